use crate::float_math::Real;

/// Wraps `angle` (in radians) into the signed range (-π, π].
///
/// Angles that are already in range are returned unchanged.
pub(crate) fn wrap_to_signed_range<T: Real>(angle: T) -> T {
    let pi = T::pi();
    if angle > -pi && angle <= pi {
        return angle;
    }

    let full_turn = T::two_pi();
    let wrapped = angle - full_turn * ((angle + pi) / full_turn).floor();
    // the floor puts us in [-π, π), and -π is the same rotation as π
    if wrapped <= -pi {
        wrapped + full_turn
    } else {
        wrapped
    }
}
