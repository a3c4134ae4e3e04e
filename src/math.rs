//! Closed-form conversions between so(3) and SO(3), and their Jacobians.
//!
//! The functions in this module are the numeric core of the crate. They operate directly on
//! nalgebra's fixed-size types so that they can be used without going through
//! [`RelativeRotation`](crate::RelativeRotation) or the [`expression`](crate::expression)
//! machinery, for example from inside a solver's residual function.
//!
//! Every function here is pure. Inputs are taken by reference with any nalgebra storage, so
//! views into larger buffers work as well as owned vectors and matrices.
//!
//! All kernels switch to a series expansion when the rotation angle gets small enough that the
//! closed form would divide by (nearly) zero. The switch-over points are tied to the machine
//! epsilon of the scalar type, `ε`:
//!
//! | kernel                                  | closed form used when |
//! | --------------------------------------- | --------------------- |
//! | [`quaternion_from_rotation_vector`]     | θ⁴ > ε                |
//! | [`rotation_vector_from_quaternion`]     | ‖q.vec‖ > ε           |
//! | [`rotation_vector_from_matrix`]         | θ² > ε                |
//! | [`jacobian_of_rotation_exp_map`]        | θ² > ε                |
//! | [`jacobian_of_rotation_log_map`]        | θ² > ε^¼              |
//!
//! The Jacobians follow the left-perturbation convention, R ⊞ δ = exp(δ)·R. See also
//! [`expression::BoxPlus`](crate::expression::BoxPlus).

use crate::float_math::{lit, Real};
use nalgebra::{Matrix, Matrix3, Quaternion, Scalar, Storage, UnitQuaternion, Vector, Vector3, U3};

/// Returns the skew-symmetric "cross-product" (or "hat") matrix of a 3-vector.
///
/// This is the matrix `[v]×` for which `[v]× * w == v.cross(&w)`.
#[doc(alias = "hat")]
#[doc(alias = "skew")]
#[must_use]
pub fn cross_matrix<T, S>(vec: &Vector<T, U3, S>) -> Matrix3<T>
where
    T: Real,
    S: Storage<T, U3>,
{
    let (x, y, z) = (vec[0], vec[1], vec[2]);
    Matrix3::new(
        T::zero(),
        -z,
        y,
        z,
        T::zero(),
        -x,
        -y,
        x,
        T::zero(),
    )
}

/// Goes from a skew-symmetric (cross) matrix to the 3-vector that generates it.
///
/// Also known as the "vee" operator; it is the inverse of [`cross_matrix`]. Only the elements
/// `(2, 1)`, `(0, 2)`, and `(1, 0)` are read. The matrix is _not_ checked for being
/// skew-symmetric, so passing anything else silently discards the remaining elements.
#[doc(alias = "vee")]
#[must_use]
pub fn uncross_matrix<T, S>(skew: &Matrix<T, U3, U3, S>) -> Vector3<T>
where
    T: Scalar,
    S: Storage<T, U3, U3>,
{
    Vector3::new(
        skew[(2, 1)].clone(),
        skew[(0, 2)].clone(),
        skew[(1, 0)].clone(),
    )
}

/// Calculates the exponential map of a rotation vector, producing a unit quaternion.
///
/// Evaluating via the quaternion is cheaper than the Rodrigues formula for a rotation matrix,
/// even when a matrix is needed in the end and the quaternion has to be converted.
///
/// The result is unit-norm up to floating point error; it is _not_ renormalized.
///
/// Based on F. S. Grassia, "Practical parameterization of rotations using the exponential map",
/// Journal of Graphics Tools, 1998.
#[doc(alias = "exp")]
#[must_use]
pub fn quaternion_from_rotation_vector<T, S>(rotation_vec: &Vector<T, U3, S>) -> UnitQuaternion<T>
where
    T: Real,
    S: Storage<T, U3>,
{
    let v = rotation_vec.clone_owned();
    let angle2 = v.norm_squared();

    let (s, c) = if angle2 * angle2 > T::default_epsilon() {
        let angle = angle2.sqrt();
        let half_angle = angle * lit::<T>(0.5);
        (half_angle.sin() / angle, half_angle.cos())
    } else {
        // Taylor expansions of sin(θ/2)/θ and cos(θ/2)
        (
            lit::<T>(0.5) - angle2 / lit::<T>(48.0),
            T::one() - angle2 / lit::<T>(8.0),
        )
    };

    UnitQuaternion::new_unchecked(Quaternion::from_parts(c, v * s))
}

/// Calculates the logarithmic map of a quaternion, producing a rotation vector.
///
/// `q` and `-q` represent the same rotation, and both yield the same result: the rotation
/// vector of the shorter way around, whose norm is at most π.
///
/// The quaternion is expected to be of unit norm; it is not normalized first.
#[doc(alias = "log")]
#[must_use]
pub fn rotation_vector_from_quaternion<T: Real>(quaternion: &Quaternion<T>) -> Vector3<T> {
    let vec = quaternion.imag();
    let w = quaternion.scalar();

    let norm = vec.norm();
    if norm > T::default_epsilon() {
        let two = lit::<T>(2.0);
        vec * (two * norm.atan2(w.abs()) / norm.copysign(w))
    } else {
        // limit as w -> 1
        vec * lit::<T>(2.0)
    }
}

/// Calculates the logarithmic map of a rotation matrix, producing a rotation vector.
///
/// The rotation angle is recovered with an arc-cosine of the matrix trace, which is poorly
/// conditioned as the angle approaches π. Expect reduced precision for such rotations; prefer
/// [`rotation_vector_from_quaternion`] when a quaternion is available.
///
/// See E. Eade, "Lie Groups for 2D and 3D Transformations", <http://ethaneade.com/lie.pdf>.
#[must_use]
pub fn rotation_vector_from_matrix<T, S>(rotation_mat: &Matrix<T, U3, U3, S>) -> Vector3<T>
where
    T: Real,
    S: Storage<T, U3, U3>,
{
    let m = rotation_mat.clone_owned();

    // round-off can push the trace of a valid rotation just outside acos' domain
    let cos_angle = ((m.trace() - T::one()) * lit::<T>(0.5)).clamp(-T::one(), T::one());
    let angle = cos_angle.acos();
    let antisymmetric = m - m.transpose();

    if angle * angle > T::default_epsilon() {
        let two = lit::<T>(2.0);
        uncross_matrix(&(antisymmetric * (angle / (two * angle.sin()))))
    } else {
        uncross_matrix(&(antisymmetric * lit::<T>(0.5)))
    }
}

/// Local Jacobian of the logarithmic map of a rotation.
///
/// `rotation_vec` is the _result_ of the logarithmic map. The Jacobian only depends on that
/// result, not on how the original rotation was parameterized. It maps a left perturbation of
/// the rotation onto the corresponding change of the rotation vector, and is the inverse of
/// [`jacobian_of_rotation_exp_map`] for the same rotation vector.
///
/// For small angles (θ² ≤ ε^¼) the closed form loses most of its precision to cancellation in
/// `1 - cos θ`, so the coefficient of `[φ]×²` is taken from its series expansion
/// `1/12 + θ²/720 + θ⁴/30240` instead.
///
/// See E. Eade, "Derivative of the Exponential Map", <http://ethaneade.org/exp_diff.pdf>.
#[must_use]
pub fn jacobian_of_rotation_log_map<T, S>(rotation_vec: &Vector<T, U3, S>) -> Matrix3<T>
where
    T: Real,
    S: Storage<T, U3>,
{
    let phi = rotation_vec.clone_owned();
    let pcross = cross_matrix(&phi);
    let theta2 = phi.norm_squared();

    let coefficient = if theta2 > T::default_epsilon().sqrt().sqrt() {
        let theta = theta2.sqrt();
        let a = theta.sin() / theta;
        let b = (T::one() - theta.cos()) / theta2;
        (b - a * lit::<T>(0.5)) / (T::one() - theta.cos())
    } else {
        tracing::trace!("small-angle series for the rotation log map jacobian");
        lit::<T>(1.0 / 12.0) + theta2 / lit::<T>(720.0) + theta2 * theta2 / lit::<T>(30240.0)
    };

    Matrix3::identity() - pcross * lit::<T>(0.5) + pcross * pcross * coefficient
}

/// Local Jacobian of the exponential map of a rotation.
///
/// `rotation_mat` must be the result of the exponential map of `rotation_vec`, expressed as a
/// rotation matrix. Taking the already-evaluated result avoids computing the exponential map a
/// second time when both the value and its Jacobian are needed.
///
/// The Jacobian maps a change of `rotation_vec` onto the corresponding left perturbation of the
/// resulting rotation (ie, it is the left Jacobian of SO(3)).
///
/// Based on equation 80 of M. Bloesch et al., "A Primer on the Differential Calculus of 3D
/// Orientations", with a first-order expansion for near-zero input.
#[must_use]
pub fn jacobian_of_rotation_exp_map<T, SM, SV>(
    rotation_mat: &Matrix<T, U3, U3, SM>,
    rotation_vec: &Vector<T, U3, SV>,
) -> Matrix3<T>
where
    T: Real,
    SM: Storage<T, U3, U3>,
    SV: Storage<T, U3>,
{
    let phi = rotation_vec.clone_owned();
    let c = rotation_mat.clone_owned();
    let pcross = cross_matrix(&phi);
    let n2 = phi.norm_squared();

    if n2 > T::default_epsilon() {
        ((Matrix3::identity() - c) * pcross + phi * phi.transpose()) / n2
    } else {
        tracing::trace!("small-angle expansion for the rotation exp map jacobian");
        Matrix3::identity() + pcross * lit::<T>(0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RelativeRotation;
    use approx::assert_relative_eq;
    use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};
    use quickcheck::quickcheck;
    use rstest::rstest;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn v(x: f64, y: f64, z: f64) -> Vector3<f64> {
        Vector3::new(x, y, z)
    }

    #[rstest]
    #[case(v(1., 2., 3.))]
    #[case(v(-4., 0., 0.5))]
    #[case(v(0., 0., 0.))]
    #[case(v(1e-3, -7.25, 1024.))]
    fn uncross_inverts_cross(#[case] w: Vector3<f64>) {
        assert_eq!(uncross_matrix(&cross_matrix(&w)), w);
    }

    #[test]
    fn uncross_works_on_integers() {
        let skew = Matrix3::new(0, -3, 2, 3, 0, -1, -2, 1, 0);
        assert_eq!(uncross_matrix(&skew), Vector3::new(1, 2, 3));
    }

    #[test]
    fn cross_matrix_applies_cross_product() {
        let a = v(0.3, -1.2, 2.5);
        let b = v(-0.7, 0.1, 4.0);
        assert_relative_eq!(cross_matrix(&a) * b, a.cross(&b));
        assert_relative_eq!(cross_matrix(&a).transpose(), -cross_matrix(&a));
    }

    #[test]
    fn cross_matrix_of_view() {
        let buffer = nalgebra::DVector::from_vec(vec![9., 1., 2., 3.]);
        assert_eq!(
            cross_matrix(&buffer.fixed_rows::<3>(1)),
            cross_matrix(&v(1., 2., 3.))
        );
    }

    #[test]
    fn zero_maps_to_identity() {
        let q = quaternion_from_rotation_vector(&Vector3::<f64>::zeros());
        assert_eq!(q.coords, nalgebra::Vector4::new(0., 0., 0., 1.));
        assert_eq!(
            rotation_vector_from_quaternion(&UnitQuaternion::<f64>::identity()),
            Vector3::zeros()
        );
        assert_eq!(
            rotation_vector_from_matrix(&Matrix3::<f64>::identity()),
            Vector3::zeros()
        );
    }

    #[test]
    fn jacobians_are_identity_at_zero() {
        let zero = Vector3::<f64>::zeros();
        assert_eq!(jacobian_of_rotation_log_map(&zero), Matrix3::identity());
        assert_eq!(
            jacobian_of_rotation_exp_map(&Matrix3::identity(), &zero),
            Matrix3::identity()
        );
    }

    #[test]
    fn quarter_turn_about_z() {
        let q = quaternion_from_rotation_vector(&v(0., 0., FRAC_PI_2));
        assert_relative_eq!(q.i, 0.);
        assert_relative_eq!(q.j, 0.);
        assert_relative_eq!(q.k, FRAC_PI_4.sin());
        assert_relative_eq!(q.w, FRAC_PI_4.cos());
    }

    #[rstest]
    #[case(v(0.1, 0.2, 0.3))]
    #[case(v(-1.5, 0.4, 2.2))]
    #[case(v(3.0, 0., 0.))]
    #[case(v(1e-3, 0., -2e-3))]
    fn exp_map_matches_nalgebra(#[case] rotation_vec: Vector3<f64>) {
        let expected = UnitQuaternion::from_scaled_axis(rotation_vec);
        let actual = quaternion_from_rotation_vector(&rotation_vec);
        assert_relative_eq!(actual, expected, epsilon = 1e-14);
        assert_relative_eq!(actual.norm(), 1., epsilon = 1e-15);
    }

    #[rstest]
    #[case(v(0.1, 0.2, 0.3))]
    #[case(v(-1.5, 0.4, 2.2))]
    #[case(v(0., -3.1, 0.))]
    fn log_maps_match_nalgebra(#[case] rotation_vec: Vector3<f64>) {
        let q = UnitQuaternion::from_scaled_axis(rotation_vec);
        assert_relative_eq!(
            rotation_vector_from_quaternion(&q),
            q.scaled_axis(),
            epsilon = 1e-14
        );
        let m = Rotation3::from_scaled_axis(rotation_vec).into_inner();
        assert_relative_eq!(
            rotation_vector_from_matrix(&m),
            q.scaled_axis(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn log_map_picks_the_short_way_around() {
        // 270° about x is -90° about x
        let q = quaternion_from_rotation_vector(&v(1.5 * PI, 0., 0.));
        assert_relative_eq!(
            rotation_vector_from_quaternion(&q),
            v(-FRAC_PI_2, 0., 0.),
            epsilon = 1e-14
        );
    }

    #[test]
    fn log_map_ignores_quaternion_sign() {
        let q = quaternion_from_rotation_vector(&v(0.4, -0.8, 1.1));
        let negated = -q.into_inner();
        assert_relative_eq!(
            rotation_vector_from_quaternion(&negated),
            rotation_vector_from_quaternion(&q),
            epsilon = 1e-15
        );
    }

    #[rstest]
    #[case(1e-4)]
    #[case(1e-8)]
    // just below, at and just above the switch-over point between series and closed form
    #[case(f64::EPSILON.sqrt().sqrt() * 0.999)]
    #[case(f64::EPSILON.sqrt().sqrt())]
    #[case(f64::EPSILON.sqrt().sqrt() * 1.001)]
    fn exp_map_branches_agree(#[case] angle: f64) {
        let axis = v(1., -2., 0.5).normalize();
        let q = quaternion_from_rotation_vector(&(axis * angle));

        let s = (angle / 2.).sin() / angle;
        let c = (angle / 2.).cos();
        assert_relative_eq!(q.imag(), axis * angle * s, epsilon = 1e-20, max_relative = 1e-14);
        assert_relative_eq!(q.w, c, epsilon = 1e-16);
    }

    #[rstest]
    #[case(1e-6)]
    #[case(1e-3)]
    #[case(f64::EPSILON.sqrt().sqrt().sqrt() * 0.999)]
    #[case(f64::EPSILON.sqrt().sqrt().sqrt() * 1.001)]
    #[case(0.5)]
    fn log_map_jacobian_branches_agree(#[case] angle: f64) {
        let phi = v(0.3, 0.9, -0.2).normalize() * angle;
        let pcross = cross_matrix(&phi);
        // the coefficient written in a form without the cancellation in 1 - cos θ
        let half = angle / 2.;
        let coefficient = (1. - half / half.tan()) / (angle * angle);
        let expected = Matrix3::identity() - pcross * 0.5 + pcross * pcross * coefficient;

        // the closed form carries a cancellation error of about 2ε/θ² just above the switch-over
        assert_relative_eq!(
            jacobian_of_rotation_log_map(&phi),
            expected,
            epsilon = 1e-10
        );
    }

    #[rstest]
    #[case(v(1e-5, 0., 0.))]
    #[case(v(1e-3, 2e-3, -1e-3))]
    #[case(v(0.008, 0.001, 0.))]
    #[case(v(0.2, -0.1, 0.3))]
    #[case(v(1.0, 1.0, -1.0))]
    #[case(v(-2.5, 0.3, 0.9))]
    fn log_map_jacobian_inverts_exp_map_jacobian(#[case] phi: Vector3<f64>) {
        let c = quaternion_from_rotation_vector(&phi)
            .to_rotation_matrix()
            .into_inner();
        let product = jacobian_of_rotation_log_map(&phi) * jacobian_of_rotation_exp_map(&c, &phi);
        assert_relative_eq!(product, Matrix3::identity(), epsilon = 1e-9);
    }

    #[test]
    fn exp_map_jacobian_is_left_jacobian() {
        let phi = v(0.7, -0.3, 1.2);
        let theta: f64 = phi.norm();
        let k = cross_matrix(&phi);
        let expected = Matrix3::identity()
            + k * ((1. - theta.cos()) / theta.powi(2))
            + k * k * ((theta - theta.sin()) / theta.powi(3));
        let c = Rotation3::from_scaled_axis(phi).into_inner();
        assert_relative_eq!(
            jacobian_of_rotation_exp_map(&c, &phi),
            expected,
            epsilon = 1e-13
        );
    }

    #[test]
    fn single_precision_kernels() {
        let phi = Vector3::<f32>::new(0.2, -0.4, 0.1);
        let q = quaternion_from_rotation_vector(&phi);
        assert_relative_eq!(rotation_vector_from_quaternion(&q), phi, epsilon = 1e-6);
        let c = q.to_rotation_matrix().into_inner();
        assert_relative_eq!(rotation_vector_from_matrix(&c), phi, epsilon = 1e-5);
        assert_relative_eq!(
            jacobian_of_rotation_log_map(&phi) * jacobian_of_rotation_exp_map(&c, &phi),
            Matrix3::identity(),
            epsilon = 1e-5
        );
        assert_eq!(
            jacobian_of_rotation_log_map(&Vector3::<f32>::zeros()),
            Matrix3::identity()
        );
    }

    quickcheck! {
        fn quaternion_roundtrip(phi: RelativeRotation<f64>) -> () {
            let q = quaternion_from_rotation_vector(phi.value());
            assert_relative_eq!(rotation_vector_from_quaternion(&q), *phi.value(), epsilon = 1e-12);
        }

        fn matrix_roundtrip(phi: RelativeRotation<f64>) -> () {
            let c = quaternion_from_rotation_vector(phi.value())
                .to_rotation_matrix()
                .into_inner();
            assert_relative_eq!(rotation_vector_from_matrix(&c), *phi.value(), epsilon = 1e-8);
        }
    }
}
