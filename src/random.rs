//! Random sampling of scalars and rotations.
//!
//! The functions without a generator argument draw from rand's thread-local generator
//! ([`rand::rng`]), which is seeded from the operating system the first time it is used on a
//! given thread and never reseeded. There is no shared state between threads, so these can be
//! called concurrently without synchronization.
//!
//! For reproducible samples (in tests, say), use the `_with` variants and pass in a seeded
//! generator:
//!
//! ```
//! use rand::{rngs::StdRng, SeedableRng};
//! use relrot::random::{random_quaternion_with, uniform_random_with};
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let x = uniform_random_with(&mut rng, -1.0, 1.0);
//! assert!((-1.0..=1.0).contains(&x));
//!
//! let q = random_quaternion_with::<f64, _>(&mut rng);
//! assert!((q.norm() - 1.0).abs() < 1e-12);
//! ```

use crate::float_math::{lit, Real};
use crate::relative_rotation::RelativeRotation;
use nalgebra::{Quaternion, Unit, UnitQuaternion};
use rand::Rng;

/// Draws a real number uniformly from the _closed_ interval `[a, b]`.
///
/// Uses the calling thread's generator. See [`uniform_random_with`].
#[must_use]
pub fn uniform_random<T: Real>(a: T, b: T) -> T {
    uniform_random_with(&mut rand::rng(), a, b)
}

/// Draws a real number uniformly from the _closed_ interval `[a, b]` using `rng`.
///
/// Sampling happens on `[a, next_up(b))`, which makes `b` itself a possible outcome. `a == b`
/// is allowed and returns `a`. Intervals too wide for their length to be representable (such
/// as `[0, MAX]`) are sampled at a quarter of their scale and scaled back up.
///
/// `a` must not be greater than `b`, and both must be finite; this is checked in debug builds.
#[must_use]
pub fn uniform_random_with<T, R>(rng: &mut R, a: T, b: T) -> T
where
    T: Real,
    R: Rng + ?Sized,
{
    debug_assert!(a <= b, "uniform_random needs a <= b");
    debug_assert!(a.is_finite() && b.is_finite(), "uniform_random needs finite bounds");
    let sample = if (b.next_up() - a).is_finite() {
        rng.random_range(a..b.next_up())
    } else {
        let quarter = lit::<T>(0.25);
        rng.random_range(a * quarter..(b * quarter).next_up()) * lit::<T>(4.0)
    };
    // float rounding inside the sampler may land on the excluded upper bound
    sample.clamp(a, b)
}

/// Draws a unit quaternion uniformly (with respect to the Haar measure) from SO(3).
///
/// Uses the calling thread's generator. See [`random_quaternion_with`].
#[must_use]
pub fn random_quaternion<T: Real>() -> UnitQuaternion<T> {
    random_quaternion_with(&mut rand::rng())
}

/// Draws a unit quaternion uniformly (with respect to the Haar measure) from SO(3) using `rng`.
///
/// With `s` uniform on `[0, 1]` and `t₁`, `t₂` uniform on `[0, 2π)`, the quaternion is
///
/// ```text
/// w = cos(t₂)·√s
/// x = sin(t₁)·√(1 - s)
/// y = cos(t₁)·√(1 - s)
/// z = sin(t₂)·√s
/// ```
///
/// See K. Shoemake, "Uniform random rotations", Graphics Gems III, 1992.
#[must_use]
pub fn random_quaternion_with<T, R>(rng: &mut R) -> UnitQuaternion<T>
where
    T: Real,
    R: Rng + ?Sized,
{
    let s = uniform_random_with(rng, T::zero(), T::one());
    let s1 = (T::one() - s).sqrt();
    let s2 = s.sqrt();
    let t1 = rng.random_range(T::zero()..T::two_pi());
    let t2 = rng.random_range(T::zero()..T::two_pi());

    UnitQuaternion::new_unchecked(Quaternion::new(
        t2.cos() * s2,
        t1.sin() * s1,
        t1.cos() * s1,
        t2.sin() * s2,
    ))
}

/// Draws a relative rotation with a uniformly distributed axis and an angle drawn uniformly from
/// `[0, max_angle]`.
///
/// Note that this is _not_ uniform over SO(3) even when `max_angle` is π; use
/// [`random_quaternion_with`] for that.
#[must_use]
pub fn random_relative_rotation_with<T, R>(rng: &mut R, max_angle: T) -> RelativeRotation<T>
where
    T: Real,
    R: Rng + ?Sized,
{
    // the vector part of a Haar-uniform quaternion points uniformly in all directions
    let axis = loop {
        let q = random_quaternion_with::<T, _>(rng);
        if let Some(axis) = Unit::try_new(q.imag(), T::default_epsilon()) {
            break axis;
        }
    };
    let angle = uniform_random_with(rng, T::zero(), max_angle);
    RelativeRotation::from_vector(axis.into_inner() * angle)
}
