//! This library provides the rotation half of a differentiable geometry kernel: conversions
//! between rotations (SO(3)) and relative rotations (so(3)), along with their exact analytic
//! Jacobians.
//!
//! The central type is [`RelativeRotation`], a rotation expressed as a 3-vector whose direction
//! is the axis of rotation and whose length is the angle of rotation. It is the minimal
//! parameterization of a rotation, which makes it the natural space in which to express small
//! corrections, for example in a non-linear least-squares solver. Proper rotations are
//! represented with nalgebra's [`UnitQuaternion`](nalgebra::UnitQuaternion).
//!
//! Moving between the two happens through the exponential and logarithmic maps. The closed-form
//! kernels for these (and their Jacobians) live in [`math`] and work directly on nalgebra types.
//! The [`expression`] module wraps them in operation tags ([`ExpMap`](expression::ExpMap) and
//! [`LogMap`](expression::LogMap)) whose [`Evaluate`](expression::Evaluate) and
//! [`Jacobian`](expression::Jacobian) implementations are what an automatic differentiation or
//! optimization framework would call into. If the operation is only known at run time,
//! [`dynamic`] dispatches to the same implementations.
//!
//! Everything is generic over the scalar type through [`Real`], which is implemented for `f32`
//! and `f64`.
//!
//! # Examples
//!
//! Assume we want to find the relative rotation `φ` that maps onto some target rotation. The
//! exponential map and its Jacobian are all we need for Newton's method:
//!
//! ```
//! use nalgebra::UnitQuaternion;
//! use relrot::expression::{BoxPlus, ExpMap, Jacobian};
//! use relrot::RelativeRotation;
//!
//! let target = UnitQuaternion::from_euler_angles(0.1, -0.3, 0.2);
//!
//! let mut phi = RelativeRotation::<f64>::zero();
//! for _ in 0..5 {
//!     let (estimate, jacobian) = ExpMap.evaluate_with_jacobian(&phi);
//!     // how far off we are, as a (left) perturbation of the current estimate
//!     let error = target.box_minus(&estimate);
//!     let inverse = jacobian
//!         .try_inverse()
//!         .expect("the jacobian is invertible for angles below 2π");
//!     phi = phi.box_plus(&(inverse * error));
//! }
//!
//! assert!(phi.exp().angle_to(&target) < 1e-12);
//! ```
//!
//! Of course, in this particular case the logarithmic map gives the answer directly:
//!
//! ```
//! # use nalgebra::UnitQuaternion;
//! use relrot::expression::{Evaluate, LogMap};
//! # let target = UnitQuaternion::from_euler_angles(0.1, -0.3, 0.2);
//! let phi = LogMap.evaluate(&target);
//! assert!(phi.exp().angle_to(&target) < 1e-12);
//! ```
//!
//! # Features
//!
//! - `serde` (default): serialization of [`RelativeRotation`] as a sequence of three numbers.
//! - `approx` (default): [`approx`] comparisons for [`RelativeRotation`].

mod float_math;
mod relative_rotation;
mod util;

pub mod dynamic;
pub mod expression;
pub mod math;
pub mod random;

pub use float_math::{Real, RealAngle};
pub use relative_rotation::RelativeRotation;
