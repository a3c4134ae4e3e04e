//! Hooks that plug the rotation kernels into an expression framework.
//!
//! An expression framework builds computations out of _leaves_ (the inputs whose derivatives
//! are of interest) and _operations_ applied to them. This module defines what such a framework
//! needs from this crate:
//!
//! - [`Leaf`] classifies a type as an input and names its plain (owned) form.
//! - [`BoxPlus`] gives a leaf a tangent space, which is where derivatives live.
//! - [`ExpMap`] and [`LogMap`] are operation tags, and [`Evaluate`] / [`Jacobian`] are
//!   implemented for each supported `(operation, operand)` pair.
//!
//! Which implementation runs is decided entirely at compile time by the tag and operand types:
//!
//! ```rust
//! use relrot::expression::{Evaluate, ExpMap, Jacobian, LogMap};
//! use relrot::RelativeRotation;
//!
//! let phi = RelativeRotation::new(0.1, -0.2, 0.3);
//! let (q, exp_jacobian) = ExpMap.evaluate_with_jacobian(&phi);
//! let (back, log_jacobian) = LogMap.evaluate_with_jacobian(&q);
//!
//! assert!((back.value() - phi.value()).norm() < 1e-14);
//! assert!((log_jacobian * exp_jacobian - nalgebra::Matrix3::identity()).norm() < 1e-12);
//! ```
//!
//! For callers that only learn the operation at run time, see [`dynamic`](crate::dynamic).
//!
//! ## Perturbation convention
//!
//! Jacobians are taken with respect to _left_ perturbations in tangent space. For a rotation
//! `R`, that means `R ⊞ δ = exp(δ)·R`; for a [`RelativeRotation`](crate::RelativeRotation) it is
//! plain vector addition. A Jacobian `J` of an operation `f` then satisfies
//! `f(x ⊞ δ) ≈ f(x) ⊞ J·δ` for small `δ`.

use crate::float_math::{lit, Real};
use crate::math::{
    jacobian_of_rotation_log_map, quaternion_from_rotation_vector,
    rotation_vector_from_quaternion,
};
use crate::RelativeRotation;
use nalgebra::{Matrix3, UnitQuaternion, Vector3};
use std::fmt::{self, Display, Formatter};

/// The kinds of leaves known to this crate.
///
/// This mirrors [`Leaf::KIND`] at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    /// A leaf that lives in a vector space, like [`RelativeRotation`].
    Vector,
    /// A leaf that is a rotation, like [`UnitQuaternion`].
    Rotation,
}

impl Display for LeafKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vector => write!(f, "vector"),
            Self::Rotation => write!(f, "rotation"),
        }
    }
}

/// A type that can be an input (a leaf) of an expression.
pub trait Leaf {
    /// The real scalar type the leaf is made of.
    type Scalar: Real;

    /// The owned type a leaf of this kind evaluates to.
    ///
    /// For leaves that may borrow their storage (like a [`RelativeRotation`] viewing into a
    /// larger vector), this is the variant that owns it.
    type Plain: Leaf<Scalar = Self::Scalar>;

    /// What kind of leaf this is.
    const KIND: LeafKind;

    /// Number of degrees of freedom, ie, the dimension of the tangent space.
    const TANGENT_SIZE: usize;
}

/// Movement of a [`Leaf`] within its tangent space.
pub trait BoxPlus: Leaf {
    /// Applies the tangent-space perturbation `delta` to `self` (`self ⊞ delta`).
    fn box_plus(&self, delta: &Vector3<Self::Scalar>) -> Self::Plain;

    /// Returns the tangent-space difference between `self` and `other` (`self ⊟ other`).
    ///
    /// This is the inverse of [`BoxPlus::box_plus`]: `(a ⊞ δ) ⊟ a == δ` for small enough `δ`.
    fn box_minus(&self, other: &Self) -> Vector3<Self::Scalar>;
}

impl<T: Real> Leaf for UnitQuaternion<T> {
    type Scalar = T;
    type Plain = Self;
    const KIND: LeafKind = LeafKind::Rotation;
    const TANGENT_SIZE: usize = 3;
}

impl<T: Real> BoxPlus for UnitQuaternion<T> {
    fn box_plus(&self, delta: &Vector3<T>) -> Self {
        quaternion_from_rotation_vector(delta) * self
    }

    fn box_minus(&self, other: &Self) -> Vector3<T> {
        rotation_vector_from_quaternion(&(self * other.inverse()))
    }
}

/// Operation tag for the exponential map, from so(3) to SO(3).
///
/// Implemented for [`RelativeRotation`] operands, producing a [`UnitQuaternion`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpMap;

/// Operation tag for the logarithmic map, from SO(3) to so(3).
///
/// Implemented for [`UnitQuaternion`] operands, producing a [`RelativeRotation`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogMap;

/// Evaluation of the operation `Self` applied to an operand of type `Rhs`.
pub trait Evaluate<Rhs> {
    /// What the operation produces.
    type Output;

    /// Computes the result of the operation.
    fn evaluate(&self, rhs: &Rhs) -> Self::Output;
}

/// The local Jacobian of the operation `Self` applied to an operand of type `Rhs`.
pub trait Jacobian<Rhs: Leaf>: Evaluate<Rhs> {
    /// Computes the Jacobian of the operation at `rhs`.
    ///
    /// `value` must be the result of [`Evaluate::evaluate`] for the same `rhs`. Many Jacobians
    /// are cheaper to compute from the result than from scratch, and callers of Jacobians nearly
    /// always have the result at hand.
    fn jacobian(&self, value: &Self::Output, rhs: &Rhs) -> Matrix3<Rhs::Scalar>;

    /// Computes both the result of the operation and its Jacobian.
    fn evaluate_with_jacobian(&self, rhs: &Rhs) -> (Self::Output, Matrix3<Rhs::Scalar>) {
        let value = self.evaluate(rhs);
        let jacobian = self.jacobian(&value, rhs);
        (value, jacobian)
    }
}

impl<T: Real> Evaluate<UnitQuaternion<T>> for LogMap {
    type Output = RelativeRotation<T>;

    fn evaluate(&self, rhs: &UnitQuaternion<T>) -> RelativeRotation<T> {
        RelativeRotation::from_vector(rotation_vector_from_quaternion(rhs))
    }
}

impl<T: Real> Jacobian<UnitQuaternion<T>> for LogMap {
    fn jacobian(&self, value: &RelativeRotation<T>, _: &UnitQuaternion<T>) -> Matrix3<T> {
        jacobian_of_rotation_log_map(value.value())
    }
}

/// Estimates the Jacobian of `op` at `rhs` with central finite differences.
///
/// Each column `i` is `(op(rhs ⊞ h·eᵢ) ⊟ op(rhs ⊞ -h·eᵢ)) / 2h`, where `h` is `step`. This is
/// mostly useful for checking analytic Jacobians; the error is of order `h²` plus round-off of
/// order `ε/h`, so a `step` around the cube root of the machine epsilon tends to work best.
#[must_use]
pub fn numerical_jacobian<Op, Rhs>(op: &Op, rhs: &Rhs, step: Rhs::Scalar) -> Matrix3<Rhs::Scalar>
where
    Rhs: BoxPlus,
    Op: Evaluate<Rhs::Plain>,
    Op::Output: BoxPlus<Scalar = Rhs::Scalar>,
{
    let mut jacobian = Matrix3::zeros();
    for i in 0..Rhs::TANGENT_SIZE {
        let delta = Vector3::ith(i, step);
        let plus = op.evaluate(&rhs.box_plus(&delta));
        let minus = op.evaluate(&rhs.box_plus(&-delta));
        jacobian.set_column(i, &(plus.box_minus(&minus) / (lit::<Rhs::Scalar>(2.0) * step)));
    }
    jacobian
}
