//! Dispatch of operations chosen at run time.
//!
//! The [`expression`](crate::expression) hooks resolve which kernel to call at compile time.
//! This module offers the same operations for callers that only learn the operation (and the
//! kind of operand) at run time, such as an expression graph built from a configuration file.
//! The set of supported `(operation, operand)` pairs is closed; asking for anything else is
//! reported as a [`DispatchError`] rather than a panic.
//!
//! ```rust
//! use relrot::dynamic::{self, DispatchError, DynamicValue, Operation};
//! use relrot::expression::LeafKind;
//! use relrot::RelativeRotation;
//!
//! let phi = DynamicValue::from(RelativeRotation::new(0., 0., 0.5));
//! let q = dynamic::evaluate(Operation::ExpMap, &phi)?;
//! assert_eq!(q.kind(), LeafKind::Rotation);
//!
//! assert_eq!(
//!     dynamic::evaluate(Operation::LogMap, &phi),
//!     Err(DispatchError::Unsupported {
//!         operation: Operation::LogMap,
//!         operand: LeafKind::Vector,
//!     })
//! );
//! # Ok::<(), DispatchError>(())
//! ```

use crate::expression::{Evaluate, ExpMap, Jacobian, LeafKind, LogMap};
use crate::float_math::Real;
use crate::RelativeRotation;
use nalgebra::{Matrix3, UnitQuaternion};
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// An operation that can be dispatched at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// See [`ExpMap`].
    ExpMap,
    /// See [`LogMap`].
    LogMap,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExpMap => write!(f, "exp map"),
            Self::LogMap => write!(f, "log map"),
        }
    }
}

/// An operand (or result) whose type is only known at run time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DynamicValue<T: Real> {
    /// An element of so(3).
    RelativeRotation(RelativeRotation<T>),
    /// An element of SO(3).
    Rotation(UnitQuaternion<T>),
}

impl<T: Real> DynamicValue<T> {
    /// Returns what kind of leaf this value holds.
    #[must_use]
    pub fn kind(&self) -> LeafKind {
        match self {
            Self::RelativeRotation(_) => LeafKind::Vector,
            Self::Rotation(_) => LeafKind::Rotation,
        }
    }
}

impl<T: Real> From<RelativeRotation<T>> for DynamicValue<T> {
    fn from(value: RelativeRotation<T>) -> Self {
        Self::RelativeRotation(value)
    }
}

impl<T: Real> From<UnitQuaternion<T>> for DynamicValue<T> {
    fn from(value: UnitQuaternion<T>) -> Self {
        Self::Rotation(value)
    }
}

/// Errors from dispatching an [`Operation`] at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The operation is not defined for operands of this kind.
    #[error("the {operation} is not defined for a {operand} operand")]
    Unsupported {
        /// The operation that was requested.
        operation: Operation,
        /// The kind of operand it was requested for.
        operand: LeafKind,
    },
}

fn unsupported<T: Real>(operation: Operation, value: &DynamicValue<T>) -> DispatchError {
    let operand = value.kind();
    tracing::debug!(%operation, %operand, "rejecting dispatch");
    DispatchError::Unsupported { operation, operand }
}

/// Applies `operation` to `value`.
///
/// This gives the same result as calling [`Evaluate::evaluate`] on the corresponding operation
/// tag with the unwrapped value.
pub fn evaluate<T: Real>(
    operation: Operation,
    value: &DynamicValue<T>,
) -> Result<DynamicValue<T>, DispatchError> {
    tracing::trace!(%operation, operand = %value.kind(), "dispatching evaluation");
    match (operation, value) {
        (Operation::ExpMap, DynamicValue::RelativeRotation(phi)) => {
            Ok(ExpMap.evaluate(phi).into())
        }
        (Operation::LogMap, DynamicValue::Rotation(q)) => Ok(LogMap.evaluate(q).into()),
        _ => Err(unsupported(operation, value)),
    }
}

/// Applies `operation` to `value`, and also returns the Jacobian of the operation at `value`.
///
/// This gives the same result as calling [`Jacobian::evaluate_with_jacobian`] on the
/// corresponding operation tag with the unwrapped value.
pub fn evaluate_with_jacobian<T: Real>(
    operation: Operation,
    value: &DynamicValue<T>,
) -> Result<(DynamicValue<T>, Matrix3<T>), DispatchError> {
    tracing::trace!(%operation, operand = %value.kind(), "dispatching jacobian");
    match (operation, value) {
        (Operation::ExpMap, DynamicValue::RelativeRotation(phi)) => {
            let (q, jacobian) = ExpMap.evaluate_with_jacobian(phi);
            Ok((q.into(), jacobian))
        }
        (Operation::LogMap, DynamicValue::Rotation(q)) => {
            let (phi, jacobian) = LogMap.evaluate_with_jacobian(q);
            Ok((phi.into(), jacobian))
        }
        _ => Err(unsupported(operation, value)),
    }
}
