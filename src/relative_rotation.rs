use crate::expression::{BoxPlus, Evaluate, ExpMap, Jacobian, Leaf, LeafKind};
use crate::float_math::{Real, RealAngle};
use crate::math::{jacobian_of_rotation_exp_map, quaternion_from_rotation_vector};
use crate::util::wrap_to_signed_range;
use nalgebra::{
    ArrayStorage, Matrix3, Storage, StorageMut, Unit, UnitQuaternion, Vector, Vector3, U3,
};
use std::fmt::{self, Display, Formatter};

#[cfg(any(test, feature = "approx"))]
use approx::{AbsDiffEq, RelativeEq};

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A rotation expressed as an element of the Lie algebra so(3).
///
/// The direction of the underlying 3-vector is the axis of rotation, and its length is the angle
/// of rotation in radians (counter-clockwise about the axis, by the right-hand rule). This is
/// also known as a "rotation vector" or the "scaled axis" representation. It is the minimal
/// parameterization of a rotation that is unique for angles below π, which is what makes it
/// suitable as the tangent space in which small rotational corrections are expressed.
///
/// Every 3-vector is a valid relative rotation, so no normalization ever happens. In
/// particular, vectors longer than π are allowed; [`RelativeRotation::shortest`] finds the
/// equivalent rotation with an angle in (-π, π].
///
/// The storage parameter `S` decides where the three components live. The default is an owned
/// array, but any nalgebra storage works, which means a `RelativeRotation` can also be a view
/// into a slice of a larger parameter vector:
///
/// ```rust
/// use nalgebra::DVector;
/// use relrot::RelativeRotation;
///
/// let mut parameters = DVector::<f64>::zeros(6);
/// let mut attitude = RelativeRotation::from_storage(parameters.fixed_rows_mut::<3>(3));
/// attitude.set_from_angle_and_axis(0.5, &nalgebra::Vector3::y());
/// assert_eq!(parameters[4], 0.5);
/// ```
///
/// Mapping the relative rotation onto a proper rotation happens through the exponential map:
///
/// ```rust
/// use relrot::RelativeRotation;
/// use std::f64::consts::FRAC_PI_2;
///
/// let quarter_turn = RelativeRotation::from_angle_and_axis(FRAC_PI_2, &nalgebra::Vector3::z());
/// let q = quarter_turn.exp();
/// assert!((q.k - 0.5_f64.sqrt()).abs() < 1e-15);
/// assert!((q.w - 0.5_f64.sqrt()).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RelativeRotation<T, S = ArrayStorage<T, 3, 1>> {
    value: Vector<T, U3, S>,
}

impl<T: Real> RelativeRotation<T> {
    /// Constructs a relative rotation from its three components.
    #[must_use]
    pub fn new(x: T, y: T, z: T) -> Self {
        Self::from_vector(Vector3::new(x, y, z))
    }

    /// Constructs a relative rotation from a rotation vector.
    #[must_use]
    pub fn from_vector(value: Vector3<T>) -> Self {
        Self { value }
    }

    /// The relative rotation that does not rotate at all.
    #[must_use]
    pub fn zero() -> Self {
        Self::from_vector(Vector3::zeros())
    }

    /// Constructs a relative rotation by `angle` (in radians) about `axis`.
    ///
    /// `axis` does not need to be of unit length, but must not be zero. See
    /// [`RelativeRotation::try_from_angle_and_axis`] for a checked version.
    #[must_use]
    pub fn from_angle_and_axis<SA>(angle: T, axis: &Vector<T, U3, SA>) -> Self
    where
        SA: Storage<T, U3>,
    {
        let mut rotation = Self::zero();
        rotation.set_from_angle_and_axis(angle, axis);
        rotation
    }

    /// Constructs a relative rotation by `angle` (in radians) about `axis`.
    ///
    /// Returns `None` if `axis` has no well-defined direction, ie, if its length is zero or not
    /// finite.
    #[must_use]
    pub fn try_from_angle_and_axis<SA>(angle: T, axis: &Vector<T, U3, SA>) -> Option<Self>
    where
        SA: Storage<T, U3>,
    {
        let norm = axis.norm();
        if norm > T::zero() && norm.is_finite() {
            Some(Self::from_vector(axis / norm * angle))
        } else {
            None
        }
    }
}

impl<T, S> RelativeRotation<T, S>
where
    T: Real,
    S: Storage<T, U3>,
{
    /// Wraps existing storage (owned or a view) as a relative rotation.
    #[must_use]
    pub fn from_storage(value: Vector<T, U3, S>) -> Self {
        Self { value }
    }

    /// Returns the underlying rotation vector.
    #[must_use]
    pub fn value(&self) -> &Vector<T, U3, S> {
        &self.value
    }

    /// Returns the angle of rotation in radians.
    ///
    /// This is never negative; a negative angle about some axis is a positive angle about the
    /// opposite axis.
    #[must_use]
    pub fn angle(&self) -> T {
        self.value.norm()
    }

    /// Returns the axis of rotation, or `None` if this is the zero rotation.
    #[must_use]
    pub fn axis(&self) -> Option<Unit<Vector3<T>>> {
        Unit::try_new(self.value.clone_owned(), T::zero())
    }

    /// Copies the rotation vector into owned storage.
    #[must_use]
    pub fn clone_owned(&self) -> RelativeRotation<T> {
        RelativeRotation::from_vector(self.value.clone_owned())
    }

    /// Maps this relative rotation onto the rotation it describes.
    ///
    /// Shorthand for evaluating [`ExpMap`] on `self`.
    #[must_use]
    pub fn exp(&self) -> UnitQuaternion<T> {
        ExpMap.evaluate(self)
    }

    /// Returns the equivalent relative rotation whose angle lies in (-π, π].
    ///
    /// The axis is preserved (up to a flip of sign when the angle is wrapped to a negative
    /// value), so for vectors no longer than π this is a copy.
    #[must_use]
    pub fn shortest(&self) -> RelativeRotation<T> {
        let angle = self.angle();
        if angle <= T::pi() {
            return self.clone_owned();
        }
        let wrapped = wrap_to_signed_range(angle);
        RelativeRotation::from_vector(self.value.clone_owned() * (wrapped / angle))
    }
}

impl<T, S> RelativeRotation<T, S>
where
    T: Real,
    S: StorageMut<T, U3>,
{
    /// Returns the underlying rotation vector for modification.
    pub fn value_mut(&mut self) -> &mut Vector<T, U3, S> {
        &mut self.value
    }

    /// Overwrites this relative rotation with one by `angle` (in radians) about `axis`.
    ///
    /// `axis` does not need to be of unit length, but must not be zero; this is checked in debug
    /// builds only.
    pub fn set_from_angle_and_axis<SA>(&mut self, angle: T, axis: &Vector<T, U3, SA>) -> &mut Self
    where
        SA: Storage<T, U3>,
    {
        debug_assert!(
            axis.norm_squared() > T::zero(),
            "axis of rotation must not be the zero vector"
        );
        self.value.copy_from(&(axis.normalize() * angle));
        self
    }
}

impl<T: Real> RelativeRotation<T> {
    /// Constructs a relative rotation by `angle` about `axis`.
    ///
    /// Same as [`RelativeRotation::from_angle_and_axis`], but takes the angle as a unit-aware
    /// quantity. The scalar type follows from the quantity's storage type.
    #[must_use]
    pub fn from_si_angle_and_axis<A, SA>(angle: A, axis: &Vector<T, U3, SA>) -> Self
    where
        A: RealAngle<Scalar = T>,
        SA: Storage<T, U3>,
    {
        Self::from_angle_and_axis(angle.radians(), axis)
    }
}

impl<T: Real, S: Storage<T, U3>> RelativeRotation<T, S> {
    /// Returns the angle of rotation as a unit-aware quantity.
    #[must_use]
    pub fn si_angle(&self) -> T::Angle {
        T::Angle::from_radians(self.angle())
    }
}

impl<T: Real> Default for RelativeRotation<T> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<T: Real> From<Vector3<T>> for RelativeRotation<T> {
    fn from(value: Vector3<T>) -> Self {
        Self::from_vector(value)
    }
}

impl<T: Real> From<[T; 3]> for RelativeRotation<T> {
    fn from([x, y, z]: [T; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl<T: Real> From<RelativeRotation<T>> for Vector3<T> {
    fn from(rotation: RelativeRotation<T>) -> Self {
        rotation.value
    }
}

impl<T, S, S2> PartialEq<RelativeRotation<T, S2>> for RelativeRotation<T, S>
where
    T: Real,
    S: Storage<T, U3>,
    S2: Storage<T, U3>,
{
    fn eq(&self, other: &RelativeRotation<T, S2>) -> bool {
        self.value == other.value
    }
}

impl<T: Real, S: Storage<T, U3>> Display for RelativeRotation<T, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "so(3): [{}, {}, {}]",
            self.value[0], self.value[1], self.value[2]
        )
    }
}

#[cfg(any(test, feature = "approx"))]
impl<T: Real, S: Storage<T, U3>> AbsDiffEq<Self> for RelativeRotation<T, S> {
    type Epsilon = T;

    fn default_epsilon() -> Self::Epsilon {
        T::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        self.value.abs_diff_eq(&other.value, epsilon)
    }
}

#[cfg(any(test, feature = "approx"))]
impl<T: Real, S: Storage<T, U3>> RelativeEq for RelativeRotation<T, S> {
    fn default_max_relative() -> Self::Epsilon {
        T::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        self.value.relative_eq(&other.value, epsilon, max_relative)
    }
}

// serialized as a bare sequence of three numbers, whatever the storage
#[cfg(feature = "serde")]
impl<T, S> Serialize for RelativeRotation<T, S>
where
    T: Real + Serialize,
    S: Storage<T, U3>,
{
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.collect_seq(self.value.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, T> Deserialize<'de> for RelativeRotation<T>
where
    T: Real + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <[T; 3]>::deserialize(deserializer).map(Self::from)
    }
}

impl<T: Real, S: Storage<T, U3>> Leaf for RelativeRotation<T, S> {
    type Scalar = T;
    type Plain = RelativeRotation<T>;
    const KIND: LeafKind = LeafKind::Vector;
    const TANGENT_SIZE: usize = 3;
}

impl<T: Real, S: Storage<T, U3>> BoxPlus for RelativeRotation<T, S> {
    fn box_plus(&self, delta: &Vector3<T>) -> RelativeRotation<T> {
        RelativeRotation::from_vector(&self.value + delta)
    }

    fn box_minus(&self, other: &Self) -> Vector3<T> {
        &self.value - &other.value
    }
}

impl<T: Real, S: Storage<T, U3>> Evaluate<RelativeRotation<T, S>> for ExpMap {
    type Output = UnitQuaternion<T>;

    fn evaluate(&self, rhs: &RelativeRotation<T, S>) -> UnitQuaternion<T> {
        quaternion_from_rotation_vector(rhs.value())
    }
}

impl<T: Real, S: Storage<T, U3>> Jacobian<RelativeRotation<T, S>> for ExpMap {
    fn jacobian(&self, value: &UnitQuaternion<T>, rhs: &RelativeRotation<T, S>) -> Matrix3<T> {
        jacobian_of_rotation_exp_map(&value.to_rotation_matrix().into_inner(), rhs.value())
    }
}
