//! The scalar types the kernels in this crate are generic over.
//!
//! Everything numeric in this crate is written against [`Real`] rather than a concrete float
//! type so that the same formulas serve both single and double precision. The trait is a thin
//! extension of nalgebra's [`RealField`] with the few extra operations the crate needs that
//! `RealField` does not provide.

use nalgebra::RealField;
use rand::distr::uniform::SampleUniform;

/// A real scalar usable with every kernel in this crate.
///
/// Implemented for `f32` and `f64`.
pub trait Real: RealField + Copy + SampleUniform {
    /// The [`uom`] angle quantity stored as `Self`.
    type Angle: RealAngle<Scalar = Self>;

    /// Returns the least representable value greater than `self`.
    ///
    /// `NaN` and positive infinity are returned unchanged. Both zeroes step to the smallest
    /// positive subnormal.
    fn next_up(self) -> Self;
}

/// A unit-aware angle whose value is stored as a [`Real`].
///
/// Implemented for [`uom::si::f32::Angle`] and [`uom::si::f64::Angle`]. Functions that take an
/// angle through this trait learn the scalar type from the argument, so no turbofish is needed.
pub trait RealAngle {
    type Scalar: Real;

    /// Returns the angle in radians.
    fn radians(&self) -> Self::Scalar;

    fn from_radians(radians: Self::Scalar) -> Self;
}

macro_rules! impl_real {
    ($float:ident) => {
        impl RealAngle for uom::si::$float::Angle {
            type Scalar = $float;

            #[inline]
            fn radians(&self) -> $float {
                self.get::<uom::si::angle::radian>()
            }

            #[inline]
            fn from_radians(radians: $float) -> Self {
                Self::new::<uom::si::angle::radian>(radians)
            }
        }

        impl Real for $float {
            type Angle = uom::si::$float::Angle;

            #[inline]
            fn next_up(self) -> Self {
                if self.is_nan() || self == <$float>::INFINITY {
                    return self;
                }
                if self == 0.0 {
                    return <$float>::from_bits(1);
                }
                let bits = self.to_bits();
                // moving away from zero is "up" for positives, towards zero is "up" for negatives
                <$float>::from_bits(if self > 0.0 { bits + 1 } else { bits - 1 })
            }
        }
    };
}

impl_real!(f32);
impl_real!(f64);

/// Converts an `f64` literal into the scalar type `T`.
#[inline]
pub(crate) fn lit<T: Real>(value: f64) -> T {
    nalgebra::convert(value)
}

#[cfg(test)]
mod tests {
    use super::{lit, Real, RealAngle};
    use rstest::rstest;

    #[rstest]
    #[case(1.0, 1.0 + f64::EPSILON)]
    #[case(-1.0, -1.0 + f64::EPSILON / 2.)]
    #[case(f64::MAX, f64::INFINITY)]
    #[case(f64::NEG_INFINITY, f64::MIN)]
    #[case(f64::INFINITY, f64::INFINITY)]
    fn next_up_f64(#[case] input: f64, #[case] expected: f64) {
        assert_eq!(Real::next_up(input), expected);
    }

    #[test]
    fn next_up_f32() {
        assert_eq!(Real::next_up(1.0_f32), 1.0 + f32::EPSILON);
        assert_eq!(Real::next_up(f32::MAX), f32::INFINITY);
    }

    #[test]
    fn next_up_from_zero_is_smallest_subnormal() {
        assert_eq!(Real::next_up(0.0_f64), f64::from_bits(1));
        assert_eq!(Real::next_up(-0.0_f64), f64::from_bits(1));
        assert_eq!(Real::next_up(0.0_f32), f32::from_bits(1));
        assert!(Real::next_up(0.0_f64) > 0.0);
    }

    #[test]
    fn next_up_keeps_nan() {
        assert!(Real::next_up(f64::NAN).is_nan());
        assert!(Real::next_up(f32::NAN).is_nan());
    }

    #[test]
    fn next_up_is_strictly_greater() {
        for x in [-1e300, -2.5, -f64::MIN_POSITIVE, 1e-310, 0.1, 3.0, 1e300] {
            let up = Real::next_up(x);
            assert!(up > x, "{up} should be greater than {x}");
            // nothing representable fits in between
            let mid = x + (up - x) / 2.0;
            assert!(mid == x || mid == up);
        }
    }

    #[test]
    fn literal_conversion() {
        assert_eq!(lit::<f32>(0.5), 0.5_f32);
        assert_eq!(lit::<f64>(48.0), 48.0_f64);
    }

    #[test]
    fn angles_convert_through_radians() {
        use uom::si::angle::degree;

        let right = uom::si::f64::Angle::new::<degree>(90.);
        assert!((right.radians() - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
        let back = uom::si::f64::Angle::from_radians(std::f64::consts::PI);
        assert!((back.get::<degree>() - 180.).abs() < 1e-12);

        let single = uom::si::f32::Angle::new::<degree>(-45.);
        assert!((single.radians() + std::f32::consts::FRAC_PI_4).abs() < 1e-6);
    }
}
