//! Utility functions used accross the library
use crate::Scalar;

/// Restrict value to a certain interval
#[inline]
pub fn clamp<T>(val: T, min: T, max: T) -> T
where
    T: PartialOrd,
{
    if val < min {
        min
    } else if val > max {
        max
    } else {
        val
    }
}

/// Number of segments needed to approximate an arc
///
/// Arc of `radius` spanning `arc` radians is split so that the distance between a
/// chord and the arc never exceeds `tolerance`. Never returns less than two.
pub fn curve_divisions(radius: Scalar, arc: Scalar, tolerance: Scalar) -> usize {
    let da = (radius / (radius + tolerance)).acos() * 2.0;
    let divs = (arc / da).ceil();
    if divs.is_finite() {
        (divs as usize).max(2)
    } else {
        2
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::PI;

    #[macro_export]
    macro_rules! assert_approx_eq {
        ( $v0:expr, $v1: expr ) => {{
            assert!(($v0 - $v1).abs() < $crate::EPSILON, "{} != {}", $v0, $v1);
        }};
        ( $v0:expr, $v1: expr, $e: expr ) => {{
            assert!(($v0 - $v1).abs() < $e, "{} != {}", $v0, $v1);
        }};
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5, 0, 3), 3);
        assert_eq!(clamp(-1.0, 0.0, 3.0), 0.0);
        assert_eq!(clamp(1.5, 0.0, 3.0), 1.5);
    }

    #[test]
    fn test_curve_divisions() {
        // tiny radius never drops below two segments
        assert_eq!(curve_divisions(0.01, PI, 0.25), 2);
        assert_eq!(curve_divisions(0.0, PI, 0.25), 2);

        let coarse = curve_divisions(5.0, PI, 0.25);
        let fine = curve_divisions(5.0, PI, 0.01);
        assert!(fine > coarse, "{} <= {}", fine, coarse);

        let small = curve_divisions(5.0, PI, 0.25);
        let large = curve_divisions(50.0, PI, 0.25);
        assert!(large > small, "{} <= {}", large, small);
    }
}
