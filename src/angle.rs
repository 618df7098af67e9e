use std::f64::consts::{PI, TAU};

/// Wraps an angle into `(-PI, PI]`.
///
/// Values already in range are returned bit-for-bit, so the function is
/// idempotent. Non-finite input gives NaN.
pub fn normalize_angle(angle: f64) -> f64 {
    if angle > -PI && angle <= PI {
        return angle;
    }
    let wrapped = PI - (PI - angle).rem_euclid(TAU);
    // rem_euclid の丸めで境界外に出ることがある
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_normalize_range() {
        for a in [3.0 * PI, -2.5 * PI, 0.1, PI, -PI, 7.0, -7.0, 1e6, -1e6, TAU] {
            let n = normalize_angle(a);
            assert!(n > -PI && n <= PI, "{a} -> {n}");
            assert_abs_diff_eq!(n.sin(), a.sin(), epsilon = 1e-9);
            assert_abs_diff_eq!(n.cos(), a.cos(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_normalize_known_values() {
        assert_abs_diff_eq!(normalize_angle(3.0 * PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(-2.5 * PI), -0.5 * PI, epsilon = 1e-12);
        assert_eq!(normalize_angle(0.1), 0.1);
        assert_eq!(normalize_angle(PI), PI);
        assert_abs_diff_eq!(normalize_angle(-PI), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_idempotent() {
        for a in [3.0 * PI, -2.5 * PI, 0.1, -PI, 12.34, -98.7] {
            let once = normalize_angle(a);
            assert_eq!(normalize_angle(once), once);
        }
    }

    #[test]
    fn test_normalize_nan() {
        assert!(normalize_angle(f64::NAN).is_nan());
    }
}
