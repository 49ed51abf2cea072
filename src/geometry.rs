// src/geometry.rs
use nalgebra::Vector2;

/// Angle in degrees (0-180) at vertex `b` formed by the points `a` and `c`.
///
/// Duplicate points leave one of the arms with zero length; the angle is
/// undefined there and `0.0` is returned instead of NaN.
pub fn calculate_angle(a: Vector2<f64>, b: Vector2<f64>, c: Vector2<f64>) -> f64 {
    let ba = a - b;
    let bc = c - b;

    let mag_ba = ba.norm();
    let mag_bc = bc.norm();
    if mag_ba == 0.0 || mag_bc == 0.0 {
        return 0.0;
    }

    let cos_angle = (ba.dot(&bc) / (mag_ba * mag_bc)).clamp(-1.0, 1.0);
    round2(cos_angle.acos().to_degrees())
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Vector2<f64> {
        Vector2::new(x, y)
    }

    #[test]
    fn straight_line_is_180() {
        let angle = calculate_angle(p(0.0, 0.0), p(0.5, 0.0), p(1.0, 0.0));
        assert!((angle - 180.0).abs() < 0.1);
    }

    #[test]
    fn vertex_outside_segment_is_zero() {
        let angle = calculate_angle(p(1.0, 1.0), p(0.0, 0.0), p(2.0, 2.0));
        assert!(angle.abs() < 0.1);
    }

    #[test]
    fn right_angle() {
        let angle = calculate_angle(p(0.0, 0.0), p(0.5, 0.0), p(0.5, 0.5));
        assert!((angle - 90.0).abs() < 0.01);
    }

    #[test]
    fn symmetric_in_outer_points() {
        let cases = [
            (p(3.0, 1.0), p(0.5, -2.0), p(-4.0, 7.5)),
            (p(120.0, 40.0), p(300.0, 300.0), p(310.0, 410.0)),
            (p(0.0, 1.0), p(0.0, 0.0), p(1.0, 0.0)),
        ];
        for (a, b, c) in cases {
            assert_eq!(calculate_angle(a, b, c), calculate_angle(c, b, a));
        }
    }

    #[test]
    fn duplicate_points_yield_zero() {
        assert_eq!(calculate_angle(p(1.0, 1.0), p(1.0, 1.0), p(2.0, 3.0)), 0.0);
        assert_eq!(calculate_angle(p(1.0, 1.0), p(0.0, 0.0), p(0.0, 0.0)), 0.0);
    }

    #[test]
    fn rounded_to_two_decimals() {
        let angle = calculate_angle(p(1.0, 0.0), p(0.0, 0.0), p(1.0, 3.0));
        assert_eq!(angle, round2(angle));
        assert!((angle - 71.57).abs() < 1e-9);
    }
}
