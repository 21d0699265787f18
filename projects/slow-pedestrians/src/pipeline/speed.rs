use crate::pipeline::types::TrajectoryPoint;

/// Mean centroid displacement between consecutive points, in trajectory order.
///
/// Fewer than two points yields 0.0. That sentinel means "not enough data"
/// but reads the same as a stationary track, so it passes any positive
/// threshold.
pub fn estimate_speed(points: &[TrajectoryPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let total: f64 = points.windows(2).map(|w| w[0].distance_to(&w[1])).sum();
    total / (points.len() - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(frame: u32, x: f64, y: f64) -> TrajectoryPoint {
        TrajectoryPoint::new(frame, x, y)
    }

    #[test]
    fn test_short_trajectories_are_zero() {
        assert_eq!(estimate_speed(&[]), 0.0);
        assert_eq!(estimate_speed(&[p(4, 100.0, 100.0)]), 0.0);
    }

    #[test]
    fn test_single_leg() {
        assert_eq!(estimate_speed(&[p(0, 0.0, 0.0), p(1, 3.0, 4.0)]), 5.0);
    }

    #[test]
    fn test_equal_legs_average() {
        let pts = [p(0, 0.0, 0.0), p(1, 3.0, 4.0), p(2, 6.0, 8.0)];
        assert_eq!(estimate_speed(&pts), 5.0);
    }

    #[test]
    fn test_uses_listed_order_not_frame_order() {
        // frames reversed relative to listing; distances follow the listing
        let pts = [p(2, 0.0, 0.0), p(0, 6.0, 8.0), p(1, 6.0, 8.0)];
        assert_eq!(estimate_speed(&pts), 5.0);
    }
}
