use crate::pipeline::speed::estimate_speed;
use crate::pipeline::types::Trajectory;

/// The slowest trajectory of a video and whether it is slow enough.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub index: usize,
    pub speed: f64,
    pub qualifies: bool,
}

/// Picks the minimum-speed trajectory. Ties go to the earliest one in input
/// order. Qualifies when the speed is strictly below `threshold`.
/// Non-finite speeds are never selected; returns `None` when no trajectory
/// has a finite speed (including an empty input).
pub fn select_slowest(trajectories: &[Trajectory], threshold: f64) -> Option<Selection> {
    let mut best: Option<(usize, f64)> = None;

    for (index, trajectory) in trajectories.iter().enumerate() {
        let speed = estimate_speed(&trajectory.points);
        tracing::debug!("Trajectory {} ({}) speed {:.3}", index, trajectory.label, speed);
        if !speed.is_finite() {
            tracing::warn!("Ignoring trajectory {} with non-finite speed", index);
            continue;
        }
        match best {
            Some((_, best_speed)) if speed >= best_speed => {}
            _ => best = Some((index, speed)),
        }
    }

    best.map(|(index, speed)| Selection {
        index,
        speed,
        qualifies: speed < threshold,
    })
}
