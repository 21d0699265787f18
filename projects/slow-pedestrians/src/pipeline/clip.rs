use crate::pipeline::types::{ClipRequest, Trajectory};
use std::path::Path;

const FALLBACK_EXTENSION: &str = "mp4";

/// Builds clip requests for qualifying trajectories of one batch.
#[derive(Debug, Clone)]
pub struct ClipRequestBuilder<'a> {
    pub output_dir: &'a Path,
    pub frame_rate: f64,
    pub duration_secs: f64,
}

impl<'a> ClipRequestBuilder<'a> {
    pub fn new(output_dir: &'a Path, frame_rate: f64, duration_secs: f64) -> Self {
        Self {
            output_dir,
            frame_rate,
            duration_secs,
        }
    }

    /// Starts at the trajectory's first listed frame, which is not
    /// necessarily its earliest one.
    pub fn build(&self, trajectory: &Trajectory, video: &Path) -> Option<ClipRequest> {
        let first_frame = trajectory.first_frame()?;
        let start_secs = first_frame as f64 / self.frame_rate;

        Some(ClipRequest {
            source: video.to_path_buf(),
            start_secs,
            duration_secs: self.duration_secs,
            output: self.output_dir.join(clip_file_name(video, start_secs)),
        })
    }
}

/// `<video stem>_<whole seconds>s.<video extension>`
pub fn clip_file_name(video: &Path, start_secs: f64) -> String {
    let stem = video
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let ext = video
        .extension()
        .map(|s| s.to_string_lossy())
        .unwrap_or_else(|| FALLBACK_EXTENSION.into());

    format!("{}_{}s.{}", stem, start_secs.floor() as u64, ext)
}
