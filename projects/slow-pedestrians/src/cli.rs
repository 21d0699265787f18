use crate::pipeline::types::CurationConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding one annotation XML per video
    #[arg(long, env = "SLOW_PEDESTRIANS_ANNOTATION_DIR", default_value = "Annotations")]
    pub annotation_dir: PathBuf,

    /// Directory holding the videos, named after their annotation files
    #[arg(long, env = "SLOW_PEDESTRIANS_VIDEO_DIR", default_value = "JAAD_clips")]
    pub video_dir: PathBuf,

    /// Where clips and the run report are written (created if absent)
    #[arg(
        long,
        env = "SLOW_PEDESTRIANS_OUTPUT_DIR",
        default_value = "slow_pedestrian_clips"
    )]
    pub output_dir: PathBuf,

    /// Annotation file extension
    #[arg(long, default_value = "xml")]
    pub annotation_ext: String,

    /// Video file extension
    #[arg(long, default_value = "mp4")]
    pub video_ext: String,

    /// Mean centroid displacement per record (px) below which a pedestrian is slow
    #[arg(long, env = "SLOW_PEDESTRIANS_SPEED_THRESHOLD", default_value_t = 2.5)]
    pub speed_threshold: f64,

    /// Clip length in seconds
    #[arg(long, env = "SLOW_PEDESTRIANS_CLIP_DURATION", default_value_t = 5.0)]
    pub clip_duration: f64,

    /// Frame rate assumed when converting annotation frames to seconds
    #[arg(long, env = "SLOW_PEDESTRIANS_FRAME_RATE", default_value_t = 30.0)]
    pub frame_rate: f64,

    /// Number of pairs processed concurrently
    #[arg(long, env = "SLOW_PEDESTRIANS_WORKERS", default_value_t = 4)]
    pub workers: usize,

    /// Per-clip ffmpeg timeout in seconds
    #[arg(long, env = "SLOW_PEDESTRIANS_TIMEOUT_SECS", default_value_t = 120)]
    pub timeout_secs: u64,

    /// Sort each trajectory by frame instead of keeping annotation order
    #[arg(long, env = "SLOW_PEDESTRIANS_SORT_BY_FRAME")]
    pub sort_by_frame: bool,

    /// Do not retry a failed extraction
    #[arg(long)]
    pub no_retry: bool,

    /// Select clips and write the report without running ffmpeg
    #[arg(long)]
    pub dry_run: bool,

    /// ffmpeg executable
    #[arg(long, env = "SLOW_PEDESTRIANS_FFMPEG", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn curation_config(&self) -> CurationConfig {
        CurationConfig {
            annotation_dir: self.annotation_dir.clone(),
            video_dir: self.video_dir.clone(),
            output_dir: self.output_dir.clone(),
            annotation_ext: self.annotation_ext.clone(),
            video_ext: self.video_ext.clone(),
            speed_threshold: self.speed_threshold,
            clip_duration_secs: self.clip_duration,
            frame_rate: self.frame_rate,
            workers: self.workers,
            transcode_timeout_secs: self.timeout_secs,
            sort_by_frame: self.sort_by_frame,
            retry_failed_extraction: !self.no_retry,
            dry_run: self.dry_run,
        }
    }
}
