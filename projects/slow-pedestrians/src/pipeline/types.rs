use crate::error::CurateError;
use serde::Serialize;
use std::path::PathBuf;

/// One per-frame axis-aligned box as listed in the annotation document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub frame: u32,
    pub xtl: f64,
    pub ytl: f64,
    pub xbr: f64,
    pub ybr: f64,
}

impl BoundingBox {
    /// Halves before adding so corners near `f64::MAX` stay finite.
    pub fn centroid(&self) -> (f64, f64) {
        (
            self.xtl / 2.0 + self.xbr / 2.0,
            self.ytl / 2.0 + self.ybr / 2.0,
        )
    }

    pub fn to_point(&self) -> TrajectoryPoint {
        let (x, y) = self.centroid();
        TrajectoryPoint::new(self.frame, x, y)
    }
}

/// Centroid of a box at a given frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub frame: u32,
    pub x: f64,
    pub y: f64,
}

impl TrajectoryPoint {
    pub fn new(frame: u32, x: f64, y: f64) -> Self {
        Self { frame, x, y }
    }

    pub fn distance_to(&self, other: &TrajectoryPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Centroid path of one pedestrian track.
///
/// Points are kept in document order unless the loader was asked to sort
/// them by frame. Never empty once produced by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub label: String,
    pub points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn new(label: impl Into<String>, points: Vec<TrajectoryPoint>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    pub fn first_frame(&self) -> Option<u32> {
        self.points.first().map(|p| p.frame)
    }

    pub fn sort_by_frame(&mut self) {
        // stable: equal frames keep document order
        self.points.sort_by_key(|p| p.frame);
    }
}

/// All pedestrian trajectories of one annotation document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationRecord {
    pub trajectories: Vec<Trajectory>,
}

impl AnnotationRecord {
    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }
}

/// Instruction handed to the transcoder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipRequest {
    pub source: PathBuf,
    pub start_secs: f64,
    pub duration_secs: f64,
    pub output: PathBuf,
}

/// Runtime settings for a curation batch.
#[derive(Debug, Clone, Serialize)]
pub struct CurationConfig {
    pub annotation_dir: PathBuf,
    pub video_dir: PathBuf,
    pub output_dir: PathBuf,
    pub annotation_ext: String,
    pub video_ext: String,
    /// Mean centroid displacement (px per record) below which a track is slow
    pub speed_threshold: f64,
    pub clip_duration_secs: f64,
    /// Assumed, not probed from the video
    pub frame_rate: f64,
    pub workers: usize,
    pub transcode_timeout_secs: u64,
    pub sort_by_frame: bool,
    pub retry_failed_extraction: bool,
    pub dry_run: bool,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            annotation_dir: PathBuf::from("Annotations"),
            video_dir: PathBuf::from("JAAD_clips"),
            output_dir: PathBuf::from("slow_pedestrian_clips"),
            annotation_ext: "xml".to_string(),
            video_ext: "mp4".to_string(),
            speed_threshold: 2.5,
            clip_duration_secs: 5.0,
            frame_rate: 30.0,
            workers: 4,
            transcode_timeout_secs: 120,
            sort_by_frame: false,
            retry_failed_extraction: true,
            dry_run: false,
        }
    }
}

impl CurationConfig {
    pub fn validate(&self) -> Result<(), CurateError> {
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(CurateError::InvalidConfig(format!(
                "frame rate must be positive, got {}",
                self.frame_rate
            )));
        }
        if !(self.clip_duration_secs.is_finite() && self.clip_duration_secs > 0.0) {
            return Err(CurateError::InvalidConfig(format!(
                "clip duration must be positive, got {}",
                self.clip_duration_secs
            )));
        }
        if !self.speed_threshold.is_finite() {
            return Err(CurateError::InvalidConfig(format!(
                "speed threshold must be finite, got {}",
                self.speed_threshold
            )));
        }
        if self.workers == 0 {
            return Err(CurateError::InvalidConfig(
                "at least one worker is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// An annotation file and the video it was matched to, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationPair {
    pub index: usize,
    pub annotation: PathBuf,
    pub video: Option<PathBuf>,
    /// Where the video was looked for
    pub expected_video: PathBuf,
}

/// What happened to one pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PairOutcome {
    Extracted {
        clip: ClipRequest,
        speed: f64,
        attempts: u32,
    },
    Planned {
        clip: ClipRequest,
        speed: f64,
    },
    NotSlow {
        speed: f64,
    },
    NoPedestrians,
    ParseError {
        message: String,
    },
    PairingGap {
        expected_video: PathBuf,
    },
    ExtractionFailed {
        clip: ClipRequest,
        speed: f64,
        attempts: u32,
        message: String,
    },
}

impl PairOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Extracted { .. } => "extracted",
            Self::Planned { .. } => "planned",
            Self::NotSlow { .. } => "not_slow",
            Self::NoPedestrians => "no_pedestrians",
            Self::ParseError { .. } => "parse_error",
            Self::PairingGap { .. } => "pairing_gap",
            Self::ExtractionFailed { .. } => "extraction_failed",
        }
    }

    pub fn speed(&self) -> Option<f64> {
        match self {
            Self::Extracted { speed, .. }
            | Self::Planned { speed, .. }
            | Self::NotSlow { speed }
            | Self::ExtractionFailed { speed, .. } => Some(*speed),
            _ => None,
        }
    }

    pub fn clip(&self) -> Option<&ClipRequest> {
        match self {
            Self::Extracted { clip, .. }
            | Self::Planned { clip, .. }
            | Self::ExtractionFailed { clip, .. } => Some(clip),
            _ => None,
        }
    }
}

/// One record per processed pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairReport {
    pub index: usize,
    pub annotation: PathBuf,
    pub video: Option<PathBuf>,
    /// Pedestrian trajectories found, 0 when the document was not read
    pub trajectories: usize,
    pub outcome: PairOutcome,
}
