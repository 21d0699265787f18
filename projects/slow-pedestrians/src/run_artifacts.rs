// Run artifact struct definitions
//
// This module contains the struct definitions for artifacts that are persisted
// within a run's output directory.

use crate::pipeline::types::{CurationConfig, PairOutcome, PairReport};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Per-category pair counts
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pairs: usize,
    /// Pairs that had a video to go with the annotation
    pub matched: usize,
    /// Extracted, or planned in a dry run
    pub extracted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_reports(reports: &[PairReport]) -> Self {
        let mut summary = RunSummary {
            pairs: reports.len(),
            ..Default::default()
        };

        for report in reports {
            if report.video.is_some() {
                summary.matched += 1;
            }
            match report.outcome {
                PairOutcome::Extracted { .. } | PairOutcome::Planned { .. } => {
                    summary.extracted += 1
                }
                PairOutcome::ExtractionFailed { .. } => summary.failed += 1,
                PairOutcome::NotSlow { .. }
                | PairOutcome::NoPedestrians
                | PairOutcome::ParseError { .. }
                | PairOutcome::PairingGap { .. } => summary.skipped += 1,
            }
        }

        summary
    }
}

/// Everything written to `run_report.json`
#[derive(Serialize, Debug, Clone)]
pub struct RunReport {
    pub created_at: DateTime<Utc>,
    pub config: CurationConfig,
    pub summary: RunSummary,
    pub pairs: Vec<PairReport>,
}

impl RunReport {
    pub fn new(config: CurationConfig, pairs: Vec<PairReport>) -> Self {
        Self {
            created_at: Utc::now(),
            summary: RunSummary::from_reports(&pairs),
            config,
            pairs,
        }
    }
}

/// Flat row of `run_report.csv`
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PairRow {
    pub index: usize,
    pub annotation: String,
    pub video: String,
    pub outcome: &'static str,
    pub trajectories: usize,
    pub speed: Option<f64>,
    pub start_secs: Option<f64>,
    pub clip: String,
}

impl From<&PairReport> for PairRow {
    fn from(report: &PairReport) -> Self {
        let clip = report.outcome.clip();
        PairRow {
            index: report.index,
            annotation: report.annotation.display().to_string(),
            video: report
                .video
                .as_ref()
                .map(|v| v.display().to_string())
                .unwrap_or_default(),
            outcome: report.outcome.kind(),
            trajectories: report.trajectories,
            speed: report.outcome.speed(),
            start_secs: clip.map(|c| c.start_secs),
            clip: clip
                .map(|c| c.output.display().to_string())
                .unwrap_or_default(),
        }
    }
}
