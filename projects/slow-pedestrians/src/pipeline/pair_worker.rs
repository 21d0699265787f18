// Pair worker: runs one annotation/video pair from parsing to extraction

use crate::error::CurateError;
use crate::pipeline::annotation::load_annotation;
use crate::pipeline::clip::ClipRequestBuilder;
use crate::pipeline::selector::select_slowest;
use crate::pipeline::types::{
    AnnotationPair, ClipRequest, CurationConfig, PairOutcome, PairReport,
};
use crate::video::Transcoder;
use crossbeam::channel::{Receiver, Sender};
use std::path::Path;
use std::sync::Arc;

/// Processes one pair. Every failure is folded into the returned report.
pub fn process_pair(
    pair: &AnnotationPair,
    config: &CurationConfig,
    transcoder: &dyn Transcoder,
) -> PairReport {
    let mut report = PairReport {
        index: pair.index,
        annotation: pair.annotation.clone(),
        video: pair.video.clone(),
        trajectories: 0,
        outcome: PairOutcome::NoPedestrians,
    };

    let video = match &pair.video {
        Some(v) => v,
        None => {
            tracing::debug!(
                "{}",
                CurateError::PairingGap {
                    annotation: pair.annotation.clone(),
                    expected_video: pair.expected_video.clone(),
                }
            );
            report.outcome = PairOutcome::PairingGap {
                expected_video: pair.expected_video.clone(),
            };
            return report;
        }
    };

    let record = match load_annotation(&pair.annotation, config.sort_by_frame) {
        Ok(record) => record,
        Err(e) => {
            tracing::debug!("Skipping pair: {}", e);
            report.outcome = PairOutcome::ParseError {
                message: e.to_string(),
            };
            return report;
        }
    };
    report.trajectories = record.len();

    if record.is_empty() {
        tracing::debug!(
            "{}",
            CurateError::NoPedestrians {
                path: pair.annotation.clone()
            }
        );
        return report;
    }

    let Some(selection) = select_slowest(&record.trajectories, config.speed_threshold) else {
        return report;
    };

    tracing::debug!(
        "{} | slowest pedestrian speed = {:.2}",
        display_name(&pair.annotation),
        selection.speed
    );

    if !selection.qualifies {
        report.outcome = PairOutcome::NotSlow {
            speed: selection.speed,
        };
        return report;
    }

    let builder = ClipRequestBuilder::new(
        &config.output_dir,
        config.frame_rate,
        config.clip_duration_secs,
    );
    let clip = match builder.build(&record.trajectories[selection.index], video) {
        Some(clip) => clip,
        None => return report,
    };

    if config.dry_run {
        tracing::debug!("Dry run, would extract {:?}", clip.output);
        report.outcome = PairOutcome::Planned {
            clip,
            speed: selection.speed,
        };
        return report;
    }

    let max_attempts = if config.retry_failed_extraction { 2 } else { 1 };
    let (attempts, result) = extract_with_retry(transcoder, &clip, max_attempts);

    report.outcome = match result {
        Ok(()) => {
            tracing::debug!("Extracted clip {:?}", clip.output);
            PairOutcome::Extracted {
                clip,
                speed: selection.speed,
                attempts,
            }
        }
        Err(e) => {
            tracing::debug!("{} (after {} attempt(s))", e, attempts);
            PairOutcome::ExtractionFailed {
                clip,
                speed: selection.speed,
                attempts,
                message: e.to_string(),
            }
        }
    };

    report
}

/// Runs the transcoder and checks its output file exists.
pub fn extract_verified(
    transcoder: &dyn Transcoder,
    clip: &ClipRequest,
) -> Result<(), CurateError> {
    transcoder.extract(clip)?;
    if !clip.output.is_file() {
        return Err(CurateError::extraction(
            &clip.output,
            format!("{} reported success but wrote no output", transcoder.name()),
        ));
    }
    Ok(())
}

/// Returns the number of attempts made along with the last result.
fn extract_with_retry(
    transcoder: &dyn Transcoder,
    clip: &ClipRequest,
    max_attempts: u32,
) -> (u32, Result<(), CurateError>) {
    let mut attempt = 1;
    loop {
        match extract_verified(transcoder, clip) {
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                tracing::warn!("{}; retrying", e);
                attempt += 1;
            }
            result => return (attempt, result),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Pulls pairs until the job channel closes, sending one report per pair.
pub fn pair_worker(
    rx: Receiver<AnnotationPair>,
    tx: Sender<PairReport>,
    config: Arc<CurationConfig>,
    transcoder: Arc<dyn Transcoder>,
) {
    for pair in rx {
        let report = process_pair(&pair, &config, transcoder.as_ref());
        if tx.send(report).is_err() {
            tracing::error!("Pair worker: result channel closed");
            break;
        }
    }
}
