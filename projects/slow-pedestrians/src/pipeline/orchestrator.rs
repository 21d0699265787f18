// Pipeline orchestrator: fans annotation/video pairs out to a bounded pool of
// pair workers and collects their reports on the calling thread.

use crate::pipeline::pair_worker::pair_worker;
use crate::pipeline::types::{AnnotationPair, CurationConfig, PairReport};
use crate::video::Transcoder;
use crossbeam::channel;
use std::sync::Arc;
use std::thread;

/// Receives each pair report as soon as it is available.
pub trait OutcomeSink {
    fn emit(&mut self, report: &PairReport);
}

/// Blanket implementation so any closure with the right signature
/// automatically implements OutcomeSink.
impl<F> OutcomeSink for F
where
    F: FnMut(&PairReport),
{
    fn emit(&mut self, report: &PairReport) {
        self(report)
    }
}

/// Processes every pair and returns the reports in pair order.
pub fn run_batch<S>(
    pairs: Vec<AnnotationPair>,
    config: Arc<CurationConfig>,
    transcoder: Arc<dyn Transcoder>,
    mut sink: S,
) -> Vec<PairReport>
where
    S: OutcomeSink,
{
    let total = pairs.len();
    if total == 0 {
        return Vec::new();
    }

    let workers = config.workers.clamp(1, total);
    tracing::info!(
        "Processing {} pairs with {} workers ({})",
        total,
        workers,
        transcoder.name()
    );

    let (tx_jobs, rx_jobs) = channel::bounded::<AnnotationPair>(workers * 2);
    let (tx_reports, rx_reports) = channel::unbounded::<PairReport>();

    let handles: Vec<_> = (0..workers)
        .map(|id| spawn_pair_worker(id, &rx_jobs, &tx_reports, &config, &transcoder))
        .collect();
    drop(rx_jobs);
    drop(tx_reports);

    // Feed from a separate thread so the caller can drain reports meanwhile
    let feeder = thread::spawn(move || {
        for pair in pairs {
            if tx_jobs.send(pair).is_err() {
                tracing::error!("All pair workers exited early");
                break;
            }
        }
    });

    let mut reports = Vec::with_capacity(total);
    for report in rx_reports {
        sink.emit(&report);
        reports.push(report);
    }

    if feeder.join().is_err() {
        tracing::error!("Pair feeder panicked");
    }
    for (id, handle) in handles.into_iter().enumerate() {
        if handle.join().is_err() {
            tracing::error!("Pair worker {} panicked", id);
        }
    }

    if reports.len() < total {
        tracing::error!(
            "{} of {} pairs produced no report",
            total - reports.len(),
            total
        );
    }

    reports.sort_by_key(|r| r.index);
    reports
}

fn spawn_pair_worker(
    id: usize,
    rx: &channel::Receiver<AnnotationPair>,
    tx: &channel::Sender<PairReport>,
    config: &Arc<CurationConfig>,
    transcoder: &Arc<dyn Transcoder>,
) -> thread::JoinHandle<()> {
    let rx = rx.clone();
    let tx = tx.clone();
    let config = config.clone();
    let transcoder = transcoder.clone();
    thread::spawn(move || {
        tracing::debug!("Spawning pair worker {}", id);
        pair_worker(rx, tx, config, transcoder);
        tracing::debug!("Pair worker {} finished", id);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::pair_worker::tests::{ScriptedTranscoder, ALL_FAST, SLOW_AND_FAST};
    use crate::pipeline::types::PairOutcome;
    use std::fs;
    use std::path::Path;

    fn write_pairs(root: &Path, docs: &[(&str, &str, bool)]) -> Vec<AnnotationPair> {
        docs.iter()
            .enumerate()
            .map(|(index, (name, xml, with_video))| {
                let annotation = root.join(format!("{}.xml", name));
                fs::write(&annotation, xml).unwrap();
                let video = root.join(format!("{}.mp4", name));
                if *with_video {
                    fs::write(&video, b"video").unwrap();
                }
                AnnotationPair {
                    index,
                    annotation,
                    video: with_video.then(|| video.clone()),
                    expected_video: video,
                }
            })
            .collect()
    }

    fn config_for(root: &Path, workers: usize, dry_run: bool) -> Arc<CurationConfig> {
        let output_dir = root.join("out");
        fs::create_dir_all(&output_dir).unwrap();
        Arc::new(CurationConfig {
            output_dir,
            workers,
            dry_run,
            ..Default::default()
        })
    }

    #[test]
    fn test_bad_pair_does_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let pairs = write_pairs(
            dir.path(),
            &[
                ("a", SLOW_AND_FAST, true),
                ("b", "<annotations>", true),
                ("c", ALL_FAST, true),
                ("d", SLOW_AND_FAST, false),
                ("e", SLOW_AND_FAST, true),
            ],
        );

        let mut emitted = 0;
        let reports = run_batch(
            pairs,
            config_for(dir.path(), 3, false),
            Arc::new(ScriptedTranscoder::ok()),
            |_: &PairReport| emitted += 1,
        );

        assert_eq!(emitted, 5);
        let kinds: Vec<&str> = reports.iter().map(|r| r.outcome.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "extracted",
                "parse_error",
                "not_slow",
                "pairing_gap",
                "extracted"
            ]
        );
        let indices: Vec<usize> = reports.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_dry_runs_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let docs: Vec<(String, &str, bool)> = (0..8)
            .map(|i| (format!("video_{:04}", i), SLOW_AND_FAST, true))
            .collect();
        let docs: Vec<(&str, &str, bool)> =
            docs.iter().map(|(n, x, v)| (n.as_str(), *x, *v)).collect();
        let pairs = write_pairs(dir.path(), &docs);

        let clips = |workers: usize| -> Vec<_> {
            run_batch(
                pairs.clone(),
                config_for(dir.path(), workers, true),
                Arc::new(ScriptedTranscoder::ok()),
                |_: &PairReport| {},
            )
            .into_iter()
            .filter_map(|r| match r.outcome {
                PairOutcome::Planned { clip, .. } => Some(clip),
                _ => None,
            })
            .collect()
        };

        let first = clips(4);
        assert_eq!(first.len(), 8);
        assert_eq!(first, clips(1));
    }

    #[test]
    fn test_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let reports = run_batch(
            Vec::new(),
            config_for(dir.path(), 2, false),
            Arc::new(ScriptedTranscoder::ok()),
            |_: &PairReport| panic!("nothing to emit"),
        );
        assert!(reports.is_empty());
    }
}
