mod cli;
mod error;
mod pipeline;
mod run_artifacts;
mod run_context;
mod video;

use anyhow::Result;
use cli::Args;
use indicatif::{ProgressBar, ProgressStyle};
use pipeline::orchestrator::run_batch;
use pipeline::types::{PairOutcome, PairReport};
use run_artifacts::RunReport;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use video::ffmpeg_cli::FfmpegTranscoder;

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse_args();
    let config = args.curation_config();
    config.validate()?;

    let transcoder = FfmpegTranscoder::new(
        &args.ffmpeg,
        Duration::from_secs(config.transcode_timeout_secs),
    );
    if !config.dry_run && !transcoder.is_available() {
        anyhow::bail!("{:?} not found or not runnable", args.ffmpeg);
    }

    run_context::prepare_output_dir(&config.output_dir)?;

    let annotations =
        run_context::list_annotations(&config.annotation_dir, &config.annotation_ext)?;
    let pairs = run_context::pair_annotations(annotations, &config.video_dir, &config.video_ext);
    let matched = pairs.iter().filter(|p| p.video.is_some()).count();
    tracing::info!(
        "Found {} video-annotation pairs ({} annotations)",
        matched,
        pairs.len()
    );

    let pb = ProgressBar::new(pairs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let reports = run_batch(
        pairs,
        Arc::new(config.clone()),
        Arc::new(transcoder),
        |report: &PairReport| {
            pb.suspend(|| log_report(report));
            pb.inc(1);
        },
    );
    pb.finish_and_clear();

    let report = RunReport::new(config, reports);
    let (json_path, _) = run_context::write_run_report(&report.config.output_dir, &report)?;

    let s = report.summary;
    tracing::info!(
        "Done: {} pairs, {} matched, {} extracted, {} skipped, {} failed. Report: {:?}",
        s.pairs,
        s.matched,
        s.extracted,
        s.skipped,
        s.failed,
        json_path
    );

    if s.failed > 0 {
        anyhow::bail!("{} clip extraction(s) failed", s.failed);
    }

    Ok(())
}

fn log_report(report: &PairReport) {
    let name = report.annotation.display();
    match &report.outcome {
        PairOutcome::Extracted { clip, speed, .. } => {
            tracing::info!("{}: extracted {:?} (speed {:.2})", name, clip.output, speed)
        }
        PairOutcome::Planned { clip, speed } => {
            tracing::info!("{}: would extract {:?} (speed {:.2})", name, clip.output, speed)
        }
        PairOutcome::NotSlow { speed } => {
            tracing::info!("{}: all pedestrians fast (slowest {:.2})", name, speed)
        }
        PairOutcome::NoPedestrians => tracing::warn!("{}: no pedestrians found", name),
        PairOutcome::ParseError { message } => tracing::warn!("{}: skipped, {}", name, message),
        PairOutcome::PairingGap { expected_video } => {
            tracing::warn!("{}: no video at {:?}", name, expected_video)
        }
        PairOutcome::ExtractionFailed { message, .. } => {
            tracing::error!("{}: {}", name, message)
        }
    }
}
