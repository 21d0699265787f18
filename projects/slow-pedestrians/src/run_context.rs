use crate::pipeline::types::AnnotationPair;
use crate::run_artifacts::{PairRow, RunReport};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const REPORT_JSON: &str = "run_report.json";
pub const REPORT_CSV: &str = "run_report.csv";

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Annotation files directly inside `annotation_dir`, sorted by file name.
pub fn list_annotations(annotation_dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    if !annotation_dir.is_dir() {
        anyhow::bail!("Annotation directory not found: {:?}", annotation_dir);
    }

    let annotations: Vec<PathBuf> = WalkDir::new(annotation_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| has_extension(e.path(), ext))
        .map(|e| e.path().to_path_buf())
        .collect();

    Ok(annotations)
}

/// Matches each annotation to `<video_dir>/<annotation stem>.<video_ext>`.
/// Annotations without a video still yield a pair, with `video: None`.
pub fn pair_annotations(
    annotations: Vec<PathBuf>,
    video_dir: &Path,
    video_ext: &str,
) -> Vec<AnnotationPair> {
    annotations
        .into_iter()
        .enumerate()
        .map(|(index, annotation)| {
            // not `with_extension`: stems may contain dots
            let mut file_name = annotation
                .file_stem()
                .map(|s| s.to_os_string())
                .unwrap_or_default();
            file_name.push(".");
            file_name.push(video_ext);
            let expected_video = video_dir.join(file_name);
            let video = expected_video.is_file().then(|| expected_video.clone());
            AnnotationPair {
                index,
                annotation,
                video,
                expected_video,
            }
        })
        .collect()
}

/// Creates the clip output directory. Called once before any processing.
pub fn prepare_output_dir(output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))
}

/// Writes `run_report.json` and `run_report.csv` into `output_dir`.
pub fn write_run_report(output_dir: &Path, report: &RunReport) -> Result<(PathBuf, PathBuf)> {
    let json_path = output_dir.join(REPORT_JSON);
    let content = serde_json::to_string_pretty(report)?;
    fs::write(&json_path, content)
        .with_context(|| format!("Failed to write {:?}", json_path))?;

    let csv_path = output_dir.join(REPORT_CSV);
    let mut writer = csv::Writer::from_path(&csv_path)
        .with_context(|| format!("Failed to create {:?}", csv_path))?;
    for pair in &report.pairs {
        writer.serialize(PairRow::from(pair))?;
    }
    writer.flush()?;

    Ok((json_path, csv_path))
}
