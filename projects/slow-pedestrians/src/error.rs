use std::path::PathBuf;

/// Failure while turning an annotation document into trajectories.
#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
    #[error("unreadable annotation file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed annotation XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("invalid `{attribute}` value {value:?} in track {track}")]
    InvalidAttribute {
        attribute: &'static str,
        value: String,
        track: usize,
    },
}

/// Per-pair and configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum CurateError {
    #[error("no video found for {annotation} (expected {expected_video})")]
    PairingGap {
        annotation: PathBuf,
        expected_video: PathBuf,
    },

    #[error("failed to parse {path}: {source}")]
    AnnotationParse {
        path: PathBuf,
        #[source]
        source: AnnotationError,
    },

    #[error("no pedestrian tracks in {path}")]
    NoPedestrians { path: PathBuf },

    #[error("extraction of {output} failed: {message}")]
    ExtractionFailure { output: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CurateError {
    pub fn extraction(output: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ExtractionFailure {
            output: output.into(),
            message: message.into(),
        }
    }

    /// Extraction failures are the only kind worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExtractionFailure { .. })
    }
}
