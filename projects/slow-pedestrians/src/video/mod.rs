pub mod ffmpeg_cli;

use crate::error::CurateError;
use crate::pipeline::types::ClipRequest;

/// Executes a clip extraction.
///
/// Implementations must return an error when the underlying tool fails;
/// checking that the output file exists afterwards is the caller's job.
pub trait Transcoder: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, request: &ClipRequest) -> Result<(), CurateError>;
}
