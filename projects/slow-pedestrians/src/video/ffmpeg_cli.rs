use super::Transcoder;
use crate::error::CurateError;
use crate::pipeline::types::ClipRequest;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Stream-copy trimming through the `ffmpeg` command line tool.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// True if `<binary> -version` runs and exits cleanly.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Seek before `-i` for a fast keyframe seek, copy streams, overwrite.
    pub fn build_args(request: &ClipRequest) -> Vec<OsString> {
        vec![
            "-nostdin".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-ss".into(),
            format!("{}", request.start_secs).into(),
            "-i".into(),
            request.source.clone().into_os_string(),
            "-t".into(),
            format!("{}", request.duration_secs).into(),
            "-c".into(),
            "copy".into(),
            request.output.clone().into_os_string(),
        ]
    }

    fn wait_with_timeout(
        &self,
        child: &mut Child,
        request: &ClipRequest,
    ) -> Result<ExitStatus, CurateError> {
        let start = Instant::now();
        loop {
            let message = match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if start.elapsed() < self.timeout => {
                    thread::sleep(POLL_INTERVAL);
                    continue;
                }
                Ok(None) => format!("ffmpeg timed out after {:?}", self.timeout),
                Err(e) => format!("failed to poll ffmpeg: {}", e),
            };
            Self::reap(child);
            return Err(CurateError::extraction(&request.output, message));
        }
    }

    fn reap(child: &mut Child) {
        if let Err(e) = child.kill() {
            tracing::warn!("Failed to kill ffmpeg: {}", e);
        }
        let _ = child.wait();
    }
}

impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn extract(&self, request: &ClipRequest) -> Result<(), CurateError> {
        tracing::debug!(
            "ffmpeg trim {:?} @ {:.3}s for {}s -> {:?}",
            request.source,
            request.start_secs,
            request.duration_secs,
            request.output
        );

        let mut child = Command::new(&self.binary)
            .args(Self::build_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                CurateError::extraction(
                    &request.output,
                    format!("failed to spawn {:?}: {}", self.binary, e),
                )
            })?;

        let status = self.wait_with_timeout(&mut child, request)?;
        if !status.success() {
            return Err(CurateError::extraction(
                &request.output,
                format!("ffmpeg exited with {}", status),
            ));
        }

        Ok(())
    }
}
