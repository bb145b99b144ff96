//! Annotated-frame output sink with codec fallback.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// JPEG quality for frames written to the intermediate container.
const SINK_JPEG_QUALITY: u8 = 90;

/// Outcome of finalizing a sink.
#[derive(Debug, Clone)]
pub enum SinkFinish {
    /// Output encoded with the primary codec
    Clean(PathBuf),
    /// Primary encode unavailable or failed; the intermediate container
    /// was kept. Non-fatal: the job still completes, degraded.
    Degraded { path: PathBuf, detail: String },
}

impl SinkFinish {
    /// Location of whatever output survived.
    pub fn path(&self) -> &Path {
        match self {
            SinkFinish::Clean(path) => path,
            SinkFinish::Degraded { path, .. } => path,
        }
    }
}

/// Sink for annotated frames.
#[async_trait]
pub trait OutputSink: Send {
    async fn write(&mut self, frame: &Frame) -> MediaResult<()>;

    /// Flush and close the output. Called exactly once, after the last
    /// frame.
    async fn finalize(mut self: Box<Self>) -> MediaResult<SinkFinish>;
}

/// Creates an `OutputSink` for a job's output path.
#[async_trait]
pub trait SinkFactory: Send + Sync {
    async fn create(&self, output: &Path, fps: f64) -> MediaResult<Box<dyn OutputSink>>;
}

/// Factory for [`FfmpegSink`].
pub struct FfmpegSinkFactory;

#[async_trait]
impl SinkFactory for FfmpegSinkFactory {
    async fn create(&self, output: &Path, fps: f64) -> MediaResult<Box<dyn OutputSink>> {
        Ok(Box::new(FfmpegSink::create(output, fps).await?))
    }
}

/// File-backed sink that accumulates an MJPEG intermediate and transcodes
/// it to H.264 MP4 with the external `ffmpeg` binary on finalize.
///
/// When `ffmpeg` is missing or fails, the intermediate is kept and the
/// result is reported as degraded rather than failing the job.
pub struct FfmpegSink {
    output_path: PathBuf,
    intermediate_path: PathBuf,
    file: File,
    fps: f64,
    frames_written: u64,
}

impl FfmpegSink {
    /// Create the sink; failure to create the intermediate file is fatal
    /// to the job.
    pub async fn create(output_path: impl Into<PathBuf>, fps: f64) -> MediaResult<Self> {
        let output_path = output_path.into();
        let intermediate_path = output_path.with_extension("mjpeg");
        let file = File::create(&intermediate_path).await?;
        debug!(path = %intermediate_path.display(), "opened intermediate container");

        Ok(Self {
            output_path,
            intermediate_path,
            file,
            fps,
            frames_written: 0,
        })
    }

    async fn transcode(&self, ffmpeg: &Path) -> MediaResult<()> {
        let output = Command::new(ffmpeg)
            .args(["-y", "-loglevel", "error"])
            .args(["-f", "mjpeg"])
            .args(["-framerate", &format!("{:.3}", self.fps)])
            .arg("-i")
            .arg(&self.intermediate_path)
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .args(["-movflags", "+faststart"])
            .arg(&self.output_path)
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::ffmpeg_failed(
                "transcode to mp4 failed",
                Some(String::from_utf8_lossy(&output.stderr).into_owned()),
                output.status.code(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl OutputSink for FfmpegSink {
    async fn write(&mut self, frame: &Frame) -> MediaResult<()> {
        let jpeg = frame.to_jpeg(SINK_JPEG_QUALITY)?;
        self.file.write_all(&jpeg).await?;
        self.frames_written += 1;
        Ok(())
    }

    async fn finalize(mut self: Box<Self>) -> MediaResult<SinkFinish> {
        self.file.flush().await?;
        self.file.sync_all().await?;

        let ffmpeg = match which::which("ffmpeg") {
            Ok(path) => path,
            Err(_) => {
                warn!(
                    path = %self.intermediate_path.display(),
                    "ffmpeg not found, keeping MJPEG intermediate"
                );
                return Ok(SinkFinish::Degraded {
                    path: self.intermediate_path.clone(),
                    detail: "ffmpeg not found in PATH; output kept as MJPEG".to_string(),
                });
            }
        };

        match self.transcode(&ffmpeg).await {
            Ok(()) => {
                let _ = tokio::fs::remove_file(&self.intermediate_path).await;
                info!(
                    path = %self.output_path.display(),
                    frames = self.frames_written,
                    "output encoded"
                );
                Ok(SinkFinish::Clean(self.output_path.clone()))
            }
            Err(e) => {
                warn!(error = %e, "transcode failed, keeping MJPEG intermediate");
                Ok(SinkFinish::Degraded {
                    path: self.intermediate_path.clone(),
                    detail: format!("transcode failed: {e}; output kept as MJPEG"),
                })
            }
        }
    }
}
