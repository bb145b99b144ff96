//! Frame acquisition interfaces.

use async_trait::async_trait;

use crate::error::MediaResult;
use crate::frame::Frame;

/// A stream of decoded frames from a file or capture device.
///
/// `next_frame` may block the owning task only. Returning `Ok(None)` means
/// end of stream; an `Err` is a read failure the caller decides how to
/// handle (fatal for files, retried for live devices).
#[async_trait]
pub trait FrameSource: Send {
    async fn next_frame(&mut self) -> MediaResult<Option<Frame>>;

    /// Total frame count, when the container knows it.
    fn total_frames(&self) -> Option<u64> {
        None
    }

    /// Nominal frame rate.
    fn fps(&self) -> f64 {
        30.0
    }
}

/// Opens a `FrameSource` for a source reference (file path, camera index).
///
/// Injected so the engine never depends on a concrete decoder; an open
/// failure is fatal to the unit of work that requested it.
#[async_trait]
pub trait SourceOpener: Send + Sync {
    async fn open(&self, source: &str) -> MediaResult<Box<dyn FrameSource>>;
}
