//! Media-side collaborator interfaces for the tracking engine.
//!
//! This crate provides:
//! - The `Frame` type plus annotation and JPEG transport helpers
//! - `FrameSource`/`SourceOpener` for decode and capture
//! - `Detector` for black-box per-frame inference
//! - `OutputSink` with an FFmpeg-backed implementation that degrades to an
//!   MJPEG container when the encoder is unavailable

pub mod annotate;
pub mod detect;
pub mod error;
pub mod frame;
pub mod sink;
pub mod source;

pub use annotate::annotate_tracks;
pub use detect::{Detector, DetectorError};
pub use error::{MediaError, MediaResult};
pub use frame::Frame;
pub use sink::{FfmpegSink, FfmpegSinkFactory, OutputSink, SinkFactory, SinkFinish};
pub use source::{FrameSource, SourceOpener};
