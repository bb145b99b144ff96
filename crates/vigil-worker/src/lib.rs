//! Batch video processing pipeline.
//!
//! This crate provides:
//! - Job registry with `submit`/`status` (one tokio task per job)
//! - The per-job processing loop: decode, detect, track, annotate, write
//! - Progress/completion/warning emission on the event channel
//! - The persistence seam for tracking results

pub mod config;
pub mod error;
pub mod persist;
pub mod processor;
pub mod registry;

pub use config::WorkerConfig;
pub use error::{PipelineError, PipelineResult};
pub use persist::{JsonFileStore, PersistError, ResultStore};
pub use processor::PipelineContext;
pub use registry::JobRegistry;
