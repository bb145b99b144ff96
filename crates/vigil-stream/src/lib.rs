//! Concurrent live-stream session manager.
//!
//! One capture session per session key: frames are read from an injected
//! `FrameSource`, annotated with tracked objects (detection subsampled to
//! every Nth frame), and relayed as base64 JPEG events. Stop requests only
//! flip a cooperative flag; the session task owns its capture handle and
//! releases it exactly once.

pub mod config;
pub mod manager;

pub use config::StreamConfig;
pub use manager::{SessionInfo, StreamError, StreamManager, StreamResult};
