//! Live session lifecycle and the per-session relay loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use vigil_events::EventChannel;
use vigil_media::{annotate_tracks, Detector, FrameSource, SourceOpener};
use vigil_models::{BBox, Event, EventTarget, SessionStatus};
use vigil_track::Tracker;

use crate::config::StreamConfig;

pub type StreamResult<T> = Result<T, StreamError>;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("session {0} is already active")]
    AlreadyActive(String),

    #[error("device unavailable for session {key}: {message}")]
    DeviceUnavailable { key: String, message: String },
}

/// Shared handles for one running session.
///
/// The capture handle itself is owned by the session task; the registry
/// keeps only the cooperative stop flag and a frame counter, so `stop`
/// can never release a resource the loop is still using.
struct SessionEntry {
    active: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
}

/// Point-in-time view of one session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub session_key: String,
    pub frames_relayed: u64,
}

/// Manages concurrent live capture sessions, at most one per session key.
///
/// Cloning is cheap; all clones share the same session table.
#[derive(Clone)]
pub struct StreamManager {
    config: StreamConfig,
    opener: Arc<dyn SourceOpener>,
    detector: Arc<dyn Detector>,
    events: Arc<dyn EventChannel>,
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl StreamManager {
    pub fn new(
        config: StreamConfig,
        opener: Arc<dyn SourceOpener>,
        detector: Arc<dyn Detector>,
        events: Arc<dyn EventChannel>,
    ) -> Self {
        Self {
            config,
            opener,
            detector,
            events,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start a session for `session_key` reading from `source`.
    ///
    /// The key is reserved before the device is opened, so a concurrent
    /// second start for the same key fails with `AlreadyActive` instead of
    /// opening the device twice.
    pub async fn start(&self, session_key: &str, source: &str) -> StreamResult<()> {
        let active = Arc::new(AtomicBool::new(true));
        let frames = Arc::new(AtomicU64::new(0));
        {
            let mut sessions = self.sessions.write().await;
            if sessions.contains_key(session_key) {
                return Err(StreamError::AlreadyActive(session_key.to_string()));
            }
            sessions.insert(
                session_key.to_string(),
                SessionEntry {
                    active: Arc::clone(&active),
                    frames: Arc::clone(&frames),
                },
            );
        }

        self.emit(
            session_key,
            Event::camera_status(session_key, SessionStatus::Connecting),
        )
        .await;

        let capture = match self.opener.open(source).await {
            Ok(capture) => capture,
            Err(e) => {
                self.sessions.write().await.remove(session_key);
                error!(session_key, error = %e, "failed to open capture device");
                self.emit(
                    session_key,
                    Event::CameraStatus {
                        session_key: session_key.to_string(),
                        status: SessionStatus::Error,
                        message: Some(e.to_string()),
                    },
                )
                .await;
                return Err(StreamError::DeviceUnavailable {
                    key: session_key.to_string(),
                    message: e.to_string(),
                });
            }
        };

        info!(session_key, source, "session started");
        self.emit(
            session_key,
            Event::camera_status(session_key, SessionStatus::Connected),
        )
        .await;

        let manager = self.clone();
        let key = session_key.to_string();
        tokio::spawn(async move {
            manager.session_loop(key, capture, active, frames).await;
        });

        Ok(())
    }

    /// Request a session to stop. Only flips the cooperative flag; the
    /// session task performs all cleanup itself. Returns false for an
    /// unknown key.
    pub async fn stop(&self, session_key: &str) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(session_key) {
            Some(entry) => {
                info!(session_key, "session stop requested");
                entry.active.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Request every session to stop.
    pub async fn stop_all(&self) {
        let sessions = self.sessions.read().await;
        for (key, entry) in sessions.iter() {
            debug!(session_key = %key, "session stop requested");
            entry.active.store(false, Ordering::SeqCst);
        }
    }

    /// Whether a session is registered for this key.
    pub async fn is_active(&self, session_key: &str) -> bool {
        self.sessions.read().await.contains_key(session_key)
    }

    /// Snapshot of all registered sessions.
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        self.sessions
            .read()
            .await
            .iter()
            .map(|(key, entry)| SessionInfo {
                session_key: key.clone(),
                frames_relayed: entry.frames.load(Ordering::SeqCst),
            })
            .collect()
    }

    async fn emit(&self, session_key: &str, event: Event) {
        let _ = self
            .events
            .emit(event, EventTarget::Session(session_key.to_string()))
            .await;
    }

    /// The per-session relay loop. Owns the capture handle for its whole
    /// lifetime and releases it exactly once, on loop exit, along with the
    /// registry entry and a final status event.
    async fn session_loop(
        self,
        session_key: String,
        mut capture: Box<dyn FrameSource>,
        active: Arc<AtomicBool>,
        frames: Arc<AtomicU64>,
    ) {
        let mut tracker = Tracker::new(self.config.tracker_config());
        let mut last_boxes: Vec<(u64, String, BBox)> = Vec::new();
        let mut consecutive_errors: u32 = 0;
        let mut frame_index: u64 = 0;
        let mut fatal: Option<String> = None;

        while active.load(Ordering::SeqCst) {
            let tick = Instant::now();

            let mut frame = match capture.next_frame().await {
                Ok(Some(frame)) => {
                    consecutive_errors = 0;
                    frame
                }
                outcome => {
                    consecutive_errors += 1;
                    let reason = match outcome {
                        Err(e) => e.to_string(),
                        _ => "end of stream".to_string(),
                    };
                    warn!(
                        session_key = %session_key,
                        consecutive = consecutive_errors,
                        reason = %reason,
                        "capture read failed"
                    );
                    if consecutive_errors >= self.config.max_consecutive_errors {
                        fatal = Some(format!(
                            "{consecutive_errors} consecutive read failures: {reason}"
                        ));
                        break;
                    }
                    sleep(self.config.error_backoff).await;
                    continue;
                }
            };

            // Detection is subsampled; relayed frames in between carry the
            // last confirmed boxes forward.
            if frame_index % self.config.detect_every == 0 {
                let detections = match self.detector.detect(&frame).await {
                    Ok(detections) => detections,
                    Err(e) => {
                        warn!(session_key = %session_key, frame = frame_index, error = %e, "inference failed, frame treated as empty");
                        Vec::new()
                    }
                };
                let confirmed = tracker.update(&detections, frame_index);
                last_boxes = confirmed
                    .iter()
                    .map(|t| (t.id, t.class_label.clone(), t.bbox()))
                    .collect();
            }

            annotate_tracks(
                &mut frame.image,
                last_boxes.iter().map(|(id, class, bbox)| (*id, class.as_str(), *bbox)),
            );

            match frame.to_transport_payload() {
                Ok(image) => {
                    self.emit(
                        &session_key,
                        Event::CameraFrame {
                            session_key: session_key.clone(),
                            image,
                        },
                    )
                    .await;
                    frames.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => {
                    warn!(session_key = %session_key, frame = frame_index, error = %e, "frame encode failed")
                }
            }

            frame_index += 1;

            let elapsed = tick.elapsed();
            if elapsed < self.config.frame_interval {
                sleep(self.config.frame_interval - elapsed).await;
            }
            // Every await above can resolve without suspending when the
            // capture is in-process and the interval has already elapsed;
            // re-queue so stop requests and other tasks get scheduled.
            tokio::task::yield_now().await;
        }

        drop(capture);
        self.sessions.write().await.remove(&session_key);

        match fatal {
            Some(error) => {
                error!(session_key = %session_key, error = %error, "session failed");
                self.emit(&session_key, Event::camera_error(&session_key, error))
                    .await;
            }
            None => {
                info!(
                    session_key = %session_key,
                    frames = frames.load(Ordering::SeqCst),
                    "session stopped"
                );
                self.emit(
                    &session_key,
                    Event::camera_status(&session_key, SessionStatus::Stopped),
                )
                .await;
            }
        }
    }
}
