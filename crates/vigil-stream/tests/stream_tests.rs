//! Session lifecycle tests over fake capture devices and detectors.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;

use vigil_events::{EventBus, EventChannel, Envelope};
use vigil_media::{
    Detector, DetectorError, Frame, FrameSource, MediaError, MediaResult, SourceOpener,
};
use vigil_models::{BBox, Event, EventTarget, RawDetection, SessionStatus};
use vigil_stream::{StreamConfig, StreamError, StreamManager};

/// Capture device that serves solid frames, optionally failing every read,
/// and counts how many times a handle has been dropped.
struct FakeCapture {
    cursor: u64,
    fail_all: bool,
    drops: Arc<AtomicU64>,
}

impl Drop for FakeCapture {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl FrameSource for FakeCapture {
    async fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        if self.fail_all {
            return Err(MediaError::read_failed("device read error"));
        }
        let index = self.cursor;
        self.cursor += 1;
        Ok(Some(Frame::new(
            index,
            RgbImage::from_pixel(160, 120, image::Rgb([30, 30, 30])),
        )))
    }
}

struct FakeOpener {
    fail_open: bool,
    fail_reads: bool,
    opens: Arc<AtomicU64>,
    drops: Arc<AtomicU64>,
}

impl FakeOpener {
    fn healthy() -> Self {
        Self {
            fail_open: false,
            fail_reads: false,
            opens: Arc::new(AtomicU64::new(0)),
            drops: Arc::new(AtomicU64::new(0)),
        }
    }

    fn unavailable() -> Self {
        Self {
            fail_open: true,
            ..Self::healthy()
        }
    }

    fn flaky() -> Self {
        Self {
            fail_reads: true,
            ..Self::healthy()
        }
    }
}

#[async_trait]
impl SourceOpener for FakeOpener {
    async fn open(&self, source: &str) -> MediaResult<Box<dyn FrameSource>> {
        if self.fail_open {
            return Err(MediaError::source_unavailable(format!(
                "cannot open {source}"
            )));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeCapture {
            cursor: 0,
            fail_all: self.fail_reads,
            drops: Arc::clone(&self.drops),
        }))
    }
}

/// Detector returning one stationary person, counting invocations.
struct CountingDetector {
    calls: Arc<AtomicU64>,
}

#[async_trait]
impl Detector for CountingDetector {
    async fn detect(&self, _frame: &Frame) -> Result<Vec<RawDetection>, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![RawDetection::new(
            BBox::new(20.0, 20.0, 40.0, 60.0),
            "person",
            0.9,
        )])
    }
}

fn fast_config() -> StreamConfig {
    StreamConfig {
        frame_interval: Duration::ZERO,
        error_backoff: Duration::ZERO,
        ..StreamConfig::default()
    }
}

fn manager(opener: FakeOpener) -> (StreamManager, EventBus, Arc<AtomicU64>) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let bus = EventBus::default();
    let calls = Arc::new(AtomicU64::new(0));
    let manager = StreamManager::new(
        fast_config(),
        Arc::new(opener),
        Arc::new(CountingDetector {
            calls: Arc::clone(&calls),
        }),
        Arc::new(bus.clone()),
    );
    (manager, bus, calls)
}

async fn wait_until_gone(manager: &StreamManager, key: &str) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while manager.is_active(key).await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("session did not terminate");
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<Envelope>) -> Vec<Envelope> {
    use tokio::sync::broadcast::error::TryRecvError;
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(envelope) => out.push(envelope),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    out
}

#[tokio::test]
async fn test_duplicate_start_rejected() {
    let (manager, _bus, _calls) = manager(FakeOpener::healthy());

    manager.start("cam-1", "0").await.unwrap();
    let second = manager.start("cam-1", "0").await;
    assert!(matches!(second, Err(StreamError::AlreadyActive(k)) if k == "cam-1"));

    // The first session is untouched by the rejected start.
    assert!(manager.is_active("cam-1").await);
    manager.stop("cam-1").await;
    wait_until_gone(&manager, "cam-1").await;
}

#[tokio::test]
async fn test_open_failure_leaves_no_session() {
    let (manager, bus, _calls) = manager(FakeOpener::unavailable());
    let mut rx = bus.subscribe();

    let result = manager.start("cam-1", "0").await;
    assert!(matches!(
        result,
        Err(StreamError::DeviceUnavailable { .. })
    ));
    assert!(!manager.is_active("cam-1").await);

    // A second start for the same key is allowed after the failure.
    assert!(matches!(
        manager.start("cam-1", "0").await,
        Err(StreamError::DeviceUnavailable { .. })
    ));

    let events = drain(&mut rx);
    let error_status = events.iter().any(|e| {
        matches!(
            &e.event,
            Event::CameraStatus {
                status: SessionStatus::Error,
                ..
            }
        )
    });
    assert!(error_status, "expected an error camera_status event");
}

#[tokio::test]
async fn test_stop_releases_handle_exactly_once() {
    let opener = FakeOpener::healthy();
    let drops = Arc::clone(&opener.drops);
    let (manager, bus, _calls) = manager(opener);
    let mut rx = bus.subscribe();

    manager.start("cam-1", "0").await.unwrap();
    assert!(manager.stop("cam-1").await);
    wait_until_gone(&manager, "cam-1").await;

    assert_eq!(drops.load(Ordering::SeqCst), 1);

    // Stop on an already-terminated session is a no-op.
    assert!(!manager.stop("cam-1").await);
    assert_eq!(drops.load(Ordering::SeqCst), 1);

    let events = drain(&mut rx);
    let stopped = events.iter().any(|e| {
        matches!(
            &e.event,
            Event::CameraStatus {
                status: SessionStatus::Stopped,
                ..
            }
        )
    });
    assert!(stopped, "expected a stopped camera_status event");
}

#[tokio::test]
async fn test_consecutive_read_failures_fail_session() {
    let opener = FakeOpener::flaky();
    let drops = Arc::clone(&opener.drops);
    let (manager, bus, _calls) = manager(opener);
    let mut rx = bus.subscribe();

    manager.start("cam-1", "0").await.unwrap();
    wait_until_gone(&manager, "cam-1").await;

    assert_eq!(drops.load(Ordering::SeqCst), 1);

    let events = drain(&mut rx);
    let fatal = events
        .iter()
        .find(|e| matches!(&e.event, Event::CameraError { .. }))
        .expect("expected a camera_error event");
    if let Event::CameraError { error, .. } = &fatal.event {
        assert!(error.contains("5 consecutive read failures"));
    }
    // No stopped status after a fatal error.
    let stopped = events.iter().any(|e| {
        matches!(
            &e.event,
            Event::CameraStatus {
                status: SessionStatus::Stopped,
                ..
            }
        )
    });
    assert!(!stopped);
}

#[tokio::test]
async fn test_frames_relayed_to_session_target() {
    let (manager, bus, _calls) = manager(FakeOpener::healthy());
    let mut rx = bus.subscribe();

    manager.start("cam-7", "0").await.unwrap();

    // Wait until a few frames have been relayed.
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let sessions = manager.sessions().await;
            if sessions.iter().any(|s| s.frames_relayed >= 5) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("no frames relayed");

    manager.stop("cam-7").await;
    wait_until_gone(&manager, "cam-7").await;

    let events = drain(&mut rx);
    let frame = events
        .iter()
        .find(|e| matches!(&e.event, Event::CameraFrame { .. }))
        .expect("expected camera_frame events");
    assert_eq!(frame.target, EventTarget::Session("cam-7".to_string()));
    if let Event::CameraFrame { image, .. } = &frame.event {
        assert!(!image.is_empty());
    }
}

#[tokio::test]
async fn test_detection_subsampled() {
    let (manager, _bus, calls) = manager(FakeOpener::healthy());

    manager.start("cam-1", "0").await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let sessions = manager.sessions().await;
            if sessions.iter().any(|s| s.frames_relayed >= 30) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("no frames relayed");

    manager.stop("cam-1").await;
    wait_until_gone(&manager, "cam-1").await;

    // detect_every == 3: at least 30 frames flowed, so roughly a third of
    // them ran detection.
    let detections = calls.load(Ordering::SeqCst);
    assert!(detections >= 10, "detector barely invoked: {detections}");
}

#[tokio::test]
async fn test_hot_loop_still_observes_stop() {
    // With a zero frame interval the relay loop never has to wait between
    // frames; on a current-thread runtime it must still yield so this
    // future gets to run and the stop request is observed.
    let (manager, _bus, _calls) = manager(FakeOpener::healthy());

    manager.start("cam-1", "0").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(manager.stop("cam-1").await);
    wait_until_gone(&manager, "cam-1").await;
}

#[tokio::test]
async fn test_stop_racing_fatal_error_cleans_up_once() {
    // Reads fail constantly while a stop request lands; whichever exit
    // wins, the handle is released once and the entry removed once.
    let opener = FakeOpener::flaky();
    let drops = Arc::clone(&opener.drops);
    let (manager, _bus, _calls) = manager(opener);

    manager.start("cam-1", "0").await.unwrap();
    manager.stop("cam-1").await;
    wait_until_gone(&manager, "cam-1").await;

    assert_eq!(drops.load(Ordering::SeqCst), 1);
    assert!(manager.sessions().await.is_empty());
}

#[tokio::test]
async fn test_independent_sessions_per_key() {
    let opener = FakeOpener::healthy();
    let opens = Arc::clone(&opener.opens);
    let drops = Arc::clone(&opener.drops);
    let (manager, _bus, _calls) = manager(opener);

    manager.start("cam-a", "0").await.unwrap();
    manager.start("cam-b", "1").await.unwrap();
    assert_eq!(opens.load(Ordering::SeqCst), 2);
    assert_eq!(manager.sessions().await.len(), 2);

    manager.stop_all().await;
    wait_until_gone(&manager, "cam-a").await;
    wait_until_gone(&manager, "cam-b").await;

    assert_eq!(drops.load(Ordering::SeqCst), 2);
    assert!(manager.sessions().await.is_empty());

    // Keys are reusable once their sessions are gone.
    manager.start("cam-a", "0").await.unwrap();
    manager.stop("cam-a").await;
    wait_until_gone(&manager, "cam-a").await;
}
