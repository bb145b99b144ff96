//! Per-job processing loop.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use vigil_events::EventChannel;
use vigil_media::{annotate_tracks, Detector, SinkFactory, SinkFinish, SourceOpener};
use vigil_models::{
    BBox, DetectionRecord, Event, JobId, JobStatus, ProcessingPhase, TrackingResult, VideoJob,
};
use vigil_track::{ClassCounts, Tracker};

use crate::config::WorkerConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::persist::ResultStore;
use crate::registry::JobTable;

/// Collaborators for job processing.
pub struct PipelineContext {
    pub config: WorkerConfig,
    pub opener: Arc<dyn SourceOpener>,
    pub detector: Arc<dyn Detector>,
    pub sinks: Arc<dyn SinkFactory>,
    pub store: Arc<dyn ResultStore>,
    pub events: Arc<dyn EventChannel>,
}

pub(crate) async fn update_job(jobs: &JobTable, job_id: &JobId, f: impl FnOnce(&mut VideoJob)) {
    let mut table = jobs.write().await;
    if let Some(job) = table.get_mut(job_id) {
        f(job);
        job.updated_at = Utc::now();
    }
}

/// Drive one job from `Queued` to a terminal state.
///
/// Emits exactly one final event: `processing_complete` on success, a
/// `processing_status` error on failure. Degraded codec output and
/// persistence failures are attached as warnings to a completed job.
pub(crate) async fn run_job(ctx: Arc<PipelineContext>, jobs: JobTable, job_id: JobId) {
    let (source_path, output_path) = {
        let table = jobs.read().await;
        match table.get(&job_id) {
            Some(job) => (job.source_path.clone(), job.output_path.clone()),
            None => return,
        }
    };

    update_job(&jobs, &job_id, |j| j.status = JobStatus::Processing).await;
    let _ = ctx
        .events
        .broadcast(Event::processing_status(
            job_id.clone(),
            ProcessingPhase::Started,
            0,
        ))
        .await;

    info!(job_id = %job_id, source = %source_path.display(), "processing video job");

    match process(&ctx, &jobs, &job_id, &source_path, &output_path).await {
        Ok((result, finish)) => {
            if let SinkFinish::Degraded { detail, .. } = &finish {
                warn!(job_id = %job_id, detail = %detail, "codec degraded");
                let _ = ctx
                    .events
                    .broadcast(Event::processing_warning(
                        job_id.clone(),
                        format!("codec degraded: {detail}"),
                    ))
                    .await;
            }

            if let Err(e) = ctx.store.save(&job_id, &result).await {
                warn!(job_id = %job_id, error = %e, "result persistence failed");
                let _ = ctx
                    .events
                    .broadcast(Event::processing_warning(
                        job_id.clone(),
                        format!("results not persisted: {e}"),
                    ))
                    .await;
            }

            update_job(&jobs, &job_id, |j| {
                j.status = JobStatus::Completed;
                j.progress = 100;
                j.person_count = result.person_count;
                j.animal_count = result.animal_count;
            })
            .await;

            info!(
                job_id = %job_id,
                person_count = result.person_count,
                animal_count = result.animal_count,
                total_frames = result.total_frames,
                "video job completed"
            );

            let _ = ctx
                .events
                .broadcast(Event::ProcessingComplete {
                    job_id: job_id.clone(),
                    person_count: result.person_count,
                    animal_count: result.animal_count,
                    output: finish.path().display().to_string(),
                })
                .await;
        }
        Err(e) => {
            error!(job_id = %job_id, error = %e, "video job failed");
            let message = e.to_string();
            update_job(&jobs, &job_id, |j| {
                j.status = JobStatus::Error;
                j.error = Some(message.clone());
            })
            .await;
            let _ = ctx
                .events
                .broadcast(Event::processing_error(job_id.clone(), message))
                .await;
        }
    }
}

/// The frame loop: decode, detect, track, annotate, write, report.
async fn process(
    ctx: &PipelineContext,
    jobs: &JobTable,
    job_id: &JobId,
    source_path: &Path,
    output_path: &Path,
) -> PipelineResult<(TrackingResult, SinkFinish)> {
    let mut source = ctx
        .opener
        .open(&source_path.to_string_lossy())
        .await
        .map_err(|e| PipelineError::SourceUnavailable(e.to_string()))?;

    let total_frames = source.total_frames();
    let mut sink = ctx
        .sinks
        .create(output_path, source.fps())
        .await
        .map_err(|e| PipelineError::Sink(e.to_string()))?;

    let mut tracker = Tracker::new(ctx.config.tracker_config());
    let mut counts = ClassCounts::default();
    let mut records: Vec<DetectionRecord> = Vec::new();
    let mut frame_index: u64 = 0;
    let mut read_failures: u32 = 0;
    let mut last_percent: u8 = 0;

    loop {
        let mut frame = match source.next_frame().await {
            Ok(Some(frame)) => {
                read_failures = 0;
                frame
            }
            Ok(None) => break,
            Err(e) => {
                read_failures += 1;
                warn!(
                    job_id = %job_id,
                    frame = frame_index,
                    attempt = read_failures,
                    error = %e,
                    "frame read failed"
                );
                if read_failures > ctx.config.max_read_retries {
                    return Err(PipelineError::Read {
                        message: e.to_string(),
                        retries: ctx.config.max_read_retries,
                    });
                }
                continue;
            }
        };

        // A per-frame inference failure never aborts the job
        let detections = match ctx.detector.detect(&frame).await {
            Ok(detections) => detections,
            Err(e) => {
                warn!(job_id = %job_id, frame = frame_index, error = %e, "inference failed, frame treated as empty");
                Vec::new()
            }
        };

        for det in detections.iter().filter(|d| d.is_well_formed()) {
            records.push(DetectionRecord {
                frame: frame_index,
                bbox: det.bbox,
                class_label: det.class_label.clone(),
                confidence: det.confidence,
            });
        }

        let confirmed = tracker.update(&detections, frame_index);
        let boxes: Vec<(u64, String, BBox)> = confirmed
            .iter()
            .map(|t| (t.id, t.class_label.clone(), t.bbox()))
            .collect();
        counts.observe(confirmed);

        annotate_tracks(
            &mut frame.image,
            boxes.iter().map(|(id, class, bbox)| (*id, class.as_str(), *bbox)),
        );
        sink.write(&frame)
            .await
            .map_err(|e| PipelineError::Sink(e.to_string()))?;

        frame_index += 1;

        if let Some(total) = total_frames.filter(|&t| t > 0) {
            let percent = ((frame_index * 100) / total).min(100) as u8;
            if percent > last_percent {
                last_percent = percent;
                update_job(jobs, job_id, |j| j.progress = percent).await;
                let _ = ctx
                    .events
                    .broadcast(Event::processing_status(
                        job_id.clone(),
                        ProcessingPhase::Processing,
                        percent,
                    ))
                    .await;
            }
        }
    }

    let finish = sink
        .finalize()
        .await
        .map_err(|e| PipelineError::Sink(e.to_string()))?;

    let result = TrackingResult {
        tracks: tracker.summaries(),
        person_count: counts.person_count(),
        animal_count: counts.animal_count(),
        per_frame_detections: records,
        total_frames: frame_index,
        completed_at: Utc::now(),
    };

    Ok((result, finish))
}
