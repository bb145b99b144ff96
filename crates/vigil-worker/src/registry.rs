//! Job registry: submission, bounded concurrency, status lookup.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{RwLock, Semaphore};
use tracing::info;

use vigil_models::{JobId, VideoJob};

use crate::processor::{run_job, PipelineContext};

pub(crate) type JobTable = Arc<RwLock<HashMap<JobId, VideoJob>>>;

/// Owns the job table and spawns one task per submitted job.
///
/// Cloning is cheap; all clones share the same table and concurrency limit.
#[derive(Clone)]
pub struct JobRegistry {
    ctx: Arc<PipelineContext>,
    jobs: JobTable,
    permits: Arc<Semaphore>,
}

impl JobRegistry {
    pub fn new(ctx: PipelineContext) -> Self {
        let permits = Arc::new(Semaphore::new(ctx.config.max_concurrent_jobs));
        Self {
            ctx: Arc::new(ctx),
            jobs: Arc::new(RwLock::new(HashMap::new())),
            permits,
        }
    }

    /// Queue a video for processing and return its job ID immediately.
    ///
    /// The job starts as `Queued` and is picked up as soon as a concurrency
    /// permit is available.
    pub async fn submit(
        &self,
        source_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> JobId {
        let job = VideoJob::new(source_path, output_path);
        let job_id = job.job_id.clone();
        self.jobs.write().await.insert(job_id.clone(), job);

        info!(job_id = %job_id, "job submitted");

        let ctx = Arc::clone(&self.ctx);
        let jobs = Arc::clone(&self.jobs);
        let permits = Arc::clone(&self.permits);
        let id = job_id.clone();
        tokio::spawn(async move {
            // Closed only if the registry logic itself is torn down
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            run_job(ctx, jobs, id).await;
        });

        job_id
    }

    /// Snapshot of one job's current state.
    pub async fn status(&self, job_id: &JobId) -> Option<VideoJob> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Snapshot of every known job, newest first.
    pub async fn jobs(&self) -> Vec<VideoJob> {
        let mut jobs: Vec<VideoJob> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }
}
