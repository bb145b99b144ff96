//! Persistence seam for tracking results.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use vigil_models::{JobId, TrackingResult};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("persistence failed: {0}")]
    Failed(String),
}

/// Store for completed tracking results.
///
/// A save failure is surfaced as a warning on the event channel; the job
/// outcome is unaffected.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn save(&self, job_id: &JobId, result: &TrackingResult) -> Result<(), PersistError>;
}

/// Writes one `tracking_<job_id>.json` per completed job.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn result_path(&self, job_id: &JobId) -> PathBuf {
        self.dir.join(format!("tracking_{job_id}.json"))
    }
}

#[async_trait]
impl ResultStore for JsonFileStore {
    async fn save(&self, job_id: &JobId, result: &TrackingResult) -> Result<(), PersistError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PersistError::Failed(e.to_string()))?;

        let path = self.result_path(job_id);
        let json = serde_json::to_vec_pretty(result).map_err(|e| PersistError::Failed(e.to_string()))?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| PersistError::Failed(e.to_string()))?;

        info!(job_id = %job_id, path = %path.display(), "tracking result saved");
        Ok(())
    }
}
