//! In-memory job store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn};

use vgen_models::{GenerationJob, JobId, JobPatch, JobState};

use crate::error::{StoreError, StoreResult};
use crate::store::JobStore;

/// In-memory `JobStore` backed by a `RwLock<HashMap>`.
#[derive(Clone, Default)]
pub struct MemoryJobStore {
    jobs: Arc<RwLock<HashMap<JobId, GenerationJob>>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs held (any state).
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create_job(&self, job: GenerationJob) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(StoreError::AlreadyExists(job.id.clone()));
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn get_job(&self, id: &JobId) -> StoreResult<GenerationJob> {
        self.jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn replace_job(&self, job: GenerationJob) -> StoreResult<()> {
        let mut jobs = self.jobs.write().await;
        if !jobs.contains_key(&job.id) {
            return Err(StoreError::NotFound(job.id.clone()));
        }
        jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn update_job(&self, id: &JobId, patch: JobPatch) -> StoreResult<GenerationJob> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if let Some(state) = patch.state {
            job.state = state;
        }
        if let Some(progress) = patch.progress {
            job.progress = progress.min(100);
        }
        if let Some(result_url) = patch.result_url {
            job.result_url = Some(result_url);
        }
        if let Some(error_message) = patch.error_message {
            job.error_message = Some(error_message);
        }

        Ok(job.clone())
    }

    async fn get_pending_jobs(&self) -> StoreResult<Vec<GenerationJob>> {
        let jobs = self.jobs.read().await;
        let mut pending: Vec<GenerationJob> = jobs
            .values()
            .filter(|j| j.state == JobState::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|j| j.created_at);
        Ok(pending)
    }

    async fn recover_stuck_jobs(&self, age_minutes: i64) -> StoreResult<usize> {
        let cutoff = Utc::now() - Duration::minutes(age_minutes);
        let mut jobs = self.jobs.write().await;
        let mut recovered = 0usize;

        for job in jobs.values_mut() {
            if job.state != JobState::Running {
                continue;
            }
            let started = match job.started_at {
                Some(t) => t,
                None => job.created_at,
            };
            if started > cutoff {
                continue;
            }

            // A crashed worker left this job running. Give it another
            // attempt if budget remains, otherwise terminate it.
            let next = if job.can_retry() {
                job.clone().retry()
            } else {
                job.clone().fail("worker crashed while processing")
            };
            match next {
                Ok(next) => {
                    info!(
                        job_id = %job.id,
                        state = %next.state,
                        "Recovered stuck job"
                    );
                    *job = next;
                    recovered += 1;
                }
                Err(e) => {
                    warn!(job_id = %job.id, "Failed to recover stuck job: {}", e);
                }
            }
        }

        Ok(recovered)
    }
}
