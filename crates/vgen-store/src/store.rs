//! The `JobStore` trait.

use async_trait::async_trait;

use vgen_models::{GenerationJob, JobId, JobPatch};

use crate::error::StoreResult;

/// Persistence seam for generation jobs.
///
/// Implementations must apply [`replace_job`](JobStore::replace_job) and
/// [`update_job`](JobStore::update_job) atomically with respect to
/// concurrent readers.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a new job. Fails if the id already exists.
    async fn create_job(&self, job: GenerationJob) -> StoreResult<()>;

    /// Fetch a job by id.
    async fn get_job(&self, id: &JobId) -> StoreResult<GenerationJob>;

    /// Replace a job record wholesale (used for state transitions,
    /// which are computed as pure functions on the model).
    async fn replace_job(&self, job: GenerationJob) -> StoreResult<()>;

    /// Apply a partial update to a job.
    async fn update_job(&self, id: &JobId, patch: JobPatch) -> StoreResult<GenerationJob>;

    /// All pending jobs, oldest first.
    async fn get_pending_jobs(&self) -> StoreResult<Vec<GenerationJob>>;

    /// Force jobs stuck in `running` for longer than `age_minutes` back
    /// into a processable state. Returns the number of jobs recovered.
    async fn recover_stuck_jobs(&self, age_minutes: i64) -> StoreResult<usize>;
}
