//! The generation job loop.
//!
//! A single loop polls the store for pending jobs and drives one job
//! per tick through the orchestrator. Jobs already being processed are
//! guarded by an in-progress set so overlapping ticks never double-run
//! a job. Per-job failures are absorbed into the job record (retry or
//! terminal failure); only store-level errors surface in logs. Events
//! are published only after the matching store write succeeds, so
//! subscribers never see a state the store does not hold.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

use vgen_models::{
    GenerationJob, GenerationRequest, JobId, SceneContext, VisualStyle,
};
use vgen_providers::Orchestrator;
use vgen_store::JobStore;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::events::{EventBus, JobEvent};

/// Generation job worker.
pub struct GenerationWorker {
    store: Arc<dyn JobStore>,
    orchestrator: Arc<Orchestrator>,
    events: EventBus,
    config: WorkerConfig,
    in_progress: Arc<Mutex<HashSet<JobId>>>,
}

impl GenerationWorker {
    pub fn new(
        store: Arc<dyn JobStore>,
        orchestrator: Arc<Orchestrator>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            store,
            orchestrator,
            events: EventBus::default(),
            config,
            in_progress: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Subscribe to job lifecycle events.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Run until the shutdown signal flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> WorkerResult<()> {
        self.recover_stuck().await;

        let mut ticker = tokio::time::interval(self.config.poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested, stopping worker loop");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Reclaim jobs abandoned mid-run by a crashed worker.
    async fn recover_stuck(&self) {
        match self
            .store
            .recover_stuck_jobs(self.config.stuck_threshold_minutes)
            .await
        {
            Ok(0) => {}
            Ok(n) => warn!("Recovered {} stuck job(s) at startup", n),
            Err(e) => error!("Stuck-job recovery failed: {}", e),
        }
    }

    /// One scheduling pass: claim and process at most one pending job.
    pub async fn tick(&self) {
        let pending = match self.store.get_pending_jobs().await {
            Ok(jobs) => jobs,
            Err(e) => {
                error!("Failed to list pending jobs: {}", e);
                return;
            }
        };

        let job = {
            let mut guard = self.in_progress.lock().await;
            let Some(job) = pending.into_iter().find(|j| !guard.contains(&j.id)) else {
                return;
            };
            guard.insert(job.id.clone());
            job
        };

        let job_id = job.id.clone();
        if let Err(e) = self.process_job(job).await {
            error!(job_id = %job_id, "Job processing error: {}", e);
        }
        self.in_progress.lock().await.remove(&job_id);
    }

    /// Drive one job from `pending` to a next state.
    async fn process_job(&self, job: GenerationJob) -> WorkerResult<()> {
        let running = job.start()?;
        self.store.replace_job(running.clone()).await?;
        self.events.publish(JobEvent::new(
            running.id.clone(),
            running.state,
            running.progress,
        ));
        info!(
            job_id = %running.id,
            project_id = %running.project_id,
            scene = running.scene_index,
            attempt = running.retry_count + 1,
            "Processing generation job"
        );

        let request = build_request(&running);
        match self.orchestrator.generate(&request).await {
            Ok(outcome) => {
                info!(
                    job_id = %running.id,
                    provider = %outcome.provider_used,
                    cost_usd = outcome.cost_usd,
                    "Job succeeded"
                );
                let done = running.complete(outcome.media_url, outcome.cost_usd)?;
                self.store.replace_job(done.clone()).await?;
                self.events
                    .publish(JobEvent::new(done.id, done.state, done.progress));
            }
            Err(e) => {
                let reason = e.to_string();
                match running.clone().retry() {
                    Ok(retried) => {
                        warn!(
                            job_id = %retried.id,
                            retry = retried.retry_count,
                            "Job failed, requeued: {}", reason
                        );
                        self.store.replace_job(retried.clone()).await?;
                        self.events.publish(
                            JobEvent::new(retried.id, retried.state, retried.progress)
                                .with_message(reason),
                        );
                    }
                    Err(_) => {
                        error!(job_id = %running.id, "Job failed terminally: {}", reason);
                        let failed = running.fail(&reason)?;
                        self.store.replace_job(failed.clone()).await?;
                        self.events.publish(
                            JobEvent::new(failed.id, failed.state, failed.progress)
                                .with_message(reason),
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

/// Translate a stored job into an orchestrator request.
///
/// Retries switch to the fallback prompt when one exists; the primary
/// prompt already failed at least once.
fn build_request(job: &GenerationJob) -> GenerationRequest {
    let prompt = if job.retry_count > 0 {
        job.fallback_prompt.clone().unwrap_or_else(|| job.prompt.clone())
    } else {
        job.prompt.clone()
    };

    GenerationRequest {
        prompt,
        negative_prompt: job.negative_prompt.clone(),
        duration_secs: job.duration_secs,
        aspect_ratio: job.aspect_ratio,
        source_image_url: job.source_image_url.clone(),
        provider: job.provider,
        quality_tier: job.quality_tier,
        context: SceneContext {
            visual_style: visual_style_from_tag(job.style.as_deref()),
            ..SceneContext::default()
        },
    }
}

fn visual_style_from_tag(tag: Option<&str>) -> VisualStyle {
    match tag.map(str::to_lowercase).as_deref() {
        Some("cinematic") => VisualStyle::Cinematic,
        Some("energetic") => VisualStyle::Energetic,
        Some("minimal") => VisualStyle::Minimal,
        _ => VisualStyle::Clean,
    }
}
