//! Publish job fan-out.
//!
//! Every platform in a [`PublishRequest`] becomes one job running as its own
//! tokio task. Jobs start in platform-selection order, staggered, and finish
//! in any order. Each resolved job appends a history record; successful jobs
//! also mark the batch's creatives as uploaded to their platform.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use creative_core::config::PublishConfig;
use creative_core::{CreativeError, HistoryRecord, HistoryStatus, Platform};
use creative_store::DataStore;
use creative_wizard::PublishRequest;
use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::backend::{JobContext, PublishBackend};
use crate::durations::{DurationSource, RandomizedDurations};
use crate::job::PublishJob;

/// The jobs created for one publish action.
pub struct JobBatch {
    id: Uuid,
    request: PublishRequest,
    jobs: RwLock<Vec<PublishJob>>,
    processed: AtomicBool,
}

impl JobBatch {
    /// One queued job per selected platform, in selection order. The batch
    /// takes its id from the request.
    pub fn new(request: PublishRequest) -> Arc<Self> {
        let items = request.distinct_creative_ids().len();
        let jobs = request
            .platforms
            .iter()
            .map(|p| PublishJob::queued(*p, items))
            .collect();
        Arc::new(Self {
            id: request.batch_id,
            request,
            jobs: RwLock::new(jobs),
            processed: AtomicBool::new(false),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn request(&self) -> &PublishRequest {
        &self.request
    }

    pub fn jobs(&self) -> Vec<PublishJob> {
        self.jobs.read().clone()
    }

    pub fn all_finished(&self) -> bool {
        self.jobs.read().iter().all(|j| j.status.is_terminal())
    }

    fn update(&self, index: usize, apply: impl FnOnce(&mut PublishJob)) {
        if let Some(job) = self.jobs.write().get_mut(index) {
            apply(job);
        }
    }

    /// Claim the batch for processing. Only the first caller gets `true`.
    fn claim(&self) -> bool {
        !self.processed.swap(true, Ordering::SeqCst)
    }
}

/// Handle on the running jobs of a batch.
pub struct PublishRun {
    batch: Arc<JobBatch>,
    handles: Vec<JoinHandle<()>>,
}

impl PublishRun {
    pub fn batch(&self) -> &Arc<JobBatch> {
        &self.batch
    }

    /// Snapshot of every job's current state.
    pub fn jobs(&self) -> Vec<PublishJob> {
        self.batch.jobs()
    }

    pub fn all_finished(&self) -> bool {
        self.batch.all_finished()
    }

    /// Wait for every job task to finish and return the final job states.
    pub async fn wait(mut self) -> Vec<PublishJob> {
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!(error = %e, "Publish job task panicked");
                }
            }
        }
        self.batch.jobs()
    }

    /// Abort every outstanding job task. Jobs already resolved keep their
    /// state; the others stay where they were.
    pub fn cancel(&mut self) {
        for handle in &self.handles {
            handle.abort();
        }
        info!(batch = %self.batch.id, "Publish run cancelled");
    }
}

pub struct PublishSimulator {
    store: Arc<DataStore>,
    /// Every batch this simulator has claimed, by id.
    batches: Mutex<HashMap<Uuid, Arc<JobBatch>>>,
    durations: Arc<dyn DurationSource>,
    backends: HashMap<Platform, Arc<dyn PublishBackend>>,
    default_campaign_label: String,
}

impl PublishSimulator {
    pub fn new(store: Arc<DataStore>, durations: Arc<dyn DurationSource>) -> Self {
        Self {
            store,
            batches: Mutex::new(HashMap::new()),
            durations,
            backends: HashMap::new(),
            default_campaign_label: PublishConfig::default().campaign_label,
        }
    }

    pub fn from_config(store: Arc<DataStore>, config: &PublishConfig) -> Self {
        Self::new(store, Arc::new(RandomizedDurations::from_config(config)))
            .with_campaign_label(config.campaign_label.clone())
    }

    pub fn with_campaign_label(mut self, label: impl Into<String>) -> Self {
        self.default_campaign_label = label.into();
        self
    }

    /// Route jobs for `platform` through `backend`. Platforms without a
    /// backend complete after their processing time.
    pub fn with_backend(mut self, platform: Platform, backend: Arc<dyn PublishBackend>) -> Self {
        self.backends.insert(platform, backend);
        self
    }

    /// Create the batch for `request` and start processing it. A request
    /// whose batch id was already claimed is not processed again: the run
    /// returned has no tasks and reports the existing batch's jobs.
    pub fn start_publish(&self, request: PublishRequest) -> PublishRun {
        if let Some(existing) = self.batches.lock().get(&request.batch_id).cloned() {
            warn!(batch = %existing.id, "Publish batch already processed, ignoring");
            return PublishRun {
                batch: existing,
                handles: Vec::new(),
            };
        }
        let batch = JobBatch::new(request);
        match self.process(batch.clone()) {
            Some(run) => run,
            None => PublishRun {
                batch,
                handles: Vec::new(),
            },
        }
    }

    /// Spawn one task per job of `batch`. Returns `None` when the batch, or
    /// another batch with the same id, was already processed; it is never
    /// processed twice.
    pub fn process(&self, batch: Arc<JobBatch>) -> Option<PublishRun> {
        {
            let mut batches = self.batches.lock();
            if batches.contains_key(&batch.id) || !batch.claim() {
                warn!(batch = %batch.id, "Publish batch already processed, ignoring");
                return None;
            }
            batches.insert(batch.id, batch.clone());
        }

        let request = batch.request();
        let creative_ids = request.distinct_creative_ids();
        let date = Local::now().date_naive();
        info!(
            batch = %batch.id,
            game_id = %request.game_id,
            platforms = request.platforms.len(),
            creatives = creative_ids.len(),
            "Publish batch started"
        );

        let handles = request
            .platforms
            .iter()
            .enumerate()
            .map(|(index, platform)| {
                let ctx = JobContext {
                    platform: *platform,
                    game_id: request.game_id.clone(),
                    creative_ids: creative_ids.clone(),
                    setup: request.setup.get(platform).cloned(),
                    campaign_label: request
                        .campaign_labels
                        .get(platform)
                        .cloned()
                        .unwrap_or_else(|| self.default_campaign_label.clone()),
                    date,
                };
                let worker = JobWorker {
                    index,
                    batch: batch.clone(),
                    store: self.store.clone(),
                    durations: self.durations.clone(),
                    backend: self.backends.get(platform).cloned(),
                };
                tokio::spawn(worker.run(ctx))
            })
            .collect();

        Some(PublishRun { batch, handles })
    }
}

struct JobWorker {
    index: usize,
    batch: Arc<JobBatch>,
    store: Arc<DataStore>,
    durations: Arc<dyn DurationSource>,
    backend: Option<Arc<dyn PublishBackend>>,
}

impl JobWorker {
    async fn run(self, ctx: JobContext) {
        tokio::time::sleep(self.durations.start_delay(self.index)).await;
        self.batch.update(self.index, PublishJob::start);
        info!(platform = %ctx.platform, "Publish job in progress");

        let processing = tokio::time::sleep(self.durations.processing_time(ctx.platform));
        let outcome = match &self.backend {
            Some(backend) => {
                let (outcome, _) = tokio::join!(backend.publish(&ctx), processing);
                outcome
            }
            None => {
                processing.await;
                Ok(Vec::new())
            }
        };

        match outcome {
            Ok(network_ids) => self.succeed(&ctx, network_ids),
            Err(e) => self.fail(&ctx, e),
        }
    }

    fn record(&self, ctx: &JobContext, status: HistoryStatus, network_ids: Vec<String>) {
        self.store.add_history_item(HistoryRecord {
            id: Uuid::new_v4(),
            game_id: Some(ctx.game_id.clone()),
            platform: ctx.platform,
            campaign: ctx.campaign_label.clone(),
            status,
            date: ctx.date,
            creatives: ctx.creative_ids.len(),
            network_ids,
        });
    }

    fn succeed(&self, ctx: &JobContext, network_ids: Vec<String>) {
        self.batch
            .update(self.index, |job| job.succeed(network_ids.clone()));
        self.record(ctx, HistoryStatus::Success, network_ids);
        for creative_id in &ctx.creative_ids {
            self.store.mark_uploaded(creative_id, ctx.platform);
        }
        metrics::counter!("publish.jobs.succeeded").increment(1);
        info!(
            platform = %ctx.platform,
            creatives = ctx.creative_ids.len(),
            "Publish job succeeded"
        );
    }

    fn fail(&self, ctx: &JobContext, err: CreativeError) {
        let message = err.to_string();
        warn!(platform = %ctx.platform, error = %message, "Publish job failed");
        self.batch.update(self.index, |job| job.fail(message));
        self.record(ctx, HistoryStatus::Failed, Vec::new());
        metrics::counter!("publish.jobs.failed").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::durations::FixedDurations;
    use crate::job::JobStatus;
    use creative_core::{CreativeId, Dimension};
    use creative_wizard::SelectionKey;

    fn request(platforms: &[Platform]) -> PublishRequest {
        PublishRequest {
            batch_id: Uuid::new_v4(),
            game_id: "g1".into(),
            selection: vec![
                SelectionKey::new(CreativeId::from(1), Dimension::from("9:16")),
                SelectionKey::new(CreativeId::from(1), Dimension::from("1:1")),
                SelectionKey::new(CreativeId::from(3), Dimension::from("9:16")),
            ],
            platforms: platforms.to_vec(),
            setup: HashMap::new(),
            campaign_labels: HashMap::new(),
        }
    }

    #[test]
    fn batch_has_one_queued_job_per_platform_in_order() {
        let batch = JobBatch::new(request(&[Platform::Tiktok, Platform::Meta]));
        let jobs = batch.jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].platform, Platform::Tiktok);
        assert_eq!(jobs[1].platform, Platform::Meta);
        assert!(jobs.iter().all(|j| j.status == JobStatus::Queued && j.items == 2));
        assert!(!batch.all_finished());
    }

    #[tokio::test]
    async fn jobs_resolve_with_default_campaign_label() {
        let store = Arc::new(DataStore::in_memory());
        let simulator = PublishSimulator::new(store.clone(), Arc::new(FixedDurations::immediate()));
        let jobs = simulator.start_publish(request(&[Platform::Google])).wait().await;

        assert_eq!(jobs[0].status, JobStatus::Success);
        let history = store.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].campaign, "New Campaign");
        assert_eq!(history[0].creatives, 2);
        assert_eq!(history[0].game_id.as_deref(), Some("g1"));
    }

    #[tokio::test]
    async fn campaign_label_from_setup_wins() {
        let store = Arc::new(DataStore::in_memory());
        let simulator = PublishSimulator::new(store.clone(), Arc::new(FixedDurations::immediate()));
        let mut req = request(&[Platform::Meta]);
        req.campaign_labels.insert(Platform::Meta, "Retargeting Nov".into());
        simulator.start_publish(req).wait().await;
        assert_eq!(store.history()[0].campaign, "Retargeting Nov");
    }

    #[tokio::test]
    async fn same_request_is_published_once() {
        let store = Arc::new(DataStore::in_memory());
        let simulator = PublishSimulator::new(store.clone(), Arc::new(FixedDurations::immediate()));
        let req = request(&[Platform::Meta]);

        let first = simulator.start_publish(req.clone()).wait().await;
        let second = simulator.start_publish(req.clone()).wait().await;
        assert_eq!(first[0].status, JobStatus::Success);
        assert_eq!(second, first);

        let fresh_batch = JobBatch::new(req);
        assert!(simulator.process(fresh_batch).is_none());

        assert_eq!(store.history().len(), 1);
        assert_eq!(
            store.uploaded_status().get(&CreativeId::from(1)),
            Some(&vec![Platform::Meta])
        );
    }

    #[tokio::test]
    async fn cancel_stops_outstanding_jobs() {
        let store = Arc::new(DataStore::in_memory());
        let durations = FixedDurations::new(
            std::time::Duration::from_secs(60),
            std::time::Duration::from_secs(60),
        );
        let simulator = PublishSimulator::new(store.clone(), Arc::new(durations));
        let mut run = simulator.start_publish(request(&[Platform::Meta]));
        run.cancel();
        let jobs = run.wait().await;
        assert_eq!(jobs[0].status, JobStatus::Queued);
        assert!(store.history().is_empty());
    }
}
