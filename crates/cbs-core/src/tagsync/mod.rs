//! Periodic tag reconciliation for controllers.
//!
//! The scheduler alternates between two states, forever:
//! - sleeping for a delay drawn uniformly from `[0, interval)`;
//! - running one reconciliation pass.
//!
//! A failed pass is logged and counted; the next cycle starts as usual. Only cancellation
//! ends the loop.
use std::{sync::Arc, time::Duration};

use rand::{Rng, SeedableRng, rngs::StdRng};
use taskvisor::{TaskError, TaskFn, TaskRef};
use tokio::{sync::Mutex, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cbs_model::{ServiceSpec, TagSyncInterval};

use crate::{
    metrics::{MetricsHandle, Outcome, noop_metrics},
    service::{TagReconciler, TagSyncRequest},
};

/// Slot (and task) name of the tag sync service.
pub const TAG_SYNC_SERVICE_NAME: &str = "cbs-tag-sync";

/// Delay before the supervisor restarts a crashed scheduler.
pub const TAG_SYNC_RESTART_DELAY_MS: u64 = 5_000;

/// Jittered tag reconciliation loop.
pub struct TagSyncScheduler {
    interval: TagSyncInterval,
    reconciler: Arc<dyn TagReconciler>,
    request: TagSyncRequest,
    rng: StdRng,
    metrics: MetricsHandle,
}

impl TagSyncScheduler {
    /// Create a scheduler. The RNG is seeded from OS entropy, once.
    pub fn new(
        interval: TagSyncInterval,
        reconciler: Arc<dyn TagReconciler>,
        request: TagSyncRequest,
    ) -> Self {
        Self {
            interval,
            reconciler,
            request,
            rng: StdRng::from_entropy(),
            metrics: noop_metrics(),
        }
    }

    /// Reseed with a fixed value for reproducible delays.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Draw the next sleep, uniformly from `[0, interval)`.
    pub fn next_delay(&mut self) -> Duration {
        let upper_ms = self.interval.as_duration().as_millis() as u64;
        Duration::from_millis(self.rng.gen_range(0..upper_ms))
    }

    /// Run the loop until `cancel` fires.
    pub async fn run(&mut self, cancel: &CancellationToken) {
        info!(
            interval = %self.interval,
            reconciler = self.reconciler.name(),
            region = %self.request.region,
            cluster_id = %self.request.cluster_id,
            "tag sync scheduler started"
        );
        loop {
            let delay = self.next_delay();
            debug!(delay_ms = delay.as_millis() as u64, "sleeping before next tag sync");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = self.sync_once() => {}
            }
        }
        info!("tag sync scheduler stopped");
    }

    /// Run a single reconciliation pass and record its outcome.
    pub async fn sync_once(&self) -> Outcome {
        let started = Instant::now();
        let res = self.reconciler.reconcile(&self.request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let outcome = Outcome::from_result(&res);
        self.metrics.record_tag_sync(outcome, elapsed_ms);

        match res {
            Ok(()) => debug!(elapsed_ms, "tag sync pass completed"),
            Err(e) => warn!(error = %e, elapsed_ms, "tag sync pass failed; retrying next cycle"),
        }
        outcome
    }

    /// Wrap the scheduler into a supervised service.
    ///
    /// The body returns `Ok` once `shutdown` fires and `Canceled` when the supervisor
    /// cancels it; anything else would be a crash and gets restarted.
    pub fn into_service(self, shutdown: CancellationToken) -> (TaskRef, ServiceSpec) {
        let scheduler = Arc::new(Mutex::new(self));

        let task: TaskRef = TaskFn::arc(TAG_SYNC_SERVICE_NAME, move |ctx: CancellationToken| {
            let scheduler = Arc::clone(&scheduler);
            let shutdown = shutdown.clone();

            async move {
                let mut scheduler = scheduler.lock().await;
                tokio::select! {
                    _ = scheduler.run(&shutdown) => Ok(()),
                    _ = ctx.cancelled() => Err(TaskError::Canceled),
                }
            }
        });

        let spec = ServiceSpec::perpetual(TAG_SYNC_SERVICE_NAME, TAG_SYNC_RESTART_DELAY_MS);
        (task, spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;

    use crate::service::ReconcileError;

    const HOUR: Duration = Duration::from_secs(3_600);

    struct RecordingReconciler {
        fail: bool,
        calls: StdMutex<Vec<(Instant, TagSyncRequest)>>,
    }

    impl RecordingReconciler {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                calls: StdMutex::new(Vec::new()),
            })
        }

        fn instants(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
        }
    }

    #[async_trait]
    impl TagReconciler for RecordingReconciler {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn reconcile(&self, req: &TagSyncRequest) -> Result<(), ReconcileError> {
            self.calls.lock().unwrap().push((Instant::now(), req.clone()));
            if self.fail {
                return Err(ReconcileError::Failed("cloud api unavailable".into()));
            }
            Ok(())
        }
    }

    fn request() -> TagSyncRequest {
        TagSyncRequest {
            region: "ap-guangzhou".into(),
            cluster_id: "cls-abc".into(),
        }
    }

    fn scheduler(reconciler: Arc<RecordingReconciler>, seed: u64) -> TagSyncScheduler {
        TagSyncScheduler::new(TagSyncInterval::default(), reconciler, request()).with_seed(seed)
    }

    async fn run_for(mut sched: TagSyncScheduler, total: Duration) {
        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        let handle = tokio::spawn(async move { sched.run(&stop).await });

        tokio::time::sleep(total).await;
        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn reconciles_repeatedly_with_jittered_gaps() {
        let rec = RecordingReconciler::new(false);
        let start = Instant::now();

        run_for(scheduler(rec.clone(), 7), 10 * HOUR).await;

        let instants = rec.instants();
        // each gap is below one hour, so ten hours hold at least ten passes
        assert!(
            (10..=40).contains(&instants.len()),
            "unexpected number of passes: {}",
            instants.len()
        );

        let mut prev = start;
        let mut gaps = Vec::with_capacity(instants.len());
        for t in instants {
            gaps.push(t - prev);
            prev = t;
        }
        assert!(gaps.iter().all(|g| *g < HOUR), "gap not below interval: {gaps:?}");
        assert!(
            gaps.windows(2).any(|w| w[0] != w[1]),
            "gaps should vary: {gaps:?}"
        );

        let calls = rec.calls.lock().unwrap();
        assert!(calls.iter().all(|(_, req)| *req == request()));
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_the_loop() {
        let rec = RecordingReconciler::new(true);

        run_for(scheduler(rec.clone(), 11), 10 * HOUR).await;

        assert!(rec.instants().len() >= 10);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_sleep_skips_reconcile() {
        let rec = RecordingReconciler::new(false);
        let mut sched = scheduler(rec.clone(), 3);

        let cancel = CancellationToken::new();
        cancel.cancel();
        sched.run(&cancel).await;

        assert!(rec.instants().is_empty());
    }

    #[test]
    fn delays_are_uniform_below_interval() {
        let rec = RecordingReconciler::new(false);
        let mut sched = scheduler(rec, 42);

        const SAMPLES: usize = 10_000;
        const BUCKETS: usize = 6;
        let mut hist = [0usize; BUCKETS];

        for _ in 0..SAMPLES {
            let d = sched.next_delay();
            assert!(d < HOUR);
            let bucket = (d.as_millis() * BUCKETS as u128 / HOUR.as_millis()) as usize;
            hist[bucket] += 1;
        }

        // expected 1666 per bucket; allow a wide margin
        for (i, n) in hist.iter().enumerate() {
            assert!((1_400..=1_950).contains(n), "bucket {i} has {n} samples: {hist:?}");
        }
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = scheduler(RecordingReconciler::new(false), 99);
        let mut b = scheduler(RecordingReconciler::new(false), 99);

        let xs: Vec<_> = (0..16).map(|_| a.next_delay()).collect();
        let ys: Vec<_> = (0..16).map(|_| b.next_delay()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn service_spec_restarts_with_fixed_delay() {
        let rec = RecordingReconciler::new(false);
        let (_task, spec) = scheduler(rec, 1).into_service(CancellationToken::new());

        assert_eq!(spec.slot, TAG_SYNC_SERVICE_NAME);
        assert_eq!(spec.restart_delay_ms, TAG_SYNC_RESTART_DELAY_MS);
    }
}
