use crate::engine::machine::{CraftingContext, CraftingEngine, Step};
use crate::host::{InputDriver, SnapshotProvider};
use crate::models::{MAX_CONCURRENT_ENGINES, Point, RunOutcome};
use crate::services::ScoreEngine;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Registry name of the crafting task
pub const CRAFTING_TASK_NAME: &str = "AutoCraft_Routine";

/// Source of the waits between engine steps
pub trait Delay: Send + Sync {
    fn wait(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Real waits on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Waits that only yield to the runtime and add up the requested time.
///
/// Lets a whole run execute deterministically in tests.
#[derive(Debug, Clone, Default)]
pub struct InstantDelay {
    requested_ms: Arc<AtomicU64>,
}

impl InstantDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total time the engine asked to wait
    pub fn requested(&self) -> Duration {
        Duration::from_millis(self.requested_ms.load(Ordering::Relaxed))
    }
}

impl Delay for InstantDelay {
    async fn wait(&self, duration: Duration) {
        let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        // fetch_update never fails with a closure that always returns Some
        let _ = self
            .requested_ms
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
                Some(total.saturating_add(ms))
            });
        tokio::task::yield_now().await;
    }
}

/// Drive `engine` until it finishes.
///
/// Yields to the runtime after every step, and races every wait against the
/// cancel signal so a stop takes effect at the next suspension point. A
/// dropped cancel sender counts as a stop.
pub async fn drive<P, I, D>(
    mut engine: CraftingEngine<P, I>,
    delay: &D,
    mut cancel_rx: watch::Receiver<bool>,
) -> RunOutcome
where
    P: SnapshotProvider,
    I: InputDriver,
    D: Delay,
{
    loop {
        if *cancel_rx.borrow() {
            engine.cancel();
        }

        match engine.step() {
            Step::Finished(outcome) => return outcome,
            Step::Continue => tokio::task::yield_now().await,
            Step::Wait(duration) => {
                tokio::select! {
                    _ = delay.wait(duration) => {}
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            engine.cancel();
                        }
                    }
                }
            }
        }
    }
}

struct TaskEntry {
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<RunOutcome>,
}

/// Named background tasks, at most one per name
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, TaskEntry>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, TaskEntry>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a task named `name` is still running. Finished tasks are pruned.
    pub fn has(&self, name: &str) -> bool {
        let mut tasks = self.lock();
        tasks.retain(|_, entry| !entry.handle.is_finished());
        tasks.contains_key(name)
    }

    /// Number of tasks that have not finished yet
    pub fn active(&self) -> usize {
        self.lock()
            .values()
            .filter(|entry| !entry.handle.is_finished())
            .count()
    }

    /// Spawn `make` under `name` unless a task of that name is running.
    ///
    /// The future receives the task's cancel signal. Returns `false` and
    /// spawns nothing when the name is taken.
    pub fn spawn_named<F, Fut>(&self, name: &str, runtime: &tokio::runtime::Handle, make: F) -> bool
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = RunOutcome> + Send + 'static,
    {
        let mut tasks = self.lock();
        if tasks
            .get(name)
            .is_some_and(|entry| !entry.handle.is_finished())
        {
            return false;
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = runtime.spawn(make(cancel_rx));
        tasks.insert(name.to_string(), TaskEntry { cancel_tx, handle });
        true
    }

    /// Signal cancellation to `name`. Returns whether such a task exists.
    pub fn cancel(&self, name: &str) -> bool {
        match self.lock().get(name) {
            Some(entry) => {
                let _ = entry.cancel_tx.send(true);
                true
            }
            None => false,
        }
    }

    /// Remove `name` and hand back its join handle
    pub fn take(&self, name: &str) -> Option<JoinHandle<RunOutcome>> {
        self.lock().remove(name).map(|entry| entry.handle)
    }

    /// Signal cancellation to every task
    pub fn cancel_all(&self) {
        for entry in self.lock().values() {
            let _ = entry.cancel_tx.send(true);
        }
    }
}

/// Host-facing commands for the crafting engine.
///
/// Wraps one [`CraftingContext`] and guarantees a single running engine
/// through the [`TaskRegistry`]. All commands are safe to call in any state.
pub struct CraftingController<P, I, D = TokioDelay> {
    ctx: CraftingContext<P, I>,
    delay: D,
    registry: TaskRegistry,
    runtime: tokio::runtime::Handle,
    scorer: RwLock<ScoreEngine>,
}

impl<P, I> CraftingController<P, I, TokioDelay>
where
    P: SnapshotProvider + 'static,
    I: InputDriver + 'static,
{
    pub fn new(ctx: CraftingContext<P, I>, runtime: tokio::runtime::Handle) -> Self {
        Self::with_delay(ctx, runtime, TokioDelay)
    }
}

impl<P, I, D> CraftingController<P, I, D>
where
    P: SnapshotProvider + 'static,
    I: InputDriver + 'static,
    D: Delay + Clone + 'static,
{
    pub fn with_delay(ctx: CraftingContext<P, I>, runtime: tokio::runtime::Handle, delay: D) -> Self {
        let scorer = ScoreEngine::new(&ctx.state.settings().score);
        Self {
            ctx,
            delay,
            registry: TaskRegistry::new(),
            runtime,
            scorer: RwLock::new(scorer),
        }
    }

    pub fn context(&self) -> &CraftingContext<P, I> {
        &self.ctx
    }

    pub fn is_running(&self) -> bool {
        self.registry.has(CRAFTING_TASK_NAME)
    }

    /// Start a run in the background.
    ///
    /// Returns `false` without doing anything when a run is already active or
    /// the host is not ready for crafting.
    pub fn start(&self) -> bool {
        if !self.ctx.provider.crafting_ready() {
            tracing::warn!("Inventory or currency tab not visible, not starting");
            return false;
        }

        if self.registry.active() >= MAX_CONCURRENT_ENGINES {
            tracing::info!("Crafting routine already running, start ignored");
            return false;
        }

        let engine = CraftingEngine::new(self.ctx.clone());
        let delay = self.delay.clone();
        let started = self
            .registry
            .spawn_named(CRAFTING_TASK_NAME, &self.runtime, move |cancel_rx| async move {
                drive(engine, &delay, cancel_rx).await
            });

        if started {
            tracing::info!("Crafting routine started");
        } else {
            tracing::info!("Crafting routine already running, start ignored");
        }
        started
    }

    /// Stop the active run and wait for its cleanup.
    ///
    /// Keys are released again afterwards, so this also works as a cleanup
    /// when nothing is running. Returns the outcome of the stopped run.
    pub async fn stop(&self) -> Option<RunOutcome> {
        self.registry.cancel(CRAFTING_TASK_NAME);

        let outcome = match self.registry.take(CRAFTING_TASK_NAME) {
            Some(handle) => Some(self.join(handle).await),
            None => None,
        };

        self.ctx.release_all_keys();
        outcome
    }

    /// Stop if running, start otherwise. Returns whether a run was started.
    pub async fn toggle(&self) -> bool {
        if self.is_running() {
            self.stop().await;
            false
        } else {
            self.start()
        }
    }

    /// Wait for the active run to end on its own
    pub async fn wait(&self) -> Option<RunOutcome> {
        let handle = self.registry.take(CRAFTING_TASK_NAME)?;
        Some(self.join(handle).await)
    }

    /// Synchronous panic button.
    ///
    /// Signals every task to stop and releases all keys before returning. The
    /// cancelled task runs its own cleanup at its next suspension point.
    pub fn emergency_cleanup(&self) {
        tracing::warn!("Emergency cleanup requested");
        self.registry.cancel_all();
        let released = self.ctx.release_all_keys();
        tracing::info!("Emergency cleanup released {} keys", released);
    }

    async fn join(&self, handle: JoinHandle<RunOutcome>) -> RunOutcome {
        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Crafting task join error: {}", e);
                let outcome = if e.is_cancelled() {
                    RunOutcome::Cancelled
                } else {
                    RunOutcome::Faulted(format!("crafting task panicked: {}", e))
                };
                self.ctx.release_all_keys();
                if self.ctx.state.is_running() {
                    self.ctx.state.finish_run(outcome.clone());
                }
                outcome
            }
        }
    }

    /// Re-parse the banned modifier list and weights from the current settings
    pub fn reload_scoring(&self) {
        let settings = self.ctx.state.settings();
        self.scorer
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .reload(&settings.score);
    }

    /// Score of every inventory entity, paired with its screen position
    pub fn score_inventory(&self) -> Vec<(Point, i32)> {
        let Some(entities) = self.ctx.provider.inventory_items() else {
            return Vec::new();
        };

        let offset = self.ctx.provider.window_origin();
        let scorer = self.scorer.read().unwrap_or_else(PoisonError::into_inner);
        entities
            .iter()
            .map(|entity| (entity.position + offset, scorer.score(entity)))
            .collect()
    }
}
