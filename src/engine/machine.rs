use crate::host::{HostError, InputDriver, Key, MouseButton, SnapshotProvider};
use crate::metrics::Metrics;
use crate::models::{CraftingSettings, Currency, InventoryEntity, Phase, Point, RunOutcome};
use crate::services::{
    QueueError, QueueSignature, WorkItem, WorkQueue, is_craftable, select_currency,
};
use crate::state::StateManager;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors raised while executing a run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CraftingError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("{0} not found in the currency tab")]
    CurrencyNotFound(Currency),

    #[error("No inventory item at {0} any more")]
    TargetNotFound(Point),

    #[error("Item at {at} no longer needs {currency}")]
    TargetChanged { at: Point, currency: Currency },

    #[error(transparent)]
    Input(#[from] HostError),

    #[error("Engine fault: {0}")]
    Fault(String),
}

/// Everything a run needs, passed explicitly instead of living in globals.
pub struct CraftingContext<P, I> {
    pub provider: Arc<P>,
    pub input: Arc<Mutex<I>>,
    pub state: StateManager,
    pub metrics: Arc<Metrics>,
}

impl<P, I> Clone for CraftingContext<P, I> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            input: Arc::clone(&self.input),
            state: self.state.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<P, I> CraftingContext<P, I>
where
    P: SnapshotProvider,
    I: InputDriver,
{
    pub fn new(provider: P, input: I, state: StateManager) -> Self {
        Self {
            provider: Arc::new(provider),
            input: Arc::new(Mutex::new(input)),
            state,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Run `f` with exclusive access to the input driver
    pub fn with_input<R>(&self, f: impl FnOnce(&mut I) -> R) -> R {
        let mut input = self.input.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut input)
    }

    /// Release every key cleanup knows about
    pub fn release_all_keys(&self) -> usize {
        release_all_keys(&self.input)
    }
}

/// Release every tracked modifier and button key.
///
/// Safe to call at any time, with or without a run in progress. A failure on
/// one key is logged and the remaining keys are still released. Returns the
/// number of keys released without error.
pub fn release_all_keys<I: InputDriver>(input: &Mutex<I>) -> usize {
    let mut input = input.lock().unwrap_or_else(PoisonError::into_inner);
    let mut released = 0;

    for key in Key::ALL {
        match input.key_up(key) {
            Ok(()) => released += 1,
            Err(e) => tracing::error!("Failed to release {:?}: {}", key, e),
        }
    }

    tracing::debug!("Released {}/{} keys", released, Key::ALL.len());
    released
}

/// What the scheduler should do after a step
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Suspend for the given time before the next step
    Wait(Duration),

    /// Step again after yielding once
    Continue,

    /// The run is over
    Finished(RunOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ApplyAction {
    MoveToCurrency,
    RightClick,
    MoveToTarget,
    LeftClick,
}

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    Start,
    Hold,
    Pick {
        index: usize,
    },
    Apply {
        index: usize,
        currency_at: Point,
        action: ApplyAction,
    },
    Release,
    Evaluate,
    Cleanup(RunOutcome),
    Done(RunOutcome),
}

/// The crafting state machine.
///
/// Every call to [`step`](Self::step) performs at most one input action and
/// reports how long to wait before the next one. Suspension and cancellation
/// are the scheduler's business, so the machine can be stepped by hand in
/// tests without any real delays.
///
/// One run looks like this:
///
/// ```text
/// Idle -> HoldingModifierKey -> (PickingCurrency -> ApplyingCurrency)* -> ReleasingModifierKey
///      -> rebuild queue: empty => Idle, otherwise HoldingModifierKey again
/// ```
///
/// `Cleanup` is entered on cancellation, on a fault in the hold/release
/// logic, and when the cycle cap or the progress check stops the run.
pub struct CraftingEngine<P, I> {
    ctx: CraftingContext<P, I>,
    stage: Stage,
    phase: Phase,
    transitions: Vec<Phase>,

    settings: CraftingSettings,
    queue: WorkQueue,
    signature: QueueSignature,
    cycle: u32,

    cursor_origin: Option<Point>,
    started_at: Option<Instant>,
}

impl<P, I> CraftingEngine<P, I>
where
    P: SnapshotProvider,
    I: InputDriver,
{
    pub fn new(ctx: CraftingContext<P, I>) -> Self {
        Self {
            ctx,
            stage: Stage::Start,
            phase: Phase::Idle,
            transitions: vec![Phase::Idle],
            settings: CraftingSettings::default(),
            queue: WorkQueue::empty(),
            signature: WorkQueue::empty().signature(),
            cycle: 0,
            cursor_origin: None,
            started_at: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Every phase the engine has been in, in order, starting with `Idle`
    pub fn transitions(&self) -> &[Phase] {
        &self.transitions
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Done(_))
    }

    /// Request cancellation. The next step runs cleanup.
    pub fn cancel(&mut self) {
        match self.stage {
            Stage::Done(_) | Stage::Cleanup(RunOutcome::Cancelled) => {}
            Stage::Start => {
                // Nothing was pressed yet
                tracing::info!("Crafting cancelled before it started");
                self.stage = Stage::Cleanup(RunOutcome::Cancelled);
                self.ctx.state.begin_run();
                self.ctx.metrics.record_run_started();
            }
            _ => {
                tracing::info!("Crafting cancelled during {}", self.phase);
                self.stage = Stage::Cleanup(RunOutcome::Cancelled);
            }
        }
    }

    /// Advance the machine by one action.
    pub fn step(&mut self) -> Step {
        let stage = std::mem::replace(&mut self.stage, Stage::Start);

        match stage {
            Stage::Start => self.start(),
            Stage::Hold => self.hold(),
            Stage::Pick { index } => self.pick(index),
            Stage::Apply {
                index,
                currency_at,
                action,
            } => self.apply(index, currency_at, action),
            Stage::Release => self.release(),
            Stage::Evaluate => self.evaluate(),
            Stage::Cleanup(outcome) => self.cleanup(outcome),
            Stage::Done(outcome) => {
                self.stage = Stage::Done(outcome.clone());
                Step::Finished(outcome)
            }
        }
    }

    /// Step until the run finishes, ignoring waits. Used by tests and benches.
    pub fn run_to_completion(&mut self) -> RunOutcome {
        loop {
            if let Step::Finished(outcome) = self.step() {
                return outcome;
            }
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.phase == phase {
            return;
        }

        tracing::info!("Phase {} -> {}", self.phase, phase);
        self.phase = phase;
        self.transitions.push(phase);
        self.ctx.state.set_phase(phase);
    }

    fn start(&mut self) -> Step {
        self.ctx.state.begin_run();
        self.ctx.metrics.record_run_started();
        self.started_at = Some(Instant::now());

        self.settings = self.ctx.state.settings();
        self.cursor_origin = Some(self.ctx.with_input(|input| input.cursor_position()));
        self.cycle = 1;

        tracing::info!("Crafting started (max {} cycles)", self.settings.max_cycles);

        self.queue = self.build_queue();
        self.signature = self.queue.signature();
        self.stage = Stage::Hold;
        Step::Continue
    }

    fn build_queue(&self) -> WorkQueue {
        self.ctx.metrics.record_queue_build();

        let queue = match WorkQueue::build(self.ctx.provider.as_ref(), &self.settings) {
            Ok(queue) => queue,
            Err(e) => {
                self.ctx.metrics.record_queue_build_failure();
                self.ctx.state.set_last_error(e.to_string());
                WorkQueue::empty()
            }
        };

        self.ctx.state.record_queue(self.cycle, queue.len());
        tracing::info!("Cycle {}: {} items queued", self.cycle, queue.len());
        for (currency, count) in queue.currency_counts() {
            tracing::debug!("  {} x {}", count, currency);
        }

        queue
    }

    fn hold(&mut self) -> Step {
        self.ctx.metrics.record_cycle();
        self.set_phase(Phase::HoldingModifierKey);

        if let Err(e) = self.ctx.with_input(|input| input.key_down(Key::CRAFT_MODIFIER)) {
            return self.fault(format!("failed to hold {:?}: {}", Key::CRAFT_MODIFIER, e));
        }

        self.stage = if self.queue.is_empty() {
            Stage::Release
        } else {
            Stage::Pick { index: 0 }
        };
        Step::Wait(self.settings.modifier_settle())
    }

    fn pick(&mut self, index: usize) -> Step {
        let Some(item) = self.queue.get(index).cloned() else {
            self.stage = Stage::Release;
            return Step::Continue;
        };

        self.set_phase(Phase::PickingCurrency);
        self.ctx.state.set_current_item(Some(index));

        match self.locate(&item) {
            Ok(currency_at) => {
                tracing::debug!(
                    "Item {}/{}: {} on {}",
                    index + 1,
                    self.queue.len(),
                    item.currency,
                    item.source.display_label()
                );
                self.stage = Stage::Apply {
                    index,
                    currency_at,
                    action: ApplyAction::MoveToCurrency,
                };
            }
            Err(e) => {
                self.skip(&item, &e);
                self.stage = Stage::Pick { index: index + 1 };
            }
        }

        Step::Continue
    }

    /// Screen position of the item's currency.
    ///
    /// Also re-reads the inventory: the slot must still hold an item that
    /// passes the eligibility filter and still wants the planned currency.
    /// An unreadable inventory does not block the item.
    fn locate(&self, item: &WorkItem) -> Result<Point, CraftingError> {
        let currency_at = self
            .ctx
            .provider
            .locate_currency_position(item.currency.internal_name())
            .ok_or(CraftingError::CurrencyNotFound(item.currency))?;

        if let Some(inventory) = self.ctx.provider.inventory_items() {
            let current = inventory
                .iter()
                .find(|e| e.position == item.target)
                .ok_or(CraftingError::TargetNotFound(item.target))?;

            if !self.still_wants(current, item.currency) {
                return Err(CraftingError::TargetChanged {
                    at: item.target,
                    currency: item.currency,
                });
            }
        }

        Ok(currency_at + self.queue.click_offset())
    }

    fn still_wants(&self, entity: &InventoryEntity, currency: Currency) -> bool {
        let alchemy_only = self.settings.alchemy_only;
        is_craftable(entity, alchemy_only)
            && select_currency(entity, alchemy_only, &self.settings.currency_enabled)
                == Some(currency)
    }

    fn apply(&mut self, index: usize, currency_at: Point, action: ApplyAction) -> Step {
        let Some(item) = self.queue.get(index).cloned() else {
            self.stage = Stage::Pick { index };
            return Step::Continue;
        };

        self.set_phase(Phase::ApplyingCurrency);

        let target = item.target + self.queue.click_offset();
        let result = self.ctx.with_input(|input| match action {
            ApplyAction::MoveToCurrency => input.move_cursor(currency_at),
            ApplyAction::RightClick => input.click(MouseButton::Right),
            ApplyAction::MoveToTarget => input.move_cursor(target),
            ApplyAction::LeftClick => input.click(MouseButton::Left),
        });

        if let Err(e) = result {
            self.skip(&item, &CraftingError::from(e));
            self.stage = Stage::Pick { index: index + 1 };
            return Step::Continue;
        }

        let next = match action {
            ApplyAction::MoveToCurrency => ApplyAction::RightClick,
            ApplyAction::RightClick => ApplyAction::MoveToTarget,
            ApplyAction::MoveToTarget => ApplyAction::LeftClick,
            ApplyAction::LeftClick => {
                self.ctx.metrics.record_item_applied();
                self.ctx
                    .state
                    .record_applied(item.source.display_label().to_string(), item.currency);
                self.stage = Stage::Pick { index: index + 1 };
                return Step::Wait(self.settings.extra_delay());
            }
        };

        self.stage = Stage::Apply {
            index,
            currency_at,
            action: next,
        };
        Step::Wait(self.settings.click_delay())
    }

    fn skip(&self, item: &WorkItem, reason: &CraftingError) {
        tracing::warn!(
            "Skipping {} on {}: {}",
            item.currency,
            item.source.display_label(),
            reason
        );
        self.ctx.metrics.record_item_skipped();
        self.ctx.state.record_skipped(
            item.source.display_label().to_string(),
            item.currency,
            reason.to_string(),
        );
    }

    fn release(&mut self) -> Step {
        self.set_phase(Phase::ReleasingModifierKey);
        self.ctx.state.set_current_item(None);

        if let Err(e) = self.ctx.with_input(|input| input.key_up(Key::CRAFT_MODIFIER)) {
            return self.fault(format!("failed to release {:?}: {}", Key::CRAFT_MODIFIER, e));
        }

        if let Some(origin) = self.cursor_origin {
            if let Err(e) = self.ctx.with_input(|input| input.move_cursor(origin)) {
                tracing::warn!("Could not restore cursor to {}: {}", origin, e);
            }
        }

        self.ctx.metrics.log_periodic();
        self.stage = Stage::Evaluate;
        Step::Continue
    }

    fn evaluate(&mut self) -> Step {
        let next = self.build_queue();

        if next.is_empty() {
            return self.finish(RunOutcome::Completed { cycles: self.cycle });
        }

        let next_signature = next.signature();
        let remaining = next.len();

        if self.cycle >= self.settings.max_cycles {
            tracing::warn!(
                "Stopping after {} cycles with {} items left",
                self.cycle,
                remaining
            );
            self.stage = Stage::Cleanup(RunOutcome::Exhausted {
                cycles: self.cycle,
                remaining,
            });
            return Step::Continue;
        }

        if !self.signature.progressed_to(&next_signature) {
            tracing::warn!(
                "Cycle {} made no progress ({} items unchanged), stopping",
                self.cycle,
                remaining
            );
            self.stage = Stage::Cleanup(RunOutcome::Stalled {
                cycles: self.cycle,
                remaining,
            });
            return Step::Continue;
        }

        self.cycle += 1;
        self.queue = next;
        self.signature = next_signature;
        self.ctx.state.record_queue(self.cycle, self.queue.len());
        self.stage = Stage::Hold;
        Step::Continue
    }

    fn fault(&mut self, message: String) -> Step {
        tracing::error!("Crafting fault: {}", message);
        self.stage = Stage::Cleanup(RunOutcome::Faulted(message));
        Step::Continue
    }

    fn cleanup(&mut self, outcome: RunOutcome) -> Step {
        self.set_phase(Phase::Cleanup);
        self.ctx.release_all_keys();
        self.finish(outcome)
    }

    fn finish(&mut self, outcome: RunOutcome) -> Step {
        self.set_phase(Phase::Idle);

        let elapsed = self.started_at.map(|t| t.elapsed()).unwrap_or_default();
        self.ctx.metrics.record_run_finished(&outcome, elapsed);
        self.ctx.state.finish_run(outcome.clone());

        match &outcome {
            RunOutcome::Completed { cycles } => {
                tracing::info!("Crafting completed after {} cycle(s)", cycles)
            }
            RunOutcome::Faulted(message) => tracing::error!("Crafting failed: {}", message),
            other => tracing::info!("Crafting ended: {}", other.label()),
        }

        self.stage = Stage::Done(outcome.clone());
        Step::Finished(outcome)
    }
}
