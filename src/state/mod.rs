// State management module
//
// This module provides the StateManager which wraps AppState with thread-safe access
// using Arc<RwLock<T>> and emits change events for hosts that display progress.

use crate::models::{AppState, CraftingSettings, Currency, Phase, RunOutcome};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when state is modified
///
/// These events notify interested parties (status overlays, tests) about
/// state changes without requiring them to poll the state.
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// The engine moved to a new phase
    PhaseChanged { from: Phase, to: Phase },

    /// A crafting run has started
    RunStarted,

    /// A work queue was built for a cycle
    QueueBuilt { cycle: u32, len: usize },

    /// The engine moved on to another work item
    ProgressUpdated { current: Option<usize>, total: usize },

    /// A currency was applied to an item
    ItemApplied { item: String, currency: Currency },

    /// A work item was skipped
    ItemSkipped {
        item: String,
        currency: Currency,
        reason: String,
    },

    /// A crafting run has finished
    RunFinished {
        outcome: Option<RunOutcome>,
        applied: usize,
        skipped: usize,
    },

    /// Settings have been updated
    SettingsChanged,

    /// State has been reset
    StateReset,
}

/// Thread-safe state manager with event emission
///
/// This is the central state management component that:
/// - Provides thread-safe access to [`AppState`] via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`StateChange`] events
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// Settings live here too, so every work queue build reads the values that
/// are current at that moment.
///
/// # Related Types
///
/// - [`crate::models::AppState`]: The underlying state structure
/// - [`StateChange`]: Event types emitted on state mutations
/// - [`crate::config::ConfigManager`]: Loads settings into state
/// - [`crate::engine::CraftingEngine`]: Primary producer of state events
pub struct StateManager {
    /// The application state protected by RwLock for thread-safe access
    state: Arc<RwLock<AppState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// # Returns
    /// A new StateManager with a broadcast channel buffer of 100 events
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(AppState::default())),
            state_tx,
        }
    }

    /// Create a StateManager that starts with the given settings
    pub fn with_settings(settings: CraftingSettings) -> Self {
        let manager = Self::new();
        manager.load_settings(settings);
        manager
    }

    /// Get a read-only snapshot of the current state
    pub fn snapshot(&self) -> AppState {
        self.read(|state| state.clone())
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let running = state_manager.read(|state| state.is_running);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&AppState) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// This is the primary way to modify state. It:
    /// 1. Captures the old state
    /// 2. Applies the update function
    /// 3. Detects what changed
    /// 4. Emits appropriate events
    ///
    /// # Returns
    /// A vector of StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut AppState),
    {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let old_state = state.clone();

        update_fn(&mut state);

        let changes = self.detect_changes(&old_state, &state);

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state changes.
    /// Multiple subscribers can listen simultaneously.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    fn emit(&self, event: StateChange, changes: &mut Vec<StateChange>) {
        let _ = self.state_tx.send(event.clone());
        changes.push(event);
    }

    /// Detect what changed between two states and generate events
    fn detect_changes(&self, old: &AppState, new: &AppState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if !old.is_running && new.is_running {
            changes.push(StateChange::RunStarted);
        }

        if old.phase != new.phase {
            changes.push(StateChange::PhaseChanged {
                from: old.phase,
                to: new.phase,
            });
        }

        if old.cycle != new.cycle || old.queue_len != new.queue_len {
            changes.push(StateChange::QueueBuilt {
                cycle: new.cycle,
                len: new.queue_len,
            });
        }

        if old.current_item != new.current_item {
            changes.push(StateChange::ProgressUpdated {
                current: new.current_item,
                total: new.queue_len,
            });
        }

        if old.is_running && !new.is_running {
            changes.push(StateChange::RunFinished {
                outcome: new.last_outcome.clone(),
                applied: new.applied_items,
                skipped: new.skipped_items,
            });
        }

        if old.settings != new.settings {
            changes.push(StateChange::SettingsChanged);
        }

        changes
    }

    // Convenience methods for common state updates

    pub fn is_running(&self) -> bool {
        self.read(|state| state.is_running)
    }

    pub fn phase(&self) -> Phase {
        self.read(|state| state.phase)
    }

    /// Clone of the current settings
    pub fn settings(&self) -> CraftingSettings {
        self.read(|state| state.settings.clone())
    }

    /// Mark a run as started, clearing the results of the previous one
    pub fn begin_run(&self) -> Vec<StateChange> {
        self.update(|state| {
            state.reset_run_state();
            state.is_running = true;
        })
    }

    pub fn set_phase(&self, phase: Phase) -> Vec<StateChange> {
        self.update(|state| state.phase = phase)
    }

    /// Record the queue built for `cycle`
    pub fn record_queue(&self, cycle: u32, len: usize) -> Vec<StateChange> {
        self.update(|state| {
            state.cycle = cycle;
            state.queue_len = len;
            state.current_item = None;
        })
    }

    pub fn set_current_item(&self, index: Option<usize>) -> Vec<StateChange> {
        self.update(|state| state.current_item = index)
    }

    /// Record a successful application
    pub fn record_applied(&self, item: String, currency: Currency) -> Vec<StateChange> {
        let mut changes = self.update(|state| state.applied_items += 1);
        self.emit(StateChange::ItemApplied { item, currency }, &mut changes);
        changes
    }

    /// Record a skipped work item
    pub fn record_skipped(
        &self,
        item: String,
        currency: Currency,
        reason: String,
    ) -> Vec<StateChange> {
        let mut changes = self.update(|state| state.skipped_items += 1);
        self.emit(
            StateChange::ItemSkipped {
                item,
                currency,
                reason,
            },
            &mut changes,
        );
        changes
    }

    /// Mark the run as finished with `outcome`
    pub fn finish_run(&self, outcome: RunOutcome) -> Vec<StateChange> {
        self.update(|state| {
            if let RunOutcome::Faulted(message) = &outcome {
                state.last_error = Some(message.clone());
            }
            state.last_outcome = Some(outcome);
            state.current_item = None;
            state.phase = Phase::Idle;
            state.is_running = false;
        })
    }

    pub fn set_last_error(&self, message: String) -> Vec<StateChange> {
        self.update(|state| state.last_error = Some(message))
    }

    /// Reset all run-related state
    pub fn reset_run_state(&self) -> Vec<StateChange> {
        let mut changes = self.update(|state| state.reset_run_state());
        self.emit(StateChange::StateReset, &mut changes);
        changes
    }

    /// Modify settings in place; the result is validated before it is stored
    pub fn update_settings<F>(&self, settings_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut CraftingSettings),
    {
        self.update(|state| {
            let mut settings = state.settings.clone();
            settings_fn(&mut settings);
            state.settings = settings.validated();
        })
    }

    /// Replace the settings, e.g. after loading them from disk
    pub fn load_settings(&self, settings: CraftingSettings) -> Vec<StateChange> {
        let settings = settings.validated();

        tracing::info!(
            "Loaded settings: click_delay={}ms, extra_delay={}ms, alchemy_only={}, max_cycles={}",
            settings.click_delay_ms,
            settings.extra_delay_ms,
            settings.alchemy_only,
            settings.max_cycles
        );

        self.update(|state| state.settings = settings)
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
