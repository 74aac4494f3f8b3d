use crate::models::config::CraftingSettings;

/// Maximum number of crafting engines that may run at once.
///
/// **IMPORTANT:** This is fixed at 1. Two engines would fight over the same
/// held modifier key and cursor, and every click of one would land on the
/// other's targets.
pub const MAX_CONCURRENT_ENGINES: usize = 1;

/// Observable phase of the crafting engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    HoldingModifierKey,
    PickingCurrency,
    ApplyingCurrency,
    ReleasingModifierKey,
    Cleanup,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "Idle",
            Phase::HoldingModifierKey => "HoldingModifierKey",
            Phase::PickingCurrency => "PickingCurrency",
            Phase::ApplyingCurrency => "ApplyingCurrency",
            Phase::ReleasingModifierKey => "ReleasingModifierKey",
            Phase::Cleanup => "Cleanup",
        };
        f.write_str(name)
    }
}

/// How a crafting run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A rebuilt queue came back empty: nothing left to craft
    Completed { cycles: u32 },

    /// Work remained after the last allowed cycle
    Exhausted { cycles: u32, remaining: usize },

    /// A cycle left the queue unchanged, so another pass would repeat it
    Stalled { cycles: u32, remaining: usize },

    /// Stopped by a stop or emergency command
    Cancelled,

    /// The control logic itself failed
    Faulted(String),
}

impl RunOutcome {
    /// Runs that ended on their own count as successful, even with work left over.
    pub fn is_success(&self) -> bool {
        !matches!(self, RunOutcome::Cancelled | RunOutcome::Faulted(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Completed { .. } => "completed",
            RunOutcome::Exhausted { .. } => "exhausted",
            RunOutcome::Stalled { .. } => "stalled",
            RunOutcome::Cancelled => "cancelled",
            RunOutcome::Faulted(_) => "faulted",
        }
    }
}

/// Single source of truth for the plugin's runtime state.
///
/// Wrapped in `Arc<RwLock<AppState>>` by [`crate::state::StateManager`]; all
/// mutation goes through the manager so change events are emitted.
#[derive(Clone, Debug)]
pub struct AppState {
    pub settings: CraftingSettings,

    // Runtime state
    pub is_running: bool,
    pub phase: Phase,
    pub cycle: u32,

    // Progress of the current cycle
    pub queue_len: usize,
    pub current_item: Option<usize>,

    // Results of the current run
    pub applied_items: usize,
    pub skipped_items: usize,
    pub last_outcome: Option<RunOutcome>,
    pub last_error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            settings: CraftingSettings::default(),
            is_running: false,
            phase: Phase::Idle,
            cycle: 0,
            queue_len: 0,
            current_item: None,
            applied_items: 0,
            skipped_items: 0,
            last_outcome: None,
            last_error: None,
        }
    }
}

impl AppState {
    /// Reset everything tied to a run, keeping settings.
    pub fn reset_run_state(&mut self) {
        self.is_running = false;
        self.phase = Phase::Idle;
        self.cycle = 0;
        self.queue_len = 0;
        self.current_item = None;
        self.applied_items = 0;
        self.skipped_items = 0;
        self.last_outcome = None;
        self.last_error = None;
    }

    /// Short status line for hosts that show one
    pub fn status_summary(&self) -> String {
        if self.is_running {
            match self.current_item {
                Some(index) => format!(
                    "Crafting item {}/{} (cycle {})",
                    index + 1,
                    self.queue_len,
                    self.cycle
                ),
                None => format!("{} (cycle {})", self.phase, self.cycle),
            }
        } else if let Some(outcome) = &self.last_outcome {
            format!(
                "Last run {}: {} applied, {} skipped",
                outcome.label(),
                self.applied_items,
                self.skipped_items
            )
        } else {
            "Ready".to_string()
        }
    }
}
