//! Execution engine - turns a work queue into key and mouse input.
//!
//! [`CraftingEngine`] is an explicit state machine that performs one input
//! action per step. The [`scheduler`] drives it on tokio, inserting the
//! configured waits and racing each one against a cancel signal, and
//! [`CraftingController`] exposes the start/stop/emergency commands to the
//! host.
//!
//! ```ignore
//! let ctx = CraftingContext::new(provider, input, StateManager::new());
//! let controller = CraftingController::new(ctx, runtime.handle().clone());
//!
//! controller.start();
//! let outcome = controller.wait().await;
//! ```

pub mod machine;
pub mod scheduler;

pub use machine::{CraftingContext, CraftingEngine, CraftingError, Step, release_all_keys};
pub use scheduler::{
    CRAFTING_TASK_NAME, CraftingController, Delay, InstantDelay, TaskRegistry, TokioDelay, drive,
};
