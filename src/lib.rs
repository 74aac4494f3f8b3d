// AutoCraft - automated Waystone and Tablet crafting
//
// This is the library crate containing the decision logic, the execution engine
// and the host contracts. The binary crate (main.rs) provides a headless dry run.

pub mod config;
pub mod engine;
pub mod host;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use engine::{CraftingContext, CraftingController, CraftingEngine};
pub use host::{InputDriver, SnapshotProvider};
pub use metrics::Metrics;
pub use models::{AppState, CraftingSettings, Currency, RunOutcome};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
