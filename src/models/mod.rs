//! Data models for the AutoCraft engine.
//!
//! - [`InventoryEntity`] and friends: the read-only snapshot records handed over by the host
//! - [`Currency`] / [`CurrencyEnablement`]: the six upgrade operations and the user's toggles
//! - [`CraftingSettings`] / [`ScoreSettings`]: settings loaded from `AutoCraft Settings.yaml`
//! - [`AppState`]: runtime state owned by [`StateManager`](crate::state::StateManager)
//!
//! Snapshot records are never mutated by the engine; a fresh snapshot is read
//! for every work queue build.

pub mod app_state;
pub mod config;
pub mod currency;
pub mod item;

pub use app_state::{AppState, MAX_CONCURRENT_ENGINES, Phase, RunOutcome};
pub use config::{CraftingSettings, ScoreSettings};
pub use currency::{Currency, CurrencyEnablement};
pub use item::{
    BaseItem, Category, InventoryEntity, ItemMods, Modifier, Point, Rarity, StashEntry,
};
