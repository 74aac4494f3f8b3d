//! Services module - the crafting decision logic.
//!
//! Everything here is a pure function of a snapshot and the settings. Nothing
//! touches input, timers or the runtime, so the whole decision path can be
//! tested without a host.
//!
//! # Components
//!
//! - [`is_craftable`]: eligibility filter (components, rarity, corruption, category)
//! - [`select_currency`]: picks the single next currency from the decision tables
//! - [`WorkQueue`]: runs both over a snapshot and drops disabled currencies
//! - [`ScoreEngine`]: weighted Waystone scoring with a banned modifier veto
//!
//! # Flow
//!
//! ```ignore
//! use autocraft::services::WorkQueue;
//!
//! let queue = WorkQueue::build(&provider, &settings)?;
//! for item in queue.items() {
//!     println!("{} -> {}", item.currency, item.target);
//! }
//! ```

pub mod currency_selector;
pub mod eligibility;
pub mod scoring;
pub mod work_queue;

pub use currency_selector::{select_currency, tablet_mod_count, waystone_mod_count};
pub use eligibility::is_craftable;
pub use scoring::{ScoreBreakdown, ScoreEngine, parse_banned_modifiers};
pub use work_queue::{QueueError, QueueSignature, WorkItem, WorkQueue};
