//! Contracts with the host application.
//!
//! The host owns the game process: it reads the inventory, finds the stash
//! tab, and turns key and mouse commands into real input. The engine only sees
//! these two traits:
//!
//! - [`SnapshotProvider`]: point-in-time reads of inventory and currency stash
//! - [`InputDriver`]: fire-and-forget keyboard and mouse commands
//!
//! [`StaticSnapshot`] and [`RecordingInput`] are in-crate implementations for
//! dry runs and tests.

pub mod recording;
pub mod static_snapshot;

pub use recording::{InputEvent, RecordingInput};
pub use static_snapshot::{SnapshotFile, StaticSnapshot};

use crate::models::{InventoryEntity, Point, StashEntry};
use thiserror::Error;

/// Errors reported by a host implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Input dispatch failed: {0}")]
    Dispatch(String),

    #[error("Host is not available")]
    Unavailable,
}

/// Keys the engine may press or has to release during cleanup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    LControl,
    RControl,
    Shift,
    LShift,
    RShift,
    Alt,
    LButton,
    RButton,
}

impl Key {
    /// The modifier held while applying currency, so one pickup can be reused
    pub const CRAFT_MODIFIER: Key = Key::Shift;

    /// Everything cleanup releases, whether or not it was pressed by us
    pub const ALL: [Key; 8] = [
        Key::LControl,
        Key::RControl,
        Key::Shift,
        Key::LShift,
        Key::RShift,
        Key::Alt,
        Key::LButton,
        Key::RButton,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

/// Read access to the live game state.
///
/// Every call returns a fresh snapshot; the source keeps changing between
/// calls, so callers must not assume two reads agree.
pub trait SnapshotProvider: Send + Sync {
    /// Player inventory, or `None` when the data is not ready
    fn inventory_items(&self) -> Option<Vec<InventoryEntity>>;

    /// Visible slots of the open currency stash tab, or `None` when not accessible
    fn currency_stash(&self) -> Option<Vec<StashEntry>>;

    /// Top-left corner of the game window on screen
    fn window_origin(&self) -> Point;

    /// Whether the inventory and stash panels are both open
    fn crafting_ready(&self) -> bool {
        true
    }

    /// Position of the first stash entry whose path ends with `name`.
    fn locate_currency_position(&self, name: &str) -> Option<Point> {
        let Some(stash) = self.currency_stash() else {
            tracing::warn!("Currency tab not accessible");
            return None;
        };

        stash
            .into_iter()
            .find(|entry| entry.path.ends_with(name))
            .map(|entry| entry.position)
    }
}

/// Simulated keyboard and mouse.
///
/// Commands are fire-and-forget: `Ok` only means the command was dispatched,
/// not that the game reacted to it.
#[cfg_attr(test, mockall::automock)]
pub trait InputDriver: Send {
    fn key_down(&mut self, key: Key) -> Result<(), HostError>;
    fn key_up(&mut self, key: Key) -> Result<(), HostError>;
    fn move_cursor(&mut self, position: Point) -> Result<(), HostError>;
    fn click(&mut self, button: MouseButton) -> Result<(), HostError>;
    fn cursor_position(&self) -> Point;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stash(Option<Vec<StashEntry>>);

    impl SnapshotProvider for Stash {
        fn inventory_items(&self) -> Option<Vec<InventoryEntity>> {
            Some(Vec::new())
        }

        fn currency_stash(&self) -> Option<Vec<StashEntry>> {
            self.0.clone()
        }

        fn window_origin(&self) -> Point {
            Point::default()
        }
    }

    #[test]
    fn test_locate_currency_matches_path_suffix() {
        let provider = Stash(Some(vec![
            StashEntry {
                path: "Metadata/Items/Currency/CurrencyUpgradeToMagicShard".to_string(),
                position: Point::new(1.0, 1.0),
            },
            StashEntry {
                path: "Metadata/Items/Currency/CurrencyUpgradeToMagic".to_string(),
                position: Point::new(2.0, 2.0),
            },
        ]));

        assert_eq!(
            provider.locate_currency_position("CurrencyUpgradeToMagic"),
            Some(Point::new(2.0, 2.0))
        );
        assert_eq!(provider.locate_currency_position("CurrencyCorrupt"), None);
    }

    #[test]
    fn test_locate_currency_without_stash() {
        let provider = Stash(None);
        assert_eq!(provider.locate_currency_position("CurrencyCorrupt"), None);
        assert!(provider.crafting_ready());
    }
}
