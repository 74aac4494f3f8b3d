use crate::host::SnapshotProvider;
use crate::models::{InventoryEntity, Point, StashEntry};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// On-disk form of a captured snapshot (`Inventory Snapshot.yaml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(rename = "Window Origin", default)]
    pub window_origin: Point,

    #[serde(rename = "Inventory", default)]
    pub inventory: Vec<InventoryEntity>,

    #[serde(rename = "Currency Stash", default)]
    pub currency_stash: Vec<StashEntry>,
}

#[derive(Debug, Clone)]
struct Contents {
    inventory: Option<Vec<InventoryEntity>>,
    currency_stash: Option<Vec<StashEntry>>,
    window_origin: Point,
    ready: bool,
}

/// In-memory snapshot provider.
///
/// Serves the same data on every read until it is replaced, which makes it a
/// stand-in for the host in dry runs and tests.
#[derive(Debug)]
pub struct StaticSnapshot {
    contents: RwLock<Contents>,
}

impl StaticSnapshot {
    pub fn new(inventory: Vec<InventoryEntity>, currency_stash: Vec<StashEntry>) -> Self {
        Self {
            contents: RwLock::new(Contents {
                inventory: Some(inventory),
                currency_stash: Some(currency_stash),
                window_origin: Point::default(),
                ready: true,
            }),
        }
    }

    /// A provider whose inventory and stash report as not loaded
    pub fn unavailable() -> Self {
        Self {
            contents: RwLock::new(Contents {
                inventory: None,
                currency_stash: None,
                window_origin: Point::default(),
                ready: true,
            }),
        }
    }

    pub fn from_file(file: SnapshotFile) -> Self {
        let snapshot = Self::new(file.inventory, file.currency_stash);
        snapshot.set_window_origin(file.window_origin);
        snapshot
    }

    pub fn with_window_origin(self, origin: Point) -> Self {
        self.set_window_origin(origin);
        self
    }

    pub fn set_window_origin(&self, origin: Point) {
        self.write(|c| c.window_origin = origin);
    }

    pub fn set_inventory(&self, inventory: Option<Vec<InventoryEntity>>) {
        self.write(|c| c.inventory = inventory);
    }

    pub fn set_currency_stash(&self, stash: Option<Vec<StashEntry>>) {
        self.write(|c| c.currency_stash = stash);
    }

    pub fn set_ready(&self, ready: bool) {
        self.write(|c| c.ready = ready);
    }

    fn write(&self, f: impl FnOnce(&mut Contents)) {
        let mut contents = self.contents.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut contents);
    }

    fn read<R>(&self, f: impl FnOnce(&Contents) -> R) -> R {
        let contents = self.contents.read().unwrap_or_else(PoisonError::into_inner);
        f(&contents)
    }
}

impl SnapshotProvider for StaticSnapshot {
    fn inventory_items(&self) -> Option<Vec<InventoryEntity>> {
        self.read(|c| c.inventory.clone())
    }

    fn currency_stash(&self) -> Option<Vec<StashEntry>> {
        self.read(|c| c.currency_stash.clone())
    }

    fn window_origin(&self) -> Point {
        self.read(|c| c.window_origin)
    }

    fn crafting_ready(&self) -> bool {
        self.read(|c| c.ready)
    }
}
