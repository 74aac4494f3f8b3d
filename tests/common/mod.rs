// Shared fixtures for integration tests
//
// `simulated_game` returns a snapshot provider and an input driver backed by
// the same little world: right-clicking a stash slot picks up that currency,
// left-clicking an item applies it. Items really change between queue
// builds, so multi-cycle runs can be tested end to end.

#![allow(dead_code)]

use autocraft::host::{HostError, InputDriver, InputEvent, Key, MouseButton, SnapshotProvider};
use autocraft::models::{
    BaseItem, Category, Currency, InventoryEntity, ItemMods, Modifier, Point, Rarity, StashEntry,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

pub const STASH_ROW_Y: f32 = 200.0;

#[derive(Debug, Default)]
pub struct World {
    pub items: Vec<InventoryEntity>,
    pub stash: Vec<StashEntry>,
    pub origin: Point,
    pub cursor: Point,
    pub held: BTreeSet<Key>,
    pub carried: Option<Currency>,
    pub events: Vec<InputEvent>,
    pub not_ready: bool,
}

impl World {
    pub fn clicks(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, InputEvent::Click(_)))
            .count()
    }

    /// Key and click events only, without cursor moves
    pub fn key_and_click_events(&self) -> Vec<InputEvent> {
        self.events
            .iter()
            .filter(|e| !matches!(e, InputEvent::Move(_)))
            .copied()
            .collect()
    }

    fn client_cursor(&self) -> Point {
        Point::new(self.cursor.x - self.origin.x, self.cursor.y - self.origin.y)
    }

    fn pick_up(&mut self) {
        let at = self.client_cursor();
        self.carried = self
            .stash
            .iter()
            .find(|entry| entry.position == at)
            .and_then(|entry| entry.path.rsplit('/').next())
            .and_then(Currency::from_internal_name);
    }

    fn apply_carried(&mut self) {
        let Some(currency) = self.carried else {
            return;
        };
        if !self.held.contains(&Key::Shift) {
            self.carried = None;
        }

        let at = self.client_cursor();
        let Some(item) = self.items.iter_mut().find(|e| e.position == at) else {
            return;
        };
        let next_mod = item.mods.as_ref().map_or(0, |m| m.modifiers.len());
        let Some(mods) = item.mods.as_mut() else {
            return;
        };

        match (currency, mods.rarity) {
            (Currency::Transmute, Rarity::Normal) => {
                mods.rarity = Rarity::Magic;
                mods.modifiers.push(rolled_mod(next_mod));
            }
            (Currency::Augment, Rarity::Magic) | (Currency::Exalt, Rarity::Rare) => {
                mods.modifiers.push(rolled_mod(next_mod));
            }
            (Currency::Regal, Rarity::Magic) => {
                mods.rarity = Rarity::Rare;
                mods.modifiers.push(rolled_mod(next_mod));
            }
            (Currency::Alchemy, Rarity::Normal) => {
                mods.rarity = Rarity::Rare;
                for i in 0..4 {
                    mods.modifiers.push(rolled_mod(next_mod + i));
                }
            }
            (Currency::Corrupt, _) => {
                if let Some(base) = item.base.as_mut() {
                    base.corrupted = true;
                }
            }
            _ => {}
        }
    }
}

fn rolled_mod(index: usize) -> Modifier {
    if index % 2 == 0 {
        Modifier::new(
            "MapDroppedItemQuantityIncrease",
            "Hungering",
            &[10 + index as i32],
        )
    } else {
        Modifier::new("MapPackSizeIncrease", "of Bounty", &[5])
    }
}

#[derive(Clone)]
pub struct GameView(Arc<Mutex<World>>);

#[derive(Clone)]
pub struct GameInput(Arc<Mutex<World>>);

#[derive(Clone)]
pub struct Game(Arc<Mutex<World>>);

impl Game {
    pub fn world(&self) -> MutexGuard<'_, World> {
        self.0.lock().unwrap()
    }
}

/// Build a world with `items`, a full currency tab and the given window origin
pub fn simulated_game(items: Vec<InventoryEntity>, origin: Point) -> (GameView, GameInput, Game) {
    let world = Arc::new(Mutex::new(World {
        items,
        stash: full_stash(),
        origin,
        cursor: Point::new(5.0, 5.0),
        ..World::default()
    }));

    (
        GameView(Arc::clone(&world)),
        GameInput(Arc::clone(&world)),
        Game(world),
    )
}

pub fn full_stash() -> Vec<StashEntry> {
    Currency::ALL
        .iter()
        .enumerate()
        .map(|(i, currency)| StashEntry {
            path: format!("Metadata/Items/Currency/{}", currency.internal_name()),
            position: Point::new(40.0 + 50.0 * i as f32, STASH_ROW_Y),
        })
        .collect()
}

pub fn waystone(tier: i32, rarity: Rarity, mods: usize, slot: usize) -> InventoryEntity {
    InventoryEntity {
        path: format!("Metadata/Items/Maps/WaystoneTier{}", tier),
        category: Category::Waystone { tier },
        mods: Some(ItemMods {
            rarity,
            identified: true,
            modifiers: (0..mods).map(rolled_mod).collect(),
        }),
        base: Some(BaseItem {
            class_name: "Map".to_string(),
            corrupted: false,
        }),
        position: inventory_slot(slot),
    }
}

pub fn tablet(rarity: Rarity, mods: usize, slot: usize) -> InventoryEntity {
    InventoryEntity {
        path: "Metadata/Items/TowerAugment/Tablet".to_string(),
        category: Category::Tablet,
        mods: Some(ItemMods {
            rarity,
            identified: true,
            modifiers: (0..mods).map(rolled_mod).collect(),
        }),
        base: Some(BaseItem {
            class_name: "TowerAugmentation".to_string(),
            corrupted: false,
        }),
        position: inventory_slot(slot),
    }
}

pub fn inventory_slot(slot: usize) -> Point {
    Point::new(1300.0 + 53.0 * slot as f32, 620.0)
}

impl SnapshotProvider for GameView {
    fn inventory_items(&self) -> Option<Vec<InventoryEntity>> {
        Some(self.0.lock().unwrap().items.clone())
    }

    fn currency_stash(&self) -> Option<Vec<StashEntry>> {
        Some(self.0.lock().unwrap().stash.clone())
    }

    fn window_origin(&self) -> Point {
        self.0.lock().unwrap().origin
    }

    fn crafting_ready(&self) -> bool {
        !self.0.lock().unwrap().not_ready
    }
}

impl InputDriver for GameInput {
    fn key_down(&mut self, key: Key) -> Result<(), HostError> {
        let mut world = self.0.lock().unwrap();
        world.held.insert(key);
        world.events.push(InputEvent::KeyDown(key));
        Ok(())
    }

    fn key_up(&mut self, key: Key) -> Result<(), HostError> {
        let mut world = self.0.lock().unwrap();
        world.held.remove(&key);
        world.events.push(InputEvent::KeyUp(key));
        Ok(())
    }

    fn move_cursor(&mut self, position: Point) -> Result<(), HostError> {
        let mut world = self.0.lock().unwrap();
        world.cursor = position;
        world.events.push(InputEvent::Move(position));
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> Result<(), HostError> {
        let mut world = self.0.lock().unwrap();
        world.events.push(InputEvent::Click(button));
        match button {
            MouseButton::Right => world.pick_up(),
            MouseButton::Left => world.apply_carried(),
        }
        Ok(())
    }

    fn cursor_position(&self) -> Point {
        self.0.lock().unwrap().cursor
    }
}
