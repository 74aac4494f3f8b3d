use serde::{Deserialize, Serialize};
use std::ops::Add;

/// Modifier group used by delirium stack counters. These never count towards mod-count.
pub const DELIRIUM_STACK_GROUP: &str = "AfflictionMapDeliriumStacks";

/// Substring of the base item class name that identifies Precursor Tablets.
pub const TABLET_CLASS_MARKER: &str = "TowerAugment";

/// A 2D screen position in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.0}, {:.0})", self.x, self.y)
    }
}

/// Item rarity as reported by the mods component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Normal,
    Magic,
    Rare,
    Unique,
}

/// Item category, resolved once when the snapshot is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Category {
    Waystone { tier: i32 },
    Tablet,
    Other,
}

impl Category {
    /// Resolve the category from the raw component data.
    ///
    /// A map tier marks a Waystone; otherwise a base class name containing
    /// `TowerAugment` (any case) marks a Tablet.
    pub fn resolve(map_tier: Option<i32>, class_name: &str) -> Self {
        if let Some(tier) = map_tier {
            return Category::Waystone { tier };
        }

        if class_name
            .to_ascii_lowercase()
            .contains(&TABLET_CLASS_MARKER.to_ascii_lowercase())
        {
            Category::Tablet
        } else {
            Category::Other
        }
    }

    pub fn tier(&self) -> Option<i32> {
        match self {
            Category::Waystone { tier } => Some(*tier),
            _ => None,
        }
    }
}

/// A single rolled modifier on an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    /// Internal key, e.g. `MapDroppedItemQuantityIncrease`
    pub internal_name: String,

    /// Display name, e.g. `of Bounty`. Suffixes start with "of".
    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub group: String,

    #[serde(default)]
    pub values: Vec<i32>,
}

impl Modifier {
    pub fn new(internal_name: &str, display_name: &str, values: &[i32]) -> Self {
        Self {
            internal_name: internal_name.to_string(),
            display_name: display_name.to_string(),
            group: String::new(),
            values: values.to_vec(),
        }
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = group.to_string();
        self
    }

    pub fn is_delirium_stack(&self) -> bool {
        self.group == DELIRIUM_STACK_GROUP
    }

    pub fn is_suffix(&self) -> bool {
        self.display_name
            .get(..2)
            .is_some_and(|head| head.eq_ignore_ascii_case("of"))
    }

    /// Value at `index`, or 0 when the modifier carries fewer values.
    pub fn value(&self, index: usize) -> i32 {
        self.values.get(index).copied().unwrap_or(0)
    }
}

/// The mods component: rarity, identification state and rolled modifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemMods {
    pub rarity: Rarity,

    #[serde(default = "default_identified")]
    pub identified: bool,

    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

fn default_identified() -> bool {
    true
}

/// The base item component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseItem {
    #[serde(default)]
    pub class_name: String,

    #[serde(default)]
    pub corrupted: bool,
}

/// Read-only record of one inventory object at the moment the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntity {
    /// Metadata path of the item, used for logging
    #[serde(default)]
    pub path: String,

    pub category: Category,

    #[serde(default)]
    pub mods: Option<ItemMods>,

    #[serde(default)]
    pub base: Option<BaseItem>,

    /// Centre of the inventory slot, client-relative
    pub position: Point,
}

impl InventoryEntity {
    /// Both components, or `None` for objects that are not recognised items.
    pub fn components(&self) -> Option<(&ItemMods, &BaseItem)> {
        Some((self.mods.as_ref()?, self.base.as_ref()?))
    }

    pub fn rarity(&self) -> Option<Rarity> {
        self.mods.as_ref().map(|m| m.rarity)
    }

    pub fn is_identified(&self) -> bool {
        self.mods.as_ref().is_some_and(|m| m.identified)
    }

    pub fn is_corrupted(&self) -> bool {
        self.base.as_ref().is_some_and(|b| b.corrupted)
    }

    pub fn modifiers(&self) -> &[Modifier] {
        self.mods.as_ref().map(|m| m.modifiers.as_slice()).unwrap_or(&[])
    }

    pub fn display_label(&self) -> &str {
        if self.path.is_empty() {
            "<unnamed item>"
        } else {
            &self.path
        }
    }
}

/// One visible slot in the currency stash tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StashEntry {
    /// Metadata path, e.g. `Metadata/Items/Currency/CurrencyUpgradeToMagic`
    pub path: String,
    pub position: Point,
}
