//! Decides whether an inventory object is a legal crafting target.

use crate::models::{Category, InventoryEntity, Rarity};

/// Returns true when `entity` may be upgraded in the current mode.
///
/// Rules are checked in order and the first failing rule disqualifies:
/// 1. both the mods and base components must be present
/// 2. uniques are never crafted
/// 3. corrupted items are terminal
/// 4. only Waystones and Tablets are crafted
/// 5. rarity gate: Waystones accept Normal/Magic/Rare (Normal/Rare in
///    alchemy-only mode), Tablets accept Normal/Magic
pub fn is_craftable(entity: &InventoryEntity, alchemy_only: bool) -> bool {
    let Some((mods, base)) = entity.components() else {
        return false;
    };

    if mods.rarity == Rarity::Unique {
        return false;
    }

    if base.corrupted {
        return false;
    }

    match entity.category {
        Category::Waystone { .. } => match mods.rarity {
            Rarity::Normal | Rarity::Rare => true,
            Rarity::Magic => !alchemy_only,
            Rarity::Unique => false,
        },
        Category::Tablet => matches!(mods.rarity, Rarity::Normal | Rarity::Magic),
        Category::Other => false,
    }
}
