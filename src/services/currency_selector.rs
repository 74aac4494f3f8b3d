//! Picks the next upgrade currency for an eligible item.
//!
//! The decision tables are evaluated top to bottom and the first matching row
//! wins. Items that match no row are left alone for this cycle and looked at
//! again on the next build, since their state (identification, rarity) may
//! change in between.
//!
//! | Category | Mode | Rarity | Condition | Currency |
//! |---|---|---|---|---|
//! | Waystone | default | Normal | | Transmute |
//! | Waystone | default | Magic | mods < 2 | Augment |
//! | Waystone | default | Magic | mods ≥ 2, tier ≥ 10 | Regal |
//! | Waystone | default | Rare | mods < 6, tier ≥ 12, enabled | Exalt |
//! | Waystone | default | Rare | mods == 6, enabled | Corrupt |
//! | Waystone | alchemy | Normal | | Alchemy |
//! | Waystone | alchemy | Rare | mods < 6, enabled | Exalt |
//! | Waystone | alchemy | Rare | mods == 6, enabled | Corrupt |
//! | Tablet | any | Normal | | Transmute |
//! | Tablet | any | Magic | mods < 2 | Augment |

use crate::models::{Category, Currency, CurrencyEnablement, InventoryEntity, Modifier, Rarity};

/// Magic Waystones below this tier are left Magic instead of being regaled
pub const REGAL_MIN_TIER: i32 = 10;

/// Rare Waystones below this tier are not exalted in default mode
pub const EXALT_MIN_TIER: i32 = 12;

pub const MAGIC_MOD_LIMIT: usize = 2;
pub const RARE_MOD_LIMIT: usize = 6;

/// Prefix plus suffix count of a Waystone. Delirium stack counters are not prefixes.
pub fn waystone_mod_count(modifiers: &[Modifier]) -> usize {
    let suffixes = modifiers.iter().filter(|m| m.is_suffix()).count();
    let prefixes = modifiers
        .iter()
        .filter(|m| !m.is_suffix() && !m.is_delirium_stack())
        .count();

    prefixes + suffixes
}

/// Named modifiers on a Tablet, ignoring hidden ones and delirium stacks.
pub fn tablet_mod_count(modifiers: &[Modifier]) -> usize {
    modifiers
        .iter()
        .filter(|m| !m.display_name.is_empty() && !m.is_delirium_stack())
        .count()
}

/// Select the single next currency for `entity`, or `None`.
///
/// Unidentified items always get `None`.
pub fn select_currency(
    entity: &InventoryEntity,
    alchemy_only: bool,
    enablement: &CurrencyEnablement,
) -> Option<Currency> {
    let mods = entity.mods.as_ref()?;
    if !mods.identified {
        tracing::debug!("Skipping unidentified item: {}", entity.display_label());
        return None;
    }

    let selected = match entity.category {
        Category::Waystone { tier } => {
            let mod_count = waystone_mod_count(&mods.modifiers);
            tracing::debug!(
                "Waystone tier {} rarity {:?} with {} mods",
                tier,
                mods.rarity,
                mod_count
            );
            if alchemy_only {
                select_for_waystone_alchemy(mods.rarity, mod_count, enablement)
            } else {
                select_for_waystone(mods.rarity, tier, mod_count, enablement)
            }
        }
        Category::Tablet => {
            let mod_count = tablet_mod_count(&mods.modifiers);
            tracing::debug!("Tablet rarity {:?} with {} mods", mods.rarity, mod_count);
            select_for_tablet(mods.rarity, mod_count)
        }
        Category::Other => None,
    };

    if selected.is_none() {
        tracing::debug!("No suitable currency for {}", entity.display_label());
    }

    selected
}

fn select_for_waystone(
    rarity: Rarity,
    tier: i32,
    mod_count: usize,
    enablement: &CurrencyEnablement,
) -> Option<Currency> {
    match rarity {
        Rarity::Normal => Some(Currency::Transmute),
        Rarity::Magic if mod_count < MAGIC_MOD_LIMIT => Some(Currency::Augment),
        Rarity::Magic if tier >= REGAL_MIN_TIER => Some(Currency::Regal),
        Rarity::Rare
            if mod_count < RARE_MOD_LIMIT
                && tier >= EXALT_MIN_TIER
                && enablement.is_enabled(Currency::Exalt) =>
        {
            Some(Currency::Exalt)
        }
        Rarity::Rare if mod_count == RARE_MOD_LIMIT && enablement.is_enabled(Currency::Corrupt) => {
            Some(Currency::Corrupt)
        }
        _ => None,
    }
}

fn select_for_waystone_alchemy(
    rarity: Rarity,
    mod_count: usize,
    enablement: &CurrencyEnablement,
) -> Option<Currency> {
    match rarity {
        Rarity::Normal => Some(Currency::Alchemy),
        Rarity::Rare if mod_count < RARE_MOD_LIMIT && enablement.is_enabled(Currency::Exalt) => {
            Some(Currency::Exalt)
        }
        Rarity::Rare if mod_count == RARE_MOD_LIMIT && enablement.is_enabled(Currency::Corrupt) => {
            Some(Currency::Corrupt)
        }
        _ => None,
    }
}

fn select_for_tablet(rarity: Rarity, mod_count: usize) -> Option<Currency> {
    match rarity {
        Rarity::Normal => Some(Currency::Transmute),
        Rarity::Magic if mod_count < MAGIC_MOD_LIMIT => Some(Currency::Augment),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BaseItem, ItemMods, Point};
    use crate::models::item::DELIRIUM_STACK_GROUP;

    fn prefix(name: &str) -> Modifier {
        Modifier::new("MapPrefix", name, &[1])
    }

    fn suffix(name: &str) -> Modifier {
        Modifier::new("MapSuffix", name, &[1])
    }

    fn delirium() -> Modifier {
        Modifier::new("MapDeliriumStacks", "Delirious", &[1]).with_group(DELIRIUM_STACK_GROUP)
    }

    fn entity(category: Category, rarity: Rarity, modifiers: Vec<Modifier>) -> InventoryEntity {
        InventoryEntity {
            path: "Metadata/Items/Test".to_string(),
            category,
            mods: Some(ItemMods {
                rarity,
                identified: true,
                modifiers,
            }),
            base: Some(BaseItem::default()),
            position: Point::default(),
        }
    }

    fn waystone(tier: i32, rarity: Rarity, modifiers: Vec<Modifier>) -> InventoryEntity {
        entity(Category::Waystone { tier }, rarity, modifiers)
    }

    fn six_mods() -> Vec<Modifier> {
        vec![
            prefix("Hungering"),
            prefix("Teeming"),
            prefix("Armoured"),
            suffix("of Bounty"),
            suffix("of Frenzy"),
            suffix("of Giants"),
        ]
    }

    fn all_enabled() -> CurrencyEnablement {
        CurrencyEnablement::new()
    }

    #[test]
    fn test_waystone_mod_count_ignores_delirium_prefixes() {
        let mods = vec![prefix("Hungering"), suffix("of Bounty"), delirium()];
        assert_eq!(waystone_mod_count(&mods), 2);
    }

    #[test]
    fn test_tablet_mod_count_ignores_hidden_and_delirium() {
        let mods = vec![prefix("Hungering"), prefix(""), delirium()];
        assert_eq!(tablet_mod_count(&mods), 1);
    }

    #[test]
    fn test_normal_waystone_any_tier() {
        for tier in [1, 5, 10, 16] {
            let item = waystone(tier, Rarity::Normal, Vec::new());
            assert_eq!(
                select_currency(&item, false, &all_enabled()),
                Some(Currency::Transmute)
            );
            assert_eq!(
                select_currency(&item, true, &all_enabled()),
                Some(Currency::Alchemy)
            );
        }
    }

    #[test]
    fn test_magic_waystone() {
        let one_mod = waystone(5, Rarity::Magic, vec![prefix("Hungering")]);
        assert_eq!(
            select_currency(&one_mod, false, &all_enabled()),
            Some(Currency::Augment)
        );

        let two_mods_low_tier = waystone(9, Rarity::Magic, vec![prefix("Hungering"), suffix("of Bounty")]);
        assert_eq!(select_currency(&two_mods_low_tier, false, &all_enabled()), None);

        let two_mods_high_tier = waystone(10, Rarity::Magic, vec![prefix("Hungering"), suffix("of Bounty")]);
        assert_eq!(
            select_currency(&two_mods_high_tier, false, &all_enabled()),
            Some(Currency::Regal)
        );
    }

    #[test]
    fn test_magic_waystone_alchemy_mode_gets_nothing() {
        let item = waystone(15, Rarity::Magic, vec![prefix("Hungering"), suffix("of Bounty")]);
        assert_eq!(select_currency(&item, true, &all_enabled()), None);
    }

    #[test]
    fn test_rare_waystone_exalt_requires_tier_in_default_mode() {
        let mods = vec![prefix("Hungering"), suffix("of Bounty"), prefix("Teeming")];

        let low = waystone(11, Rarity::Rare, mods.clone());
        assert_eq!(select_currency(&low, false, &all_enabled()), None);

        let high = waystone(12, Rarity::Rare, mods.clone());
        assert_eq!(
            select_currency(&high, false, &all_enabled()),
            Some(Currency::Exalt)
        );

        // Alchemy mode exalts regardless of tier
        assert_eq!(
            select_currency(&low, true, &all_enabled()),
            Some(Currency::Exalt)
        );
    }

    #[test]
    fn test_full_rare_waystone_corrupt_toggle() {
        let item = waystone(14, Rarity::Rare, six_mods());

        assert_eq!(
            select_currency(&item, false, &all_enabled()),
            Some(Currency::Corrupt)
        );
        assert_eq!(
            select_currency(&item, true, &all_enabled()),
            Some(Currency::Corrupt)
        );

        let no_vaal: CurrencyEnablement = [(Currency::Corrupt, false)].into_iter().collect();
        assert_eq!(select_currency(&item, false, &no_vaal), None);
        assert_eq!(select_currency(&item, true, &no_vaal), None);
    }

    #[test]
    fn test_disabled_exalt_does_not_fall_through() {
        let item = waystone(14, Rarity::Rare, vec![prefix("Hungering")]);
        let no_exalt: CurrencyEnablement = [(Currency::Exalt, false)].into_iter().collect();

        assert_eq!(select_currency(&item, false, &no_exalt), None);
        assert_eq!(select_currency(&item, true, &no_exalt), None);
    }

    #[test]
    fn test_tablet_table_same_in_both_modes() {
        for alchemy_only in [false, true] {
            let normal = entity(Category::Tablet, Rarity::Normal, Vec::new());
            assert_eq!(
                select_currency(&normal, alchemy_only, &all_enabled()),
                Some(Currency::Transmute)
            );

            let magic = entity(Category::Tablet, Rarity::Magic, vec![prefix("Hungering")]);
            assert_eq!(
                select_currency(&magic, alchemy_only, &all_enabled()),
                Some(Currency::Augment)
            );

            let full = entity(
                Category::Tablet,
                Rarity::Magic,
                vec![prefix("Hungering"), suffix("of Bounty")],
            );
            assert_eq!(select_currency(&full, alchemy_only, &all_enabled()), None);
        }
    }

    #[test]
    fn test_unidentified_item_skipped() {
        let mut item = waystone(5, Rarity::Normal, Vec::new());
        if let Some(mods) = item.mods.as_mut() {
            mods.identified = false;
        }
        assert_eq!(select_currency(&item, false, &all_enabled()), None);
    }
}
