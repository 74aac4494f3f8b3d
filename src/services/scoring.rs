//! Waystone quality scoring.
//!
//! A score is a weighted sum over the Waystone's modifier rolls. Any modifier
//! whose display name contains a banned substring zeroes the whole score.

use crate::models::{InventoryEntity, Modifier, ScoreSettings};

/// Parse the comma separated banned modifier list: trimmed, lower-cased, empties dropped.
pub fn parse_banned_modifiers(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Per-category totals collected from one Waystone's modifiers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub quantity: i32,
    pub rarity: i32,
    pub pack_size: i32,
    pub magic_pack_size: i32,
    pub extra_packs_percent: i32,
    pub extra_magic_pack: i32,
    pub extra_rare_pack: i32,
    pub additional_packs: i32,
    pub extra_rare_monster_modifier: bool,
}

impl ScoreBreakdown {
    fn accumulate(&mut self, modifier: &Modifier) {
        let first = modifier.value(0);
        let second = modifier.value(1);
        match modifier.internal_name.as_str() {
            "MapDroppedItemRarityIncrease" => add(&mut self.rarity, first),
            "MapDroppedItemQuantityIncrease" => {
                add(&mut self.quantity, first);
                add(&mut self.rarity, second);
            }
            "MapRareMonstersAdditionalModifier" => self.extra_rare_monster_modifier = true,
            "MapPackSizeIncrease" => add(&mut self.pack_size, first),
            "MapMagicPackSizeIncrease" => add(&mut self.magic_pack_size, first),
            "MapTotalEffectivenessIncrease" => add(&mut self.extra_packs_percent, first),
            "MapMagicPackIncrease" => add(&mut self.extra_magic_pack, first),
            "MapMagicRarePackIncrease" => {
                add(&mut self.extra_rare_pack, first);
                add(&mut self.extra_magic_pack, second);
            }
            "MapRarePackIncrease" => add(&mut self.extra_rare_pack, first),
            name if name.starts_with("MapMonsterAdditionalPacks") => {
                add(&mut self.additional_packs, first)
            }
            _ => {}
        }
    }

    /// Weighted total. Saturates at the `i32` bounds instead of overflowing.
    fn weighted(&self, weights: &ScoreSettings) -> i32 {
        let terms = [
            (self.quantity, weights.per_quantity),
            (self.rarity, weights.per_rarity),
            (self.pack_size, weights.per_pack_size),
            (self.magic_pack_size, weights.per_magic_pack_size),
            (self.extra_packs_percent, weights.per_extra_packs_percent),
            (self.extra_magic_pack, weights.per_extra_magic_pack),
            (self.extra_rare_pack, weights.per_extra_rare_pack),
            (self.additional_packs, weights.per_additional_pack),
        ];

        let mut score = terms
            .into_iter()
            .fold(0i32, |total, (value, weight)| {
                total.saturating_add(value.saturating_mul(weight))
            });

        if self.extra_rare_monster_modifier {
            score = score.saturating_add(weights.extra_rare_monster_modifier);
        }

        score
    }
}

fn add(total: &mut i32, value: i32) {
    *total = total.saturating_add(value);
}

/// Scores Waystones with a fixed set of weights.
///
/// The banned list is parsed once on construction and again only on
/// [`reload`](Self::reload), never per score call.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    weights: ScoreSettings,
    banned: Vec<String>,
}

impl ScoreEngine {
    pub fn new(settings: &ScoreSettings) -> Self {
        Self {
            weights: settings.clone(),
            banned: parse_banned_modifiers(&settings.banned_modifiers),
        }
    }

    /// Pick up changed weights and re-parse the banned list.
    pub fn reload(&mut self, settings: &ScoreSettings) {
        self.weights = settings.clone();
        self.banned = parse_banned_modifiers(&settings.banned_modifiers);
        tracing::debug!("Score settings reloaded, {} banned modifiers", self.banned.len());
    }

    pub fn banned_modifiers(&self) -> &[String] {
        &self.banned
    }

    pub fn is_banned(&self, display_name: &str) -> bool {
        if self.banned.is_empty() {
            return false;
        }
        let name = display_name.to_lowercase();
        self.banned.iter().any(|banned| name.contains(banned.as_str()))
    }

    /// Category totals, or `None` when the entity scores 0 outright
    /// (not a Waystone, no mods, below minimum tier, or a banned modifier).
    pub fn breakdown(&self, entity: &InventoryEntity) -> Option<ScoreBreakdown> {
        let mods = entity.mods.as_ref()?;
        let tier = entity.category.tier()?;

        if tier < self.weights.minimum_tier {
            return None;
        }

        let mut breakdown = ScoreBreakdown::default();
        for modifier in &mods.modifiers {
            if self.is_banned(&modifier.display_name) {
                tracing::debug!(
                    "Banned modifier '{}' on {}",
                    modifier.display_name,
                    entity.display_label()
                );
                return None;
            }
            breakdown.accumulate(modifier);
        }

        Some(breakdown)
    }

    pub fn score(&self, entity: &InventoryEntity) -> i32 {
        self.breakdown(entity)
            .map(|b| b.weighted(&self.weights))
            .unwrap_or(0)
    }
}
