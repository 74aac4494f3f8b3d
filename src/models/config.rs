use crate::models::currency::CurrencyEnablement;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound shared by every delay setting, in milliseconds
pub const MAX_DELAY_MS: u64 = 2000;

/// Crafting settings from `AutoCraft Settings.yaml`
///
/// Key names match the labels of the in-game settings menu so the file stays
/// readable for users editing it by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CraftingSettings {
    /// Delay between currency and item clicks
    #[serde(rename = "Click Delay", default = "default_click_delay")]
    pub click_delay_ms: u64,

    /// Delay after each applied currency, giving the game time to process the result
    #[serde(rename = "Extra Delay", default = "default_extra_delay")]
    pub extra_delay_ms: u64,

    /// Pause after pressing the modifier key before the first click
    #[serde(rename = "Modifier Settle Delay", default = "default_settle_delay")]
    pub modifier_settle_ms: u64,

    /// Jump Normal Waystones straight to Rare with Alchemy
    #[serde(rename = "Alchemy Craft Only", default)]
    pub alchemy_only: bool,

    #[serde(rename = "Currency Enabled", default)]
    pub currency_enabled: CurrencyEnablement,

    /// Upper bound on build/apply cycles per run
    #[serde(rename = "Max Cycles", default = "default_max_cycles")]
    pub max_cycles: u32,

    #[serde(rename = "Debug Logging", default)]
    pub debug_enabled: bool,

    #[serde(rename = "Score Settings", default)]
    pub score: ScoreSettings,
}

impl Default for CraftingSettings {
    fn default() -> Self {
        Self {
            click_delay_ms: default_click_delay(),
            extra_delay_ms: default_extra_delay(),
            modifier_settle_ms: default_settle_delay(),
            alchemy_only: false,
            currency_enabled: CurrencyEnablement::default(),
            max_cycles: default_max_cycles(),
            debug_enabled: false,
            score: ScoreSettings::default(),
        }
    }
}

fn default_click_delay() -> u64 {
    100
}

fn default_extra_delay() -> u64 {
    100
}

fn default_settle_delay() -> u64 {
    50
}

fn default_max_cycles() -> u32 {
    3
}

impl CraftingSettings {
    pub fn click_delay(&self) -> Duration {
        Duration::from_millis(self.click_delay_ms)
    }

    pub fn extra_delay(&self) -> Duration {
        Duration::from_millis(self.extra_delay_ms)
    }

    pub fn modifier_settle(&self) -> Duration {
        Duration::from_millis(self.modifier_settle_ms)
    }

    /// Clamp every value into its allowed range.
    ///
    /// Out-of-range values are logged and replaced, never rejected, so a
    /// hand-edited file cannot stop the plugin from loading.
    pub fn validated(mut self) -> Self {
        for (label, value) in [
            ("Click Delay", &mut self.click_delay_ms),
            ("Extra Delay", &mut self.extra_delay_ms),
            ("Modifier Settle Delay", &mut self.modifier_settle_ms),
        ] {
            if *value > MAX_DELAY_MS {
                tracing::warn!(
                    "{} of {}ms exceeds {}ms, clamping",
                    label,
                    value,
                    MAX_DELAY_MS
                );
                *value = MAX_DELAY_MS;
            }
        }

        if self.max_cycles == 0 {
            tracing::warn!("Max Cycles of 0 is not allowed, using 1");
            self.max_cycles = 1;
        }

        if self.score.minimum_tier < 0 {
            tracing::warn!("Minimum Tier {} is negative, using 0", self.score.minimum_tier);
            self.score.minimum_tier = 0;
        }

        self
    }
}

/// Waystone scoring coefficients and the banned modifier list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSettings {
    #[serde(rename = "Minimum Tier", default = "default_minimum_tier")]
    pub minimum_tier: i32,

    #[serde(rename = "Score Per Quantity", default = "default_weight")]
    pub per_quantity: i32,

    #[serde(rename = "Score Per Rarity", default = "default_weight")]
    pub per_rarity: i32,

    #[serde(rename = "Score Per Pack Size", default = "default_weight")]
    pub per_pack_size: i32,

    #[serde(rename = "Score Per Magic Pack Size", default = "default_weight")]
    pub per_magic_pack_size: i32,

    #[serde(rename = "Score Per Extra Packs Percent", default = "default_weight")]
    pub per_extra_packs_percent: i32,

    #[serde(rename = "Score Per Extra Magic Pack", default = "default_weight")]
    pub per_extra_magic_pack: i32,

    #[serde(rename = "Score Per Extra Rare Pack", default = "default_weight")]
    pub per_extra_rare_pack: i32,

    #[serde(rename = "Score Per Additional Pack", default = "default_weight")]
    pub per_additional_pack: i32,

    #[serde(
        rename = "Score For Extra Rare Monster Modifier",
        default = "default_rare_modifier_bonus"
    )]
    pub extra_rare_monster_modifier: i32,

    /// Comma separated, matched case-insensitively against display names
    #[serde(rename = "Banned Modifiers", default)]
    pub banned_modifiers: String,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            minimum_tier: default_minimum_tier(),
            per_quantity: default_weight(),
            per_rarity: default_weight(),
            per_pack_size: default_weight(),
            per_magic_pack_size: default_weight(),
            per_extra_packs_percent: default_weight(),
            per_extra_magic_pack: default_weight(),
            per_extra_rare_pack: default_weight(),
            per_additional_pack: default_weight(),
            extra_rare_monster_modifier: default_rare_modifier_bonus(),
            banned_modifiers: String::new(),
        }
    }
}

fn default_minimum_tier() -> i32 {
    1
}

fn default_weight() -> i32 {
    1
}

fn default_rare_modifier_bonus() -> i32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Currency;

    #[test]
    fn test_crafting_settings_defaults() {
        let settings = CraftingSettings::default();
        assert_eq!(settings.click_delay_ms, 100);
        assert_eq!(settings.extra_delay_ms, 100);
        assert_eq!(settings.modifier_settle_ms, 50);
        assert_eq!(settings.max_cycles, 3);
        assert!(!settings.alchemy_only);
        assert!(settings.currency_enabled.is_enabled(Currency::Corrupt));
    }

    #[test]
    fn test_validated_clamps_out_of_range() {
        let settings = CraftingSettings {
            click_delay_ms: 5000,
            extra_delay_ms: 2000,
            max_cycles: 0,
            ..CraftingSettings::default()
        }
        .validated();

        assert_eq!(settings.click_delay_ms, MAX_DELAY_MS);
        assert_eq!(settings.extra_delay_ms, 2000);
        assert_eq!(settings.max_cycles, 1);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "Click Delay: 40\nAlchemy Craft Only: true\nCurrency Enabled:\n  CurrencyCorrupt: false\n";
        let settings: CraftingSettings = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(settings.click_delay_ms, 40);
        assert_eq!(settings.extra_delay_ms, 100);
        assert!(settings.alchemy_only);
        assert!(!settings.currency_enabled.is_enabled(Currency::Corrupt));
        assert!(settings.currency_enabled.is_enabled(Currency::Exalt));
        assert_eq!(settings.score, ScoreSettings::default());
    }
}
