use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One of the six upgrade operations the engine knows how to apply.
///
/// Serialized by its internal name so the settings file matches the metadata
/// paths the stash reports (`.../CurrencyUpgradeToMagic`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "CurrencyUpgradeToMagic")]
    Transmute,
    #[serde(rename = "CurrencyAddModToMagic")]
    Augment,
    #[serde(rename = "CurrencyUpgradeMagicToRare")]
    Regal,
    #[serde(rename = "CurrencyUpgradeToRare")]
    Alchemy,
    #[serde(rename = "CurrencyAddModToRare")]
    Exalt,
    #[serde(rename = "CurrencyCorrupt")]
    Corrupt,
}

impl Currency {
    /// Every currency, in the order the settings UI lists them
    pub const ALL: [Currency; 6] = [
        Currency::Transmute,
        Currency::Augment,
        Currency::Regal,
        Currency::Alchemy,
        Currency::Exalt,
        Currency::Corrupt,
    ];

    /// Suffix of the stash metadata path for this currency
    pub fn internal_name(&self) -> &'static str {
        match self {
            Currency::Transmute => "CurrencyUpgradeToMagic",
            Currency::Augment => "CurrencyAddModToMagic",
            Currency::Regal => "CurrencyUpgradeMagicToRare",
            Currency::Alchemy => "CurrencyUpgradeToRare",
            Currency::Exalt => "CurrencyAddModToRare",
            Currency::Corrupt => "CurrencyCorrupt",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Currency::Transmute => "Orb of Transmutation",
            Currency::Augment => "Orb of Augmentation",
            Currency::Regal => "Regal Orb",
            Currency::Alchemy => "Alchemy Orb",
            Currency::Exalt => "Exalted Orb",
            Currency::Corrupt => "Vaal Orb",
        }
    }

    pub fn from_internal_name(name: &str) -> Option<Currency> {
        Currency::ALL
            .into_iter()
            .find(|c| c.internal_name() == name)
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// User toggles per currency. A currency without an entry counts as enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyEnablement(IndexMap<Currency, bool>);

impl CurrencyEnablement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, currency: Currency) -> bool {
        self.0.get(&currency).copied().unwrap_or(true)
    }

    /// Whether the user has an explicit entry for this currency
    pub fn contains(&self, currency: Currency) -> bool {
        self.0.contains_key(&currency)
    }

    pub fn set(&mut self, currency: Currency, enabled: bool) {
        self.0.insert(currency, enabled);
    }

    /// Add an enabled entry for every currency that has none yet.
    pub fn ensure_all(&mut self) {
        for currency in Currency::ALL {
            self.0.entry(currency).or_insert(true);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Currency, bool)> + '_ {
        self.0.iter().map(|(c, enabled)| (*c, *enabled))
    }
}

impl FromIterator<(Currency, bool)> for CurrencyEnablement {
    fn from_iter<T: IntoIterator<Item = (Currency, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_currency_defaults_to_enabled() {
        let enablement = CurrencyEnablement::new();
        for currency in Currency::ALL {
            assert!(enablement.is_enabled(currency));
            assert!(!enablement.contains(currency));
        }
    }

    #[test]
    fn test_explicit_toggle() {
        let mut enablement = CurrencyEnablement::new();
        enablement.set(Currency::Corrupt, false);

        assert!(!enablement.is_enabled(Currency::Corrupt));
        assert!(enablement.is_enabled(Currency::Exalt));
    }

    #[test]
    fn test_ensure_all_keeps_existing_values() {
        let mut enablement: CurrencyEnablement =
            [(Currency::Regal, false)].into_iter().collect();
        enablement.ensure_all();

        assert_eq!(enablement.iter().count(), 6);
        assert!(!enablement.is_enabled(Currency::Regal));
        assert!(enablement.contains(Currency::Transmute));
    }

    #[test]
    fn test_internal_name_round_trip() {
        for currency in Currency::ALL {
            assert_eq!(
                Currency::from_internal_name(currency.internal_name()),
                Some(currency)
            );
        }
        assert_eq!(Currency::from_internal_name("CurrencyRerollRare"), None);
    }

    #[test]
    fn test_yaml_uses_internal_names() {
        let enablement: CurrencyEnablement =
            [(Currency::Exalt, false)].into_iter().collect();
        let yaml = serde_yaml_ng::to_string(&enablement).unwrap();
        assert!(yaml.contains("CurrencyAddModToRare: false"));
    }
}
