use crate::host::SnapshotProvider;
use crate::models::{CraftingSettings, Currency, InventoryEntity, Point};
use crate::services::currency_selector::select_currency;
use crate::services::eligibility::is_craftable;
use thiserror::Error;

/// Errors that can occur while building a work queue
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Inventory snapshot unavailable")]
    DataUnavailable,
}

/// One planned currency application
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub currency: Currency,

    /// Client-relative click position of the target, taken from this build's snapshot
    pub target: Point,

    /// The snapshot record the item was planned from
    pub source: InventoryEntity,
}

/// Ordered work for one cycle, in snapshot order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkQueue {
    items: Vec<WorkItem>,

    /// Window origin read during this build; added to every click position
    click_offset: Point,
}

/// Order-insensitive fingerprint of a queue: each planned currency paired
/// with the modifier count of its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSignature {
    entries: Vec<(Currency, usize)>,
}

impl QueueSignature {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A follow-up queue made progress when it shrank, its currency mix
    /// changed, or a target gained or lost modifiers.
    ///
    /// The modifier counts let a Rare Waystone that is exalted one mod per
    /// cycle keep going until `Max Cycles`, even though every queue is `[Exalt]`.
    pub fn progressed_to(&self, next: &QueueSignature) -> bool {
        next.len() < self.len() || next != self
    }
}

impl WorkQueue {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a queue from a fresh snapshot of `provider`.
    ///
    /// # Errors
    ///
    /// [`QueueError::DataUnavailable`] when the provider has no inventory data.
    pub fn build<P: SnapshotProvider + ?Sized>(
        provider: &P,
        settings: &CraftingSettings,
    ) -> Result<Self, QueueError> {
        let click_offset = provider.window_origin();
        Self::from_snapshot(provider.inventory_items(), click_offset, settings)
    }

    /// Build a queue from an already captured snapshot.
    ///
    /// Each entity passes the eligibility filter, then the currency selector,
    /// then the enablement check. Survivors keep their snapshot order.
    pub fn from_snapshot(
        snapshot: Option<Vec<InventoryEntity>>,
        click_offset: Point,
        settings: &CraftingSettings,
    ) -> Result<Self, QueueError> {
        let Some(entities) = snapshot else {
            tracing::warn!("Inventory data unavailable, nothing to craft");
            return Err(QueueError::DataUnavailable);
        };

        tracing::debug!("Found {} inventory items", entities.len());

        let enablement = &settings.currency_enabled;
        let mut items = Vec::new();

        for entity in entities {
            if !is_craftable(&entity, settings.alchemy_only) {
                tracing::debug!("Skipping non-craftable item: {}", entity.display_label());
                continue;
            }

            let Some(currency) = select_currency(&entity, settings.alchemy_only, enablement)
            else {
                continue;
            };

            if !enablement.is_enabled(currency) {
                tracing::debug!(
                    "Skipping {} because {} is disabled",
                    entity.display_label(),
                    currency
                );
                continue;
            }

            tracing::debug!("Planned {} on {}", currency, entity.display_label());
            items.push(WorkItem {
                currency,
                target: entity.position,
                source: entity,
            });
        }

        tracing::debug!("Work queue built with {} items", items.len());

        Ok(Self {
            items,
            click_offset,
        })
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&WorkItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn click_offset(&self) -> Point {
        self.click_offset
    }

    pub fn signature(&self) -> QueueSignature {
        let mut entries: Vec<(Currency, usize)> = self
            .items
            .iter()
            .map(|i| (i.currency, i.source.modifiers().len()))
            .collect();
        entries.sort();
        QueueSignature { entries }
    }

    /// Number of planned applications per currency, in [`Currency::ALL`] order
    pub fn currency_counts(&self) -> Vec<(Currency, usize)> {
        Currency::ALL
            .into_iter()
            .map(|c| (c, self.items.iter().filter(|i| i.currency == c).count()))
            .filter(|(_, n)| *n > 0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BaseItem, Category, ItemMods, Modifier, Rarity};

    fn waystone(tier: i32, rarity: Rarity, mods: usize, x: f32) -> InventoryEntity {
        let modifiers = (0..mods)
            .map(|i| {
                if i % 2 == 0 {
                    Modifier::new("MapPrefix", "Hungering", &[1])
                } else {
                    Modifier::new("MapSuffix", "of Bounty", &[1])
                }
            })
            .collect();

        InventoryEntity {
            path: format!("Metadata/Items/Maps/Waystone{}", tier),
            category: Category::Waystone { tier },
            mods: Some(ItemMods {
                rarity,
                identified: true,
                modifiers,
            }),
            base: Some(BaseItem::default()),
            position: Point::new(x, 100.0),
        }
    }

    #[test]
    fn test_unavailable_snapshot() {
        let result = WorkQueue::from_snapshot(None, Point::default(), &CraftingSettings::default());
        assert_eq!(result, Err(QueueError::DataUnavailable));
    }

    #[test]
    fn test_queue_preserves_snapshot_order() {
        let snapshot = vec![
            waystone(5, Rarity::Normal, 0, 1.0),
            waystone(5, Rarity::Unique, 0, 2.0),
            waystone(12, Rarity::Rare, 3, 3.0),
            waystone(5, Rarity::Magic, 1, 4.0),
        ];

        let queue =
            WorkQueue::from_snapshot(Some(snapshot), Point::new(5.0, 5.0), &CraftingSettings::default())
                .unwrap();

        let plan: Vec<(Currency, f32)> = queue.items().iter().map(|i| (i.currency, i.target.x)).collect();
        assert_eq!(
            plan,
            vec![
                (Currency::Transmute, 1.0),
                (Currency::Exalt, 3.0),
                (Currency::Augment, 4.0)
            ]
        );
        assert_eq!(queue.click_offset(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_disabled_currency_dropped() {
        let mut settings = CraftingSettings::default();
        settings.currency_enabled.set(Currency::Transmute, false);

        let snapshot = vec![
            waystone(5, Rarity::Normal, 0, 1.0),
            waystone(5, Rarity::Magic, 1, 2.0),
        ];
        let queue = WorkQueue::from_snapshot(Some(snapshot), Point::default(), &settings).unwrap();

        assert_eq!(queue.len(), 1);
        assert!(queue.items().iter().all(|i| i.currency != Currency::Transmute));
    }

    #[test]
    fn test_signature_progress() {
        let settings = CraftingSettings::default();
        let before = WorkQueue::from_snapshot(
            Some(vec![waystone(5, Rarity::Normal, 0, 1.0), waystone(5, Rarity::Normal, 0, 2.0)]),
            Point::default(),
            &settings,
        )
        .unwrap()
        .signature();

        let same = WorkQueue::from_snapshot(
            Some(vec![waystone(6, Rarity::Normal, 0, 9.0), waystone(7, Rarity::Normal, 0, 8.0)]),
            Point::default(),
            &settings,
        )
        .unwrap()
        .signature();
        assert!(!before.progressed_to(&same));

        let changed = WorkQueue::from_snapshot(
            Some(vec![waystone(5, Rarity::Magic, 1, 1.0), waystone(5, Rarity::Normal, 0, 2.0)]),
            Point::default(),
            &settings,
        )
        .unwrap()
        .signature();
        assert!(before.progressed_to(&changed));

        let shrunk = WorkQueue::from_snapshot(
            Some(vec![waystone(5, Rarity::Normal, 0, 1.0)]),
            Point::default(),
            &settings,
        )
        .unwrap()
        .signature();
        assert!(before.progressed_to(&shrunk));
    }

    #[test]
    fn test_signature_counts_added_modifiers_as_progress() {
        let settings = CraftingSettings::default();
        let signature = |mods: usize| {
            WorkQueue::from_snapshot(
                Some(vec![waystone(12, Rarity::Rare, mods, 1.0)]),
                Point::default(),
                &settings,
            )
            .unwrap()
            .signature()
        };

        // Both queues are a single Exalt, but the target grew a modifier
        assert!(signature(3).progressed_to(&signature(4)));
        assert!(!signature(4).progressed_to(&signature(4)));
    }

    #[test]
    fn test_currency_counts() {
        let queue = WorkQueue::from_snapshot(
            Some(vec![
                waystone(5, Rarity::Normal, 0, 1.0),
                waystone(5, Rarity::Normal, 0, 2.0),
                waystone(5, Rarity::Magic, 1, 3.0),
            ]),
            Point::default(),
            &CraftingSettings::default(),
        )
        .unwrap();

        assert_eq!(
            queue.currency_counts(),
            vec![(Currency::Transmute, 2), (Currency::Augment, 1)]
        );
    }
}
