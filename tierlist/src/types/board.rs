//! Board-level types: Board, TierDefinition

use super::ids::{ColorId, ItemId, TierId};
use super::item::MediaItem;
use crate::palette::DEFAULT_PALETTE;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Placeholder label for tiers created without one
pub const NEW_TIER_LABEL: &str = "New Tier";

/// Title given to freshly created boards
pub const DEFAULT_TITLE: &str = "Untitled Tier List";

/// A labeled, colored row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDefinition {
    pub id: TierId,
    pub label: String,
    pub color_id: ColorId,
}

impl TierDefinition {
    pub fn new(id: impl Into<TierId>, label: impl Into<String>, color: impl Into<ColorId>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            color_id: color.into(),
        }
    }
}

/// Partial update for a [`TierDefinition`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<ColorId>,
}

impl TierPatch {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            color_id: None,
        }
    }

    pub fn color(color: impl Into<ColorId>) -> Self {
        Self {
            label: None,
            color_id: Some(color.into()),
        }
    }
}

/// The complete ranked collection.
///
/// `items` holds one ordered list per tier. `item_lookup` is a reverse index
/// item → tier that must always agree with `items`; every item id appears in
/// at most one tier list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub tier_definitions: Vec<TierDefinition>,
    #[serde(default)]
    pub items: BTreeMap<TierId, Vec<MediaItem>>,
    #[serde(default)]
    pub item_lookup: HashMap<ItemId, TierId>,
}

impl Default for Board {
    fn default() -> Self {
        Self::with_tiers(DEFAULT_TITLE, Self::default_tiers())
    }
}

impl Board {
    /// Create an empty board with the given tiers
    pub fn with_tiers(title: impl Into<String>, tiers: Vec<TierDefinition>) -> Self {
        let items = tiers.iter().map(|t| (t.id.clone(), Vec::new())).collect();
        Self {
            title: title.into(),
            category: None,
            tier_definitions: tiers,
            items,
            item_lookup: HashMap::new(),
        }
    }

    /// Create a board with the default tiers and a custom title
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_tiers(title, Self::default_tiers())
    }

    /// The default S/A/B/C/D/Unranked rows
    pub fn default_tiers() -> Vec<TierDefinition> {
        [
            ("s", "S"),
            ("a", "A"),
            ("b", "B"),
            ("c", "C"),
            ("d", "D"),
            ("unranked", "Unranked"),
        ]
        .iter()
        .zip(DEFAULT_PALETTE.iter())
        .map(|((id, label), color)| TierDefinition::new(*id, *label, *color))
        .collect()
    }

    pub fn find_tier(&self, id: &TierId) -> Option<&TierDefinition> {
        self.tier_definitions.iter().find(|t| &t.id == id)
    }

    pub fn tier_index(&self, id: &TierId) -> Option<usize> {
        self.tier_definitions.iter().position(|t| &t.id == id)
    }

    pub fn has_tier(&self, id: &str) -> bool {
        self.tier_definitions.iter().any(|t| t.id.as_str() == id)
    }

    /// Items of a tier, empty for unknown tiers
    pub fn tier_items(&self, id: &TierId) -> &[MediaItem] {
        self.items.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The tier currently holding `item`, scanning lists when the index lags
    pub fn container_of(&self, item: &ItemId) -> Option<TierId> {
        if let Some(tier) = self.item_lookup.get(item) {
            if self.tier_items(tier).iter().any(|i| &i.id == item) {
                return Some(tier.clone());
            }
        }
        self.items
            .iter()
            .find(|(_, list)| list.iter().any(|i| &i.id == item))
            .map(|(tier, _)| tier.clone())
    }

    pub fn find_item(&self, item: &ItemId) -> Option<&MediaItem> {
        let tier = self.container_of(item)?;
        self.tier_items(&tier).iter().find(|i| &i.id == item)
    }

    pub fn contains_item(&self, item: &ItemId) -> bool {
        self.container_of(item).is_some()
    }

    /// Total number of items across all tiers
    pub fn item_count(&self) -> usize {
        self.items.values().map(Vec::len).sum()
    }

    /// All items in tier order
    pub fn all_items(&self) -> impl Iterator<Item = &MediaItem> {
        self.tier_definitions
            .iter()
            .flat_map(move |t| self.tier_items(&t.id).iter())
    }

    /// Rebuild `item_lookup` from `items` and make sure every tier has a list.
    ///
    /// Lists for tiers that no longer exist are dropped, and a later duplicate
    /// of an already placed item is removed so the at-most-one-tier invariant
    /// holds after loading untrusted data.
    pub fn reindex(&mut self) {
        let mut items = std::mem::take(&mut self.items);
        let mut lookup = HashMap::new();
        let mut rebuilt = BTreeMap::new();

        for tier in &self.tier_definitions {
            let mut list = items.remove(&tier.id).unwrap_or_default();
            list.retain(|item| {
                if lookup.contains_key(&item.id) {
                    tracing::warn!(item = %item.id, tier = %tier.id, "dropping duplicate item");
                    return false;
                }
                lookup.insert(item.id.clone(), tier.id.clone());
                true
            });
            rebuilt.insert(tier.id.clone(), list);
        }

        for (tier, list) in items {
            if !list.is_empty() {
                tracing::warn!(tier = %tier, count = list.len(), "dropping items of unknown tier");
            }
        }

        self.items = rebuilt;
        self.item_lookup = lookup;
    }

    /// Check the lookup/list agreement invariant
    pub fn is_consistent(&self) -> bool {
        let mut seen = HashMap::new();
        for (tier, list) in &self.items {
            for item in list {
                if seen.insert(item.id.clone(), tier.clone()).is_some() {
                    return false;
                }
            }
        }
        seen == self.item_lookup
    }
}
