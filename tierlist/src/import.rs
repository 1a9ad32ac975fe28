//! Versioned board document used for import and export.
//!
//! ```json
//! { "version": 1, "title": "...", "tiers": [ { "label": "S", "color": "red", "items": [] } ] }
//! ```

use crate::error::{Result, TierlistError};
use crate::types::{Board, ColorId, MediaItem, TierDefinition, TierId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardDocument {
    pub version: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub tiers: Vec<DocumentTier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentTier {
    pub label: String,
    pub color: ColorId,
    #[serde(default)]
    pub items: Vec<MediaItem>,
}

impl BoardDocument {
    /// Parse and validate a document
    pub fn parse(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| TierlistError::invalid_import(format!("not valid JSON: {e}")))?;

        let version = value
            .get("version")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| TierlistError::invalid_import("missing numeric 'version'"))?;
        if version != u64::from(DOCUMENT_VERSION) {
            return Err(TierlistError::UnsupportedVersion {
                found: u32::try_from(version).unwrap_or(u32::MAX),
            });
        }

        let document: Self = serde_json::from_value(value)
            .map_err(|e| TierlistError::invalid_import(e.to_string()))?;
        document.validate()?;
        Ok(document)
    }

    fn validate(&self) -> Result<()> {
        if self.tiers.is_empty() {
            return Err(TierlistError::invalid_import("document has no tiers"));
        }
        let mut seen = HashSet::new();
        for item in self.tiers.iter().flat_map(|tier| &tier.items) {
            if !seen.insert(&item.id) {
                return Err(TierlistError::invalid_import(format!(
                    "item '{}' appears more than once",
                    item.id
                )));
            }
        }
        Ok(())
    }

    /// Document describing `board`
    pub fn from_board(board: &Board) -> Self {
        let tiers = board
            .tier_definitions
            .iter()
            .map(|tier| DocumentTier {
                label: tier.label.clone(),
                color: tier.color_id.clone(),
                items: board.tier_items(&tier.id).to_vec(),
            })
            .collect();
        Self {
            version: DOCUMENT_VERSION,
            title: board.title.clone(),
            category: board.category.clone(),
            tiers,
        }
    }

    /// Build a board with fresh tier ids
    pub fn into_board(self) -> Board {
        let mut board = Board::with_tiers(self.title, Vec::new());
        board.category = self.category;
        for tier in self.tiers {
            let id = TierId::new();
            board
                .tier_definitions
                .push(TierDefinition::new(id.clone(), tier.label, tier.color));
            board.items.insert(id, tier.items);
        }
        board.reindex();
        board
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemId, MediaType};
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "version": 1,
            "title": "Best of 1982",
            "tiers": [
                {"label": "S", "color": "red", "items": [
                    {"id": "thriller", "type": "album", "title": "Thriller"}
                ]},
                {"label": "A", "color": "orange", "items": []}
            ]
        })
    }

    #[test]
    fn test_parse_into_board() {
        let board = BoardDocument::parse(&sample().to_string())
            .unwrap()
            .into_board();
        assert_eq!(board.title, "Best of 1982");
        assert_eq!(board.tier_definitions.len(), 2);
        assert_eq!(board.item_count(), 1);
        let s = board.tier_definitions[0].id.clone();
        assert_eq!(board.container_of(&ItemId::from("thriller")), Some(s));
        assert!(board.is_consistent());
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(matches!(
            BoardDocument::parse("{oops"),
            Err(TierlistError::InvalidImport { .. })
        ));

        let mut doc = sample();
        doc["version"] = json!(2);
        assert!(matches!(
            BoardDocument::parse(&doc.to_string()),
            Err(TierlistError::UnsupportedVersion { found: 2 })
        ));

        let mut doc = sample();
        doc["tiers"][1]["items"] = doc["tiers"][0]["items"].clone();
        assert!(matches!(
            BoardDocument::parse(&doc.to_string()),
            Err(TierlistError::InvalidImport { .. })
        ));

        let mut doc = sample();
        doc["tiers"][0].as_object_mut().unwrap().remove("label");
        assert!(BoardDocument::parse(&doc.to_string()).is_err());

        let mut doc = sample();
        doc["tiers"] = json!([]);
        assert!(BoardDocument::parse(&doc.to_string()).is_err());
    }

    #[test]
    fn test_export_matches_board() {
        let mut board = Board::default();
        let first = board.tier_definitions[0].id.clone();
        board
            .items
            .insert(first, vec![MediaItem::new("x", MediaType::Song, "X")]);
        board.reindex();

        let doc = BoardDocument::from_board(&board);
        assert_eq!(doc.version, DOCUMENT_VERSION);
        assert_eq!(doc.tiers.len(), board.tier_definitions.len());
        assert_eq!(doc.tiers[0].items.len(), 1);

        let reparsed = BoardDocument::parse(&doc.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, doc);
    }
}
