//! Tier slice: add, delete, update, reorder

use crate::diff;
use crate::palette::Palette;
use crate::reorder::array_move;
use crate::types::{Board, TierDefinition, TierId, TierPatch, NEW_TIER_LABEL};
use rand::Rng;
use std::sync::Arc;

pub(super) fn add<R: Rng + ?Sized>(
    state: &Arc<Board>,
    label: Option<&str>,
    palette: &Palette,
    rng: &mut R,
) -> Arc<Board> {
    let color = palette
        .first_unused(state.tier_definitions.iter().map(|t| &t.color_id))
        .unwrap_or_else(|| palette.random(rng));
    let label = label
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(NEW_TIER_LABEL);

    let tier = TierDefinition::new(TierId::new(), label, color);
    let mut next = Board::clone(state);
    next.items.insert(tier.id.clone(), Vec::new());
    next.tier_definitions.push(tier);
    Arc::new(next)
}

/// Remove a tier. Its items are appended after the existing items of the
/// first remaining tier; with no tier left they go away with it.
pub(super) fn delete(state: &Arc<Board>, tier_id: &TierId) -> Arc<Board> {
    if state.find_tier(tier_id).is_none() {
        return Arc::clone(state);
    }

    let mut next = Board::clone(state);
    next.tier_definitions.retain(|t| &t.id != tier_id);
    let orphans = next.items.remove(tier_id).unwrap_or_default();

    match next.tier_definitions.first().map(|t| t.id.clone()) {
        Some(fallback) => {
            for item in &orphans {
                next.item_lookup.insert(item.id.clone(), fallback.clone());
            }
            next.items.entry(fallback).or_default().extend(orphans);
        }
        None => {
            for item in &orphans {
                next.item_lookup.remove(&item.id);
            }
        }
    }
    Arc::new(next)
}

pub(super) fn update(state: &Arc<Board>, tier_id: &TierId, patch: &TierPatch) -> Arc<Board> {
    let Some(index) = state.tier_index(tier_id) else {
        return Arc::clone(state);
    };
    let Some(mut updated) = diff::apply_patch(&state.tier_definitions[index], patch) else {
        return Arc::clone(state);
    };
    // The id is not patchable
    updated.id = tier_id.clone();

    let mut next = Board::clone(state);
    next.tier_definitions[index] = updated;
    Arc::new(next)
}

pub(super) fn reorder(state: &Arc<Board>, old_index: usize, new_index: usize) -> Arc<Board> {
    let len = state.tier_definitions.len();
    if old_index == new_index || old_index >= len || new_index >= len {
        return Arc::clone(state);
    }
    let mut next = Board::clone(state);
    array_move(&mut next.tier_definitions, old_index, new_index);
    Arc::new(next)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{board, item};
    use crate::action::Action;
    use crate::palette::Palette;
    use crate::reducer::BoardReducer;
    use crate::types::{Board, ColorId, ItemId, TierDefinition, TierId, TierPatch, NEW_TIER_LABEL};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn reducer() -> BoardReducer {
        BoardReducer::default()
    }

    #[test]
    fn test_add_tier_picks_unused_color() {
        let state = board();
        let next = reducer().reduce(&state, &Action::add_tier());
        assert_eq!(next.tier_definitions.len(), 4);
        let added = next.tier_definitions.last().unwrap();
        assert_eq!(added.label, NEW_TIER_LABEL);
        // red, orange, amber are taken
        assert_eq!(added.color_id, ColorId::from("yellow"));
        assert!(next.items.contains_key(&added.id));
    }

    #[test]
    fn test_add_tier_random_color_when_palette_exhausted() {
        let reducer = BoardReducer::new(Palette::new(["red", "orange"]));
        let state = Arc::new(Board::with_tiers(
            "T",
            vec![
                TierDefinition::new("s", "S", "red"),
                TierDefinition::new("a", "A", "orange"),
            ],
        ));
        let mut rng = StdRng::seed_from_u64(3);
        let next = reducer.reduce_with_rng(
            &state,
            &Action::AddTier {
                label: Some("Honorable".into()),
            },
            &mut rng,
        );
        let added = next.tier_definitions.last().unwrap();
        assert_eq!(added.label, "Honorable");
        assert!(reducer.palette().colors().contains(&added.color_id));
    }

    #[test]
    fn test_delete_tier_moves_items_to_first_remaining() {
        let state = board();
        let next = reducer().reduce(&state, &Action::delete_tier("s"));
        assert_eq!(next.tier_definitions.len(), 2);
        let ids: Vec<_> = next
            .tier_items(&TierId::from("a"))
            .iter()
            .map(|i| i.id.to_string())
            .collect();
        // Existing items first, then the migrated ones
        assert_eq!(ids, vec!["p", "x", "y"]);
        assert_eq!(next.item_lookup[&ItemId::from("x")], TierId::from("a"));
        assert_eq!(next.item_count(), state.item_count());
        assert!(next.is_consistent());
    }

    #[test]
    fn test_delete_last_tier_drops_items() {
        let mut only = Board::with_tiers("T", vec![TierDefinition::new("s", "S", "red")]);
        only.items.insert(TierId::from("s"), vec![item("x")]);
        only.reindex();
        let state = Arc::new(only);

        let next = reducer().reduce(&state, &Action::delete_tier("s"));
        assert!(next.tier_definitions.is_empty());
        assert_eq!(next.item_count(), 0);
        assert!(next.item_lookup.is_empty());
    }

    #[test]
    fn test_delete_unknown_tier_is_noop() {
        let state = board();
        let next = reducer().reduce(&state, &Action::delete_tier("zzz"));
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_update_tier() {
        let state = board();
        let next = reducer().reduce(&state, &Action::update_tier("a", TierPatch::label("Great")));
        assert_eq!(next.find_tier(&TierId::from("a")).unwrap().label, "Great");

        let same = reducer().reduce(&next, &Action::update_tier("a", TierPatch::label("Great")));
        assert!(Arc::ptr_eq(&next, &same));

        let missing = reducer().reduce(&state, &Action::update_tier("zz", TierPatch::color("red")));
        assert!(Arc::ptr_eq(&state, &missing));
    }

    #[test]
    fn test_reorder_tiers() {
        let state = board();
        let next = reducer().reduce(
            &state,
            &Action::ReorderTiers {
                old_index: 0,
                new_index: 2,
            },
        );
        let order: Vec<_> = next
            .tier_definitions
            .iter()
            .map(|t| t.id.to_string())
            .collect();
        assert_eq!(order, vec!["a", "b", "s"]);

        for (old_index, new_index) in [(1, 1), (0, 9)] {
            let same = reducer().reduce(
                &state,
                &Action::ReorderTiers {
                    old_index,
                    new_index,
                },
            );
            assert!(Arc::ptr_eq(&state, &same));
        }
    }
}
