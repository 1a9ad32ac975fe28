//! Item slice: update, remove. Moves live in [`crate::reorder`].

use crate::diff;
use crate::types::{Board, ItemId, ItemPatch, TierId};
use std::sync::Arc;

/// Merge `patch` into the item wherever it sits. A merge that changes no
/// field (nested details included) is a no-op, so background refreshes that
/// bring nothing new never reach persistence.
pub(super) fn update(state: &Arc<Board>, item_id: &ItemId, patch: &ItemPatch) -> Arc<Board> {
    let Some(tier) = state.container_of(item_id) else {
        return Arc::clone(state);
    };
    let Some(index) = state
        .tier_items(&tier)
        .iter()
        .position(|i| &i.id == item_id)
    else {
        return Arc::clone(state);
    };
    let Some(mut updated) = diff::apply_patch(&state.tier_items(&tier)[index], patch) else {
        return Arc::clone(state);
    };
    // Identity is not patchable
    updated.id = item_id.clone();
    updated.media_type = state.tier_items(&tier)[index].media_type;

    let mut next = Board::clone(state);
    if let Some(list) = next.items.get_mut(&tier) {
        list[index] = updated;
    }
    Arc::new(next)
}

pub(super) fn remove(state: &Arc<Board>, tier_id: &TierId, item_id: &ItemId) -> Arc<Board> {
    let Some(index) = state
        .tier_items(tier_id)
        .iter()
        .position(|i| &i.id == item_id)
    else {
        return Arc::clone(state);
    };

    let mut next = Board::clone(state);
    if let Some(list) = next.items.get_mut(tier_id) {
        list.remove(index);
    }
    next.item_lookup.remove(item_id);
    Arc::new(next)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::board;
    use crate::action::Action;
    use crate::reducer::BoardReducer;
    use crate::types::{ItemDetails, ItemId, ItemPatch, TierId};
    use std::sync::Arc;

    #[test]
    fn test_update_item_merges_fields() {
        let state = board();
        let next = BoardReducer::default().reduce(
            &state,
            &Action::update_item(
                "x",
                ItemPatch {
                    year: Some(1994),
                    image_url: Some("https://img/x.jpg".into()),
                    ..ItemPatch::default()
                },
            ),
        );
        let x = next.find_item(&ItemId::from("x")).unwrap();
        assert_eq!(x.year, Some(1994));
        assert_eq!(x.title, "X");
        assert!(!Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_update_item_noop_when_nothing_changes() {
        let reducer = BoardReducer::default();
        let details = ItemDetails {
            description: Some("debut".into()),
            ..ItemDetails::default()
        };
        let state = board();
        let enriched = reducer.reduce(&state, &Action::update_item("x", ItemPatch::details(details.clone())));
        assert!(!Arc::ptr_eq(&state, &enriched));

        let again = reducer.reduce(&enriched, &Action::update_item("x", ItemPatch::details(details)));
        assert!(Arc::ptr_eq(&enriched, &again));

        let title = reducer.reduce(&enriched, &Action::update_item("x", ItemPatch::title("X")));
        assert!(Arc::ptr_eq(&enriched, &title));
    }

    #[test]
    fn test_update_missing_item_is_noop() {
        let state = board();
        let next = BoardReducer::default().reduce(&state, &Action::update_item("gone", ItemPatch::title("G")));
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_remove_item() {
        let state = board();
        let next = BoardReducer::default().reduce(&state, &Action::remove_item("s", "x"));
        assert_eq!(next.item_count(), 2);
        assert!(!next.item_lookup.contains_key(&ItemId::from("x")));
        assert!(next.is_consistent());

        // Wrong tier: nothing removed
        let same = BoardReducer::default().reduce(&state, &Action::remove_item("a", "x"));
        assert!(Arc::ptr_eq(&state, &same));
        assert_eq!(state.container_of(&ItemId::from("x")), Some(TierId::from("s")));
    }
}
