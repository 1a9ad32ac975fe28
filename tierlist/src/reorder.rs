//! Positional move algorithm for drag-based reassignment.
//!
//! A drop is described by the dragged item (`active`) and what it was dropped
//! on (`over`): either a tier container id or another item's id. Drop indices
//! are purely ordinal: dropping on an item inserts before it, dropping on a
//! container appends.

use crate::types::{Board, ItemId, MediaItem, TierId};
use std::sync::Arc;
use tracing::trace;

/// Where a drop lands inside a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// On the container itself
    End,
    /// On the item at this index
    Before(usize),
}

/// The tier holding `active`, preferring the caller's hint when it is right
pub fn active_container(
    board: &Board,
    active: &ItemId,
    source_hint: Option<&TierId>,
) -> Option<TierId> {
    if let Some(hint) = source_hint {
        if board.tier_items(hint).iter().any(|i| &i.id == active) {
            return Some(hint.clone());
        }
    }
    board.container_of(active)
}

/// The tier a drop on `over` lands in: the tier holding that item, or the
/// tier named by `over` itself.
pub fn over_container(board: &Board, over: &str) -> Option<TierId> {
    board
        .container_of(&ItemId::from(over))
        .or_else(|| board.has_tier(over).then(|| TierId::from(over)))
}

/// Resolve the drop position of `over` inside `container`
pub fn drop_target(board: &Board, container: &TierId, over: &str) -> DropTarget {
    if container.as_str() == over {
        return DropTarget::End;
    }
    board
        .tier_items(container)
        .iter()
        .position(|i| i.id.as_str() == over)
        .map_or(DropTarget::End, DropTarget::Before)
}

/// Stable array move: the element at `from` ends up at index `to`
pub fn array_move<T>(list: &mut Vec<T>, from: usize, to: usize) {
    if from == to || from >= list.len() {
        return;
    }
    let item = list.remove(from);
    let to = to.min(list.len());
    list.insert(to, item);
}

/// Apply a drop. Returns `state` itself (same `Arc`) when nothing moves.
pub fn move_item(
    state: &Arc<Board>,
    active: &ItemId,
    over: &str,
    source_hint: Option<&TierId>,
    new_item: Option<&MediaItem>,
) -> Arc<Board> {
    let Some(over_tier) = over_container(state, over) else {
        trace!(%active, over, "drop target not resolvable");
        return Arc::clone(state);
    };

    match active_container(state, active, source_hint) {
        None => insert_new(state, new_item, &over_tier, over),
        Some(source) if source == over_tier => move_within(state, active, &source, over),
        Some(source) => move_across(state, active, &source, &over_tier, over),
    }
}

fn insert_new(
    state: &Arc<Board>,
    new_item: Option<&MediaItem>,
    container: &TierId,
    over: &str,
) -> Arc<Board> {
    let Some(item) = new_item else {
        trace!("unknown item dropped without payload");
        return Arc::clone(state);
    };
    if state.contains_item(&item.id) {
        trace!(item = %item.id, "item already on board, skipping insert");
        return Arc::clone(state);
    }

    let target = drop_target(state, container, over);
    let mut next = Board::clone(state);
    let list = next.items.entry(container.clone()).or_default();
    match target {
        DropTarget::End => list.push(item.clone()),
        DropTarget::Before(index) => list.insert(index, item.clone()),
    }
    next.item_lookup.insert(item.id.clone(), container.clone());
    Arc::new(next)
}

fn move_within(state: &Arc<Board>, active: &ItemId, container: &TierId, over: &str) -> Arc<Board> {
    let list = state.tier_items(container);
    let Some(from) = list.iter().position(|i| &i.id == active) else {
        return Arc::clone(state);
    };
    // Dropping onto its own container leaves the item where it is
    let to = match drop_target(state, container, over) {
        DropTarget::End => return Arc::clone(state),
        DropTarget::Before(index) => index,
    };
    if from == to {
        return Arc::clone(state);
    }

    let mut next = Board::clone(state);
    if let Some(list) = next.items.get_mut(container) {
        array_move(list, from, to);
    }
    Arc::new(next)
}

fn move_across(
    state: &Arc<Board>,
    active: &ItemId,
    source: &TierId,
    dest: &TierId,
    over: &str,
) -> Arc<Board> {
    let target = drop_target(state, dest, over);
    let mut next = Board::clone(state);

    let Some(source_list) = next.items.get_mut(source) else {
        return Arc::clone(state);
    };
    let Some(from) = source_list.iter().position(|i| &i.id == active) else {
        return Arc::clone(state);
    };
    let moved = source_list.remove(from);

    let dest_list = next.items.entry(dest.clone()).or_default();
    match target {
        DropTarget::End => dest_list.push(moved),
        DropTarget::Before(index) => dest_list.insert(index.min(dest_list.len()), moved),
    }
    next.item_lookup.insert(active.clone(), dest.clone());
    Arc::new(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MediaType, TierDefinition};

    fn item(id: &str) -> MediaItem {
        MediaItem::new(id, MediaType::Album, id.to_uppercase())
    }

    fn board() -> Arc<Board> {
        let mut board = Board::with_tiers(
            "Test",
            vec![
                TierDefinition::new("s", "S", "red"),
                TierDefinition::new("a", "A", "orange"),
                TierDefinition::new("b", "B", "amber"),
            ],
        );
        board
            .items
            .insert(TierId::from("s"), vec![item("x"), item("y"), item("z")]);
        board.items.insert(TierId::from("a"), vec![item("p")]);
        board.reindex();
        Arc::new(board)
    }

    fn ids(board: &Board, tier: &str) -> Vec<String> {
        board
            .tier_items(&TierId::from(tier))
            .iter()
            .map(|i| i.id.to_string())
            .collect()
    }

    #[test]
    fn test_array_move() {
        let mut v = vec![1, 2, 3, 4];
        array_move(&mut v, 0, 2);
        assert_eq!(v, vec![2, 3, 1, 4]);
        array_move(&mut v, 3, 0);
        assert_eq!(v, vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_same_container_move() {
        let state = board();
        let next = move_item(&state, &ItemId::from("x"), "z", None, None);
        assert_eq!(ids(&next, "s"), vec!["y", "z", "x"]);
        assert!(next.is_consistent());
    }

    #[test]
    fn test_drop_on_own_container_is_noop() {
        let state = board();
        let next = move_item(&state, &ItemId::from("x"), "s", None, None);
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_drop_on_self_is_noop() {
        let state = board();
        let next = move_item(&state, &ItemId::from("y"), "y", None, None);
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_cross_container_inserts_before_target() {
        let state = board();
        let next = move_item(&state, &ItemId::from("y"), "p", None, None);
        assert_eq!(ids(&next, "s"), vec!["x", "z"]);
        assert_eq!(ids(&next, "a"), vec!["y", "p"]);
        assert_eq!(next.item_lookup[&ItemId::from("y")], TierId::from("a"));
        assert!(next.is_consistent());
    }

    #[test]
    fn test_cross_container_onto_container_appends() {
        let state = board();
        let next = move_item(&state, &ItemId::from("x"), "a", None, None);
        assert_eq!(ids(&next, "a"), vec!["p", "x"]);
        assert_eq!(next.find_item(&ItemId::from("x")), Some(&item("x")));
    }

    #[test]
    fn test_unresolvable_target_is_noop() {
        let state = board();
        let next = move_item(&state, &ItemId::from("x"), "nowhere", None, None);
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_new_item_onto_item_position() {
        let state = board();
        let new = item("n");
        let next = move_item(&state, &new.id, "y", None, Some(&new));
        assert_eq!(ids(&next, "s"), vec!["x", "n", "y", "z"]);
        assert_eq!(next.item_lookup[&new.id], TierId::from("s"));
    }

    #[test]
    fn test_new_item_duplicate_is_skipped() {
        let state = board();
        let dup = item("p");
        // Unknown source hint, payload id already on the board
        let next = move_item(&state, &ItemId::from("ghost"), "b", None, Some(&dup));
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_unknown_item_without_payload_is_noop() {
        let state = board();
        let next = move_item(&state, &ItemId::from("ghost"), "b", None, None);
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_stale_source_hint_is_ignored() {
        let state = board();
        let next = move_item(
            &state,
            &ItemId::from("p"),
            "b",
            Some(&TierId::from("s")),
            None,
        );
        assert_eq!(ids(&next, "a"), Vec::<String>::new());
        assert_eq!(ids(&next, "b"), vec!["p"]);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let state = board();
        let before = Board::clone(&state);
        let _ = move_item(&state, &ItemId::from("x"), "a", None, None);
        assert_eq!(*state, before);
    }
}
