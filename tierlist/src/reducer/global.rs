//! Global slice: title, colors, clear, replace

use crate::palette::Palette;
use crate::types::Board;
use rand::Rng;
use std::sync::Arc;

pub(super) fn update_title(state: &Arc<Board>, title: &str) -> Arc<Board> {
    if state.title == title {
        return Arc::clone(state);
    }
    let mut next = Board::clone(state);
    next.title = title.to_string();
    Arc::new(next)
}

/// Give every tier a fresh color, without repeats until the palette is used up
pub(super) fn randomize_colors<R: Rng + ?Sized>(
    state: &Arc<Board>,
    palette: &Palette,
    rng: &mut R,
) -> Arc<Board> {
    if state.tier_definitions.is_empty() {
        return Arc::clone(state);
    }
    let colors = palette.draw_distinct(state.tier_definitions.len(), rng);
    let mut next = Board::clone(state);
    for (tier, color) in next.tier_definitions.iter_mut().zip(colors) {
        tier.color_id = color;
    }
    if next.tier_definitions == state.tier_definitions {
        return Arc::clone(state);
    }
    Arc::new(next)
}

pub(super) fn clear(state: &Arc<Board>) -> Arc<Board> {
    if state.item_count() == 0 {
        return Arc::clone(state);
    }
    let mut next = Board::clone(state);
    for list in next.items.values_mut() {
        list.clear();
    }
    next.item_lookup.clear();
    Arc::new(next)
}

pub(super) fn replace(state: &Arc<Board>, board: &Arc<Board>) -> Arc<Board> {
    if Arc::ptr_eq(state, board) {
        return Arc::clone(state);
    }
    if board.is_consistent() {
        return Arc::clone(board);
    }
    let mut fixed = Board::clone(board);
    fixed.reindex();
    Arc::new(fixed)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::board;
    use crate::action::Action;
    use crate::reducer::BoardReducer;
    use crate::types::{Board, TierId};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_update_title() {
        let state = board();
        let reducer = BoardReducer::default();
        let next = reducer.reduce(&state, &Action::update_title("Top Albums"));
        assert_eq!(next.title, "Top Albums");
        let same = reducer.reduce(&next, &Action::update_title("Top Albums"));
        assert!(Arc::ptr_eq(&next, &same));
    }

    #[test]
    fn test_randomize_colors_distinct() {
        let state = Arc::new(Board::default());
        let mut rng = StdRng::seed_from_u64(11);
        let next = BoardReducer::default().reduce_with_rng(&state, &Action::RandomizeColors, &mut rng);
        let colors: HashSet<_> = next.tier_definitions.iter().map(|t| &t.color_id).collect();
        assert_eq!(colors.len(), next.tier_definitions.len());
    }

    #[test]
    fn test_clear_board_keeps_tiers() {
        let state = board();
        let reducer = BoardReducer::default();
        let next = reducer.reduce(&state, &Action::ClearBoard);
        assert_eq!(next.item_count(), 0);
        assert_eq!(next.tier_definitions, state.tier_definitions);
        assert!(next.item_lookup.is_empty());

        let again = reducer.reduce(&next, &Action::ClearBoard);
        assert!(Arc::ptr_eq(&next, &again));
    }

    #[test]
    fn test_replace_state_reindexes() {
        let state = board();
        let mut incoming = Board::new("Imported");
        incoming
            .items
            .get_mut(&TierId::from("b"))
            .unwrap()
            .push(super::super::test_support::item("q"));
        let next = BoardReducer::default().reduce(&state, &Action::replace_state(incoming));
        assert_eq!(next.title, "Imported");
        assert!(next.is_consistent());

        let same = BoardReducer::default().reduce(&state, &Action::ReplaceState { board: Arc::clone(&state) });
        assert!(Arc::ptr_eq(&state, &same));
    }
}
