//! Pure board state transitions.
//!
//! `(state, action) -> state` over `Arc<Board>`. The input is never mutated,
//! and an action that changes nothing returns the very same `Arc` so callers
//! can skip history, persistence and render work with `Arc::ptr_eq`. The
//! reducer is total: it has no error path.

mod global;
mod items;
mod tiers;

use crate::action::Action;
use crate::palette::Palette;
use crate::types::Board;
use rand::Rng;
use std::sync::Arc;
use tracing::trace;

/// Reducer configured with the palette used for tier colors
#[derive(Debug, Clone, Default)]
pub struct BoardReducer {
    palette: Palette,
}

impl BoardReducer {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Reduce using the thread-local RNG for color picks
    pub fn reduce(&self, state: &Arc<Board>, action: &Action) -> Arc<Board> {
        self.reduce_with_rng(state, action, &mut rand::rng())
    }

    /// Reduce with an explicit RNG (deterministic in tests)
    pub fn reduce_with_rng<R: Rng + ?Sized>(
        &self,
        state: &Arc<Board>,
        action: &Action,
        rng: &mut R,
    ) -> Arc<Board> {
        let next = match action {
            // Tier slice
            Action::AddTier { label } => tiers::add(state, label.as_deref(), &self.palette, rng),
            Action::DeleteTier { tier_id } => tiers::delete(state, tier_id),
            Action::UpdateTier { tier_id, patch } => tiers::update(state, tier_id, patch),
            Action::ReorderTiers {
                old_index,
                new_index,
            } => tiers::reorder(state, *old_index, *new_index),

            // Item slice
            Action::MoveItem {
                active_id,
                over_id,
                source_tier,
                new_item,
            } => crate::reorder::move_item(
                state,
                active_id,
                over_id,
                source_tier.as_ref(),
                new_item.as_ref(),
            ),
            Action::UpdateItem { item_id, patch } => items::update(state, item_id, patch),
            Action::RemoveItem { tier_id, item_id } => items::remove(state, tier_id, item_id),

            // Global slice
            Action::UpdateTitle { title } => global::update_title(state, title),
            Action::RandomizeColors => global::randomize_colors(state, &self.palette, rng),
            Action::ClearBoard => global::clear(state),
            Action::ReplaceState { board } => global::replace(state, board),
        };

        if Arc::ptr_eq(state, &next) {
            trace!(action = %action, "no-op");
        }
        next
    }
}
