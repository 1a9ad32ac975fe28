//! Bounded linear undo/redo history.

use std::collections::VecDeque;

/// Default number of undo steps kept
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Two stacks of snapshots. `past` grows at the back, `future` at the front.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: VecDeque<T>,
    future: VecDeque<T>,
    limit: usize,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl<T> History<T> {
    /// A history keeping at most `limit` undo steps (minimum 1)
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Record the pre-mutation snapshot. Any redo branch is discarded.
    pub fn push(&mut self, snapshot: T) {
        self.past.push_back(snapshot);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        self.future.clear();
    }

    /// Step back: hand the last snapshot to `apply`, keep `current` for redo.
    /// Returns false when there is nothing to undo.
    pub fn undo<F: FnOnce(T)>(&mut self, current: T, apply: F) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        apply(previous);
        self.future.push_front(current);
        true
    }

    /// Step forward: hand the next snapshot to `apply`, keep `current` for undo.
    /// Returns false when there is nothing to redo.
    pub fn redo<F: FnOnce(T)>(&mut self, current: T, apply: F) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        apply(next);
        self.past.push_back(current);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}
