//! Undo log for flag changes
//!
//! Searches and the DRC driver record an object's previous flags before
//! changing them. Changes accumulate into a pending step until `commit`
//! closes it; `undo` reverts the most recent committed step.

use super::data::{Board, ObjectRef};
use super::flags::ObjectFlags;

pub trait UndoLog {
    /// Remember `previous` as the flags `object` had before a change
    fn record_change(&mut self, object: ObjectRef, previous: ObjectFlags);

    /// Close the pending step; a no-op if nothing was recorded
    fn commit(&mut self);

    /// Revert the last committed step. Returns false if there was none.
    fn undo(&mut self, board: &mut Board) -> bool;
}

/// In-memory undo log
#[derive(Debug, Default)]
pub struct FlagUndoLog {
    pending: Vec<(ObjectRef, ObjectFlags)>,
    steps: Vec<Vec<(ObjectRef, ObjectFlags)>>,
}

impl FlagUndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed steps available to undo
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl UndoLog for FlagUndoLog {
    fn record_change(&mut self, object: ObjectRef, previous: ObjectFlags) {
        self.pending.push((object, previous));
    }

    fn commit(&mut self) {
        if !self.pending.is_empty() {
            self.steps.push(std::mem::take(&mut self.pending));
        }
    }

    fn undo(&mut self, board: &mut Board) -> bool {
        let Some(step) = self.steps.pop() else {
            return false;
        };
        // newest first so repeated changes to one object unwind to the oldest value
        for (object, previous) in step.into_iter().rev() {
            board.set_flags(object, previous);
        }
        true
    }
}

/// Set or clear `flags` on `object`, recording the old value when an undo
/// log is supplied. Returns whether the flags changed.
pub fn change_flags(
    board: &mut Board,
    object: ObjectRef,
    set: ObjectFlags,
    clear: ObjectFlags,
    undo: Option<&mut (dyn UndoLog + '_)>,
) -> bool {
    let Some(slot) = board.flags_mut(object) else {
        return false;
    };
    let previous = *slot;
    let mut next = previous;
    next.remove(clear);
    next.insert(set);
    if next == previous {
        return false;
    }
    *slot = next;
    if let Some(log) = undo {
        log.record_change(object, previous);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Pin, Point};

    #[test]
    fn test_undo_restores_oldest_value() {
        let mut board = Board::new(1);
        let via = board.add_via(Pin::new(Point::new(0, 0), 10, 4).with_flags(ObjectFlags::SQUARE));
        let mut log = FlagUndoLog::new();

        assert!(change_flags(&mut board, via, ObjectFlags::FOUND, ObjectFlags::NONE, Some(&mut log)));
        assert!(change_flags(&mut board, via, ObjectFlags::WARN, ObjectFlags::NONE, Some(&mut log)));
        log.commit();
        assert_eq!(log.depth(), 1);

        assert!(log.undo(&mut board));
        assert_eq!(board.flags(via), Some(ObjectFlags::SQUARE));
        assert!(!log.undo(&mut board));
    }

    #[test]
    fn test_unchanged_flags_are_not_recorded() {
        let mut board = Board::new(1);
        let via = board.add_via(Pin::new(Point::new(0, 0), 10, 4));
        let mut log = FlagUndoLog::new();
        assert!(!change_flags(&mut board, via, ObjectFlags::NONE, ObjectFlags::FOUND, Some(&mut log)));
        log.commit();
        assert_eq!(log.depth(), 0);
    }
}
