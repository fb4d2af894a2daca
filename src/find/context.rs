//! Per-search state
//!
//! A `SearchContext` owns everything one connection search needs besides
//! the board flags: the frontier, the flag to mark with, the margin added
//! to every shape, and whether the search runs as a DRC probe. Nothing is
//! shared between contexts, so independent boards can be searched side by
//! side.

use std::ops::ControlFlow;
use std::time::Instant;
use tracing::{debug, warn};

use super::frontier::{FrontierEntry, ObjectFrontier};
use crate::board::{
    change_flags, Board, GroupTable, ObjectFlags, ObjectRef, SpatialIndex, UndoLog,
};
use crate::error::BoardError;

/// What a search marks and what it treats as already reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMode {
    /// Set on every object the search reaches
    pub mark: ObjectFlags,
    /// Objects carrying any of these are skipped
    pub visited: ObjectFlags,
    /// Stop at the first object outside the Selected baseline
    pub drc: bool,
    /// Discover ratlines attached to found objects
    pub and_rats: bool,
}

impl SearchMode {
    pub fn marking(flag: ObjectFlags) -> Self {
        Self {
            mark: flag,
            visited: flag,
            drc: false,
            and_rats: false,
        }
    }

    pub fn with_rats(mut self, and_rats: bool) -> Self {
        self.and_rats = and_rats;
        self
    }

    pub fn visited_by(mut self, visited: ObjectFlags) -> Self {
        self.visited = visited;
        self
    }

    /// Marks Found and diverges on anything not Selected
    pub fn drc_probe() -> Self {
        Self {
            drc: true,
            ..Self::marking(ObjectFlags::FOUND)
        }
    }
}

/// First object a DRC probe reached outside the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divergence {
    pub object: ObjectRef,
    pub from: ObjectRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Complete,
    Diverged(Divergence),
}

pub struct SearchContext<'a> {
    pub(super) board: &'a mut Board,
    pub(super) index: &'a dyn SpatialIndex,
    pub(super) groups: GroupTable,
    pub(super) frontier: ObjectFrontier,
    pub(super) mode: SearchMode,
    pub(super) margin: f64,
    pub(super) undo: Option<&'a mut dyn UndoLog>,
}

impl<'a> SearchContext<'a> {
    pub fn new(board: &'a mut Board, index: &'a dyn SpatialIndex, mode: SearchMode) -> Self {
        let (groups, errors) = board.groups.resolve(board.layer_count());
        for error in errors {
            debug!("skipping malformed layer group entry: {}", error);
        }
        let frontier = ObjectFrontier::new(board.layer_count());
        Self {
            board,
            index,
            groups,
            frontier,
            mode,
            margin: 0.0,
            undo: None,
        }
    }

    /// Margin added to both operands of every intersection test
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Record every flag change in `undo`
    pub fn with_undo(mut self, undo: &'a mut dyn UndoLog) -> Self {
        self.undo = Some(undo);
        self
    }

    /// Continue from a frontier left by an earlier context
    pub fn with_frontier(mut self, frontier: ObjectFrontier) -> Self {
        if frontier.layer_count() == self.board.layer_count() {
            self.frontier = frontier;
        } else {
            warn!("discarding frontier built for a different layer count");
        }
        self
    }

    pub fn into_frontier(self) -> ObjectFrontier {
        self.frontier
    }

    pub fn board(&self) -> &Board {
        &*self.board
    }

    pub fn frontier(&self) -> &ObjectFrontier {
        &self.frontier
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Reset the frontier to `seed` and mark it. False for a stale or
    /// non-copper reference.
    pub fn start(&mut self, seed: ObjectRef) -> bool {
        let seeded = self
            .frontier
            .seed(self.board, seed, self.mode.mark, self.undo.as_deref_mut());
        if !seeded {
            warn!("cannot start a connection search from {:?}", seed);
        }
        seeded
    }

    /// Expand until nothing new is found, or until a DRC probe diverges.
    /// A diverged search can be resumed by calling `run` again.
    pub fn run(&mut self) -> SearchOutcome {
        let start = Instant::now();
        let outcome = match self.run_to_fixed_point() {
            ControlFlow::Continue(()) => SearchOutcome::Complete,
            ControlFlow::Break(divergence) => SearchOutcome::Diverged(divergence),
        };
        debug!(
            "[FIND] {} objects at margin {} in {:.2}ms: {:?}",
            self.frontier.len(),
            self.margin,
            start.elapsed().as_secs_f64() * 1000.0,
            outcome
        );
        outcome
    }

    /// Objects reached so far, in discovery order per category
    pub fn found(&self) -> Vec<ObjectRef> {
        self.frontier.discovered().map(|e| e.object).collect()
    }

    /// Mark `candidate` and queue it. In DRC mode an object outside the
    /// Selected baseline is marked but not queued, and ends the run.
    pub(super) fn try_add(&mut self, candidate: ObjectRef, from: ObjectRef) -> ControlFlow<Divergence> {
        let Some(flags) = self.board.flags(candidate) else {
            warn!("{}", BoardError::UnknownObject(candidate));
            return ControlFlow::Continue(());
        };
        if flags.intersects(self.mode.visited) {
            return ControlFlow::Continue(());
        }
        if self.mode.drc && !flags.contains(ObjectFlags::SELECTED) {
            change_flags(
                self.board,
                candidate,
                self.mode.mark,
                ObjectFlags::NONE,
                self.undo.as_deref_mut(),
            );
            return ControlFlow::Break(Divergence { object: candidate, from });
        }
        self.frontier.add_if_new(
            self.board,
            FrontierEntry {
                object: candidate,
                from: Some(from),
            },
            self.mode.mark,
            self.undo.as_deref_mut(),
        );
        ControlFlow::Continue(())
    }
}
