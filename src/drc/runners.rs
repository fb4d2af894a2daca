//! DRC runner functions
//!
//! `DrcDriver` walks every unchecked net through the shrink and bloat
//! connectivity checks, then runs the absolute feature checks. Each issue
//! is highlighted through the undo log while the reporter looks at it.

use std::ops::ControlFlow;
use std::time::Instant;
use tracing::{debug, info};

use super::plow::{IndexPlow, PolygonClip};
use super::types::{DesignRules, ImplicatedObject, ReportDecision, Violation, ViolationReporter};
use crate::board::{change_flags, Board, BoardIndex, ObjectFlags, ObjectRef, SpatialIndex, UndoLog};
use crate::find::reset_connections;

/// Where the driver is in a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrcPhase {
    Idle,
    SeedSelected,
    ShrinkPass,
    BloatPass,
    AbsoluteChecks,
    /// The reporter asked to stop; terminal
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrcOutcome {
    Completed(usize),
    Aborted(usize),
}

impl DrcOutcome {
    pub fn violations(self) -> usize {
        match self {
            DrcOutcome::Completed(n) | DrcOutcome::Aborted(n) => n,
        }
    }

    /// Violation count, negated when the reporter stopped the scan
    pub fn signed_count(self) -> i64 {
        match self {
            DrcOutcome::Completed(n) => n as i64,
            DrcOutcome::Aborted(n) => -(n as i64),
        }
    }
}

pub struct DrcDriver<'a> {
    pub(super) board: &'a mut Board,
    pub(super) index: &'a dyn SpatialIndex,
    pub(super) plow: &'a dyn PolygonClip,
    pub(super) rules: &'a DesignRules,
    reporter: &'a mut dyn ViolationReporter,
    undo: &'a mut dyn UndoLog,
    phase: DrcPhase,
    count: usize,
}

impl<'a> DrcDriver<'a> {
    pub fn new(
        board: &'a mut Board,
        index: &'a dyn SpatialIndex,
        plow: &'a dyn PolygonClip,
        rules: &'a DesignRules,
        reporter: &'a mut dyn ViolationReporter,
        undo: &'a mut dyn UndoLog,
    ) -> Self {
        Self {
            board,
            index,
            plow,
            rules,
            reporter,
            undo,
            phase: DrcPhase::Idle,
            count: 0,
        }
    }

    pub fn phase(&self) -> DrcPhase {
        self.phase
    }

    /// Full scan: connectivity checks per net, then feature checks.
    /// Search flags are cleared afterwards, except that an aborted scan
    /// leaves Found and Selected showing where it stopped.
    pub fn run(mut self) -> DrcOutcome {
        let start = Instant::now();
        info!(
            "[DRC] Checking {} copper layers, {} elements, {} vias",
            self.board.layer_count(),
            self.board.elements.len(),
            self.board.vias.len()
        );

        if reset_connections(self.board, ObjectFlags::SEARCH, Some(&mut *self.undo)) {
            self.undo.commit();
        }

        let outcome = match self.scan() {
            ControlFlow::Continue(()) => {
                reset_connections(self.board, ObjectFlags::SEARCH, None);
                DrcOutcome::Completed(self.count)
            }
            ControlFlow::Break(()) => {
                reset_connections(self.board, ObjectFlags::DRC, None);
                DrcOutcome::Aborted(self.count)
            }
        };

        info!(
            "[DRC] {:?}: {} violations in {:.2}ms",
            outcome,
            outcome.violations(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        outcome
    }

    fn scan(&mut self) -> ControlFlow<()> {
        self.connectivity_checks()?;
        self.absolute_checks()
    }

    pub(super) fn set_phase(&mut self, phase: DrcPhase) {
        if self.phase != DrcPhase::Aborted && self.phase != phase {
            debug!("[DRC] {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }

    /// Highlight `implicated`, hand the violation to the reporter and act
    /// on its answer. Breaks when the reporter asks to stop.
    pub(super) fn emit(&mut self, mut violation: Violation, implicated: &[ObjectRef]) -> ControlFlow<()> {
        self.count += 1;
        violation.objects = implicated
            .iter()
            .filter_map(|&object| {
                Some(ImplicatedObject {
                    kind: object.kind(),
                    id: self.board.object_id(object)?,
                })
            })
            .collect();

        let mut highlighted = false;
        for &object in implicated {
            highlighted |= change_flags(
                self.board,
                object,
                ObjectFlags::WARN,
                ObjectFlags::NONE,
                Some(&mut *self.undo),
            );
        }
        if highlighted {
            self.undo.commit();
        }

        debug!(
            "[DRC] {} at ({}, {}): {}",
            violation.title, violation.location.x, violation.location.y, violation.explanation
        );
        match self.reporter.report(&violation) {
            ReportDecision::Continue => {
                if highlighted {
                    self.undo.undo(self.board);
                }
                ControlFlow::Continue(())
            }
            ReportDecision::Stop => {
                self.set_phase(DrcPhase::Aborted);
                info!("[DRC] Stopped by reporter after {} violations", self.count);
                ControlFlow::Break(())
            }
        }
    }
}

/// Run every check on `board`. Returns the number of violations, negated
/// if the reporter stopped the scan early.
pub fn drc_all(
    board: &mut Board,
    rules: &DesignRules,
    reporter: &mut dyn ViolationReporter,
    undo: &mut dyn UndoLog,
) -> i64 {
    let index = BoardIndex::build(board);
    let plow = IndexPlow::new(board, &index);
    DrcDriver::new(board, &index, &plow, rules, reporter, undo)
        .run()
        .signed_count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{FlagUndoLog, Line, Point};
    use crate::drc::{CollectingReporter, ViolationKind};

    fn thin_lines() -> Board {
        let mut board = Board::new(2);
        board
            .add_line(0, Line::new(Point::new(0, 0), Point::new(50000, 0), 500))
            .unwrap();
        board
            .add_line(1, Line::new(Point::new(0, 0), Point::new(50000, 0), 600))
            .unwrap();
        board
    }

    #[test]
    fn test_clean_board_has_no_violations() {
        let mut board = Board::new(2);
        board
            .add_line(0, Line::new(Point::new(0, 0), Point::new(50000, 0), 2000))
            .unwrap();
        let mut reporter = CollectingReporter::new();
        let mut log = FlagUndoLog::new();
        assert_eq!(drc_all(&mut board, &DesignRules::default(), &mut reporter, &mut log), 0);
        for flag in [ObjectFlags::FOUND, ObjectFlags::SELECTED, ObjectFlags::DRC] {
            assert!(board.flagged(flag).is_empty());
        }
    }

    #[test]
    fn test_reporter_sees_highlight_then_it_is_reverted() {
        let mut board = thin_lines();
        let mut warned = Vec::new();
        let mut log = FlagUndoLog::new();
        let mut reporter = |v: &Violation| {
            warned.push(v.kind);
            ReportDecision::Continue
        };
        let count = drc_all(&mut board, &DesignRules::default(), &mut reporter, &mut log);
        assert_eq!(count, 2);
        assert_eq!(warned, vec![ViolationKind::LineTooThin, ViolationKind::LineTooThin]);
        assert!(board.flagged(ObjectFlags::WARN).is_empty());
    }

    #[test]
    fn test_stop_aborts_and_keeps_highlight() {
        let mut board = thin_lines();
        let mut reporter = CollectingReporter::stopping_after(1);
        let mut log = FlagUndoLog::new();
        let count = drc_all(&mut board, &DesignRules::default(), &mut reporter, &mut log);
        assert_eq!(count, -1);
        assert_eq!(reporter.violations.len(), 1);
        assert_eq!(board.flagged(ObjectFlags::WARN), vec![ObjectRef::Line { layer: 0, line: 0 }]);
        assert!(board.flagged(ObjectFlags::DRC).is_empty());
    }

    #[test]
    fn test_outcome_signed_count() {
        assert_eq!(DrcOutcome::Completed(3).signed_count(), 3);
        assert_eq!(DrcOutcome::Aborted(2).signed_count(), -2);
        assert_eq!(DrcOutcome::Aborted(2).violations(), 2);
    }
}
