//! Shrink and bloat connectivity checks
//!
//! Each net is searched three ways. Shrunk, it shows which joints survive
//! with less overlap than the rules ask for; bloated, it shows which other
//! nets come closer than the minimum spacing. Both are compared against
//! the net found at nominal size.

use std::ops::ControlFlow;
use tracing::debug;

use super::runners::{DrcDriver, DrcPhase};
use super::types::{Violation, ViolationKind};
use crate::board::{ObjectFlags, ObjectRef, Point};
use crate::find::{reset_connections, Divergence, ObjectFrontier, SearchContext, SearchMode, SearchOutcome};

impl DrcDriver<'_> {
    /// Check every net not yet covered, one seed at a time
    pub(super) fn connectivity_checks(&mut self) -> ControlFlow<()> {
        let seeds = self.seeds();
        debug!("[DRC] {} connectivity seeds", seeds.len());
        for seed in seeds {
            let checked = self
                .board
                .flags(seed)
                .map_or(true, |f| f.contains(ObjectFlags::DRC));
            if checked {
                continue;
            }
            self.set_phase(DrcPhase::SeedSelected);
            self.shrink_check(seed)?;
            self.bloat_check(seed)?;
            self.set_phase(DrcPhase::Idle);
        }
        ControlFlow::Continue(())
    }

    /// Pins, pads and vias, then loose copper on checked layers
    fn seeds(&self) -> Vec<ObjectRef> {
        let board = &*self.board;
        let checked_layer = |r: &ObjectRef| {
            r.copper_layer()
                .and_then(|l| board.layers.get(l))
                .is_some_and(|layer| !layer.no_drc)
        };
        board
            .pin_refs()
            .chain(board.pad_refs())
            .chain(board.via_refs())
            .chain(board.line_refs().filter(checked_layer))
            .chain(board.arc_refs().filter(checked_layer))
            .chain(board.polygon_refs().filter(checked_layer))
            .collect()
    }

    /// Search from `seed` marking `mode.mark`, at `margin` per operand
    fn search(&mut self, seed: ObjectRef, mode: SearchMode, margin: f64) {
        let mut ctx = SearchContext::new(self.board, self.index, mode).with_margin(margin);
        if ctx.start(seed) {
            ctx.run();
        }
    }

    /// Run (or resume) a DRC probe at `margin`. Returns the first object
    /// outside the Selected baseline and the frontier to resume from.
    fn probe(
        &mut self,
        seed: ObjectRef,
        margin: f64,
        resume: Option<ObjectFrontier>,
    ) -> (SearchOutcome, ObjectFrontier) {
        let mut ctx = SearchContext::new(self.board, self.index, SearchMode::drc_probe()).with_margin(margin);
        match resume {
            Some(frontier) => ctx = ctx.with_frontier(frontier),
            None => {
                if !ctx.start(seed) {
                    return (SearchOutcome::Complete, ctx.into_frontier());
                }
            }
        }
        let outcome = ctx.run();
        (outcome, ctx.into_frontier())
    }

    /// Joints that hold only because copper barely touches
    fn shrink_check(&mut self, seed: ObjectRef) -> ControlFlow<()> {
        if self.rules.shrink == 0 {
            return ControlFlow::Continue(());
        }
        self.set_phase(DrcPhase::ShrinkPass);
        reset_connections(self.board, ObjectFlags::FOUND | ObjectFlags::SELECTED, None);

        self.search(seed, SearchMode::marking(ObjectFlags::SELECTED), self.rules.shrink_margin());
        let (outcome, _) = self.probe(seed, 0.0, None);

        let flow = match outcome {
            SearchOutcome::Diverged(divergence) => {
                let violation = self.broken_trace(divergence);
                self.emit(violation, &[divergence.object, divergence.from])
            }
            SearchOutcome::Complete => ControlFlow::Continue(()),
        };
        if flow.is_continue() {
            reset_connections(self.board, ObjectFlags::FOUND | ObjectFlags::SELECTED, None);
        }
        flow
    }

    /// Other nets closer than the minimum spacing. Each foreign net is
    /// absorbed into the baseline after it is reported so the probe can
    /// resume past it.
    fn bloat_check(&mut self, seed: ObjectRef) -> ControlFlow<()> {
        self.set_phase(DrcPhase::BloatPass);
        let baseline = SearchMode::marking(ObjectFlags::SELECTED | ObjectFlags::DRC).visited_by(ObjectFlags::SELECTED);
        self.search(seed, baseline, 0.0);

        if self.rules.bloat > 0 {
            let mut resume = None;
            loop {
                let (outcome, frontier) = self.probe(seed, self.rules.bloat_margin(), resume.take());
                let SearchOutcome::Diverged(divergence) = outcome else {
                    break;
                };
                let already_checked = self
                    .board
                    .flags(divergence.object)
                    .is_some_and(|f| f.contains(ObjectFlags::DRC));
                if already_checked {
                    debug!(
                        "[DRC] {} already reported against this net",
                        self.board.describe(divergence.object)
                    );
                } else {
                    let violation = self.too_close(divergence);
                    self.emit(violation, &[divergence.object, divergence.from])?;
                }
                let absorb = SearchMode::marking(ObjectFlags::FOUND | ObjectFlags::SELECTED)
                    .visited_by(ObjectFlags::SELECTED);
                self.search(divergence.object, absorb, 0.0);
                resume = Some(frontier);
            }
        }

        reset_connections(self.board, ObjectFlags::FOUND | ObjectFlags::SELECTED, None);
        ControlFlow::Continue(())
    }

    fn divergence_location(&self, divergence: Divergence) -> Point {
        self.board
            .location(divergence.object)
            .or_else(|| self.board.location(divergence.from))
            .unwrap_or(Point::new(0, 0))
    }

    fn broken_trace(&self, divergence: Divergence) -> Violation {
        Violation::new(
            ViolationKind::BrokenTrace,
            "Potential for broken trace",
            format!(
                "{} and {} overlap by less than the minimum of {}; \
                 a small shift in manufacturing could break the joint",
                self.board.describe(divergence.from),
                self.board.describe(divergence.object),
                self.rules.shrink
            ),
            self.divergence_location(divergence),
        )
        .with_required(self.rules.shrink)
    }

    fn too_close(&self, divergence: Divergence) -> Violation {
        Violation::new(
            ViolationKind::CopperTooClose,
            "Copper areas too close",
            format!(
                "{} and {} belong to different nets and are closer than {}",
                self.board.describe(divergence.from),
                self.board.describe(divergence.object),
                self.rules.bloat
            ),
            self.divergence_location(divergence),
        )
        .with_required(self.rules.bloat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, BoardIndex, FlagUndoLog, Line};
    use crate::drc::{CollectingReporter, DesignRules, IndexPlow};

    #[test]
    fn test_probe_from_stale_seed_finds_nothing() {
        let mut board = Board::new(2);
        board
            .add_line(0, Line::new(Point::new(0, 0), Point::new(10000, 0), 1000))
            .unwrap();
        let index = BoardIndex::build(&board);
        let plow = IndexPlow::new(&board, &index);
        let rules = DesignRules::default();
        let mut reporter = CollectingReporter::new();
        let mut log = FlagUndoLog::new();

        let mut driver = DrcDriver::new(&mut board, &index, &plow, &rules, &mut reporter, &mut log);
        let stale = ObjectRef::Line { layer: 0, line: 7 };
        let (outcome, frontier) = driver.probe(stale, 0.0, None);
        assert_eq!(outcome, SearchOutcome::Complete);
        assert!(frontier.is_empty());
        assert!(board.flagged(ObjectFlags::FOUND).is_empty());
    }
}
