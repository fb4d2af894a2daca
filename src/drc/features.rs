//! Absolute feature checks
//!
//! Minimum widths, drills, annular rings and polygon clearances, checked
//! once per object independent of connectivity.

use std::ops::ControlFlow;

use super::runners::{DrcDriver, DrcPhase};
use super::types::{Violation, ViolationKind};
use crate::board::{Coord, ObjectFlags, ObjectRef, Point};
use crate::geometry::{pad_polygon, Shape};

impl DrcDriver<'_> {
    pub(super) fn absolute_checks(&mut self) -> ControlFlow<()> {
        self.set_phase(DrcPhase::AbsoluteChecks);
        let board = &*self.board;
        let checked_layer = |r: &ObjectRef| {
            r.copper_layer()
                .and_then(|l| board.layers.get(l))
                .is_some_and(|layer| !layer.no_drc)
        };
        let traces: Vec<ObjectRef> = board
            .line_refs()
            .filter(checked_layer)
            .chain(board.arc_refs().filter(checked_layer))
            .collect();
        let pins: Vec<ObjectRef> = board.pin_refs().collect();
        let pads: Vec<ObjectRef> = board.pad_refs().collect();
        let vias: Vec<ObjectRef> = board.via_refs().collect();
        let silk: Vec<ObjectRef> = board.silk_line_refs().collect();
        let elements = board.elements.len();

        for object in traces {
            self.plow_check(object)?;
            self.width_check(object)?;
        }
        for pin in pins {
            self.plow_check(pin)?;
            self.ring_check(pin)?;
            self.drill_check(pin)?;
        }
        for pad in pads {
            self.plow_check(pad)?;
            self.width_check(pad)?;
        }
        for via in vias {
            self.plow_check(via)?;
            self.ring_check(via)?;
            self.drill_check(via)?;
        }
        for line in silk {
            self.silk_check(line)?;
        }
        for element in 0..elements {
            self.element_silk_check(element)?;
        }

        self.set_phase(DrcPhase::Idle);
        ControlFlow::Continue(())
    }

    fn location_of(&self, object: ObjectRef) -> Point {
        self.board.location(object).unwrap_or(Point::new(0, 0))
    }

    /// Clearing polygons around `object` that it does not keep far enough from
    fn plow_check(&mut self, object: ObjectRef) -> ControlFlow<()> {
        let mut candidates = Vec::new();
        let walk = self.plow.for_each_candidate(&*self.board, object, &mut |polygon| {
            candidates.push(polygon);
            ControlFlow::Continue(())
        });
        debug_assert!(walk.is_continue(), "collecting visitor never breaks");
        let required = 2 * self.rules.bloat;

        let Some(shape) = self.board.shape(object) else {
            return ControlFlow::Continue(());
        };
        let offender = candidates.into_iter().find(|&polygon| {
            let Some(region) = self.board.polygon(polygon) else {
                return false;
            };
            match shape {
                Shape::Line(l) => l.flags.contains(ObjectFlags::CLEAR_LINE) && l.clearance < required,
                Shape::Arc(a) => a.flags.contains(ObjectFlags::CLEAR_LINE) && a.clearance < required,
                Shape::Pin(p) | Shape::Via(p) => {
                    let thermal = polygon.copper_layer().is_some_and(|l| p.has_thermal(l));
                    !thermal && p.clearance > 0 && p.clearance < required
                }
                Shape::Pad(p) => p.clearance > 0 && p.clearance < required && pad_polygon(p, region, 0.0),
                Shape::Polygon(_) | Shape::Rat(_) => false,
            }
        });
        let Some(polygon) = offender else {
            return ControlFlow::Continue(());
        };

        let clearance = match shape {
            Shape::Line(l) => l.clearance,
            Shape::Arc(a) => a.clearance,
            Shape::Pin(p) | Shape::Via(p) => p.clearance,
            Shape::Pad(p) => p.clearance,
            Shape::Polygon(_) | Shape::Rat(_) => 0,
        };
        let violation = Violation::new(
            ViolationKind::PolygonClearance,
            "Insufficient clearance inside polygon",
            format!(
                "{} keeps {} from the surrounding polygon; at least {} is required",
                self.board.describe(object),
                clearance / 2,
                self.rules.bloat
            ),
            self.location_of(object),
        )
        .with_measurement(clearance, required);
        self.emit(violation, &[object, polygon])
    }

    fn width_check(&mut self, object: ObjectRef) -> ControlFlow<()> {
        let (kind, title, thickness) = match self.board.shape(object) {
            Some(Shape::Line(l)) => (ViolationKind::LineTooThin, "Line width is too thin", l.thickness),
            Some(Shape::Arc(a)) => (ViolationKind::ArcTooThin, "Arc width is too thin", a.thickness),
            Some(Shape::Pad(p)) => (ViolationKind::PadTooThin, "Pad is too thin", p.thickness),
            _ => return ControlFlow::Continue(()),
        };
        if thickness >= self.rules.min_width {
            return ControlFlow::Continue(());
        }
        let violation = Violation::new(
            kind,
            title,
            format!(
                "{} is {} wide; the process needs at least {}",
                self.board.describe(object),
                thickness,
                self.rules.min_width
            ),
            self.location_of(object),
        )
        .with_measurement(thickness, self.rules.min_width);
        self.emit(violation, &[object])
    }

    /// Copper left around the drill. Unplated holes have none to check.
    fn ring_check(&mut self, object: ObjectRef) -> ControlFlow<()> {
        let Some(pin) = self.board.pin(object) else {
            return ControlFlow::Continue(());
        };
        if pin.is_hole() || pin.thickness - pin.drill >= 2 * self.rules.min_ring {
            return ControlFlow::Continue(());
        }
        let ring = (pin.thickness - pin.drill) / 2;
        let violation = Violation::new(
            ViolationKind::AnnularRingTooSmall,
            "Pin annular ring too small",
            format!(
                "{} leaves a ring of {} around its drill; at least {} is required",
                self.board.describe(object),
                ring,
                self.rules.min_ring
            ),
            self.location_of(object),
        )
        .with_measurement(ring, self.rules.min_ring);
        self.emit(violation, &[object])
    }

    fn drill_check(&mut self, object: ObjectRef) -> ControlFlow<()> {
        let Some(pin) = self.board.pin(object) else {
            return ControlFlow::Continue(());
        };
        if pin.drill >= self.rules.min_drill {
            return ControlFlow::Continue(());
        }
        let drill = pin.drill;
        let violation = Violation::new(
            ViolationKind::DrillTooSmall,
            "Pin drill size is too small",
            format!(
                "{} is drilled {}; the smallest available drill is {}",
                self.board.describe(object),
                drill,
                self.rules.min_drill
            ),
            self.location_of(object),
        )
        .with_measurement(drill, self.rules.min_drill);
        self.emit(violation, &[object])
    }

    fn silk_check(&mut self, object: ObjectRef) -> ControlFlow<()> {
        let Some(line) = self.board.line(object) else {
            return ControlFlow::Continue(());
        };
        if line.thickness >= self.rules.min_silk {
            return ControlFlow::Continue(());
        }
        let thickness = line.thickness;
        let violation = Violation::new(
            ViolationKind::SilkTooThin,
            "Silk line is too thin",
            format!("Silk is {} wide; the process needs at least {}", thickness, self.rules.min_silk),
            self.location_of(object),
        )
        .with_measurement(thickness, self.rules.min_silk);
        self.emit(violation, &[object])
    }

    /// One violation per element, however many of its outline strokes are thin
    fn element_silk_check(&mut self, element: usize) -> ControlFlow<()> {
        let Some(e) = self.board.elements.get(element) else {
            return ControlFlow::Continue(());
        };
        let min_silk = self.rules.min_silk;
        let thin: Vec<Coord> = e
            .silk_lines
            .iter()
            .map(|l| l.thickness)
            .chain(e.silk_arcs.iter().map(|a| a.thickness))
            .filter(|&t| t < min_silk)
            .collect();
        let Some(&thinnest) = thin.iter().min() else {
            return ControlFlow::Continue(());
        };
        let object = ObjectRef::Element { element };
        let violation = Violation::new(
            ViolationKind::ElementSilkTooThin,
            "Element has outline lines that are too thin",
            format!(
                "{} has {} outline line(s) thinner than {}",
                e.name,
                thin.len(),
                min_silk
            ),
            self.location_of(object),
        )
        .with_measurement(thinnest, min_silk);
        self.emit(violation, &[object])
    }
}

#[cfg(test)]
mod tests {
    use crate::board::{Board, Element, FlagUndoLog, Line, ObjectFlags, Pad, Pin, Point, Polygon};
    use crate::drc::{drc_all, CollectingReporter, DesignRules, ViolationKind};

    fn check(board: &mut Board) -> CollectingReporter {
        let mut reporter = CollectingReporter::new();
        let mut log = FlagUndoLog::new();
        drc_all(board, &DesignRules::default(), &mut reporter, &mut log);
        reporter
    }

    #[test]
    fn test_hole_skips_ring_but_not_drill() {
        let mut board = Board::new(2);
        board.add_via(Pin::new(Point::new(0, 0), 1200, 1000).with_flags(ObjectFlags::HOLE));
        board.add_via(Pin::new(Point::new(50000, 0), 1200, 1000));
        let reporter = check(&mut board);
        assert_eq!(reporter.count(ViolationKind::AnnularRingTooSmall), 1);
        assert_eq!(reporter.count(ViolationKind::DrillTooSmall), 2);
    }

    #[test]
    fn test_element_silk_reported_once() {
        let mut board = Board::new(2);
        board.add_element(
            Element::new("U1")
                .with_silk_line(Line::new(Point::new(0, 0), Point::new(10000, 0), 300))
                .with_silk_line(Line::new(Point::new(10000, 0), Point::new(10000, 10000), 400))
                .with_silk_line(Line::new(Point::new(0, 0), Point::new(0, 10000), 1000)),
        );
        let reporter = check(&mut board);
        assert_eq!(reporter.violations.len(), 1);
        let v = &reporter.violations[0];
        assert_eq!(v.kind, ViolationKind::ElementSilkTooThin);
        assert_eq!(v.measured, Some(300));
        assert!(v.explanation.contains("2 outline"));
    }

    #[test]
    fn test_board_silk_thickness() {
        let mut board = Board::new(2);
        board
            .add_silk_line(0, Line::new(Point::new(0, 0), Point::new(10000, 0), 500))
            .unwrap();
        assert_eq!(check(&mut board).count(ViolationKind::SilkTooThin), 1);
    }

    #[test]
    fn test_clearing_line_too_close_to_polygon() {
        let mut board = Board::new(2);
        board
            .add_polygon(0, Polygon::rectangle(0, 0, 100000, 100000).with_flags(ObjectFlags::CLEAR_POLY))
            .unwrap();
        board
            .add_line(
                0,
                Line::new(Point::new(20000, 50000), Point::new(80000, 50000), 2000)
                    .with_clearance(1500)
                    .with_flags(ObjectFlags::CLEAR_LINE),
            )
            .unwrap();
        board
            .add_line(
                0,
                Line::new(Point::new(20000, 20000), Point::new(80000, 20000), 2000)
                    .with_clearance(2000)
                    .with_flags(ObjectFlags::CLEAR_LINE),
            )
            .unwrap();
        let reporter = check(&mut board);
        assert_eq!(reporter.count(ViolationKind::PolygonClearance), 1);
        assert_eq!(reporter.violations.len(), 1);
        assert_eq!(reporter.violations[0].measured, Some(1500));
    }

    #[test]
    fn test_pad_without_clearance_is_exempt() {
        let mut board = Board::new(1);
        board
            .add_polygon(0, Polygon::rectangle(0, 0, 100000, 100000).with_flags(ObjectFlags::CLEAR_POLY))
            .unwrap();
        board.add_element(
            Element::new("C1")
                .with_pad(Pad::new(Point::new(10000, 10000), Point::new(12000, 10000), 3000).with_number("1"))
                .with_pad(
                    Pad::new(Point::new(40000, 10000), Point::new(42000, 10000), 3000)
                        .with_number("2")
                        .with_clearance(1000),
                ),
        );
        let reporter = check(&mut board);
        assert_eq!(reporter.count(ViolationKind::PolygonClearance), 1);
    }
}
