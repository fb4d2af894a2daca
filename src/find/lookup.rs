//! Connection lookups built on the search engine
//!
//! These are the entry points a viewer or the command line uses: find the
//! net under a point, find a net from a given object, clear the result,
//! list unconnected pins and report which element pins share a net.

use indexmap::IndexMap;
use serde::Serialize;
use std::ops::ControlFlow;
use std::time::Instant;
use tracing::{debug, info};

use super::context::{SearchContext, SearchMode};
use crate::board::{
    change_flags, Board, BoundingBox, Bucket, Coord, ObjectFlags, ObjectRef, Point, SpatialIndex,
    UndoLog,
};
use crate::geometry::{point_in_line, point_in_pad, point_in_pin, point_in_polygon, point_on_arc};

/// Clear `flags` on every object. Returns whether anything changed.
pub fn reset_connections(
    board: &mut Board,
    flags: ObjectFlags,
    mut undo: Option<&mut (dyn UndoLog + '_)>,
) -> bool {
    let mut changed = false;
    for object in board.all_refs() {
        changed |= change_flags(board, object, ObjectFlags::NONE, flags, undo.as_deref_mut());
    }
    changed
}

/// Mark everything connected to `seed` with `flag`; returns the net
pub fn lookup_connection(
    board: &mut Board,
    index: &dyn SpatialIndex,
    seed: ObjectRef,
    flag: ObjectFlags,
    and_rats: bool,
    undo: Option<&mut (dyn UndoLog + '_)>,
) -> Vec<ObjectRef> {
    let mode = SearchMode::marking(flag).with_rats(and_rats);
    let mut ctx = SearchContext::new(board, index, mode);
    if let Some(undo) = undo {
        ctx = ctx.with_undo(undo);
    }
    if !ctx.start(seed) {
        return Vec::new();
    }
    ctx.run();
    ctx.found()
}

/// Fresh lookup from `seed`: clears earlier results, marks the net with
/// `flag` and closes one undo step
pub fn rat_find(
    board: &mut Board,
    index: &dyn SpatialIndex,
    seed: ObjectRef,
    flag: ObjectFlags,
    and_rats: bool,
    mut undo: Option<&mut (dyn UndoLog + '_)>,
) -> Vec<ObjectRef> {
    reset_connections(board, ObjectFlags::FOUND | flag, undo.as_deref_mut());
    let found = lookup_connection(board, index, seed, flag, and_rats, undo.as_deref_mut());
    if let Some(log) = undo {
        log.commit();
    }
    found
}

/// Topmost copper object within `range` of `point`: pins and vias first,
/// then pads, lines, arcs and polygons
pub fn object_at(board: &Board, index: &dyn SpatialIndex, point: Point, range: Coord) -> Option<ObjectRef> {
    let area = BoundingBox::around(point, range.max(0));
    let radius = range.max(0) as f64;

    let mut buckets = vec![Bucket::Vias, Bucket::Pins];
    buckets.extend(crate::board::Side::BOTH.map(Bucket::Pads));
    for layer in 0..board.layer_count() {
        buckets.push(Bucket::Lines(layer));
        buckets.push(Bucket::Arcs(layer));
    }
    buckets.extend((0..board.layer_count()).map(Bucket::Polygons));

    for bucket in buckets {
        let mut hit = None;
        let stopped = index.range_query(bucket, &area, &mut |r| {
            let touches = match bucket {
                Bucket::Vias | Bucket::Pins => board.pin(r).is_some_and(|p| point_in_pin(point, radius, p)),
                Bucket::Pads(_) => board.pad(r).is_some_and(|p| point_in_pad(point, radius, p)),
                Bucket::Lines(_) => board.line(r).is_some_and(|l| point_in_line(point, radius, l)),
                Bucket::Arcs(_) => board.arc(r).is_some_and(|a| point_on_arc(point, radius, a)),
                Bucket::Polygons(_) => board.polygon(r).is_some_and(|p| point_in_polygon(point, radius, p)),
                Bucket::Rats => false,
            };
            if touches {
                hit = Some(r);
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        });
        if stopped.is_break() {
            return hit;
        }
    }
    None
}

/// Mark the net of the object under `point` Found, following ratlines.
/// Returns `None` if there is nothing there or it is already Found.
pub fn lookup_connection_at(
    board: &mut Board,
    index: &dyn SpatialIndex,
    point: Point,
    range: Coord,
    mut undo: Option<&mut (dyn UndoLog + '_)>,
) -> Option<Vec<ObjectRef>> {
    let seed = object_at(board, index, point, range)?;
    if board.flags(seed)?.contains(ObjectFlags::FOUND) {
        return None;
    }
    let found = lookup_connection(board, index, seed, ObjectFlags::FOUND, true, undo.as_deref_mut());
    if let Some(log) = undo {
        log.commit();
    }
    info!("[FIND] {} objects connected to {}", found.len(), board.describe(seed));
    Some(found)
}

/// Element pins and pads connected to nothing but themselves. Leaves no
/// Found flags behind.
pub fn lookup_unused_pins(board: &mut Board, index: &dyn SpatialIndex) -> Vec<ObjectRef> {
    reset_connections(board, ObjectFlags::FOUND, None);
    let seeds: Vec<ObjectRef> = board.pin_refs().chain(board.pad_refs()).collect();
    let mut unused = Vec::new();
    for seed in seeds {
        let net = lookup_connection(board, index, seed, ObjectFlags::FOUND, false, None);
        if net.len() == 1 {
            unused.push(seed);
        }
        reset_connections(board, ObjectFlags::FOUND, None);
    }
    debug!("{} unused pins and pads", unused.len());
    unused
}

/// Pins of one element and what they connect to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementConnections {
    pub element: String,
    /// Pin or pad number to the other elements' pins on the same net
    pub pins: IndexMap<String, Vec<String>>,
}

/// Per element, per pin or pad, the pins and pads of other elements on the
/// same net. Leaves no Found flags behind.
pub fn connection_report(board: &mut Board, index: &dyn SpatialIndex) -> Vec<ElementConnections> {
    let start = Instant::now();
    reset_connections(board, ObjectFlags::FOUND, None);
    let mut report = Vec::with_capacity(board.elements.len());

    for element in 0..board.elements.len() {
        let seeds: Vec<(String, ObjectRef)> = {
            let e = &board.elements[element];
            (0..e.pins.len())
                .map(|pin| (e.pins[pin].number.clone(), ObjectRef::Pin { element, pin }))
                .chain((0..e.pads.len()).map(|pad| (e.pads[pad].number.clone(), ObjectRef::Pad { element, pad })))
                .collect()
        };

        let mut pins = IndexMap::new();
        for (number, seed) in seeds {
            let net = lookup_connection(board, index, seed, ObjectFlags::FOUND, false, None);
            let peers: Vec<String> = net
                .into_iter()
                .filter(|r| matches!(r, ObjectRef::Pin { .. } | ObjectRef::Pad { .. }))
                .filter(|r| r.element() != Some(element))
                .map(|r| board.describe(r))
                .collect();
            reset_connections(board, ObjectFlags::FOUND, None);
            pins.entry(number).or_insert_with(Vec::new).extend(peers);
        }
        report.push(ElementConnections {
            element: board.elements[element].name.clone(),
            pins,
        });
    }

    info!(
        "[FIND] Connection report for {} elements in {:.2}ms",
        report.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardIndex, Element, FlagUndoLog, Line, Pad, Pin};

    fn two_resistors() -> Board {
        let mut board = Board::new(2);
        board.add_element(
            Element::new("R1")
                .with_pin(Pin::new(Point::new(0, 0), 6000, 3000).with_number("1"))
                .with_pin(Pin::new(Point::new(0, 20000), 6000, 3000).with_number("2")),
        );
        board.add_element(
            Element::new("R2")
                .with_pin(Pin::new(Point::new(40000, 0), 6000, 3000).with_number("1"))
                .with_pin(Pin::new(Point::new(40000, 20000), 6000, 3000).with_number("2")),
        );
        board
            .add_line(0, Line::new(Point::new(0, 0), Point::new(40000, 0), 1000))
            .unwrap();
        board
    }

    #[test]
    fn test_lookup_connection_at_point() {
        let mut board = two_resistors();
        let index = BoardIndex::build(&board);
        let mut log = FlagUndoLog::new();
        let found = lookup_connection_at(&mut board, &index, Point::new(20000, 100), 10, Some(&mut log))
            .unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.contains(&ObjectRef::Pin { element: 1, pin: 0 }));
        // already found: nothing to do
        assert!(lookup_connection_at(&mut board, &index, Point::new(0, 0), 10, None).is_none());
        assert!(log.undo(&mut board));
        assert!(board.flagged(ObjectFlags::FOUND).is_empty());
    }

    #[test]
    fn test_nothing_under_point() {
        let mut board = two_resistors();
        let index = BoardIndex::build(&board);
        assert!(lookup_connection_at(&mut board, &index, Point::new(20000, 10000), 10, None).is_none());
    }

    #[test]
    fn test_unused_pins() {
        let mut board = two_resistors();
        let index = BoardIndex::build(&board);
        let unused = lookup_unused_pins(&mut board, &index);
        assert_eq!(
            unused,
            vec![
                ObjectRef::Pin { element: 0, pin: 1 },
                ObjectRef::Pin { element: 1, pin: 1 },
            ]
        );
        assert!(board.flagged(ObjectFlags::FOUND).is_empty());
    }

    #[test]
    fn test_connection_report() {
        let mut board = two_resistors();
        let index = BoardIndex::build(&board);
        let report = connection_report(&mut board, &index);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].element, "R1");
        assert_eq!(report[0].pins["1"], vec!["R2-1".to_string()]);
        assert!(report[0].pins["2"].is_empty());
        let json = serde_json::to_string(&report[1]).unwrap();
        assert!(json.contains("\"R1-1\""));
    }

    #[test]
    fn test_rat_find_follows_ratlines_only_when_asked() {
        let mut board = two_resistors();
        board.add_rat(crate::board::Rat::new(Point::new(0, 20000), 0, Point::new(40000, 20000), 0));
        let index = BoardIndex::build(&board);
        let seed = ObjectRef::Pin { element: 0, pin: 1 };

        let without = rat_find(&mut board, &index, seed, ObjectFlags::FOUND, false, None);
        assert_eq!(without, vec![seed]);

        let mut log = FlagUndoLog::new();
        let with = rat_find(&mut board, &index, seed, ObjectFlags::FOUND, true, Some(&mut log));
        assert_eq!(with.len(), 3);
        assert!(with.contains(&ObjectRef::Pin { element: 1, pin: 1 }));
        assert!(with.contains(&ObjectRef::Rat { rat: 0 }));
        assert_eq!(log.depth(), 1);
    }

    #[test]
    fn test_pad_reached_through_pin() {
        let mut board = Board::new(2);
        board.add_element(
            Element::new("U1")
                .with_pin(Pin::new(Point::new(0, 0), 2000, 800).with_number("1"))
                .with_pad(Pad::new(Point::new(500, 0), Point::new(3000, 0), 600).with_number("2")),
        );
        let index = BoardIndex::build(&board);
        let net = lookup_connection(&mut board, &index, ObjectRef::Pin { element: 0, pin: 0 }, ObjectFlags::FOUND, false, None);
        assert_eq!(net.len(), 2);
    }
}
