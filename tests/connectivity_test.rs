// Connection search over small hand-built boards
mod common;

use common::{line, pin, via, BoardBuilder};
use pcb_find::board::{BoardIndex, FlagUndoLog, ObjectFlags, ObjectRef, Point, UndoLog};
use pcb_find::find::{lookup_connection, lookup_connection_at, reset_connections, SearchContext, SearchMode};

fn sorted(mut objects: Vec<ObjectRef>) -> Vec<ObjectRef> {
    objects.sort();
    objects
}

#[test]
fn test_search_is_deterministic_and_idempotent() {
    let mut board = BoardBuilder::new(2)
        .pins("R1", &[((0, 0), 6000, 3000), ((0, 20000), 6000, 3000)])
        .pins("R2", &[((40000, 0), 6000, 3000), ((40000, 20000), 6000, 3000)])
        .line(0, (0, 0), (40000, 0), 1000)
        .via((20000, 0), 2000, 800)
        .line(1, (20000, 0), (20000, 15000), 1000)
        .line(0, (0, 40000), (40000, 40000), 1000)
        .build();
    let index = BoardIndex::build(&board);

    let first = sorted(lookup_connection(&mut board, &index, pin(0, 0), ObjectFlags::FOUND, false, None));
    assert_eq!(
        first,
        sorted(vec![pin(0, 0), pin(1, 0), line(0, 0), line(1, 0), via(0)])
    );

    // a second run from the same seed finds everything already marked
    let again = lookup_connection(&mut board, &index, pin(0, 0), ObjectFlags::FOUND, false, None);
    assert_eq!(again, vec![pin(0, 0)]);

    assert!(reset_connections(&mut board, ObjectFlags::FOUND, None));
    let rerun = sorted(lookup_connection(&mut board, &index, pin(0, 0), ObjectFlags::FOUND, false, None));
    assert_eq!(rerun, first);
    assert_eq!(sorted(board.flagged(ObjectFlags::FOUND)), first);
}

#[test]
fn test_bloated_pin_reaches_exactly_one_via() {
    let mut board = BoardBuilder::new(2)
        .pins("J1", &[((0, 0), 2000, 800)])
        .via((2500, 0), 2000, 800)
        .via((10000, 0), 2000, 800)
        .build();
    let index = BoardIndex::build(&board);

    let mut ctx = SearchContext::new(&mut board, &index, SearchMode::marking(ObjectFlags::FOUND)).with_margin(300.0);
    assert!(ctx.start(pin(0, 0)));
    ctx.run();
    assert_eq!(ctx.found(), vec![pin(0, 0), via(0)]);

    reset_connections(&mut board, ObjectFlags::FOUND, None);
    let mut ctx = SearchContext::new(&mut board, &index, SearchMode::marking(ObjectFlags::FOUND));
    assert!(ctx.start(pin(0, 0)));
    ctx.run();
    assert_eq!(ctx.found(), vec![pin(0, 0)]);
}

#[test]
fn test_layer_groups_separate_copper() {
    let mut board = BoardBuilder::new(2)
        .line(0, (0, 0), (10000, 0), 1000)
        .line(1, (0, 0), (10000, 0), 1000)
        .build();
    let index = BoardIndex::build(&board);
    let net = lookup_connection(&mut board, &index, line(0, 0), ObjectFlags::FOUND, false, None);
    assert_eq!(net, vec![line(0, 0)]);

    reset_connections(&mut board, ObjectFlags::FOUND, None);
    board.groups.groups = vec![vec![0, 1]];
    board.groups.solder = 0;
    let index = BoardIndex::build(&board);
    let net = lookup_connection(&mut board, &index, line(0, 0), ObjectFlags::FOUND, false, None);
    assert_eq!(sorted(net), vec![line(0, 0), line(1, 0)]);
}

#[test]
fn test_lookup_at_point_is_undoable() {
    let mut board = BoardBuilder::new(1)
        .pins("R1", &[((0, 0), 6000, 3000)])
        .line(0, (0, 0), (20000, 0), 1000)
        .build();
    let index = BoardIndex::build(&board);
    let mut log = FlagUndoLog::new();

    let net = lookup_connection_at(&mut board, &index, Point::new(15000, 0), 100, Some(&mut log))
        .expect("line under the point");
    assert_eq!(net.len(), 2);
    assert_eq!(log.depth(), 1);

    assert!(log.undo(&mut board));
    assert!(board.flagged(ObjectFlags::FOUND).is_empty());
}

#[test]
fn test_buried_via_reaches_only_its_layers() {
    let mut board = BoardBuilder::new(4)
        .buried_via((0, 0), 2000, 800, 0, 1)
        .line(0, (0, 0), (10000, 0), 1000)
        .line(3, (0, 0), (10000, 0), 1000)
        .build();
    let index = BoardIndex::build(&board);
    let net = lookup_connection(&mut board, &index, via(0), ObjectFlags::FOUND, false, None);
    assert_eq!(sorted(net), vec![via(0), line(0, 0)]);
}

#[test]
fn test_buried_vias_with_disjoint_spans_do_not_touch() {
    let mut board = BoardBuilder::new(4)
        .buried_via((0, 0), 2000, 800, 0, 1)
        .buried_via((500, 0), 2000, 800, 2, 3)
        .build();
    let index = BoardIndex::build(&board);
    let net = lookup_connection(&mut board, &index, via(0), ObjectFlags::FOUND, false, None);
    assert_eq!(net, vec![via(0)]);

    // a through-hole via spans every group and joins both
    let mut board = BoardBuilder::new(4)
        .buried_via((0, 0), 2000, 800, 0, 1)
        .buried_via((500, 0), 2000, 800, 2, 3)
        .via((0, 1000), 2000, 800)
        .build();
    let index = BoardIndex::build(&board);
    let net = lookup_connection(&mut board, &index, via(0), ObjectFlags::FOUND, false, None);
    assert_eq!(sorted(net), vec![via(0), via(1), via(2)]);
}

#[test]
fn test_no_drc_layer_is_not_searched() {
    let mut board = BoardBuilder::new(2)
        .no_drc(1)
        .via((0, 0), 2000, 800)
        .line(0, (0, 0), (10000, 0), 1000)
        .line(1, (0, 0), (10000, 0), 1000)
        .build();
    let index = BoardIndex::build(&board);
    let net = lookup_connection(&mut board, &index, via(0), ObjectFlags::FOUND, false, None);
    assert_eq!(sorted(net), vec![via(0), line(0, 0)]);
    assert!(board.flags(line(1, 0)).is_some_and(|f| !f.contains(ObjectFlags::FOUND)));
}
