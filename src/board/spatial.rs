//! Spatial indexing for range queries over board objects
//!
//! Objects are bucketed by category and layer so a search can ask for,
//! say, only the lines of copper layer 2 whose bounding box meets an area.
//! The default index keeps one R-tree per bucket.

use rstar::{RTree, RTreeObject, AABB};
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::time::Instant;
use tracing::info;

use super::data::{Board, ObjectRef};
use super::layers::Side;
use super::types::{BoundingBox, Coord};

/// Category/layer partition of the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Vias,
    Pins,
    Pads(Side),
    Lines(usize),
    Arcs(usize),
    Polygons(usize),
    Rats,
}

/// Range queries over board objects
pub trait SpatialIndex {
    /// Call `visitor` once for every object of `bucket` whose bounding box
    /// meets `area`. Stops early when the visitor breaks.
    fn range_query(
        &self,
        bucket: Bucket,
        area: &BoundingBox,
        visitor: &mut dyn FnMut(ObjectRef) -> ControlFlow<()>,
    ) -> ControlFlow<()>;
}

/// Object wrapper for R-tree spatial indexing
#[derive(Clone, Debug)]
pub struct IndexedObject {
    pub object: ObjectRef,
    pub bounds: AABB<[Coord; 2]>,
}

impl IndexedObject {
    pub fn new(object: ObjectRef, bbox: BoundingBox) -> Self {
        Self {
            object,
            bounds: to_envelope(&bbox),
        }
    }
}

impl RTreeObject for IndexedObject {
    type Envelope = AABB<[Coord; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.bounds
    }
}

fn to_envelope(bbox: &BoundingBox) -> AABB<[Coord; 2]> {
    AABB::from_corners([bbox.x1, bbox.y1], [bbox.x2, bbox.y2])
}

/// One R-tree per bucket, built from a snapshot of the board geometry.
/// Flags may change freely afterwards; geometry edits need a rebuild.
#[derive(Default)]
pub struct BoardIndex {
    trees: HashMap<Bucket, RTree<IndexedObject>>,
}

impl BoardIndex {
    pub fn build(board: &Board) -> Self {
        let start = Instant::now();
        let mut buckets: HashMap<Bucket, Vec<IndexedObject>> = HashMap::new();
        let mut total = 0usize;

        let mut push = |bucket: Bucket, object: ObjectRef| {
            if let Some(bbox) = board.bounding_box(object) {
                buckets
                    .entry(bucket)
                    .or_default()
                    .push(IndexedObject::new(object, bbox));
                total += 1;
            }
        };

        for r in board.via_refs() {
            push(Bucket::Vias, r);
        }
        for r in board.pin_refs() {
            push(Bucket::Pins, r);
        }
        for r in board.pad_refs() {
            if let Some(pad) = board.pad(r) {
                push(Bucket::Pads(pad.side()), r);
            }
        }
        for r in board.line_refs() {
            if let ObjectRef::Line { layer, .. } = r {
                push(Bucket::Lines(layer), r);
            }
        }
        for r in board.arc_refs() {
            if let ObjectRef::Arc { layer, .. } = r {
                push(Bucket::Arcs(layer), r);
            }
        }
        for r in board.polygon_refs() {
            if let ObjectRef::Polygon { layer, .. } = r {
                push(Bucket::Polygons(layer), r);
            }
        }
        for r in board.rat_refs() {
            push(Bucket::Rats, r);
        }

        let trees: HashMap<Bucket, RTree<IndexedObject>> = buckets
            .into_iter()
            .map(|(bucket, objects)| (bucket, RTree::bulk_load(objects)))
            .collect();

        info!(
            "[INDEX] {} objects in {} buckets, built in {:.2}ms",
            total,
            trees.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Self { trees }
    }

    pub fn len(&self) -> usize {
        self.trees.values().map(|t| t.size()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SpatialIndex for BoardIndex {
    fn range_query(
        &self,
        bucket: Bucket,
        area: &BoundingBox,
        visitor: &mut dyn FnMut(ObjectRef) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        let Some(tree) = self.trees.get(&bucket) else {
            return ControlFlow::Continue(());
        };
        let envelope = to_envelope(area);
        for item in tree.locate_in_envelope_intersecting(&envelope) {
            visitor(item.object)?;
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Line, Pin, Point};

    fn collect(index: &BoardIndex, bucket: Bucket, area: BoundingBox) -> Vec<ObjectRef> {
        let mut found = Vec::new();
        let _ = index.range_query(bucket, &area, &mut |r| {
            found.push(r);
            ControlFlow::Continue(())
        });
        found.sort();
        found
    }

    #[test]
    fn test_range_query_by_bucket() {
        let mut board = Board::new(2);
        let via = board.add_via(Pin::new(Point::new(0, 0), 100, 50));
        let line = board
            .add_line(1, Line::new(Point::new(0, 0), Point::new(1000, 0), 20))
            .unwrap();
        let index = BoardIndex::build(&board);
        assert_eq!(index.len(), 2);

        let area = BoundingBox::new(-10, -10, 10, 10);
        assert_eq!(collect(&index, Bucket::Vias, area), vec![via]);
        assert_eq!(collect(&index, Bucket::Lines(1), area), vec![line]);
        assert!(collect(&index, Bucket::Lines(0), area).is_empty());
        assert!(collect(&index, Bucket::Vias, BoundingBox::new(500, 500, 600, 600)).is_empty());
    }

    #[test]
    fn test_range_query_stops_on_break() {
        let mut board = Board::new(1);
        for x in 0..5 {
            board.add_via(Pin::new(Point::new(x * 10, 0), 4, 2));
        }
        let index = BoardIndex::build(&board);
        let mut seen = 0;
        let flow = index.range_query(Bucket::Vias, &BoundingBox::new(-100, -100, 100, 100), &mut |_| {
            seen += 1;
            ControlFlow::Break(())
        });
        assert!(flow.is_break());
        assert_eq!(seen, 1);
    }
}
