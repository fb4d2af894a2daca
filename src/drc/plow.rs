//! Clearing-polygon candidates for clearance checks
//!
//! A polygon flagged ClearPoly is cut back around the objects crossing it.
//! The clearance check needs, for one object, every such polygon on the
//! layers the object occupies whose bounding box could meet it.

use std::ops::ControlFlow;

use crate::board::{Board, Bucket, GroupTable, ObjectFlags, ObjectRef, SpatialIndex};
use crate::geometry::Shape;

pub trait PolygonClip {
    /// Call `callback` with every clearing polygon that could meet `object`
    fn for_each_candidate(
        &self,
        board: &Board,
        object: ObjectRef,
        callback: &mut dyn FnMut(ObjectRef) -> ControlFlow<()>,
    ) -> ControlFlow<()>;
}

/// Polygon candidates straight from the spatial index
pub struct IndexPlow<'a> {
    index: &'a dyn SpatialIndex,
    groups: GroupTable,
}

impl<'a> IndexPlow<'a> {
    pub fn new(board: &Board, index: &'a dyn SpatialIndex) -> Self {
        Self {
            index,
            groups: board.group_table(),
        }
    }

    /// Copper layers an object occupies
    fn layers_of(&self, board: &Board, object: ObjectRef) -> Vec<usize> {
        match object {
            ObjectRef::Line { layer, .. } | ObjectRef::Arc { layer, .. } => vec![layer],
            ObjectRef::Via { .. } | ObjectRef::Pin { .. } => match board.pin(object) {
                Some(pin) => self
                    .groups
                    .groups_spanned(pin.buried)
                    .into_iter()
                    .flat_map(|g| self.groups.layers(g).to_vec())
                    .collect(),
                None => Vec::new(),
            },
            ObjectRef::Pad { .. } => board
                .pad(object)
                .and_then(|pad| self.groups.side_group(pad.side()))
                .map(|g| self.groups.layers(g).to_vec())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

impl PolygonClip for IndexPlow<'_> {
    fn for_each_candidate(
        &self,
        board: &Board,
        object: ObjectRef,
        callback: &mut dyn FnMut(ObjectRef) -> ControlFlow<()>,
    ) -> ControlFlow<()> {
        let Some(bbox) = board.bounding_box(object) else {
            return ControlFlow::Continue(());
        };
        let clearance = match board.shape(object) {
            Some(Shape::Line(l)) => l.clearance,
            Some(Shape::Arc(a)) => a.clearance,
            Some(Shape::Pad(p)) => p.clearance,
            Some(Shape::Pin(p)) | Some(Shape::Via(p)) => p.clearance,
            _ => 0,
        };
        let area = bbox.expanded((clearance + 1) / 2);

        for layer in self.layers_of(board, object) {
            if board.layers.get(layer).map_or(true, |l| l.no_drc) {
                continue;
            }
            self.index.range_query(Bucket::Polygons(layer), &area, &mut |candidate| {
                let clearing = board
                    .flags(candidate)
                    .is_some_and(|f| f.contains(ObjectFlags::CLEAR_POLY));
                if clearing {
                    callback(candidate)
                } else {
                    ControlFlow::Continue(())
                }
            })?;
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardIndex, Line, Pin, Point, Polygon};

    #[test]
    fn test_candidates_are_clearing_polygons_on_the_object_layers() {
        let mut board = Board::new(2);
        let clearing = board
            .add_polygon(0, Polygon::rectangle(0, 0, 1000, 1000).with_flags(ObjectFlags::CLEAR_POLY))
            .unwrap();
        board
            .add_polygon(0, Polygon::rectangle(0, 0, 1000, 1000))
            .unwrap();
        let other_layer = board
            .add_polygon(1, Polygon::rectangle(0, 0, 1000, 1000).with_flags(ObjectFlags::CLEAR_POLY))
            .unwrap();
        let line = board
            .add_line(0, Line::new(Point::new(100, 100), Point::new(900, 100), 10).with_clearance(20))
            .unwrap();
        let via = board.add_via(Pin::new(Point::new(500, 500), 100, 40).with_clearance(20));

        let index = BoardIndex::build(&board);
        let plow = IndexPlow::new(&board, &index);
        let collect = |object| {
            let mut out = Vec::new();
            let _ = plow.for_each_candidate(&board, object, &mut |p| {
                out.push(p);
                ControlFlow::Continue(())
            });
            out.sort();
            out
        };
        assert_eq!(collect(line), vec![clearing]);
        assert_eq!(collect(via), vec![clearing, other_layer]);
    }
}
