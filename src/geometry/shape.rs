//! Borrowed view of any copper object, with pairwise dispatch

use super::polygon::{arc_polygon, line_polygon, pad_polygon, pin_polygon, polygon_polygon};
use super::predicates::{
    arc_arc, line_arc, line_line, line_pad, pad_arc, pad_pad, pin_arc, pin_line, pin_pad, pin_pin,
};
use crate::board::{
    Arc, BoundingBox, Line, ObjectFlags, ObjectId, ObjectKind, Pad, Pin, Point, Polygon, Rat,
};

#[derive(Debug, Clone, Copy)]
pub enum Shape<'a> {
    Pin(&'a Pin),
    Via(&'a Pin),
    Line(&'a Line),
    Arc(&'a Arc),
    Pad(&'a Pad),
    Polygon(&'a Polygon),
    Rat(&'a Rat),
}

impl<'a> Shape<'a> {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Shape::Pin(_) => ObjectKind::Pin,
            Shape::Via(_) => ObjectKind::Via,
            Shape::Line(_) => ObjectKind::Line,
            Shape::Arc(_) => ObjectKind::Arc,
            Shape::Pad(_) => ObjectKind::Pad,
            Shape::Polygon(_) => ObjectKind::Polygon,
            Shape::Rat(_) => ObjectKind::Rat,
        }
    }

    pub fn id(&self) -> ObjectId {
        match self {
            Shape::Pin(p) | Shape::Via(p) => p.id,
            Shape::Line(l) => l.id,
            Shape::Arc(a) => a.id,
            Shape::Pad(p) => p.id,
            Shape::Polygon(p) => p.id,
            Shape::Rat(r) => r.id,
        }
    }

    pub fn flags(&self) -> ObjectFlags {
        match self {
            Shape::Pin(p) | Shape::Via(p) => p.flags,
            Shape::Line(l) => l.flags,
            Shape::Arc(a) => a.flags,
            Shape::Pad(p) => p.flags,
            Shape::Polygon(p) => p.flags,
            Shape::Rat(r) => r.flags,
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Shape::Pin(p) | Shape::Via(p) => p.bounding_box(),
            Shape::Line(l) => l.bounding_box(),
            Shape::Arc(a) => a.bounding_box(),
            Shape::Pad(p) => p.bounding_box(),
            Shape::Polygon(p) => p.bounding_box(),
            Shape::Rat(r) => r.bounding_box(),
        }
    }

    pub fn as_pin(&self) -> Option<&'a Pin> {
        match *self {
            Shape::Pin(p) | Shape::Via(p) => Some(p),
            _ => None,
        }
    }

    /// Points a ratline end must coincide with to attach to this object
    pub fn rat_points(&self) -> Vec<Point> {
        match self {
            Shape::Pin(p) | Shape::Via(p) => vec![p.position],
            Shape::Line(l) => vec![l.point1, l.point2],
            Shape::Arc(a) => {
                let (start, end) = a.endpoints();
                vec![start, end]
            }
            Shape::Pad(p) => vec![p.point1, p.point2],
            Shape::Polygon(p) => p.outer_ring.first().copied().into_iter().collect(),
            Shape::Rat(r) => vec![r.point1, r.point2],
        }
    }

    /// Geometric overlap with `bloat` added to both operands. Ratlines
    /// never overlap anything; they connect through `rat_points`.
    pub fn intersects(&self, other: &Shape<'_>, bloat: f64) -> bool {
        use Shape::*;
        match (*self, *other) {
            (Rat(_), _) | (_, Rat(_)) => false,

            (Pin(a) | Via(a), Pin(b) | Via(b)) => pin_pin(a, b, bloat),
            (Pin(p) | Via(p), Pad(d)) | (Pad(d), Pin(p) | Via(p)) => pin_pad(p, d, bloat),
            (Pin(p) | Via(p), Line(l)) | (Line(l), Pin(p) | Via(p)) => pin_line(p, l, bloat),
            (Pin(p) | Via(p), Arc(a)) | (Arc(a), Pin(p) | Via(p)) => pin_arc(p, a, bloat),
            (Pin(p) | Via(p), Polygon(g)) | (Polygon(g), Pin(p) | Via(p)) => {
                pin_polygon(p, g, bloat)
            }

            (Line(a), Line(b)) => line_line(a, b, bloat),
            (Line(l), Arc(a)) | (Arc(a), Line(l)) => line_arc(l, a, bloat),
            (Line(l), Pad(d)) | (Pad(d), Line(l)) => line_pad(l, d, bloat),
            (Line(l), Polygon(g)) | (Polygon(g), Line(l)) => line_polygon(l, g, bloat),

            (Arc(a), Arc(b)) => arc_arc(a, b, bloat),
            (Arc(a), Pad(d)) | (Pad(d), Arc(a)) => pad_arc(d, a, bloat),
            (Arc(a), Polygon(g)) | (Polygon(g), Arc(a)) => arc_polygon(a, g, bloat),

            (Pad(a), Pad(b)) => pad_pad(a, b, bloat),
            (Pad(d), Polygon(g)) | (Polygon(g), Pad(d)) => pad_polygon(d, g, bloat),

            (Polygon(a), Polygon(b)) => polygon_polygon(a, b, bloat),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_is_symmetric() {
        let line = Line::new(Point::new(0, 0), Point::new(1000, 0), 100);
        let pad = Pad::new(Point::new(1040, 0), Point::new(1500, 0), 100);
        let poly = Polygon::rectangle(-200, -200, -30, 200);
        let shapes = [Shape::Line(&line), Shape::Pad(&pad), Shape::Polygon(&poly)];
        for a in &shapes {
            for b in &shapes {
                assert_eq!(a.intersects(b, 0.0), b.intersects(a, 0.0));
            }
        }
        assert!(shapes[0].intersects(&shapes[1], 0.0));
        assert!(shapes[0].intersects(&shapes[2], 0.0));
        assert!(!shapes[1].intersects(&shapes[2], 0.0));
    }

    #[test]
    fn test_rats_only_attach_by_points() {
        let rat = Rat::new(Point::new(0, 0), 0, Point::new(100, 0), 0);
        let line = Line::new(Point::new(0, 0), Point::new(100, 0), 10);
        assert!(!Shape::Rat(&rat).intersects(&Shape::Line(&line), 1000.0));
        assert_eq!(Shape::Line(&line).rat_points(), Shape::Rat(&rat).rat_points());
    }
}
