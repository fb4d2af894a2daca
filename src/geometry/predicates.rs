//! Shape intersection predicates
//!
//! Every test takes a `bloat` margin applied to both operands: a round
//! operand of radius `r` counts as `max(r + bloat, 0)`, and two shapes
//! overlap when the distance between their cores is strictly less than
//! the sum of those radii. Cores that meet always overlap, however far the
//! operands are shrunk; arc cores meet within `ARC_CONTACT` of the grid.
//! Square operands are resolved into a `Quad` first, at most one per call.

use super::distance::{point_segment_distance, segment_distance, DPoint};
use super::primitives::{crosses_quad, effective, ArcGeom, Capsule, Quad, ARC_CONTACT};
use crate::board::{Arc, Line, Pad, Pin, Point};

// --- point tests -------------------------------------------------------

/// Does a circle of `radius` around `p` touch the capsule?
pub fn point_in_capsule(p: DPoint, radius: f64, c: &Capsule) -> bool {
    if c.square {
        let q = Quad::from_capsule(c, 0.0);
        return q.contains(p)
            || q.edges()
                .iter()
                .any(|&(a, b)| point_segment_distance(p, a, b).0 < radius);
    }
    point_segment_distance(p, c.p1, c.p2).0 < c.radius + radius
}

pub fn point_in_pin(p: Point, radius: f64, pin: &Pin) -> bool {
    point_in_capsule(p.to_f64(), radius, &Capsule::from_pin(pin))
}

pub fn point_in_pad(p: Point, radius: f64, pad: &Pad) -> bool {
    point_in_capsule(p.to_f64(), radius, &Capsule::from_pad(pad))
}

pub fn point_in_line(p: Point, radius: f64, line: &Line) -> bool {
    point_in_capsule(p.to_f64(), radius, &Capsule::from_line(line))
}

/// Point within the arc's drawn width, end caps included
pub fn point_on_arc(p: Point, radius: f64, arc: &Arc) -> bool {
    let geom = ArcGeom::from_arc(arc);
    geom.point_distance(p.to_f64()) < geom.half_width + radius
}

// --- building blocks -----------------------------------------------------

/// Two capsules; square ends are resolved for one operand at a time
pub fn capsule_capsule(a: &Capsule, b: &Capsule, bloat: f64) -> bool {
    if a.square {
        let qa = Quad::from_capsule(a, bloat);
        if b.square {
            return quad_quad(&qa, &Quad::from_capsule(b, bloat), bloat);
        }
        return quad_capsule(&qa, b, bloat);
    }
    if b.square {
        return quad_capsule(&Quad::from_capsule(b, bloat), a, bloat);
    }
    let (d, _) = segment_distance(a.p1, a.p2, b.p1, b.p2);
    d == 0.0 || d < effective(a.radius, bloat) + effective(b.radius, bloat)
}

/// Quad against a capsule taken as round
pub fn quad_capsule(q: &Quad, c: &Capsule, bloat: f64) -> bool {
    if q.contains(c.p1) || q.contains(c.p2) || crosses_quad(q, c.p1, c.p2) {
        return true;
    }
    let limit = effective(c.radius, bloat) + bloat.max(0.0);
    q.edges()
        .iter()
        .any(|&(e1, e2)| segment_distance(e1, e2, c.p1, c.p2).0 < limit)
}

pub fn quad_quad(a: &Quad, b: &Quad, bloat: f64) -> bool {
    if a.corners.iter().any(|&p| b.contains(p)) || b.corners.iter().any(|&p| a.contains(p)) {
        return true;
    }
    let limit = 2.0 * bloat.max(0.0);
    a.edges().iter().any(|&(a1, a2)| {
        b.edges().iter().any(|&(b1, b2)| {
            let d = segment_distance(a1, a2, b1, b2).0;
            d == 0.0 || d < limit
        })
    })
}

pub fn quad_arc(q: &Quad, arc: &ArcGeom, bloat: f64) -> bool {
    if arc.endpoints().iter().any(|&p| q.contains(p)) {
        return true;
    }
    let limit = effective(arc.half_width, bloat) + bloat.max(0.0);
    q.edges().iter().any(|&(e1, e2)| {
        let d = arc.segment_distance(e1, e2);
        d < ARC_CONTACT || d < limit
    })
}

pub fn capsule_arc(c: &Capsule, arc: &ArcGeom, bloat: f64) -> bool {
    if c.square {
        return quad_arc(&Quad::from_capsule(c, bloat), arc, bloat);
    }
    let d = arc.segment_distance(c.p1, c.p2);
    d < ARC_CONTACT || d < effective(c.radius, bloat) + effective(arc.half_width, bloat)
}

// --- object pairs --------------------------------------------------------

pub fn line_line(a: &Line, b: &Line, bloat: f64) -> bool {
    capsule_capsule(&Capsule::from_line(a), &Capsule::from_line(b), bloat)
}

pub fn line_arc(line: &Line, arc: &Arc, bloat: f64) -> bool {
    capsule_arc(&Capsule::from_line(line), &ArcGeom::from_arc(arc), bloat)
}

pub fn arc_arc(a: &Arc, b: &Arc, bloat: f64) -> bool {
    let (ga, gb) = (ArcGeom::from_arc(a), ArcGeom::from_arc(b));
    let d = ga.arc_distance(&gb);
    d < ARC_CONTACT || d < effective(ga.half_width, bloat) + effective(gb.half_width, bloat)
}

/// Pins and vias; octagons count as round here
pub fn pin_pin(a: &Pin, b: &Pin, bloat: f64) -> bool {
    capsule_capsule(&Capsule::from_pin(a), &Capsule::from_pin(b), bloat)
}

pub fn pin_pad(pin: &Pin, pad: &Pad, bloat: f64) -> bool {
    capsule_capsule(&Capsule::from_pin(pin), &Capsule::from_pad(pad), bloat)
}

pub fn pin_line(pin: &Pin, line: &Line, bloat: f64) -> bool {
    capsule_capsule(&Capsule::from_pin(pin), &Capsule::from_line(line), bloat)
}

pub fn pin_arc(pin: &Pin, arc: &Arc, bloat: f64) -> bool {
    capsule_arc(&Capsule::from_pin(pin), &ArcGeom::from_arc(arc), bloat)
}

pub fn pad_pad(a: &Pad, b: &Pad, bloat: f64) -> bool {
    capsule_capsule(&Capsule::from_pad(a), &Capsule::from_pad(b), bloat)
}

pub fn line_pad(line: &Line, pad: &Pad, bloat: f64) -> bool {
    capsule_capsule(&Capsule::from_line(line), &Capsule::from_pad(pad), bloat)
}

pub fn pad_arc(pad: &Pad, arc: &Arc, bloat: f64) -> bool {
    capsule_arc(&Capsule::from_pad(pad), &ArcGeom::from_arc(arc), bloat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ObjectFlags;

    fn line(x1: i64, y1: i64, x2: i64, y2: i64, t: i64) -> Line {
        Line::new(Point::new(x1, y1), Point::new(x2, y2), t)
    }

    #[test]
    fn test_line_line_bloat() {
        // centres 2500 apart, edges 1500 apart
        let a = line(0, 0, 10000, 0, 1000);
        let b = line(0, 2500, 10000, 2500, 1000);
        assert!(!line_line(&a, &b, 0.0));
        assert!(!line_line(&a, &b, 750.0));
        assert!(line_line(&a, &b, 751.0));
    }

    #[test]
    fn test_line_line_shrink_breaks_overlap() {
        // ends 900 apart with 500 half-widths: overlap of 100
        let a = line(0, 0, 10000, 0, 1000);
        let b = line(10900, 0, 20000, 0, 1000);
        assert!(line_line(&a, &b, 0.0));
        assert!(!line_line(&a, &b, -500.0));
    }

    #[test]
    fn test_crossing_cores_touch_at_any_shrink() {
        let a = line(0, 0, 10000, 0, 1000);
        let b = line(9000, 0, 20000, 0, 1000);
        assert!(line_line(&a, &b, -500.0));
        assert!(line_line(&a, &b, -5000.0));
    }

    #[test]
    fn test_touching_is_not_overlap() {
        let a = line(0, 0, 100, 0, 10);
        let b = line(110, 0, 200, 0, 10);
        assert!(!line_line(&a, &b, 0.0));
    }

    #[test]
    fn test_square_pin_reaches_corner() {
        let square = Pin::new(Point::new(0, 0), 100, 30).with_flags(ObjectFlags::SQUARE);
        let round = Pin::new(Point::new(0, 0), 100, 30);
        // thin line passing 0.7 from the corner at (50, 50)
        let near_corner = line(1, 100, 100, 1, 2);
        assert!(pin_line(&square, &near_corner, 0.0));
        assert!(!pin_line(&round, &near_corner, 0.0));
    }

    #[test]
    fn test_square_pads_side_by_side() {
        let a = Pad::new(Point::new(0, 0), Point::new(100, 0), 50).with_flags(ObjectFlags::SQUARE);
        let b = Pad::new(Point::new(0, 60), Point::new(100, 60), 50).with_flags(ObjectFlags::SQUARE);
        assert!(!pad_pad(&a, &b, 0.0));
        assert!(pad_pad(&a, &b, 6.0));
        assert!(!pad_pad(&a, &b, 4.0));
    }

    #[test]
    fn test_pin_arc() {
        let arc = Arc::new(Point::new(0, 0), 1000, 0.0, 90.0, 100);
        let on_arc = Pin::new(Point::new(0, 1000), 200, 80);
        let off_sweep = Pin::new(Point::new(0, -1000), 200, 80);
        assert!(pin_arc(&on_arc, &arc, 0.0));
        assert!(!pin_arc(&off_sweep, &arc, 0.0));
    }

    #[test]
    fn test_chained_arcs_meet_at_any_shrink() {
        // the second arc's start lands a rounding error off (1000, 0)
        let a = Arc::new(Point::new(0, 0), 1000, 90.0, -90.0, 1000);
        let b = Arc::new(Point::new(2000, 0), 1000, 180.0, 90.0, 1000);
        assert!(arc_arc(&a, &b, -500.0));

        let apart = Arc::new(Point::new(3000, 0), 1000, 180.0, 90.0, 1000);
        assert!(!arc_arc(&a, &apart, 0.0));
    }

    #[test]
    fn test_line_from_rounded_arc_end_meets_arc() {
        let arc = Arc::new(Point::new(0, 0), 1000, 0.0, 45.0, 1000);
        let (_, end) = arc.endpoints();
        assert_eq!(end, Point::new(707, 707));
        let trace = Line::new(end, Point::new(707, 5000), 1000);
        assert!(line_arc(&trace, &arc, -500.0));
    }

    #[test]
    fn test_point_tests() {
        let pad = Pad::new(Point::new(0, 0), Point::new(100, 0), 20);
        assert!(point_in_pad(Point::new(105, 5), 1.0, &pad));
        assert!(!point_in_pad(Point::new(150, 0), 1.0, &pad));
        let arc = Arc::new(Point::new(0, 0), 100, 0.0, 90.0, 10);
        assert!(point_on_arc(Point::new(71, 71), 0.5, &arc));
        assert!(!point_on_arc(Point::new(-71, 71), 0.5, &arc));
    }
}
