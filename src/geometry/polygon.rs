//! Polygon tests
//!
//! A polygon is its outer contour minus its holes. Region overlap goes
//! through an earcut triangulation cached on the polygon; clearance
//! margins are applied to the other shape only, the polygon itself is
//! never grown or shrunk.

use super::distance::{segment_distance, segments_cross, DPoint, Triangle};
use super::primitives::{effective, octagon_points, Capsule, Quad};
use crate::board::{Arc, Coord, Line, ObjectFlags, Pad, Pin, Point, Polygon};

/// Triangulate a polygon with earcut. Degenerate input yields no triangles.
pub fn triangulate(polygon: &Polygon) -> Vec<Triangle> {
    if polygon.outer_ring.len() < 3 {
        return Vec::new();
    }

    // Build flat coordinate array for earcut
    let mut flat_coords: Vec<f64> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();

    for p in &polygon.outer_ring {
        flat_coords.push(p.x as f64);
        flat_coords.push(p.y as f64);
    }
    for hole in &polygon.holes {
        if hole.len() < 3 {
            continue; // Skip degenerate holes
        }
        hole_indices.push(flat_coords.len() / 2);
        for p in hole {
            flat_coords.push(p.x as f64);
            flat_coords.push(p.y as f64);
        }
    }

    let indices = earcutr::earcut(&flat_coords, &hole_indices, 2).unwrap_or_default();
    let vertex = |i: usize| [flat_coords[2 * i], flat_coords[2 * i + 1]];
    indices
        .chunks_exact(3)
        .map(|tri| Triangle::from_vertices(vertex(tri[0]), vertex(tri[1]), vertex(tri[2])))
        .collect()
}

fn point_in_ring(p: DPoint, ring: &[Point]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i].to_f64(), ring[j].to_f64());
        if (a[1] > p[1]) != (b[1] > p[1]) {
            let x = a[0] + (p[1] - a[1]) * (b[0] - a[0]) / (b[1] - a[1]);
            if p[0] < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Inside the outer contour and outside every hole
pub fn point_in_region(p: DPoint, polygon: &Polygon) -> bool {
    point_in_ring(p, &polygon.outer_ring) && !polygon.holes.iter().any(|h| point_in_ring(p, h))
}

/// Does a circle of `radius` around `p` touch the polygon?
pub fn point_in_polygon(p: Point, radius: f64, polygon: &Polygon) -> bool {
    let p = p.to_f64();
    point_in_region(p, polygon) || boundary_distance(p, p, polygon) < radius
}

/// Distance from a segment to the nearest contour edge
pub fn boundary_distance(a: DPoint, b: DPoint, polygon: &Polygon) -> f64 {
    polygon
        .edges()
        .map(|(e1, e2)| segment_distance(a, b, e1.to_f64(), e2.to_f64()).0)
        .fold(f64::MAX, f64::min)
}

/// Capsule against a polygon. The capsule takes the combined margin of
/// both operands.
pub fn capsule_polygon(c: &Capsule, polygon: &Polygon, bloat: f64) -> bool {
    let margin = 2.0 * bloat;
    if c.square {
        return quad_polygon(&Quad::from_capsule(c, margin), polygon, margin);
    }
    if point_in_region(c.p1, polygon) || point_in_region(c.p2, polygon) {
        return true;
    }
    let d = boundary_distance(c.p1, c.p2, polygon);
    d == 0.0 || d < effective(c.radius, margin)
}

fn quad_polygon(q: &Quad, polygon: &Polygon, margin: f64) -> bool {
    if q.corners.iter().any(|&p| point_in_region(p, polygon)) {
        return true;
    }
    if polygon.outer_ring.first().is_some_and(|p| q.contains(p.to_f64())) {
        return true;
    }
    let limit = margin.max(0.0);
    q.edges().iter().any(|&(a, b)| {
        let d = boundary_distance(a, b, polygon);
        d == 0.0 || d < limit
    })
}

pub fn line_polygon(line: &Line, polygon: &Polygon, bloat: f64) -> bool {
    capsule_polygon(&Capsule::from_line(line), polygon, bloat)
}

pub fn pad_polygon(pad: &Pad, polygon: &Polygon, bloat: f64) -> bool {
    capsule_polygon(&Capsule::from_pad(pad), polygon, bloat)
}

pub fn arc_polygon(arc: &Arc, polygon: &Polygon, bloat: f64) -> bool {
    let geom = super::primitives::ArcGeom::from_arc(arc);
    if geom.endpoints().iter().any(|&p| point_in_region(p, polygon)) {
        return true;
    }
    let limit = effective(geom.half_width, 2.0 * bloat);
    polygon.edges().any(|(e1, e2)| {
        let d = geom.segment_distance(e1.to_f64(), e2.to_f64());
        d == 0.0 || d < limit
    })
}

/// Octagonal pins are tested as an octagon polygon
pub fn pin_polygon(pin: &Pin, polygon: &Polygon, bloat: f64) -> bool {
    if pin.flags.contains(ObjectFlags::OCTAGON) && !pin.is_hole() {
        let radius = (pin.thickness as f64 / 2.0 + 2.0 * bloat).max(0.0);
        return polygon_polygon(&octagon(pin.position, radius), polygon, 0.0);
    }
    capsule_polygon(&Capsule::from_pin(pin), polygon, bloat)
}

/// Octagon polygon of the given inscribed radius
pub fn octagon(center: Point, radius: f64) -> Polygon {
    Polygon::new(
        octagon_points(center.to_f64(), radius)
            .into_iter()
            .map(|p| Point::new(p[0].round() as Coord, p[1].round() as Coord))
            .collect(),
    )
}

/// Un-bloated region overlap
pub fn regions_intersect(a: &Polygon, b: &Polygon) -> bool {
    let (ta, tb) = (a.triangles(), b.triangles());
    if ta.is_empty() || tb.is_empty() {
        return contours_intersect(a, b);
    }
    ta.iter().any(|x| tb.iter().any(|y| x.overlaps(y)))
}

fn contours_intersect(a: &Polygon, b: &Polygon) -> bool {
    a.outer_ring.iter().any(|p| point_in_region(p.to_f64(), b))
        || b.outer_ring.iter().any(|p| point_in_region(p.to_f64(), a))
        || a.edges().any(|(a1, a2)| {
            b.edges()
                .any(|(b1, b2)| segments_cross(a1.to_f64(), a2.to_f64(), b1.to_f64(), b2.to_f64()))
        })
}

pub fn polygon_polygon(a: &Polygon, b: &Polygon, bloat: f64) -> bool {
    polygon_polygon_with(a, b, bloat, &mut capsule_polygon)
}

/// Polygon against polygon with the per-edge test supplied by the caller.
/// Edges are only tested when the regions do not already overlap and a
/// positive bloat is requested.
pub fn polygon_polygon_with(
    a: &Polygon,
    b: &Polygon,
    bloat: f64,
    segment_test: &mut dyn FnMut(&Capsule, &Polygon, f64) -> bool,
) -> bool {
    let reach = (2.0 * bloat.max(0.0)).ceil() as Coord;
    if !a.bounding_box().expanded(reach).overlaps(&b.bounding_box()) {
        return false;
    }
    if regions_intersect(a, b) {
        return true;
    }
    if bloat <= 0.0 {
        return false;
    }
    a.edges()
        .any(|(p, q)| segment_test(&Capsule::edge(p.to_f64(), q.to_f64()), b, bloat))
}
