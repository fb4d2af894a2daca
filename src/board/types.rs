//! Core object types for board data
//!
//! This module contains the primitives placed on a board: pins and vias,
//! pads, lines, arcs, polygons and ratlines, plus the elements that own
//! pins and pads. All coordinates are integer board units.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::flags::ObjectFlags;
use super::layers::{LayerSpan, Side};
use crate::geometry::{triangulate, Triangle};

/// Board coordinate unit
pub type Coord = i64;

/// Stable object identity, unique within a board
pub type ObjectId = u64;

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    pub fn to_f64(self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }
}

/// Axis-aligned box, inclusive on all sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: Coord,
    pub y1: Coord,
    pub x2: Coord,
    pub y2: Coord,
}

impl BoundingBox {
    pub fn new(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Square box of half-size `half` around `center`
    pub fn around(center: Point, half: Coord) -> Self {
        Self::new(center.x - half, center.y - half, center.x + half, center.y + half)
    }

    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first.x, first.y, first.x, first.y);
        for p in iter {
            bbox = bbox.including(p);
        }
        Some(bbox)
    }

    pub fn including(&self, p: Point) -> Self {
        Self {
            x1: self.x1.min(p.x),
            y1: self.y1.min(p.y),
            x2: self.x2.max(p.x),
            y2: self.y2.max(p.y),
        }
    }

    /// Grow on every side; a negative amount shrinks down to the centre
    pub fn expanded(&self, by: Coord) -> Self {
        let c = self.center();
        Self {
            x1: (self.x1 - by).min(c.x),
            y1: (self.y1 - by).min(c.y),
            x2: (self.x2 + by).max(c.x),
            y2: (self.y2 + by).max(c.y),
        }
    }

    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.x1 <= other.x2 && other.x1 <= self.x2 && self.y1 <= other.y2 && other.y1 <= self.y2
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }

    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
            x2: self.x2.max(other.x2),
            y2: self.y2.max(other.y2),
        }
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }
}

/// Pin of an element, or a via when owned by the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    #[serde(default)]
    pub id: ObjectId,
    pub position: Point,
    /// Copper diameter
    pub thickness: Coord,
    #[serde(default)]
    pub clearance: Coord,
    #[serde(default)]
    pub mask: Coord,
    pub drill: Coord,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub flags: ObjectFlags,
    /// Copper layers on which the pin connects to clearing polygons
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub thermals: Vec<usize>,
    /// Copper layer range for blind and buried vias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buried: Option<LayerSpan>,
}

impl Pin {
    pub fn new(position: Point, thickness: Coord, drill: Coord) -> Self {
        Self {
            id: 0,
            position,
            thickness,
            clearance: 0,
            mask: 0,
            drill,
            name: String::new(),
            number: String::new(),
            flags: ObjectFlags::NONE,
            thermals: Vec::new(),
            buried: None,
        }
    }

    pub fn with_number(mut self, number: &str) -> Self {
        self.number = number.to_string();
        self
    }

    pub fn with_clearance(mut self, clearance: Coord) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn with_flags(mut self, flags: ObjectFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_thermal(mut self, layer: usize) -> Self {
        self.thermals.push(layer);
        self
    }

    pub fn buried(mut self, from: usize, to: usize) -> Self {
        self.buried = Some(LayerSpan::new(from, to));
        self
    }

    pub fn is_hole(&self) -> bool {
        self.flags.contains(ObjectFlags::HOLE)
    }

    pub fn has_thermal(&self, layer: usize) -> bool {
        self.thermals.contains(&layer)
    }

    /// Copper radius; an unplated hole only has its drill
    pub fn radius(&self) -> f64 {
        if self.is_hole() {
            self.drill as f64 / 2.0
        } else {
            self.thickness as f64 / 2.0
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let half = (self.thickness.max(self.drill) + 1) / 2;
        BoundingBox::around(self.position, half)
    }
}

/// Straight trace segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    #[serde(default)]
    pub id: ObjectId,
    pub point1: Point,
    pub point2: Point,
    pub thickness: Coord,
    #[serde(default)]
    pub clearance: Coord,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Line {
    pub fn new(point1: Point, point2: Point, thickness: Coord) -> Self {
        Self {
            id: 0,
            point1,
            point2,
            thickness,
            clearance: 0,
            flags: ObjectFlags::NONE,
        }
    }

    pub fn with_clearance(mut self, clearance: Coord) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn with_flags(mut self, flags: ObjectFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn bounding_box(&self) -> BoundingBox {
        segment_bounding_box(self.point1, self.point2, self.thickness, self.flags)
    }

    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.point1.x + self.point2.x) / 2,
            (self.point1.y + self.point2.y) / 2,
        )
    }
}

/// Circular arc trace. Angles are in degrees, counter-clockwise from +x;
/// `delta` may be negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arc {
    #[serde(default)]
    pub id: ObjectId,
    pub center: Point,
    pub radius: Coord,
    pub start_angle: f64,
    pub delta: f64,
    pub thickness: Coord,
    #[serde(default)]
    pub clearance: Coord,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Arc {
    pub fn new(center: Point, radius: Coord, start_angle: f64, delta: f64, thickness: Coord) -> Self {
        Self {
            id: 0,
            center,
            radius,
            start_angle,
            delta,
            thickness,
            clearance: 0,
            flags: ObjectFlags::NONE,
        }
    }

    pub fn with_clearance(mut self, clearance: Coord) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn with_flags(mut self, flags: ObjectFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Start angle and a non-negative sweep, both in degrees
    pub fn normalized(&self) -> (f64, f64) {
        if self.delta < 0.0 {
            (self.start_angle + self.delta, -self.delta)
        } else {
            (self.start_angle, self.delta)
        }
    }

    pub fn contains_angle(&self, degrees: f64) -> bool {
        let (start, sweep) = self.normalized();
        sweep >= 360.0 || (degrees - start).rem_euclid(360.0) <= sweep
    }

    pub fn point_at(&self, degrees: f64) -> Point {
        let rad = degrees.to_radians();
        let r = self.radius as f64;
        Point::new(
            self.center.x + (r * rad.cos()).round() as Coord,
            self.center.y + (r * rad.sin()).round() as Coord,
        )
    }

    pub fn endpoints(&self) -> (Point, Point) {
        (
            self.point_at(self.start_angle),
            self.point_at(self.start_angle + self.delta),
        )
    }

    pub fn midpoint(&self) -> Point {
        self.point_at(self.start_angle + self.delta / 2.0)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let (a, b) = self.endpoints();
        let mut bbox = BoundingBox::new(a.x, a.y, b.x, b.y);
        for quadrant in 0..4 {
            let angle = 90.0 * quadrant as f64;
            if self.contains_angle(angle) {
                bbox = bbox.including(self.point_at(angle));
            }
        }
        bbox.expanded((self.thickness + 1) / 2)
    }
}

/// Surface-mount pad: a capsule between two points, with round or square ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pad {
    #[serde(default)]
    pub id: ObjectId,
    pub point1: Point,
    pub point2: Point,
    pub thickness: Coord,
    #[serde(default)]
    pub clearance: Coord,
    #[serde(default)]
    pub mask: Coord,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Pad {
    pub fn new(point1: Point, point2: Point, thickness: Coord) -> Self {
        Self {
            id: 0,
            point1,
            point2,
            thickness,
            clearance: 0,
            mask: 0,
            name: String::new(),
            number: String::new(),
            flags: ObjectFlags::NONE,
        }
    }

    pub fn with_number(mut self, number: &str) -> Self {
        self.number = number.to_string();
        self
    }

    pub fn with_clearance(mut self, clearance: Coord) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn with_flags(mut self, flags: ObjectFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn side(&self) -> Side {
        if self.flags.contains(ObjectFlags::ON_SOLDER) {
            Side::Solder
        } else {
            Side::Component
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        segment_bounding_box(self.point1, self.point2, self.thickness, self.flags)
    }

    pub fn midpoint(&self) -> Point {
        Point::new(
            (self.point1.x + self.point2.x) / 2,
            (self.point1.y + self.point2.y) / 2,
        )
    }
}

/// Represents a filled polygon (with optional holes)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    #[serde(default)]
    pub id: ObjectId,
    pub outer_ring: Vec<Point>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub holes: Vec<Vec<Point>>,
    #[serde(default)]
    pub flags: ObjectFlags,
    /// Triangulated region, built on first use
    #[serde(skip)]
    triangles: OnceLock<Vec<Triangle>>,
}

impl Polygon {
    pub fn new(outer_ring: Vec<Point>) -> Self {
        Self {
            id: 0,
            outer_ring,
            holes: Vec::new(),
            flags: ObjectFlags::NONE,
            triangles: OnceLock::new(),
        }
    }

    /// Axis-aligned rectangle
    pub fn rectangle(x1: Coord, y1: Coord, x2: Coord, y2: Coord) -> Self {
        Self::new(vec![
            Point::new(x1, y1),
            Point::new(x2, y1),
            Point::new(x2, y2),
            Point::new(x1, y2),
        ])
    }

    pub fn with_hole(mut self, hole: Vec<Point>) -> Self {
        self.holes.push(hole);
        self.triangles = OnceLock::new();
        self
    }

    pub fn with_flags(mut self, flags: ObjectFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Outer ring followed by every hole
    pub fn contours(&self) -> impl Iterator<Item = &[Point]> {
        std::iter::once(self.outer_ring.as_slice()).chain(self.holes.iter().map(|h| h.as_slice()))
    }

    /// Closed edges of every contour
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.contours().flat_map(|ring| {
            let n = ring.len();
            (0..n).map(move |i| (ring[i], ring[(i + 1) % n]))
        })
    }

    pub fn triangles(&self) -> &[Triangle] {
        self.triangles.get_or_init(|| triangulate(self))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.outer_ring.iter().copied())
            .unwrap_or(BoundingBox::new(0, 0, 0, 0))
    }
}

/// Unrouted connection between two net members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rat {
    #[serde(default)]
    pub id: ObjectId,
    pub point1: Point,
    pub point2: Point,
    /// Layer group at each end
    pub group1: usize,
    pub group2: usize,
    #[serde(default)]
    pub thickness: Coord,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Rat {
    pub fn new(point1: Point, group1: usize, point2: Point, group2: usize) -> Self {
        Self {
            id: 0,
            point1,
            point2,
            group1,
            group2,
            thickness: 0,
            flags: ObjectFlags::NONE,
        }
    }

    pub fn ends(&self) -> [(Point, usize); 2] {
        [(self.point1, self.group1), (self.point2, self.group2)]
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.point1.x, self.point1.y, self.point2.x, self.point2.y)
            .expanded((self.thickness + 1) / 2)
    }
}

/// Placed component owning pins, pads and a silk outline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Element {
    #[serde(default)]
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub pins: Vec<Pin>,
    #[serde(default)]
    pub pads: Vec<Pad>,
    #[serde(default)]
    pub silk_lines: Vec<Line>,
    #[serde(default)]
    pub silk_arcs: Vec<Arc>,
    #[serde(default)]
    pub flags: ObjectFlags,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_pin(mut self, pin: Pin) -> Self {
        self.pins.push(pin);
        self
    }

    pub fn with_pad(mut self, pad: Pad) -> Self {
        self.pads.push(pad);
        self
    }

    pub fn with_silk_line(mut self, line: Line) -> Self {
        self.silk_lines.push(line);
        self
    }
}

fn segment_bounding_box(p1: Point, p2: Point, thickness: Coord, flags: ObjectFlags) -> BoundingBox {
    // slanted square ends reach out to the corner diagonal
    let half = if flags.contains(ObjectFlags::SQUARE) {
        (thickness as f64 * std::f64::consts::FRAC_1_SQRT_2).ceil() as Coord
    } else {
        (thickness + 1) / 2
    };
    BoundingBox::new(p1.x, p1.y, p2.x, p2.y).expanded(half)
}
