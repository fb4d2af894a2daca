//! Geometric primitives shared by the predicates
//!
//! Pins, pads and lines all reduce to a `Capsule`: a segment with a half
//! width, with round or square ends. A square capsule is turned into a
//! `Quad` before testing. Arcs reduce to `ArcGeom`.

use super::distance::{distance, point_segment_distance, segment_distance, segments_cross, DPoint};
use crate::board::{Arc, Line, ObjectFlags, Pad, Pin};

/// Size of an operand after applying a margin; never negative
pub fn effective(radius: f64, bloat: f64) -> f64 {
    (radius + bloat).max(0.0)
}

/// Arc points are rounded onto the board grid wherever the board exposes
/// them, so an arc core closer than this to another core meets it
pub const ARC_CONTACT: f64 = 1.0;

/// Segment with a half width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Capsule {
    pub p1: DPoint,
    pub p2: DPoint,
    pub radius: f64,
    pub square: bool,
}

impl Capsule {
    pub fn new(p1: DPoint, p2: DPoint, radius: f64, square: bool) -> Self {
        Self { p1, p2, radius, square }
    }

    pub fn from_line(line: &Line) -> Self {
        Self::new(
            line.point1.to_f64(),
            line.point2.to_f64(),
            line.thickness as f64 / 2.0,
            line.flags.contains(ObjectFlags::SQUARE),
        )
    }

    pub fn from_pad(pad: &Pad) -> Self {
        Self::new(
            pad.point1.to_f64(),
            pad.point2.to_f64(),
            pad.thickness as f64 / 2.0,
            pad.flags.contains(ObjectFlags::SQUARE),
        )
    }

    /// Unplated holes are always round
    pub fn from_pin(pin: &Pin) -> Self {
        let c = pin.position.to_f64();
        Self::new(c, c, pin.radius(), !pin.is_hole() && pin.flags.contains(ObjectFlags::SQUARE))
    }

    /// Zero-width capsule along a polygon or quad edge
    pub fn edge(a: DPoint, b: DPoint) -> Self {
        Self::new(a, b, 0.0, false)
    }

    /// Same segment with round ends
    pub fn rounded(self) -> Self {
        Self { square: false, ..self }
    }
}

/// Convex quadrilateral, corners in order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub corners: [DPoint; 4],
}

impl Quad {
    /// Rectangle covered by a square-ended capsule. A negative bloat shrinks
    /// it; positive bloat is left to the caller as a distance allowance.
    pub fn from_capsule(c: &Capsule, bloat: f64) -> Self {
        let half = (c.radius + bloat.min(0.0)).max(0.0);
        let dx = c.p2[0] - c.p1[0];
        let dy = c.p2[1] - c.p1[1];
        let len = dx.hypot(dy);
        let (ux, uy) = if len > 0.0 { (dx / len, dy / len) } else { (1.0, 0.0) };
        let (nx, ny) = (-uy, ux);
        let (ex, ey) = (ux * half, uy * half);
        let (wx, wy) = (nx * half, ny * half);
        Self {
            corners: [
                [c.p1[0] - ex - wx, c.p1[1] - ey - wy],
                [c.p2[0] + ex - wx, c.p2[1] + ey - wy],
                [c.p2[0] + ex + wx, c.p2[1] + ey + wy],
                [c.p1[0] - ex + wx, c.p1[1] - ey + wy],
            ],
        }
    }

    pub fn edges(&self) -> [(DPoint, DPoint); 4] {
        let c = &self.corners;
        [(c[0], c[1]), (c[1], c[2]), (c[2], c[3]), (c[3], c[0])]
    }

    /// Point inside or on the boundary
    pub fn contains(&self, p: DPoint) -> bool {
        let (min, max) = self.extent();
        if p[0] < min[0] || p[0] > max[0] || p[1] < min[1] || p[1] > max[1] {
            return false;
        }
        let mut has_neg = false;
        let mut has_pos = false;
        for (a, b) in self.edges() {
            let d = super::distance::orientation(a, b, p);
            has_neg |= d < 0.0;
            has_pos |= d > 0.0;
        }
        !(has_neg && has_pos)
    }

    fn extent(&self) -> (DPoint, DPoint) {
        let mut min = self.corners[0];
        let mut max = self.corners[0];
        for c in &self.corners[1..] {
            min = [min[0].min(c[0]), min[1].min(c[1])];
            max = [max[0].max(c[0]), max[1].max(c[1])];
        }
        (min, max)
    }

    /// Distance from a segment to the quad's area; 0 when they meet
    pub fn segment_distance(&self, a: DPoint, b: DPoint) -> f64 {
        if self.contains(a) || self.contains(b) {
            return 0.0;
        }
        self.edges()
            .iter()
            .map(|&(e1, e2)| segment_distance(a, b, e1, e2).0)
            .fold(f64::MAX, f64::min)
    }
}

/// Arc centerline with its half width. Angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeom {
    pub center: DPoint,
    pub radius: f64,
    pub start: f64,
    pub sweep: f64,
    pub half_width: f64,
}

impl ArcGeom {
    pub fn from_arc(arc: &Arc) -> Self {
        let (start, sweep) = arc.normalized();
        Self {
            center: arc.center.to_f64(),
            radius: arc.radius as f64,
            start,
            sweep: sweep.min(360.0),
            half_width: arc.thickness as f64 / 2.0,
        }
    }

    pub fn contains_angle(&self, degrees: f64) -> bool {
        self.sweep >= 360.0 || (degrees - self.start).rem_euclid(360.0) <= self.sweep
    }

    pub fn point_at(&self, degrees: f64) -> DPoint {
        let rad = degrees.to_radians();
        [
            self.center[0] + self.radius * rad.cos(),
            self.center[1] + self.radius * rad.sin(),
        ]
    }

    pub fn endpoints(&self) -> [DPoint; 2] {
        [self.point_at(self.start), self.point_at(self.start + self.sweep)]
    }

    fn angle_of(&self, p: DPoint) -> f64 {
        (p[1] - self.center[1]).atan2(p[0] - self.center[0]).to_degrees()
    }

    /// Distance from a point to the arc centerline
    pub fn point_distance(&self, p: DPoint) -> f64 {
        if distance(p, self.center) > 0.0 && self.contains_angle(self.angle_of(p)) {
            return (distance(p, self.center) - self.radius).abs();
        }
        let [e1, e2] = self.endpoints();
        distance(p, e1).min(distance(p, e2))
    }

    /// Distance from a segment to the arc centerline
    pub fn segment_distance(&self, a: DPoint, b: DPoint) -> f64 {
        let mut best = self.point_distance(a).min(self.point_distance(b));
        for e in self.endpoints() {
            best = best.min(point_segment_distance(e, a, b).0);
        }
        for p in segment_circle_intersections(a, b, self.center, self.radius) {
            if self.contains_angle(self.angle_of(p)) {
                return 0.0;
            }
        }
        // closest approach of the segment to the centre, projected onto the circle
        let (_, foot) = point_segment_distance(self.center, a, b);
        if distance(foot, self.center) > 0.0 && self.contains_angle(self.angle_of(foot)) {
            best = best.min((distance(foot, self.center) - self.radius).abs());
        }
        best
    }

    /// Distance between two arc centerlines
    pub fn arc_distance(&self, other: &ArcGeom) -> f64 {
        let mut best = f64::MAX;
        for e in other.endpoints() {
            best = best.min(self.point_distance(e));
        }
        for e in self.endpoints() {
            best = best.min(other.point_distance(e));
        }

        let centre_gap = distance(self.center, other.center);
        if centre_gap < 1e-9 {
            // concentric: the radial gap applies wherever the sweeps overlap
            if self.sweeps_overlap(other) {
                best = best.min((self.radius - other.radius).abs());
            }
            return best;
        }

        for p in circle_intersections(self.center, self.radius, other.center, other.radius) {
            if self.contains_angle(self.angle_of(p)) && other.contains_angle(other.angle_of(p)) {
                return 0.0;
            }
        }

        // closest points lie on the line of centres
        let toward = other.angle_of(self.center);
        for angle in [toward, toward + 180.0] {
            if other.contains_angle(angle) {
                best = best.min(self.point_distance(other.point_at(angle)));
            }
        }
        let toward = self.angle_of(other.center);
        for angle in [toward, toward + 180.0] {
            if self.contains_angle(angle) {
                best = best.min(other.point_distance(self.point_at(angle)));
            }
        }
        best
    }

    fn sweeps_overlap(&self, other: &ArcGeom) -> bool {
        self.contains_angle(other.start)
            || self.contains_angle(other.start + other.sweep)
            || other.contains_angle(self.start)
            || other.contains_angle(self.start + self.sweep)
    }
}

/// Points where a segment meets a circle
pub fn segment_circle_intersections(a: DPoint, b: DPoint, center: DPoint, radius: f64) -> Vec<DPoint> {
    let d = [b[0] - a[0], b[1] - a[1]];
    let f = [a[0] - center[0], a[1] - center[1]];
    let qa = d[0] * d[0] + d[1] * d[1];
    if qa < 1e-12 {
        return Vec::new();
    }
    let qb = 2.0 * (f[0] * d[0] + f[1] * d[1]);
    let qc = f[0] * f[0] + f[1] * f[1] - radius * radius;
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < 0.0 {
        return Vec::new();
    }
    let root = disc.sqrt();
    [(-qb - root) / (2.0 * qa), (-qb + root) / (2.0 * qa)]
        .into_iter()
        .filter(|t| (0.0..=1.0).contains(t))
        .map(|t| [a[0] + t * d[0], a[1] + t * d[1]])
        .collect()
}

/// Points where two circles meet; empty for concentric or separate circles
pub fn circle_intersections(c1: DPoint, r1: f64, c2: DPoint, r2: f64) -> Vec<DPoint> {
    let d = distance(c1, c2);
    if d < 1e-9 || d > r1 + r2 || d < (r1 - r2).abs() {
        return Vec::new();
    }
    let a = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
    let h = (r1 * r1 - a * a).max(0.0).sqrt();
    let ux = (c2[0] - c1[0]) / d;
    let uy = (c2[1] - c1[1]) / d;
    let mx = c1[0] + a * ux;
    let my = c1[1] + a * uy;
    vec![[mx - h * uy, my + h * ux], [mx + h * uy, my - h * ux]]
}

/// Regular octagon approximating an octagonal pin of the given radius
pub fn octagon_points(center: DPoint, radius: f64) -> Vec<DPoint> {
    // flat sides face the axes, matching the pin outline
    (0..8)
        .map(|i| {
            let angle = (22.5 + 45.0 * i as f64).to_radians();
            let r = radius / (std::f64::consts::PI / 8.0).cos();
            [center[0] + r * angle.cos(), center[1] + r * angle.sin()]
        })
        .collect()
}

/// True when segment `a1-a2` crosses any quad edge
pub fn crosses_quad(q: &Quad, a1: DPoint, a2: DPoint) -> bool {
    q.edges().iter().any(|&(e1, e2)| segments_cross(a1, a2, e1, e2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Point;

    #[test]
    fn test_quad_from_square_pin() {
        let pin = Pin::new(Point::new(0, 0), 100, 40).with_flags(ObjectFlags::SQUARE);
        let q = Quad::from_capsule(&Capsule::from_pin(&pin), 0.0);
        assert!(q.contains([50.0, 50.0]));
        assert!(q.contains([-49.0, 10.0]));
        assert!(!q.contains([51.0, 0.0]));
    }

    #[test]
    fn test_quad_negative_bloat_shrinks() {
        let c = Capsule::new([0.0, 0.0], [0.0, 0.0], 100.0, true);
        let q = Quad::from_capsule(&c, -30.0);
        assert!(q.contains([70.0, 0.0]));
        assert!(!q.contains([71.0, 0.0]));
        // positive bloat is not applied to the corners
        let q = Quad::from_capsule(&c, 30.0);
        assert!(!q.contains([101.0, 0.0]));
    }

    #[test]
    fn test_point_arc_distance() {
        let arc = ArcGeom::from_arc(&Arc::new(Point::new(0, 0), 100, 0.0, 90.0, 10));
        assert!((arc.point_distance([0.0, 150.0]) - 50.0).abs() < 1e-9);
        // outside the sweep: nearest endpoint
        assert!((arc.point_distance([0.0, -100.0]) - 100.0 * 2f64.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_segment_crossing_arc() {
        let arc = ArcGeom::from_arc(&Arc::new(Point::new(0, 0), 100, 0.0, 90.0, 10));
        assert_eq!(arc.segment_distance([0.0, 0.0], [200.0, 200.0]), 0.0);
        // same line through the unswept half stays away
        assert!(arc.segment_distance([0.0, 0.0], [-200.0, -200.0]) > 99.0);
    }

    #[test]
    fn test_concentric_arcs() {
        let a = ArcGeom::from_arc(&Arc::new(Point::new(0, 0), 100, 0.0, 90.0, 10));
        let b = ArcGeom::from_arc(&Arc::new(Point::new(0, 0), 120, 45.0, 90.0, 10));
        assert!((a.arc_distance(&b) - 20.0).abs() < 1e-9);
        let c = ArcGeom::from_arc(&Arc::new(Point::new(0, 0), 120, 180.0, 90.0, 10));
        assert!(a.arc_distance(&c) > 100.0);
    }

    #[test]
    fn test_crossing_arcs() {
        let a = ArcGeom::from_arc(&Arc::new(Point::new(0, 0), 100, -90.0, 180.0, 10));
        let b = ArcGeom::from_arc(&Arc::new(Point::new(150, 0), 100, 90.0, 180.0, 10));
        assert_eq!(a.arc_distance(&b), 0.0);
    }
}
