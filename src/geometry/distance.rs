//! Distance calculation algorithms
//!
//! Contains triangle, segment, and point distance calculations in `f64`.

/// Point in floating-point board units
pub type DPoint = [f64; 2];

/// Triangle with precomputed AABB for fast rejection
#[derive(Clone, Debug)]
pub struct Triangle {
    pub v0: DPoint,
    pub v1: DPoint,
    pub v2: DPoint,
    pub aabb_min: DPoint,
    pub aabb_max: DPoint,
}

impl Triangle {
    pub fn from_vertices(v0: DPoint, v1: DPoint, v2: DPoint) -> Self {
        Self {
            v0,
            v1,
            v2,
            aabb_min: [
                v0[0].min(v1[0]).min(v2[0]),
                v0[1].min(v1[1]).min(v2[1]),
            ],
            aabb_max: [
                v0[0].max(v1[0]).max(v2[0]),
                v0[1].max(v1[1]).max(v2[1]),
            ],
        }
    }

    /// Fast AABB-to-AABB distance (lower bound)
    pub fn aabb_distance(&self, other: &Triangle) -> f64 {
        let dx = (self.aabb_min[0].max(other.aabb_min[0])
            - self.aabb_max[0].min(other.aabb_max[0]))
        .max(0.0);
        let dy = (self.aabb_min[1].max(other.aabb_min[1])
            - self.aabb_max[1].min(other.aabb_max[1]))
        .max(0.0);
        (dx * dx + dy * dy).sqrt()
    }

    pub fn edges(&self) -> [(DPoint, DPoint); 3] {
        [(self.v0, self.v1), (self.v1, self.v2), (self.v2, self.v0)]
    }

    /// Point inside or on the boundary
    pub fn contains(&self, p: DPoint) -> bool {
        // degenerate triangles pass the sign test for any collinear point
        let xs = [self.v0[0], self.v1[0], self.v2[0]];
        let ys = [self.v0[1], self.v1[1], self.v2[1]];
        let inside_box = p[0] >= xs.iter().cloned().fold(f64::INFINITY, f64::min)
            && p[0] <= xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            && p[1] >= ys.iter().cloned().fold(f64::INFINITY, f64::min)
            && p[1] <= ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if !inside_box {
            return false;
        }
        let d0 = orientation(self.v0, self.v1, p);
        let d1 = orientation(self.v1, self.v2, p);
        let d2 = orientation(self.v2, self.v0, p);
        let has_neg = d0 < 0.0 || d1 < 0.0 || d2 < 0.0;
        let has_pos = d0 > 0.0 || d1 > 0.0 || d2 > 0.0;
        !(has_neg && has_pos)
    }

    /// Closed triangles share at least one point
    pub fn overlaps(&self, other: &Triangle) -> bool {
        if self.aabb_distance(other) > 0.0 {
            return false;
        }
        if [other.v0, other.v1, other.v2].iter().any(|&v| self.contains(v))
            || [self.v0, self.v1, self.v2].iter().any(|&v| other.contains(v))
        {
            return true;
        }
        self.edges().iter().any(|&(a1, a2)| {
            other
                .edges()
                .iter()
                .any(|&(b1, b2)| segments_cross(a1, a2, b1, b2))
        })
    }
}

/// Twice the signed area of (a, b, p); positive when p is left of a→b
pub fn orientation(a: DPoint, b: DPoint, p: DPoint) -> f64 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

fn on_segment(a: DPoint, b: DPoint, p: DPoint) -> bool {
    p[0] >= a[0].min(b[0]) && p[0] <= a[0].max(b[0]) && p[1] >= a[1].min(b[1]) && p[1] <= a[1].max(b[1])
}

/// Closed segments share a point (touching counts)
pub fn segments_cross(a1: DPoint, a2: DPoint, b1: DPoint, b2: DPoint) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}

/// Segment-to-segment minimum distance and the point midway between the
/// closest pair
pub fn segment_distance(a1: DPoint, a2: DPoint, b1: DPoint, b2: DPoint) -> (f64, DPoint) {
    if segments_cross(a1, a2, b1, b2) {
        return (0.0, midpoint(a1, a2));
    }

    let mut min_d = f64::MAX;
    let mut closest = [0.0f64; 2];

    for (p, s1, s2) in [(a1, b1, b2), (a2, b1, b2), (b1, a1, a2), (b2, a1, a2)] {
        let (d, q) = point_segment_distance(p, s1, s2);
        if d < min_d {
            min_d = d;
            closest = midpoint(p, q);
        }
    }

    (min_d, closest)
}

/// Point-to-segment minimum distance
pub fn point_segment_distance(p: DPoint, a: DPoint, b: DPoint) -> (f64, DPoint) {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ap = [p[0] - a[0], p[1] - a[1]];
    let ab_len2 = ab[0] * ab[0] + ab[1] * ab[1];

    if ab_len2 < 1e-10 {
        // Degenerate segment
        return (distance(p, a), a);
    }

    let t = ((ap[0] * ab[0] + ap[1] * ab[1]) / ab_len2).clamp(0.0, 1.0);
    let closest = [a[0] + t * ab[0], a[1] + t * ab[1]];
    (distance(p, closest), closest)
}

pub fn distance(a: DPoint, b: DPoint) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// Midpoint of two points
pub fn midpoint(a: DPoint, b: DPoint) -> DPoint {
    [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0]
}
