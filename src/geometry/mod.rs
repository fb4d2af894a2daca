//! Geometric predicates
//!
//! This module contains:
//! - `distance`: Point, segment and triangle distances
//! - `primitives`: Capsule, Quad and arc reductions of board shapes
//! - `predicates`: Pairwise and point intersection tests with a margin
//! - `polygon`: Polygon region and clearance tests
//! - `shape`: Borrowed object view with pairwise dispatch

pub mod distance;
pub mod polygon;
pub mod predicates;
pub mod primitives;
pub mod shape;

pub use distance::{point_segment_distance, segment_distance, DPoint, Triangle};
pub use polygon::{
    arc_polygon, line_polygon, octagon, pad_polygon, pin_polygon, point_in_polygon,
    point_in_region, polygon_polygon, polygon_polygon_with, regions_intersect, triangulate,
};
pub use predicates::{
    arc_arc, line_arc, line_line, line_pad, pad_arc, pad_pad, pin_arc, pin_line, pin_pad, pin_pin,
    point_in_line, point_in_pad, point_in_pin, point_on_arc,
};
pub use primitives::{effective, ArcGeom, Capsule, Quad};
pub use shape::Shape;
