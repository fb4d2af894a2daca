//! Board data model
//!
//! This module contains:
//! - `types`: Point, BoundingBox and the placed primitives
//! - `flags`: Per-object flag bitset
//! - `layers`: Copper layers, sides and layer groups
//! - `data`: The board itself and `ObjectRef` addressing
//! - `spatial`: Bucketed R-tree index for range queries
//! - `undo`: Undo log for flag changes

pub mod data;
pub mod flags;
pub mod layers;
pub mod spatial;
pub mod types;
pub mod undo;

pub use data::{Board, ObjectKind, ObjectRef};
pub use flags::ObjectFlags;
pub use layers::{GroupTable, Layer, LayerGroups, LayerSpan, Side};
pub use spatial::{BoardIndex, Bucket, IndexedObject, SpatialIndex};
pub use types::{Arc, BoundingBox, Coord, Element, Line, ObjectId, Pad, Pin, Point, Polygon, Rat};
pub use undo::{change_flags, FlagUndoLog, UndoLog};
