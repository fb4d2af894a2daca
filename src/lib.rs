//! Connectivity lookup and design-rule checking for printed circuit boards
//!
//! This crate contains:
//! - `board`: Board model, object flags, spatial index and undo log
//! - `geometry`: Intersection tests between copper shapes
//! - `find`: Net search from a seed object
//! - `drc`: Shrink, bloat and feature-size checks built on the search
//! - `error`: Board consistency errors

pub mod board;
pub mod drc;
pub mod error;
pub mod find;
pub mod geometry;

pub use board::{Board, BoardIndex, FlagUndoLog, ObjectFlags, ObjectRef};
pub use drc::{drc_all, CollectingReporter, DesignRules, Violation, ViolationReporter};
pub use error::BoardError;
pub use find::{lookup_connection, lookup_connection_at, rat_find, reset_connections};
