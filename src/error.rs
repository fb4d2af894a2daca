//! Board consistency errors
//!
//! None of these cross the search or DRC entry points: the engine logs them
//! and skips the affected object.

use thiserror::Error;

use crate::board::{ObjectRef, Side};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("layer group {group} refers to copper layer {layer}, which does not exist")]
    MalformedLayerGroup { group: usize, layer: usize },

    #[error("copper layer {layer} is already a member of layer group {group}")]
    DuplicateGroupLayer { layer: usize, group: usize },

    #[error("{side:?} side refers to layer group {group}, which does not exist")]
    UnknownSideGroup { side: Side, group: usize },

    #[error("no object matches {0:?}")]
    UnknownObject(ObjectRef),

    #[error("copper layer {0} does not exist")]
    UnknownLayer(usize),

    #[error("silk layer {0} does not exist")]
    UnknownSilkLayer(usize),

    #[error("element {0} does not exist")]
    UnknownElement(usize),
}
