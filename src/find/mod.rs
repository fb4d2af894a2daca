//! Connection search
//!
//! This module contains:
//! - `frontier`: Per-category discovery lists with visitation cursors
//! - `context`: Search state, modes and DRC divergence
//! - `stages`: The PV→PV, PV→LO, LO→LO and LO→PV fan-out stages
//! - `lookup`: Entry points for net lookups and connection reports

pub mod context;
pub mod frontier;
pub mod lookup;
pub mod stages;

pub use context::{Divergence, SearchContext, SearchMode, SearchOutcome};
pub use frontier::{Category, FrontierEntry, ObjectFrontier};
pub use lookup::{
    connection_report, lookup_connection, lookup_connection_at, lookup_unused_pins, object_at,
    rat_find, reset_connections, ElementConnections,
};
pub use stages::may_connect;
