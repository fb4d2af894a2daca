//! Design Rule Check (DRC) for copper spacing, joints and feature sizes
//!
//! Nets are probed with the connection search at shrunk and bloated sizes;
//! objects the probes reach outside the nominal net are reported. Feature
//! sizes and polygon clearances are checked per object afterwards.
//!
//! # Submodules
//! - `types` - Design rules, violations and the reporter protocol
//! - `plow` - Clearing-polygon candidates for clearance checks
//! - `runners` - The driver and the `drc_all` entry point
//! - `connectivity` - Shrink and bloat checks per net
//! - `features` - Width, drill, ring, silk and clearance checks

mod connectivity;
mod features;
mod plow;
mod runners;
mod types;

pub use plow::{IndexPlow, PolygonClip};
pub use runners::{drc_all, DrcDriver, DrcOutcome, DrcPhase};
pub use types::{
    CollectingReporter, DesignRules, ImplicatedObject, ReportDecision, Violation, ViolationKind,
    ViolationReporter,
};
