//! DRC data types and structures
//!
//! Contains the design rules, the violation record handed to a reporter,
//! and the reporter protocol itself.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::board::{Coord, ObjectId, ObjectKind, Point};

/// Manufacturing limits, in board units
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignRules {
    /// Minimum copper spacing; shapes are grown by this much each side
    pub bloat: Coord,
    /// Minimum overlap for a joint; shapes are shrunk by half of it each side
    pub shrink: Coord,
    pub min_width: Coord,
    pub min_silk: Coord,
    pub min_drill: Coord,
    pub min_ring: Coord,
}

impl Default for DesignRules {
    fn default() -> Self {
        Self {
            bloat: 1000,
            shrink: 1000,
            min_width: 1000,
            min_silk: 700,
            min_drill: 1500,
            min_ring: 1000,
        }
    }
}

impl DesignRules {
    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("Failed to parse design rules")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open rules file {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("In rules file {}", path.display()))
    }

    /// Per-operand margin of the connectivity probe that finds shorts
    pub fn bloat_margin(&self) -> f64 {
        self.bloat as f64
    }

    /// Per-operand margin of the shrunk baseline that finds weak joints
    pub fn shrink_margin(&self) -> f64 {
        -(self.shrink as f64) / 2.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    BrokenTrace,
    CopperTooClose,
    LineTooThin,
    ArcTooThin,
    PadTooThin,
    DrillTooSmall,
    AnnularRingTooSmall,
    SilkTooThin,
    ElementSilkTooThin,
    PolygonClearance,
}

/// An object implicated in a violation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ImplicatedObject {
    pub kind: ObjectKind,
    pub id: ObjectId,
}

/// One detected issue, handed to the reporter and then dropped
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub title: String,
    pub explanation: String,
    pub location: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured: Option<Coord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Coord>,
    pub objects: Vec<ImplicatedObject>,
}

impl Violation {
    /// Violation without measurements; the driver fills in `objects`
    pub fn new(kind: ViolationKind, title: &str, explanation: impl Into<String>, location: Point) -> Self {
        Self {
            kind,
            title: title.to_string(),
            explanation: explanation.into(),
            location,
            measured: None,
            required: None,
            objects: Vec::new(),
        }
    }

    pub fn with_measurement(mut self, measured: Coord, required: Coord) -> Self {
        self.measured = Some(measured);
        self.required = Some(required);
        self
    }

    pub fn with_required(mut self, required: Coord) -> Self {
        self.required = Some(required);
        self
    }
}

/// Reporter's answer: keep scanning or stop here
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportDecision {
    Continue,
    Stop,
}

pub trait ViolationReporter {
    fn report(&mut self, violation: &Violation) -> ReportDecision;
}

impl<F> ViolationReporter for F
where
    F: FnMut(&Violation) -> ReportDecision,
{
    fn report(&mut self, violation: &Violation) -> ReportDecision {
        self(violation)
    }
}

/// Keeps every violation; optionally stops after a number of them
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub violations: Vec<Violation>,
    pub stop_after: Option<usize>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stopping_after(limit: usize) -> Self {
        Self {
            violations: Vec::new(),
            stop_after: Some(limit),
        }
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }
}

impl ViolationReporter for CollectingReporter {
    fn report(&mut self, violation: &Violation) -> ReportDecision {
        self.violations.push(violation.clone());
        match self.stop_after {
            Some(limit) if self.violations.len() >= limit => ReportDecision::Stop,
            _ => ReportDecision::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_defaults_fill_missing_fields() {
        let rules = DesignRules::from_json_str(r#"{"bloat": 600}"#).unwrap();
        assert_eq!(rules.bloat, 600);
        assert_eq!(rules.min_drill, DesignRules::default().min_drill);
        assert_eq!(rules.shrink_margin(), -500.0);
    }

    #[test]
    fn test_collecting_reporter_stops() {
        let mut reporter = CollectingReporter::stopping_after(2);
        let v = Violation::new(ViolationKind::LineTooThin, "Line width is too thin", "", Point::new(0, 0))
            .with_measurement(10, 20);
        assert_eq!(reporter.report(&v), ReportDecision::Continue);
        assert_eq!(reporter.report(&v), ReportDecision::Stop);
        assert_eq!(reporter.count(ViolationKind::LineTooThin), 2);
    }
}
