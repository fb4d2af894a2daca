//! Layers and layer groups
//!
//! Copper layers are bundled into groups that are electrically equivalent
//! for connectivity purposes. One group is the component side and one the
//! solder side; surface pads live in the group of their side.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{Arc, Line, Polygon};
use crate::error::BoardError;

/// Board side for surface-mount pads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Component,
    Solder,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Component, Side::Solder];

    pub fn index(self) -> usize {
        match self {
            Side::Component => 0,
            Side::Solder => 1,
        }
    }
}

/// Inclusive range of copper layers spanned by a buried via
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpan {
    pub from: usize,
    pub to: usize,
}

impl LayerSpan {
    pub fn new(from: usize, to: usize) -> Self {
        Self {
            from: from.min(to),
            to: from.max(to),
        }
    }

    pub fn contains(&self, layer: usize) -> bool {
        layer >= self.from && layer <= self.to
    }
}

/// A drawing layer holding lines, arcs and polygons
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub arcs: Vec<Arc>,
    #[serde(default)]
    pub polygons: Vec<Polygon>,
    /// Excluded from connectivity traversal and DRC
    #[serde(default)]
    pub no_drc: bool,
}

impl Layer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Layer group definitions as stored on the board
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerGroups {
    /// Copper layer indices per group
    #[serde(default)]
    pub groups: Vec<Vec<usize>>,
    /// Group holding component-side pads
    #[serde(default)]
    pub component: usize,
    /// Group holding solder-side pads
    #[serde(default)]
    pub solder: usize,
}

impl LayerGroups {
    /// One group per copper layer; the first is the component side and the
    /// last the solder side
    pub fn one_per_layer(layer_count: usize) -> Self {
        Self {
            groups: (0..layer_count).map(|l| vec![l]).collect(),
            component: 0,
            solder: layer_count.saturating_sub(1),
        }
    }

    /// Validate against the copper layer count. Malformed entries are
    /// dropped and reported; ungrouped layers get a group of their own.
    pub fn resolve(&self, layer_count: usize) -> (GroupTable, Vec<BoardError>) {
        if self.groups.is_empty() {
            return Self::one_per_layer(layer_count).resolve(layer_count);
        }

        let mut errors = Vec::new();
        let mut table = GroupTable {
            groups: Vec::with_capacity(self.groups.len()),
            group_of_layer: vec![None; layer_count],
            side_groups: [None, None],
        };

        for (group, entries) in self.groups.iter().enumerate() {
            let mut members = Vec::with_capacity(entries.len());
            for &layer in entries {
                if layer >= layer_count {
                    errors.push(BoardError::MalformedLayerGroup { group, layer });
                    continue;
                }
                if let Some(existing) = table.group_of_layer[layer] {
                    errors.push(BoardError::DuplicateGroupLayer { layer, group: existing });
                    continue;
                }
                table.group_of_layer[layer] = Some(group);
                members.push(layer);
            }
            table.groups.push(members);
        }

        for layer in 0..layer_count {
            if table.group_of_layer[layer].is_none() {
                debug!("copper layer {} is not in any group; giving it its own", layer);
                table.group_of_layer[layer] = Some(table.groups.len());
                table.groups.push(vec![layer]);
            }
        }

        for (side, group) in [(Side::Component, self.component), (Side::Solder, self.solder)] {
            if group < table.groups.len() {
                table.side_groups[side.index()] = Some(group);
            } else {
                errors.push(BoardError::UnknownSideGroup { side, group });
            }
        }

        (table, errors)
    }
}

/// Validated layer-group lookup used by searches
#[derive(Debug, Clone, Default)]
pub struct GroupTable {
    groups: Vec<Vec<usize>>,
    group_of_layer: Vec<Option<usize>>,
    side_groups: [Option<usize>; 2],
}

impl GroupTable {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn layers(&self, group: usize) -> &[usize] {
        self.groups.get(group).map(|g| g.as_slice()).unwrap_or(&[])
    }

    pub fn group_of(&self, layer: usize) -> Option<usize> {
        self.group_of_layer.get(layer).copied().flatten()
    }

    pub fn side_group(&self, side: Side) -> Option<usize> {
        self.side_groups[side.index()]
    }

    /// Sides whose pads live in `group`
    pub fn sides_in(&self, group: usize) -> impl Iterator<Item = Side> + '_ {
        Side::BOTH
            .into_iter()
            .filter(move |&side| self.side_group(side) == Some(group))
    }

    /// Groups a pin or via reaches: every group for through-hole, the
    /// groups covering the span for buried vias
    pub fn groups_spanned(&self, span: Option<LayerSpan>) -> Vec<usize> {
        match span {
            None => (0..self.groups.len()).collect(),
            Some(span) => {
                let mut groups: Vec<usize> = (span.from..=span.to)
                    .filter_map(|layer| self.group_of(layer))
                    .collect();
                groups.sort_unstable();
                groups.dedup();
                groups
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_default_groups() {
        let (table, errors) = LayerGroups::default().resolve(3);
        assert!(errors.is_empty());
        assert_eq!(table.group_count(), 3);
        assert_eq!(table.side_group(Side::Component), Some(0));
        assert_eq!(table.side_group(Side::Solder), Some(2));
    }

    #[test]
    fn test_resolve_reports_malformed_entries() {
        let groups = LayerGroups {
            groups: vec![vec![0, 7], vec![1, 0]],
            component: 0,
            solder: 4,
        };
        let (table, errors) = groups.resolve(2);
        assert_eq!(
            errors,
            vec![
                BoardError::MalformedLayerGroup { group: 0, layer: 7 },
                BoardError::DuplicateGroupLayer { layer: 0, group: 0 },
                BoardError::UnknownSideGroup { side: Side::Solder, group: 4 },
            ]
        );
        assert_eq!(table.layers(0), &[0]);
        assert_eq!(table.layers(1), &[1]);
        assert_eq!(table.side_group(Side::Solder), None);
    }

    #[test]
    fn test_groups_spanned_by_buried_via() {
        let groups = LayerGroups {
            groups: vec![vec![0], vec![1, 2], vec![3]],
            component: 0,
            solder: 2,
        };
        let (table, _) = groups.resolve(4);
        assert_eq!(table.groups_spanned(None), vec![0, 1, 2]);
        assert_eq!(table.groups_spanned(Some(LayerSpan::new(1, 2))), vec![1]);
        assert_eq!(table.groups_spanned(Some(LayerSpan::new(0, 1))), vec![0, 1]);
    }
}
