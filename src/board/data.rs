//! The board: every placed object, addressed through `ObjectRef`

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::flags::ObjectFlags;
use super::layers::{GroupTable, Layer, LayerGroups};
use super::types::{Arc, BoundingBox, Element, Line, ObjectId, Pad, Pin, Point, Polygon, Rat};
use crate::error::BoardError;
use crate::geometry::Shape;

/// Object category as reported to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Pin,
    Via,
    Pad,
    Line,
    Arc,
    Polygon,
    Rat,
    Element,
}

/// Address of an object: its owning layer or element plus its index there
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectRef {
    Via { via: usize },
    Pin { element: usize, pin: usize },
    Pad { element: usize, pad: usize },
    Line { layer: usize, line: usize },
    Arc { layer: usize, arc: usize },
    Polygon { layer: usize, polygon: usize },
    Rat { rat: usize },
    SilkLine { layer: usize, line: usize },
    Element { element: usize },
}

impl ObjectRef {
    pub fn kind(self) -> ObjectKind {
        match self {
            ObjectRef::Via { .. } => ObjectKind::Via,
            ObjectRef::Pin { .. } => ObjectKind::Pin,
            ObjectRef::Pad { .. } => ObjectKind::Pad,
            ObjectRef::Line { .. } | ObjectRef::SilkLine { .. } => ObjectKind::Line,
            ObjectRef::Arc { .. } => ObjectKind::Arc,
            ObjectRef::Polygon { .. } => ObjectKind::Polygon,
            ObjectRef::Rat { .. } => ObjectKind::Rat,
            ObjectRef::Element { .. } => ObjectKind::Element,
        }
    }

    /// Pins and vias
    pub fn is_pv(self) -> bool {
        matches!(self, ObjectRef::Via { .. } | ObjectRef::Pin { .. })
    }

    /// Copper layer of a line, arc or polygon
    pub fn copper_layer(self) -> Option<usize> {
        match self {
            ObjectRef::Line { layer, .. }
            | ObjectRef::Arc { layer, .. }
            | ObjectRef::Polygon { layer, .. } => Some(layer),
            _ => None,
        }
    }

    /// Owning element of a pin or pad
    pub fn element(self) -> Option<usize> {
        match self {
            ObjectRef::Pin { element, .. }
            | ObjectRef::Pad { element, .. }
            | ObjectRef::Element { element } => Some(element),
            _ => None,
        }
    }
}

/// Complete board: copper and silk layers, elements, vias and ratlines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    #[serde(default)]
    pub name: String,
    /// Copper layers, top to bottom
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub silk_layers: Vec<Layer>,
    #[serde(default)]
    pub groups: LayerGroups,
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub vias: Vec<Pin>,
    #[serde(default)]
    pub rats: Vec<Rat>,
    #[serde(skip)]
    next_id: ObjectId,
}

impl Board {
    /// Empty board with `copper_layers` layers, one group each, and the
    /// two silk layers
    pub fn new(copper_layers: usize) -> Self {
        Self {
            name: String::new(),
            layers: (0..copper_layers)
                .map(|i| Layer::new(&format!("copper{}", i + 1)))
                .collect(),
            silk_layers: vec![Layer::new("component silk"), Layer::new("solder silk")],
            groups: LayerGroups::one_per_layer(copper_layers),
            elements: Vec::new(),
            vias: Vec::new(),
            rats: Vec::new(),
            next_id: 1,
        }
    }

    /// Parse a JSON board description and give every object an id
    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let mut board: Board =
            serde_json::from_str(text).context("Failed to parse board description")?;
        board.assign_ids();
        Ok(board)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open board file {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("In board file {}", path.display()))
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn group_table(&self) -> GroupTable {
        self.groups.resolve(self.layers.len()).0
    }

    /// Consistency problems the engine will work around
    pub fn validate(&self) -> Vec<BoardError> {
        let (_, mut errors) = self.groups.resolve(self.layers.len());
        let layer_count = self.layers.len();
        for r in self.pin_refs().chain(self.via_refs()) {
            let Some(pin) = self.pin(r) else { continue };
            if let Some(span) = pin.buried {
                if span.to >= layer_count {
                    errors.push(BoardError::UnknownLayer(span.to));
                }
            }
            for &layer in &pin.thermals {
                if layer >= layer_count {
                    errors.push(BoardError::UnknownLayer(layer));
                }
            }
        }
        errors
    }

    // --- construction -------------------------------------------------

    fn next_id(&mut self) -> ObjectId {
        self.next_id = self.next_id.max(1);
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn for_each_id(&mut self, mut f: impl FnMut(&mut ObjectId)) {
        for layer in self.layers.iter_mut().chain(self.silk_layers.iter_mut()) {
            layer.lines.iter_mut().for_each(|o| f(&mut o.id));
            layer.arcs.iter_mut().for_each(|o| f(&mut o.id));
            layer.polygons.iter_mut().for_each(|o| f(&mut o.id));
        }
        for element in &mut self.elements {
            f(&mut element.id);
            element.pins.iter_mut().for_each(|o| f(&mut o.id));
            element.pads.iter_mut().for_each(|o| f(&mut o.id));
            element.silk_lines.iter_mut().for_each(|o| f(&mut o.id));
            element.silk_arcs.iter_mut().for_each(|o| f(&mut o.id));
        }
        self.vias.iter_mut().for_each(|o| f(&mut o.id));
        self.rats.iter_mut().for_each(|o| f(&mut o.id));
    }

    /// Give every object without an id (id 0) a fresh one
    pub fn assign_ids(&mut self) {
        let mut max = 0;
        self.for_each_id(|id| max = max.max(*id));
        let mut next = max + 1;
        self.for_each_id(|id| {
            if *id == 0 {
                *id = next;
                next += 1;
            }
        });
        self.next_id = next;
    }

    pub fn add_via(&mut self, mut via: Pin) -> ObjectRef {
        via.id = self.next_id();
        self.vias.push(via);
        ObjectRef::Via { via: self.vias.len() - 1 }
    }

    /// Add an element; returns its index
    pub fn add_element(&mut self, mut element: Element) -> usize {
        element.id = self.next_id();
        for pin in &mut element.pins {
            pin.id = self.next_id();
        }
        for pad in &mut element.pads {
            pad.id = self.next_id();
        }
        for line in &mut element.silk_lines {
            line.id = self.next_id();
        }
        for arc in &mut element.silk_arcs {
            arc.id = self.next_id();
        }
        self.elements.push(element);
        self.elements.len() - 1
    }

    pub fn add_line(&mut self, layer: usize, mut line: Line) -> Result<ObjectRef, BoardError> {
        if layer >= self.layers.len() {
            return Err(BoardError::UnknownLayer(layer));
        }
        line.id = self.next_id();
        let lines = &mut self.layers[layer].lines;
        lines.push(line);
        Ok(ObjectRef::Line { layer, line: lines.len() - 1 })
    }

    pub fn add_arc(&mut self, layer: usize, mut arc: Arc) -> Result<ObjectRef, BoardError> {
        if layer >= self.layers.len() {
            return Err(BoardError::UnknownLayer(layer));
        }
        arc.id = self.next_id();
        let arcs = &mut self.layers[layer].arcs;
        arcs.push(arc);
        Ok(ObjectRef::Arc { layer, arc: arcs.len() - 1 })
    }

    pub fn add_polygon(&mut self, layer: usize, mut polygon: Polygon) -> Result<ObjectRef, BoardError> {
        if layer >= self.layers.len() {
            return Err(BoardError::UnknownLayer(layer));
        }
        polygon.id = self.next_id();
        let polygons = &mut self.layers[layer].polygons;
        polygons.push(polygon);
        Ok(ObjectRef::Polygon { layer, polygon: polygons.len() - 1 })
    }

    pub fn add_silk_line(&mut self, layer: usize, mut line: Line) -> Result<ObjectRef, BoardError> {
        if layer >= self.silk_layers.len() {
            return Err(BoardError::UnknownSilkLayer(layer));
        }
        line.id = self.next_id();
        let lines = &mut self.silk_layers[layer].lines;
        lines.push(line);
        Ok(ObjectRef::SilkLine { layer, line: lines.len() - 1 })
    }

    pub fn add_rat(&mut self, mut rat: Rat) -> ObjectRef {
        rat.id = self.next_id();
        self.rats.push(rat);
        ObjectRef::Rat { rat: self.rats.len() - 1 }
    }

    // --- lookup ---------------------------------------------------------

    /// Pin or via
    pub fn pin(&self, r: ObjectRef) -> Option<&Pin> {
        match r {
            ObjectRef::Via { via } => self.vias.get(via),
            ObjectRef::Pin { element, pin } => self.elements.get(element)?.pins.get(pin),
            _ => None,
        }
    }

    pub fn pad(&self, r: ObjectRef) -> Option<&Pad> {
        match r {
            ObjectRef::Pad { element, pad } => self.elements.get(element)?.pads.get(pad),
            _ => None,
        }
    }

    pub fn line(&self, r: ObjectRef) -> Option<&Line> {
        match r {
            ObjectRef::Line { layer, line } => self.layers.get(layer)?.lines.get(line),
            ObjectRef::SilkLine { layer, line } => self.silk_layers.get(layer)?.lines.get(line),
            _ => None,
        }
    }

    pub fn arc(&self, r: ObjectRef) -> Option<&Arc> {
        match r {
            ObjectRef::Arc { layer, arc } => self.layers.get(layer)?.arcs.get(arc),
            _ => None,
        }
    }

    pub fn polygon(&self, r: ObjectRef) -> Option<&Polygon> {
        match r {
            ObjectRef::Polygon { layer, polygon } => self.layers.get(layer)?.polygons.get(polygon),
            _ => None,
        }
    }

    pub fn rat(&self, r: ObjectRef) -> Option<&Rat> {
        match r {
            ObjectRef::Rat { rat } => self.rats.get(rat),
            _ => None,
        }
    }

    /// Geometric view of a copper object; `None` for elements and stale refs
    pub fn shape(&self, r: ObjectRef) -> Option<Shape<'_>> {
        Some(match r {
            ObjectRef::Via { .. } => Shape::Via(self.pin(r)?),
            ObjectRef::Pin { .. } => Shape::Pin(self.pin(r)?),
            ObjectRef::Pad { .. } => Shape::Pad(self.pad(r)?),
            ObjectRef::Line { .. } | ObjectRef::SilkLine { .. } => Shape::Line(self.line(r)?),
            ObjectRef::Arc { .. } => Shape::Arc(self.arc(r)?),
            ObjectRef::Polygon { .. } => Shape::Polygon(self.polygon(r)?),
            ObjectRef::Rat { .. } => Shape::Rat(self.rat(r)?),
            ObjectRef::Element { .. } => return None,
        })
    }

    pub fn flags(&self, r: ObjectRef) -> Option<ObjectFlags> {
        match r {
            ObjectRef::Element { element } => self.elements.get(element).map(|e| e.flags),
            _ => self.shape(r).map(|s| s.flags()),
        }
    }

    pub fn flags_mut(&mut self, r: ObjectRef) -> Option<&mut ObjectFlags> {
        match r {
            ObjectRef::Via { via } => self.vias.get_mut(via).map(|o| &mut o.flags),
            ObjectRef::Pin { element, pin } => self
                .elements
                .get_mut(element)?
                .pins
                .get_mut(pin)
                .map(|o| &mut o.flags),
            ObjectRef::Pad { element, pad } => self
                .elements
                .get_mut(element)?
                .pads
                .get_mut(pad)
                .map(|o| &mut o.flags),
            ObjectRef::Line { layer, line } => self
                .layers
                .get_mut(layer)?
                .lines
                .get_mut(line)
                .map(|o| &mut o.flags),
            ObjectRef::Arc { layer, arc } => self
                .layers
                .get_mut(layer)?
                .arcs
                .get_mut(arc)
                .map(|o| &mut o.flags),
            ObjectRef::Polygon { layer, polygon } => self
                .layers
                .get_mut(layer)?
                .polygons
                .get_mut(polygon)
                .map(|o| &mut o.flags),
            ObjectRef::Rat { rat } => self.rats.get_mut(rat).map(|o| &mut o.flags),
            ObjectRef::SilkLine { layer, line } => self
                .silk_layers
                .get_mut(layer)?
                .lines
                .get_mut(line)
                .map(|o| &mut o.flags),
            ObjectRef::Element { element } => self.elements.get_mut(element).map(|e| &mut e.flags),
        }
    }

    /// Overwrite an object's flags; false for a stale reference
    pub fn set_flags(&mut self, r: ObjectRef, flags: ObjectFlags) -> bool {
        match self.flags_mut(r) {
            Some(slot) => {
                *slot = flags;
                true
            }
            None => false,
        }
    }

    pub fn object_id(&self, r: ObjectRef) -> Option<ObjectId> {
        match r {
            ObjectRef::Element { element } => self.elements.get(element).map(|e| e.id),
            _ => self.shape(r).map(|s| s.id()),
        }
    }

    pub fn bounding_box(&self, r: ObjectRef) -> Option<BoundingBox> {
        match r {
            ObjectRef::Element { element } => {
                let element = self.elements.get(element)?;
                element
                    .pins
                    .iter()
                    .map(|p| p.bounding_box())
                    .chain(element.pads.iter().map(|p| p.bounding_box()))
                    .chain(element.silk_lines.iter().map(|l| l.bounding_box()))
                    .reduce(|a, b| a.union(&b))
            }
            _ => self.shape(r).map(|s| s.bounding_box()),
        }
    }

    /// Representative point used to place a violation marker
    pub fn location(&self, r: ObjectRef) -> Option<Point> {
        match self.shape(r) {
            Some(Shape::Pin(p)) | Some(Shape::Via(p)) => Some(p.position),
            Some(Shape::Pad(p)) => Some(p.midpoint()),
            Some(Shape::Line(l)) => Some(l.midpoint()),
            Some(Shape::Arc(a)) => Some(a.midpoint()),
            Some(Shape::Polygon(p)) => Some(p.bounding_box().center()),
            Some(Shape::Rat(r)) => Some(Point::new(
                (r.point1.x + r.point2.x) / 2,
                (r.point1.y + r.point2.y) / 2,
            )),
            None => self.bounding_box(r).map(|b| b.center()),
        }
    }

    /// Human-readable name, e.g. `R1-2` for pin 2 of R1
    pub fn describe(&self, r: ObjectRef) -> String {
        let owner = r.element().and_then(|e| self.elements.get(e));
        match (r, owner) {
            (ObjectRef::Pin { .. }, Some(element)) => {
                let number = self.pin(r).map(|p| p.number.as_str()).unwrap_or("?");
                format!("{}-{}", element.name, number)
            }
            (ObjectRef::Pad { .. }, Some(element)) => {
                let number = self.pad(r).map(|p| p.number.as_str()).unwrap_or("?");
                format!("{}-{}", element.name, number)
            }
            (ObjectRef::Element { .. }, Some(element)) => element.name.clone(),
            _ => match self.object_id(r) {
                Some(id) => format!("{:?} #{}", r.kind(), id),
                None => format!("{:?}", r),
            },
        }
    }

    // --- enumeration ----------------------------------------------------

    pub fn via_refs(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        (0..self.vias.len()).map(|via| ObjectRef::Via { via })
    }

    pub fn pin_refs(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        self.elements.iter().enumerate().flat_map(|(element, e)| {
            (0..e.pins.len()).map(move |pin| ObjectRef::Pin { element, pin })
        })
    }

    pub fn pad_refs(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        self.elements.iter().enumerate().flat_map(|(element, e)| {
            (0..e.pads.len()).map(move |pad| ObjectRef::Pad { element, pad })
        })
    }

    pub fn line_refs(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        self.layers.iter().enumerate().flat_map(|(layer, l)| {
            (0..l.lines.len()).map(move |line| ObjectRef::Line { layer, line })
        })
    }

    pub fn arc_refs(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        self.layers.iter().enumerate().flat_map(|(layer, l)| {
            (0..l.arcs.len()).map(move |arc| ObjectRef::Arc { layer, arc })
        })
    }

    pub fn polygon_refs(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        self.layers.iter().enumerate().flat_map(|(layer, l)| {
            (0..l.polygons.len()).map(move |polygon| ObjectRef::Polygon { layer, polygon })
        })
    }

    pub fn rat_refs(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        (0..self.rats.len()).map(|rat| ObjectRef::Rat { rat })
    }

    pub fn silk_line_refs(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        self.silk_layers.iter().enumerate().flat_map(|(layer, l)| {
            (0..l.lines.len()).map(move |line| ObjectRef::SilkLine { layer, line })
        })
    }

    pub fn element_refs(&self) -> impl Iterator<Item = ObjectRef> + '_ {
        (0..self.elements.len()).map(|element| ObjectRef::Element { element })
    }

    /// Every object carrying flags
    pub fn all_refs(&self) -> Vec<ObjectRef> {
        self.pin_refs()
            .chain(self.pad_refs())
            .chain(self.via_refs())
            .chain(self.line_refs())
            .chain(self.arc_refs())
            .chain(self.polygon_refs())
            .chain(self.rat_refs())
            .chain(self.silk_line_refs())
            .chain(self.element_refs())
            .collect()
    }

    /// Objects whose flags contain all of `flags`
    pub fn flagged(&self, flags: ObjectFlags) -> Vec<ObjectRef> {
        self.all_refs()
            .into_iter()
            .filter(|&r| self.flags(r).is_some_and(|f| f.contains(flags)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_board() -> Board {
        let mut board = Board::new(2);
        board.add_element(
            Element::new("R1")
                .with_pin(Pin::new(Point::new(0, 0), 6000, 3000).with_number("1"))
                .with_pad(Pad::new(Point::new(0, 0), Point::new(0, 100), 500).with_number("2")),
        );
        board.add_via(Pin::new(Point::new(5000, 0), 3000, 1500));
        board
            .add_line(1, Line::new(Point::new(0, 0), Point::new(100, 0), 10))
            .unwrap();
        board
    }

    #[test]
    fn test_ids_are_unique() {
        let board = sample_board();
        let mut ids: Vec<ObjectId> = board
            .all_refs()
            .into_iter()
            .filter_map(|r| board.object_id(r))
            .collect();
        let count = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), count);
        assert!(!ids.contains(&0));
    }

    #[test]
    fn test_add_line_rejects_unknown_layer() {
        let mut board = Board::new(1);
        let err = board
            .add_line(3, Line::new(Point::new(0, 0), Point::new(1, 1), 1))
            .unwrap_err();
        assert_eq!(err, BoardError::UnknownLayer(3));
    }

    #[test]
    fn test_describe_pins_and_pads() {
        let board = sample_board();
        assert_eq!(board.describe(ObjectRef::Pin { element: 0, pin: 0 }), "R1-1");
        assert_eq!(board.describe(ObjectRef::Pad { element: 0, pad: 0 }), "R1-2");
    }

    #[test]
    fn test_flags_roundtrip_through_refs() {
        let mut board = sample_board();
        let via = ObjectRef::Via { via: 0 };
        assert!(board.set_flags(via, ObjectFlags::FOUND));
        assert_eq!(board.flagged(ObjectFlags::FOUND), vec![via]);
        assert!(!board.set_flags(ObjectRef::Via { via: 9 }, ObjectFlags::FOUND));
    }

    #[test]
    fn test_json_board_gets_ids() {
        let json = r#"{
            "layers": [{"name": "top", "lines": [
                {"point1": {"x": 0, "y": 0}, "point2": {"x": 10, "y": 0}, "thickness": 2}
            ]}],
            "vias": [{"position": {"x": 0, "y": 0}, "thickness": 10, "drill": 4, "flags": ["square"]}]
        }"#;
        let board = Board::from_json_str(json).unwrap();
        assert_eq!(board.layers[0].lines[0].id, 1);
        assert_eq!(board.vias[0].id, 2);
        assert!(board.vias[0].flags.contains(ObjectFlags::SQUARE));
    }
}
