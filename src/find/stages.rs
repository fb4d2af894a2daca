//! The four fan-out stages of a connection search
//!
//! One pass runs PV→PV, PV→LO, LO→LO and LO→PV in that order; passes
//! repeat until every category's cursor has caught up with its list.
//! Every stage returns `ControlFlow` so a DRC divergence unwinds the whole
//! run. Entries are only marked visited once fully expanded, so a resumed
//! run picks up where the divergence happened.

use std::ops::ControlFlow;
use tracing::warn;

use super::context::{Divergence, SearchContext};
use super::frontier::Category;
use crate::board::{
    change_flags, BoundingBox, Bucket, Coord, ObjectFlags, ObjectRef, Pin, Point,
};
use crate::error::BoardError;
use crate::geometry::{pin_pin, Shape};

impl SearchContext<'_> {
    pub(super) fn run_to_fixed_point(&mut self) -> ControlFlow<Divergence> {
        loop {
            self.pv_to_pv()?;
            self.pv_to_lo()?;
            self.lo_to_lo()?;
            self.lo_to_pv()?;
            if self.frontier.is_exhausted() {
                return ControlFlow::Continue(());
            }
        }
    }

    /// Pins and vias touching newly found pins and vias
    fn pv_to_pv(&mut self) -> ControlFlow<Divergence> {
        let mut cursor = self.frontier.visited(Category::PinVia);
        while let Some(entry) = self.frontier.entry(Category::PinVia, cursor) {
            cursor += 1;
            let source = entry.object;
            let Some(bbox) = self.board.bounding_box(source) else {
                continue;
            };
            let area = self.query_area(bbox);
            for candidate in self.pv_candidates(&area) {
                if candidate == source {
                    continue;
                }
                let (touching, hole) = {
                    let (Some(a), Some(b)) = (self.board.pin(source), self.board.pin(candidate))
                    else {
                        continue;
                    };
                    (
                        self.pins_share_group(a, b) && pin_pin(a, b, self.margin),
                        a.is_hole() || b.is_hole(),
                    )
                };
                if !touching {
                    continue;
                }
                if hole {
                    self.warn_hole(candidate, source);
                    continue;
                }
                self.try_add(candidate, source)?;
            }
        }
        ControlFlow::Continue(())
    }

    /// Layer objects and ratlines touching newly found pins and vias
    fn pv_to_lo(&mut self) -> ControlFlow<Divergence> {
        while let Some(entry) = self.frontier.next_unvisited(Category::PinVia) {
            self.expand_pv(entry.object)?;
            self.frontier.mark_visited(Category::PinVia);
        }
        ControlFlow::Continue(())
    }

    fn expand_pv(&mut self, source: ObjectRef) -> ControlFlow<Divergence> {
        let Some(pin) = self.board.pin(source) else {
            return ControlFlow::Continue(());
        };
        if pin.is_hole() {
            return ControlFlow::Continue(());
        }
        let groups = self.groups.groups_spanned(pin.buried);
        let position = pin.position;
        let area = self.query_area(pin.bounding_box());

        for &group in &groups {
            for candidate in self.layer_candidates(group, &area) {
                if self.connects(source, candidate) {
                    self.try_add(candidate, source)?;
                }
            }
        }

        if self.mode.and_rats {
            for candidate in self.candidates(Bucket::Rats, &BoundingBox::around(position, 0)) {
                let attached = self.board.rat(candidate).is_some_and(|rat| {
                    rat.ends()
                        .iter()
                        .any(|&(p, g)| p == position && groups.contains(&g))
                });
                if attached {
                    self.try_add(candidate, source)?;
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Layer objects reaching each other within their group. Loops until
    /// no category grows, without moving the `visited` cursors.
    fn lo_to_lo(&mut self) -> ControlFlow<Divergence> {
        let categories = self.frontier.layer_categories();
        let mut cursors: Vec<usize> = categories
            .iter()
            .map(|&c| self.frontier.visited(c))
            .collect();
        loop {
            let mut progressed = false;
            for (i, &category) in categories.iter().enumerate() {
                while let Some(entry) = self.frontier.entry(category, cursors[i]) {
                    cursors[i] += 1;
                    progressed = true;
                    self.expand_layer_object(entry.object)?;
                }
            }
            if !progressed {
                return ControlFlow::Continue(());
            }
        }
    }

    fn expand_layer_object(&mut self, source: ObjectRef) -> ControlFlow<Divergence> {
        if matches!(source, ObjectRef::Rat { .. }) {
            return self.expand_rat(source);
        }
        let Some(group) = self.group_of(source) else {
            return ControlFlow::Continue(());
        };
        let Some(bbox) = self.board.bounding_box(source) else {
            return ControlFlow::Continue(());
        };
        let area = self.query_area(bbox);

        for candidate in self.layer_candidates(group, &area) {
            if candidate != source && self.connects(source, candidate) {
                self.try_add(candidate, source)?;
            }
        }

        if self.mode.and_rats {
            let points = self
                .board
                .shape(source)
                .map(|s| s.rat_points())
                .unwrap_or_default();
            for candidate in self.candidates(Bucket::Rats, &area) {
                let attached = self.board.rat(candidate).is_some_and(|rat| {
                    rat.ends()
                        .iter()
                        .any(|&(p, g)| g == group && points.contains(&p))
                });
                if attached {
                    self.try_add(candidate, source)?;
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Ratlines reach layer objects whose attachment points sit on their ends
    fn expand_rat(&mut self, source: ObjectRef) -> ControlFlow<Divergence> {
        let Some(rat) = self.board.rat(source) else {
            return ControlFlow::Continue(());
        };
        for (point, group) in rat.ends() {
            for candidate in self.layer_candidates(group, &BoundingBox::around(point, 0)) {
                if self.attaches_at(candidate, point) {
                    self.try_add(candidate, source)?;
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Pins and vias touched by newly found layer objects
    fn lo_to_pv(&mut self) -> ControlFlow<Divergence> {
        for category in self.frontier.layer_categories() {
            while let Some(entry) = self.frontier.next_unvisited(category) {
                self.reach_pvs(entry.object)?;
                self.frontier.mark_visited(category);
            }
        }
        ControlFlow::Continue(())
    }

    fn reach_pvs(&mut self, source: ObjectRef) -> ControlFlow<Divergence> {
        if let Some(rat) = self.board.rat(source) {
            for (point, group) in rat.ends() {
                for candidate in self.pv_candidates(&BoundingBox::around(point, 0)) {
                    let attached = self.board.pin(candidate).is_some_and(|pin| {
                        !pin.is_hole()
                            && pin.position == point
                            && self.groups.groups_spanned(pin.buried).contains(&group)
                    });
                    if attached {
                        self.try_add(candidate, source)?;
                    }
                }
            }
            return ControlFlow::Continue(());
        }

        let Some(group) = self.group_of(source) else {
            return ControlFlow::Continue(());
        };
        let Some(bbox) = self.board.bounding_box(source) else {
            return ControlFlow::Continue(());
        };
        let area = self.query_area(bbox);
        for candidate in self.pv_candidates(&area) {
            let reachable = self.board.pin(candidate).is_some_and(|pin| {
                !pin.is_hole() && self.groups.groups_spanned(pin.buried).contains(&group)
            });
            if reachable && self.connects(candidate, source) {
                self.try_add(candidate, source)?;
            }
        }
        ControlFlow::Continue(())
    }

    // --- helpers -------------------------------------------------------------

    /// Source box grown by the combined margin of both operands
    fn query_area(&self, bbox: BoundingBox) -> BoundingBox {
        let grow = (2.0 * self.margin).ceil().max(0.0) as Coord;
        bbox.expanded(grow)
    }

    /// Objects of `bucket` meeting `area` that this search has not reached
    fn candidates(&self, bucket: Bucket, area: &BoundingBox) -> Vec<ObjectRef> {
        let board = &*self.board;
        let visited = self.mode.visited;
        let mut out = Vec::new();
        let walk = self.index.range_query(bucket, area, &mut |r| {
            if board.flags(r).is_some_and(|f| !f.intersects(visited)) {
                out.push(r);
            }
            ControlFlow::Continue(())
        });
        debug_assert!(walk.is_continue(), "collecting visitor never breaks");
        out
    }

    fn pv_candidates(&self, area: &BoundingBox) -> Vec<ObjectRef> {
        let mut out = self.candidates(Bucket::Vias, area);
        out.extend(self.candidates(Bucket::Pins, area));
        out
    }

    /// Lines, arcs, polygons and pads of a layer group
    fn layer_candidates(&self, group: usize, area: &BoundingBox) -> Vec<ObjectRef> {
        let mut out = Vec::new();
        for &layer in self.groups.layers(group) {
            if !self.layer_searchable(layer) {
                continue;
            }
            out.extend(self.candidates(Bucket::Lines(layer), area));
            out.extend(self.candidates(Bucket::Arcs(layer), area));
            out.extend(self.candidates(Bucket::Polygons(layer), area));
        }
        for side in self.groups.sides_in(group) {
            out.extend(self.candidates(Bucket::Pads(side), area));
        }
        out
    }

    fn layer_searchable(&self, layer: usize) -> bool {
        self.board.layers.get(layer).is_some_and(|l| !l.no_drc)
    }

    /// Layer group a layer object lives in
    fn group_of(&self, object: ObjectRef) -> Option<usize> {
        match object {
            ObjectRef::Pad { .. } => {
                let side = self.board.pad(object)?.side();
                self.groups.side_group(side)
            }
            _ => {
                let layer = object.copper_layer()?;
                let group = self.groups.group_of(layer);
                if group.is_none() {
                    warn!("{}", BoardError::UnknownLayer(layer));
                }
                group
            }
        }
    }

    fn pins_share_group(&self, a: &Pin, b: &Pin) -> bool {
        if a.buried.is_none() && b.buried.is_none() {
            return true;
        }
        let spanned = self.groups.groups_spanned(a.buried);
        self.groups
            .groups_spanned(b.buried)
            .iter()
            .any(|g| spanned.contains(g))
    }

    fn attaches_at(&self, object: ObjectRef, point: Point) -> bool {
        self.board
            .shape(object)
            .is_some_and(|s| s.rat_points().contains(&point))
    }

    /// Contact allowed by clearance and thermal settings, and geometric overlap
    fn connects(&self, a: ObjectRef, b: ObjectRef) -> bool {
        let (Some(sa), Some(sb)) = (self.board.shape(a), self.board.shape(b)) else {
            return false;
        };
        may_connect(a, &sa, b, &sb) && sa.intersects(&sb, self.margin)
    }

    fn warn_hole(&mut self, candidate: ObjectRef, source: ObjectRef) {
        warn!(
            "unplated hole contact between {} and {}",
            self.board.describe(candidate),
            self.board.describe(source)
        );
        change_flags(
            self.board,
            candidate,
            ObjectFlags::WARN,
            ObjectFlags::NONE,
            self.undo.as_deref_mut(),
        );
    }
}

/// Whether two objects may form a contact at all, regardless of geometry
pub fn may_connect(a: ObjectRef, sa: &Shape<'_>, b: ObjectRef, sb: &Shape<'_>) -> bool {
    match (sa, sb) {
        (Shape::Pin(p) | Shape::Via(p), Shape::Polygon(g)) => {
            pv_polygon_contact(p, g.flags, b.copper_layer())
        }
        (Shape::Polygon(g), Shape::Pin(p) | Shape::Via(p)) => {
            pv_polygon_contact(p, g.flags, a.copper_layer())
        }
        (Shape::Pin(_) | Shape::Via(_), Shape::Pin(_) | Shape::Via(_)) => true,
        // unplated holes never reach layer objects
        (Shape::Pin(p) | Shape::Via(p), _) | (_, Shape::Pin(p) | Shape::Via(p)) => !p.is_hole(),
        (Shape::Line(_) | Shape::Arc(_), Shape::Polygon(g)) => !clears(sa.flags(), g.flags),
        (Shape::Polygon(g), Shape::Line(_) | Shape::Arc(_)) => !clears(sb.flags(), g.flags),
        (Shape::Pad(d), Shape::Polygon(g)) | (Shape::Polygon(g), Shape::Pad(d)) => {
            !(d.clearance > 0 && g.flags.contains(ObjectFlags::CLEAR_POLY))
        }
        _ => true,
    }
}

fn clears(object_flags: ObjectFlags, polygon_flags: ObjectFlags) -> bool {
    object_flags.contains(ObjectFlags::CLEAR_LINE) && polygon_flags.contains(ObjectFlags::CLEAR_POLY)
}

fn pv_polygon_contact(pin: &Pin, polygon_flags: ObjectFlags, layer: Option<usize>) -> bool {
    if pin.is_hole() {
        return false;
    }
    let thermal = layer.is_some_and(|l| pin.has_thermal(l));
    thermal || !polygon_flags.contains(ObjectFlags::CLEAR_POLY) || pin.clearance == 0
}
