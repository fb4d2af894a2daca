//! Breadth-first bookkeeping for connection searches
//!
//! Every category keeps the objects found so far in discovery order plus a
//! `visited` cursor. Entries below the cursor have been expanded; entries
//! between the cursor and the end are waiting. Discovery order doubles as
//! redraw order for a viewer.

use crate::board::{change_flags, Board, ObjectFlags, ObjectRef, Side, UndoLog};

/// Frontier partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    PinVia,
    Pad(Side),
    Line(usize),
    Arc(usize),
    Polygon(usize),
    Rat,
}

impl Category {
    /// Category of a copper object; `None` for silk and elements
    pub fn of(board: &Board, object: ObjectRef) -> Option<Category> {
        match object {
            ObjectRef::Via { .. } | ObjectRef::Pin { .. } => Some(Category::PinVia),
            ObjectRef::Pad { .. } => board.pad(object).map(|pad| Category::Pad(pad.side())),
            ObjectRef::Line { layer, .. } => Some(Category::Line(layer)),
            ObjectRef::Arc { layer, .. } => Some(Category::Arc(layer)),
            ObjectRef::Polygon { layer, .. } => Some(Category::Polygon(layer)),
            ObjectRef::Rat { .. } => Some(Category::Rat),
            ObjectRef::SilkLine { .. } | ObjectRef::Element { .. } => None,
        }
    }

    /// Layer objects: everything but pins and vias
    pub fn is_layer_object(self) -> bool {
        !matches!(self, Category::PinVia)
    }
}

/// A found object and the object that led to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierEntry {
    pub object: ObjectRef,
    pub from: Option<ObjectRef>,
}

#[derive(Debug, Clone, Default)]
struct FrontierList {
    entries: Vec<FrontierEntry>,
    visited: usize,
}

/// Per-category cursor lists for one search
#[derive(Debug, Clone)]
pub struct ObjectFrontier {
    pv: FrontierList,
    pads: [FrontierList; 2],
    lines: Vec<FrontierList>,
    arcs: Vec<FrontierList>,
    polygons: Vec<FrontierList>,
    rats: FrontierList,
}

impl ObjectFrontier {
    pub fn new(layer_count: usize) -> Self {
        Self {
            pv: FrontierList::default(),
            pads: Default::default(),
            lines: vec![FrontierList::default(); layer_count],
            arcs: vec![FrontierList::default(); layer_count],
            polygons: vec![FrontierList::default(); layer_count],
            rats: FrontierList::default(),
        }
    }

    pub fn layer_count(&self) -> usize {
        self.lines.len()
    }

    fn list(&self, category: Category) -> Option<&FrontierList> {
        match category {
            Category::PinVia => Some(&self.pv),
            Category::Pad(side) => Some(&self.pads[side.index()]),
            Category::Line(l) => self.lines.get(l),
            Category::Arc(l) => self.arcs.get(l),
            Category::Polygon(l) => self.polygons.get(l),
            Category::Rat => Some(&self.rats),
        }
    }

    fn list_mut(&mut self, category: Category) -> Option<&mut FrontierList> {
        match category {
            Category::PinVia => Some(&mut self.pv),
            Category::Pad(side) => Some(&mut self.pads[side.index()]),
            Category::Line(l) => self.lines.get_mut(l),
            Category::Arc(l) => self.arcs.get_mut(l),
            Category::Polygon(l) => self.polygons.get_mut(l),
            Category::Rat => Some(&mut self.rats),
        }
    }

    fn lists(&self) -> impl Iterator<Item = &FrontierList> {
        std::iter::once(&self.pv)
            .chain(self.pads.iter())
            .chain(self.lines.iter())
            .chain(self.arcs.iter())
            .chain(self.polygons.iter())
            .chain(std::iter::once(&self.rats))
    }

    /// Every category, pins/vias first
    pub fn categories(&self) -> Vec<Category> {
        let layers = self.layer_count();
        let mut categories = vec![Category::PinVia];
        categories.extend(Side::BOTH.map(Category::Pad));
        categories.extend((0..layers).map(Category::Line));
        categories.extend((0..layers).map(Category::Arc));
        categories.extend((0..layers).map(Category::Polygon));
        categories.push(Category::Rat);
        categories
    }

    /// Layer-object categories, in expansion order
    pub fn layer_categories(&self) -> Vec<Category> {
        self.categories()
            .into_iter()
            .filter(|c| c.is_layer_object())
            .collect()
    }

    /// Drop every entry and rewind every cursor
    pub fn reset(&mut self) {
        let layers = self.layer_count();
        *self = Self::new(layers);
    }

    /// Start over from a single object, flagging it even if it already
    /// carries `flag`. Returns false if the object has no category.
    pub fn seed(
        &mut self,
        board: &mut Board,
        object: ObjectRef,
        flag: ObjectFlags,
        undo: Option<&mut (dyn UndoLog + '_)>,
    ) -> bool {
        self.reset();
        let Some(category) = Category::of(board, object) else {
            return false;
        };
        let Some(list) = self.list_mut(category) else {
            return false;
        };
        list.entries.push(FrontierEntry { object, from: None });
        change_flags(board, object, flag, ObjectFlags::NONE, undo);
        true
    }

    /// Set `flag` on `object` and append it to its category. The caller has
    /// checked the object is not yet part of this search; returns false if
    /// the flag was already set or the object has no category.
    pub fn add_if_new(
        &mut self,
        board: &mut Board,
        entry: FrontierEntry,
        flag: ObjectFlags,
        undo: Option<&mut (dyn UndoLog + '_)>,
    ) -> bool {
        let Some(category) = Category::of(board, entry.object) else {
            return false;
        };
        if self.list(category).is_none() {
            return false;
        }
        let already = board.flags(entry.object).is_some_and(|f| f.contains(flag));
        if already {
            return false;
        }
        change_flags(board, entry.object, flag, ObjectFlags::NONE, undo);
        if let Some(list) = self.list_mut(category) {
            list.entries.push(entry);
        }
        true
    }

    /// Reserve room for `n` more entries in every category
    pub fn expand(&mut self, n: usize) {
        self.pv.entries.reserve(n);
        for list in self.pads.iter_mut().chain(self.lines.iter_mut()) {
            list.entries.reserve(n);
        }
        for list in self.arcs.iter_mut().chain(self.polygons.iter_mut()) {
            list.entries.reserve(n);
        }
        self.rats.entries.reserve(n);
    }

    pub fn count(&self, category: Category) -> usize {
        self.list(category).map_or(0, |l| l.entries.len())
    }

    pub fn visited(&self, category: Category) -> usize {
        self.list(category).map_or(0, |l| l.visited)
    }

    pub fn capacity(&self, category: Category) -> usize {
        self.list(category).map_or(0, |l| l.entries.capacity())
    }

    pub fn entry(&self, category: Category, index: usize) -> Option<FrontierEntry> {
        self.list(category)?.entries.get(index).copied()
    }

    /// Next entry waiting behind the `visited` cursor
    pub fn next_unvisited(&self, category: Category) -> Option<FrontierEntry> {
        let list = self.list(category)?;
        list.entries.get(list.visited).copied()
    }

    /// Move the `visited` cursor past one entry
    pub fn mark_visited(&mut self, category: Category) {
        if let Some(list) = self.list_mut(category) {
            if list.visited < list.entries.len() {
                list.visited += 1;
            }
        }
    }

    /// Nothing left to expand anywhere
    pub fn is_exhausted(&self) -> bool {
        self.lists().all(|l| l.visited == l.entries.len())
    }

    /// Total entries across all categories
    pub fn len(&self) -> usize {
        self.lists().map(|l| l.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every entry found so far, category by category in discovery order
    pub fn discovered(&self) -> impl Iterator<Item = &FrontierEntry> {
        self.lists().flat_map(|l| l.entries.iter())
    }
}
