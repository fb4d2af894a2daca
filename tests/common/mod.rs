// Small board builder shared by the integration tests
#![allow(dead_code)]

use pcb_find::board::{Arc, Board, Element, Line, ObjectRef, Pad, Pin, Point};

pub struct BoardBuilder {
    board: Board,
}

impl BoardBuilder {
    pub fn new(layers: usize) -> Self {
        Self {
            board: Board::new(layers),
        }
    }

    pub fn line(mut self, layer: usize, from: (i64, i64), to: (i64, i64), thickness: i64) -> Self {
        self.board
            .add_line(layer, Line::new(Point::new(from.0, from.1), Point::new(to.0, to.1), thickness))
            .expect("line on a missing layer");
        self
    }

    pub fn via(mut self, at: (i64, i64), thickness: i64, drill: i64) -> Self {
        self.board.add_via(Pin::new(Point::new(at.0, at.1), thickness, drill));
        self
    }

    pub fn arc(
        mut self,
        layer: usize,
        center: (i64, i64),
        radius: i64,
        angles: (f64, f64),
        thickness: i64,
    ) -> Self {
        self.board
            .add_arc(layer, Arc::new(Point::new(center.0, center.1), radius, angles.0, angles.1, thickness))
            .expect("arc on a missing layer");
        self
    }

    /// Via spanning copper layers `from..=to` only
    pub fn buried_via(mut self, at: (i64, i64), thickness: i64, drill: i64, from: usize, to: usize) -> Self {
        self.board
            .add_via(Pin::new(Point::new(at.0, at.1), thickness, drill).buried(from, to));
        self
    }

    pub fn no_drc(mut self, layer: usize) -> Self {
        self.board.layers[layer].no_drc = true;
        self
    }

    /// Element with one through-hole pin per entry, numbered from 1
    pub fn pins(mut self, name: &str, pins: &[((i64, i64), i64, i64)]) -> Self {
        let element = pins
            .iter()
            .enumerate()
            .fold(Element::new(name), |e, (i, &(at, thickness, drill))| {
                e.with_pin(Pin::new(Point::new(at.0, at.1), thickness, drill).with_number(&(i + 1).to_string()))
            });
        self.board.add_element(element);
        self
    }

    /// Element with one component-side pad per entry, numbered from 1
    pub fn pads(mut self, name: &str, pads: &[((i64, i64), (i64, i64), i64)]) -> Self {
        let element = pads
            .iter()
            .enumerate()
            .fold(Element::new(name), |e, (i, &(from, to, thickness))| {
                e.with_pad(
                    Pad::new(Point::new(from.0, from.1), Point::new(to.0, to.1), thickness)
                        .with_number(&(i + 1).to_string()),
                )
            });
        self.board.add_element(element);
        self
    }

    pub fn build(self) -> Board {
        self.board
    }
}

pub fn line(layer: usize, line: usize) -> ObjectRef {
    ObjectRef::Line { layer, line }
}

pub fn pin(element: usize, pin: usize) -> ObjectRef {
    ObjectRef::Pin { element, pin }
}

pub fn via(via: usize) -> ObjectRef {
    ObjectRef::Via { via }
}

pub fn arc(layer: usize, arc: usize) -> ObjectRef {
    ObjectRef::Arc { layer, arc }
}
