//! A discriminated record: `kind` decides which geometry `geometry` decodes into.
use std::cell::Cell;

use rqlgen::runtime::{Codec, CodecError, Datum, Polymorphic};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    #[cfg_attr(rqlgen, rethink = "kind", rqlgen = "string")]
    pub kind: String,
    #[cfg_attr(rqlgen, rethink = "geometry", rqlgen = "rql")]
    pub geometry: Geometry,
    #[cfg_attr(rqlgen, rethink = "label,omitempty", rqlgen = "string")]
    pub label: String,
}

include!(concat!(env!("OUT_DIR"), "/shape_rqlgen.rs"));

thread_local! {
    static MUTATIONS: Cell<usize> = const { Cell::new(0) };
}

/// Times `Shape::mutate` ran on this thread.
pub fn mutation_count() -> usize {
    MUTATIONS.with(Cell::get)
}

impl Polymorphic for Shape {
    fn mutate(&mut self) {
        MUTATIONS.with(|n| n.set(n.get() + 1));
        self.geometry = match self.kind.as_str() {
            "circle" => Geometry::Circle(Circle::default()),
            "rect" => Geometry::Rect(Rect::default()),
            _ => Geometry::Unknown,
        };
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Geometry {
    #[default]
    Unknown,
    Circle(Circle),
    Rect(Rect),
}

impl Codec for Geometry {
    fn encode(&self) -> Result<Datum, CodecError> {
        match self {
            Geometry::Unknown => Ok(Datum::Null),
            Geometry::Circle(circle) => circle.encode(),
            Geometry::Rect(rect) => rect.encode(),
        }
    }

    fn decode(&mut self, datum: Datum) -> Result<(), CodecError> {
        match self {
            Geometry::Unknown => Err(CodecError::type_mismatch("Geometry", None, "known geometry", datum.kind())),
            Geometry::Circle(circle) => circle.decode(datum),
            Geometry::Rect(rect) => rect.decode(datum),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Circle {
    #[cfg_attr(rqlgen, rethink = "radius", rqlgen = "number")]
    pub radius: f64,
}

include!(concat!(env!("OUT_DIR"), "/circle_rqlgen.rs"));

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rect {
    #[cfg_attr(rqlgen, rethink = "width", rqlgen = "number")]
    pub width: u32,
    #[cfg_attr(rqlgen, rethink = "height", rqlgen = "number")]
    pub height: u32,
}

include!(concat!(env!("OUT_DIR"), "/rect_rqlgen.rs"));
