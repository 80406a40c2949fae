#![forbid(unsafe_code)]

//! Shape data carried by the canvas and by shape commands.

use std::fmt;

/// Unique identifier for a shape on the canvas.
///
/// Commands store this id to locate their target during undo/redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(pub u64);

impl ShapeId {
    /// Create a shape id from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geometric family of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Rectangular node.
    Box,
    /// Elliptical node.
    Ellipse,
    /// Free-floating annotation.
    Note,
}

impl ShapeKind {
    /// Stable name used on the wire.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Ellipse => "ellipse",
            Self::Note => "note",
        }
    }

    /// Parse a wire name back into a kind.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "box" => Some(Self::Box),
            "ellipse" => Some(Self::Ellipse),
            "note" => Some(Self::Note),
            _ => None,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// One shape on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Identity; stable for the shape's lifetime.
    pub id: ShapeId,
    /// Geometric family.
    pub kind: ShapeKind,
    /// Display label.
    pub label: String,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Shape {
    /// Create a shape at the origin.
    #[must_use]
    pub fn new(id: ShapeId, kind: ShapeKind, label: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            label: label.into(),
            x: 0.0,
            y: 0.0,
        }
    }

    /// Position the shape.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}
