#![forbid(unsafe_code)]

//! Vellum canvas model and shape commands.
//!
//! The document side of the undo engine: a minimal in-memory diagram
//! canvas ([`Canvas`]) and the two built-in reversible edits against it
//! ([`CreateShapeCmd`], [`DeleteShapeCmd`]), wired into the engine's
//! command registry by [`register_builtin_commands`].
//!
//! # Role in Vellum
//!
//! `vellum-undo` knows nothing about shapes; it replays whatever
//! satisfies its `Command` contract. This crate supplies that contract's
//! concrete side: commands that capture enough shape state to reverse
//! themselves, serializers that put that state on the wire, and factory
//! closures that rebind reconstructed commands to the live canvas.

pub mod canvas;
pub mod commands;
pub mod shape;

pub use canvas::{Canvas, CanvasHandle};
pub use commands::{
    CREATE_SHAPE_KIND, CreateShapeCmd, DELETE_SHAPE_KIND, DeleteShapeCmd,
    register_builtin_commands,
};
pub use shape::{Shape, ShapeId, ShapeKind};
