#![forbid(unsafe_code)]

//! Undoable shape commands and their wire serializers.
//!
//! Both commands carry the full shape payload, not just its id: a
//! deserialized instance in a later session must be able to reverse
//! itself with no live state left over from the session that wrote it.
//!
//! Registry factories produce *unbound* instances holding a placeholder
//! shape; [`Command::deserialize`] replaces the placeholder with the
//! persisted payload before any replay happens.

use std::sync::{Arc, MutexGuard};

use vellum_undo::command::{Command, CommandError, CommandResult, serialized_kind};
use vellum_undo::registry::CommandRegistry;
use vellum_undo::token::{self, DecodeError, EncodeError};

use crate::canvas::{Canvas, CanvasHandle};
use crate::shape::{Shape, ShapeId, ShapeKind};

/// Registry tag of [`CreateShapeCmd`].
pub const CREATE_SHAPE_KIND: &str = "canvas.create-shape";
/// Registry tag of [`DeleteShapeCmd`].
pub const DELETE_SHAPE_KIND: &str = "canvas.delete-shape";

const SHAPE_ID: &str = "SHAPE_ID";
const SHAPE_KIND: &str = "SHAPE_KIND";
const SHAPE_LABEL: &str = "SHAPE_LABEL";
const SHAPE_X: &str = "SHAPE_X";
const SHAPE_Y: &str = "SHAPE_Y";
const SHAPE_IN_MODEL: &str = "SHAPE_IN_MODEL";

/// Register the factories for both shape commands.
///
/// Each factory captures its own handle on the canvas, so instances
/// reconstructed from the history log are born already wired to the
/// document they must replay against.
pub fn register_builtin_commands(registry: &mut CommandRegistry, canvas: &CanvasHandle) {
    let handle = Arc::clone(canvas);
    registry.register(CREATE_SHAPE_KIND, move || {
        Box::new(CreateShapeCmd::unbound(Arc::clone(&handle)))
    });
    let handle = Arc::clone(canvas);
    registry.register(DELETE_SHAPE_KIND, move || {
        Box::new(DeleteShapeCmd::unbound(Arc::clone(&handle)))
    });
    tracing::debug!(kinds = registry.len(), "shape commands registered");
}

fn lock(canvas: &CanvasHandle) -> Result<MutexGuard<'_, Canvas>, CommandError> {
    canvas
        .lock()
        .map_err(|_| CommandError::InvalidState("canvas lock poisoned".to_string()))
}

fn placeholder_shape() -> Shape {
    Shape::new(ShapeId::new(0), ShapeKind::Box, "")
}

fn serialize_shape(out: &mut String, shape: &Shape) -> Result<(), EncodeError> {
    out.push_str(&token::tokenize_value(
        SHAPE_ID,
        &shape.id.raw().to_string(),
    )?);
    out.push_str(&token::tokenize_value(SHAPE_KIND, shape.kind.wire_name())?);
    out.push_str(&token::tokenize_value(SHAPE_LABEL, &shape.label)?);
    out.push_str(&token::tokenize_value(SHAPE_X, &shape.x.to_string())?);
    out.push_str(&token::tokenize_value(SHAPE_Y, &shape.y.to_string())?);
    Ok(())
}

fn deserialize_shape(record: &str) -> Result<Shape, DecodeError> {
    let id = ShapeId::new(token::detokenize_parse(SHAPE_ID, record)?);
    let kind_name = token::detokenize(SHAPE_KIND, record)?;
    let kind = ShapeKind::from_wire(&kind_name).ok_or_else(|| DecodeError::InvalidValue {
        token: SHAPE_KIND.to_string(),
        value: kind_name,
    })?;
    let label = token::detokenize(SHAPE_LABEL, record)?;
    let x = token::detokenize_parse(SHAPE_X, record)?;
    let y = token::detokenize_parse(SHAPE_Y, record)?;
    Ok(Shape { id, kind, label, x, y })
}

/// Place a new shape on the canvas.
pub struct CreateShapeCmd {
    canvas: CanvasHandle,
    shape: Shape,
}

impl CreateShapeCmd {
    /// Create a command that will place `shape` when executed.
    #[must_use]
    pub fn new(canvas: CanvasHandle, shape: Shape) -> Self {
        Self { canvas, shape }
    }

    /// Factory form: placeholder payload, populated by `deserialize`.
    #[must_use]
    pub fn unbound(canvas: CanvasHandle) -> Self {
        Self::new(canvas, placeholder_shape())
    }
}

impl Command for CreateShapeCmd {
    fn kind(&self) -> &'static str {
        CREATE_SHAPE_KIND
    }

    fn serialize(&self) -> Result<String, EncodeError> {
        let mut out = serialized_kind(self.kind())?;
        serialize_shape(&mut out, &self.shape)?;
        Ok(out)
    }

    fn deserialize(&mut self, record: &str) -> Result<(), DecodeError> {
        self.shape = deserialize_shape(record)?;
        Ok(())
    }

    fn execute(&mut self) -> CommandResult {
        let mut canvas = lock(&self.canvas)?;
        canvas.add_shape(self.shape.clone(), self.shape.x, self.shape.y, true);
        canvas.refresh();
        Ok(())
    }

    fn undo(&mut self) -> CommandResult {
        let mut canvas = lock(&self.canvas)?;
        canvas
            .remove_shape(self.shape.id)
            .ok_or_else(|| CommandError::TargetNotFound(self.shape.id.to_string()))?;
        canvas.refresh();
        Ok(())
    }

    fn description(&self) -> &str {
        "Create shape"
    }
}

/// Remove a shape from the canvas.
///
/// The command snapshots the shape when it is built, so undo can restore
/// position, label, and model membership even in a later session.
pub struct DeleteShapeCmd {
    canvas: CanvasHandle,
    shape: Shape,
    in_model: bool,
}

impl DeleteShapeCmd {
    /// Snapshot `id`'s current state and build the delete command.
    ///
    /// Fails with [`CommandError::TargetNotFound`] if the shape is not on
    /// the canvas.
    pub fn capture(canvas: &CanvasHandle, id: ShapeId) -> Result<Self, CommandError> {
        let guard = lock(canvas)?;
        let shape = guard
            .shape(id)
            .cloned()
            .ok_or_else(|| CommandError::TargetNotFound(id.to_string()))?;
        let in_model = guard.in_model(id);
        drop(guard);
        Ok(Self {
            canvas: Arc::clone(canvas),
            shape,
            in_model,
        })
    }

    /// Factory form: placeholder payload, populated by `deserialize`.
    #[must_use]
    pub fn unbound(canvas: CanvasHandle) -> Self {
        Self {
            canvas,
            shape: placeholder_shape(),
            in_model: true,
        }
    }
}

impl Command for DeleteShapeCmd {
    fn kind(&self) -> &'static str {
        DELETE_SHAPE_KIND
    }

    fn serialize(&self) -> Result<String, EncodeError> {
        let mut out = serialized_kind(self.kind())?;
        serialize_shape(&mut out, &self.shape)?;
        out.push_str(&token::tokenize_value(
            SHAPE_IN_MODEL,
            &self.in_model.to_string(),
        )?);
        Ok(out)
    }

    fn deserialize(&mut self, record: &str) -> Result<(), DecodeError> {
        self.shape = deserialize_shape(record)?;
        self.in_model = token::detokenize_parse(SHAPE_IN_MODEL, record)?;
        Ok(())
    }

    fn execute(&mut self) -> CommandResult {
        let mut canvas = lock(&self.canvas)?;
        canvas
            .remove_shape(self.shape.id)
            .ok_or_else(|| CommandError::TargetNotFound(self.shape.id.to_string()))?;
        canvas.refresh();
        Ok(())
    }

    fn undo(&mut self) -> CommandResult {
        let mut canvas = lock(&self.canvas)?;
        canvas.add_shape(
            self.shape.clone(),
            self.shape.x,
            self.shape.y,
            self.in_model,
        );
        canvas.refresh();
        Ok(())
    }

    fn description(&self) -> &str {
        "Delete shape"
    }
}
