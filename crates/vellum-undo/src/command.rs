#![forbid(unsafe_code)]

//! The reversible command contract.
//!
//! A [`Command`] is one unit of change against the document. It knows how
//! to apply itself (`execute`), reverse itself (`undo`), re-apply itself
//! (`redo`), and how to cross a process boundary (`serialize` /
//! `deserialize` through the token grammar in [`crate::token`]).
//!
//! # Invariants
//!
//! - `execute()` followed by `undo()` restores the prior observable state.
//! - `undo()` followed by `redo()` restores the executed state.
//! - `serialize()` embeds the registry tag as `<COMMAND_CLASS=kind>` so a
//!   later session can pick the right constructor out of a
//!   [`CommandRegistry`](crate::registry::CommandRegistry).
//! - A command carries every payload field it needs to reverse itself;
//!   after `deserialize` it must be as undoable as the original instance.
//!
//! # Failure Modes
//!
//! - **Stale target**: the document object a command refers to is gone by
//!   the time `undo`/`redo` runs. Surfaced as
//!   [`CommandError::TargetNotFound`].
//! - **Unbound instance**: a registry-constructed command is executed
//!   before `deserialize` populated it. Surfaced as
//!   [`CommandError::InvalidState`].

use std::fmt;

use crate::token::{self, DecodeError, EncodeError};

/// Result of executing, undoing, or redoing a command.
pub type CommandResult = Result<(), CommandError>;

/// Failure surfaced by a command operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The document object the command targets no longer exists.
    TargetNotFound(String),
    /// The command cannot run in its current state.
    InvalidState(String),
    /// Domain-specific failure with a message.
    Other(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetNotFound(id) => write!(f, "target '{id}' not found"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CommandError {}

/// A reversible, serializable unit of change.
///
/// Concrete commands live with the domain they mutate; the engine only
/// relies on this contract and guarantees calling order.
pub trait Command: Send + Sync {
    /// Stable registry tag identifying the concrete type on the wire.
    fn kind(&self) -> &'static str;

    /// Render the command as token text, registry tag included.
    ///
    /// An [`EncodeError`] aborts the whole enclosing group serialization;
    /// partial records are never written.
    fn serialize(&self) -> Result<String, EncodeError>;

    /// Populate payload fields from a serialized record.
    fn deserialize(&mut self, record: &str) -> Result<(), DecodeError>;

    /// Apply the command's effect.
    fn execute(&mut self) -> CommandResult;

    /// Reverse the command's effect.
    fn undo(&mut self) -> CommandResult;

    /// Re-apply the command after an undo.
    fn redo(&mut self) -> CommandResult {
        self.execute()
    }

    /// Human-readable label for undo/redo menus.
    fn description(&self) -> &str;
}

impl fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("kind", &self.kind())
            .field("description", &self.description())
            .finish()
    }
}

/// Render the registry-tag token every serialized command starts with.
pub fn serialized_kind(kind: &str) -> Result<String, EncodeError> {
    token::tokenize_value(token::COMMAND_CLASS, kind)
}
