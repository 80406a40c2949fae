#![forbid(unsafe_code)]

//! Ordered command batches: one undo/redo slot each.
//!
//! A [`CommandGroup`] owns the commands of one transaction. Insertion
//! order is replay order: `execute`, `undo`, and `redo` all fan out over
//! the members in exactly the order they were added, never reversed and
//! never reordered.
//!
//! A group serializes to a single line of token text:
//!
//! ```text
//! <BEGIN_COMMAND_GROUP><GROUP_COMMENT=comment>
//!     ( <BEGIN_COMMAND> command-body <END_COMMAND> )*
//! <END_COMMAND_GROUP>
//! ```
//!
//! # Invariants
//!
//! 1. Member order survives any number of serialize/deserialize cycles.
//! 2. Common data never crosses a serialize boundary; it exists only for
//!    commands assembled within one in-memory transaction.
//! 3. Reconstruction is partial-failure tolerant: a member that cannot be
//!    resolved or decoded is skipped and reported, and every other member
//!    still comes back. One corrupt command must not cost the group.

use std::any::Any;
use std::fmt;

use crate::command::{Command, CommandResult};
use crate::registry::{CommandRegistry, ResolveError};
use crate::token::{self, DecodeError, EncodeError};

/// An ordered, atomically-(de)serialized batch of commands.
pub struct CommandGroup {
    /// Members in insertion order; this is the replay order.
    commands: Vec<Box<dyn Command>>,
    /// Human-readable transaction label, persisted with the group.
    comment: String,
    /// In-memory scratchpad for the current transaction; never persisted.
    common_data: Vec<Box<dyn Any + Send>>,
}

impl fmt::Debug for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandGroup")
            .field("comment", &self.comment)
            .field("commands", &self.commands.len())
            .field("common_data", &self.common_data.len())
            .finish()
    }
}

impl CommandGroup {
    /// Create an empty group with the given comment.
    #[must_use]
    pub fn new(comment: impl Into<String>) -> Self {
        Self {
            commands: Vec::new(),
            comment: comment.into(),
            common_data: Vec::new(),
        }
    }

    /// The group's transaction label.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Replace the transaction label.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// Append a command; it replays after every member added before it.
    pub fn add_command(&mut self, command: Box<dyn Command>) {
        self.commands.push(command);
    }

    /// Remove and return the member at `index`, shifting later members up.
    pub fn remove_command(&mut self, index: usize) -> Option<Box<dyn Command>> {
        if index < self.commands.len() {
            Some(self.commands.remove(index))
        } else {
            None
        }
    }

    /// The members, in replay order.
    #[must_use]
    pub fn commands(&self) -> &[Box<dyn Command>] {
        &self.commands
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check whether the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Publish a value for other commands in this transaction to read.
    ///
    /// Common data lives only in memory; it is dropped on serialize and
    /// absent after deserialize.
    pub fn add_common_data(&mut self, item: Box<dyn Any + Send>) {
        self.common_data.push(item);
    }

    /// The published common-data items, in publication order.
    #[must_use]
    pub fn common_data(&self) -> &[Box<dyn Any + Send>] {
        &self.common_data
    }

    /// Drop all published common data.
    pub fn clear_common_data(&mut self) {
        self.common_data.clear();
    }

    /// Execute every member in replay order.
    ///
    /// Stops at the first failing member and propagates its error.
    pub fn execute(&mut self) -> CommandResult {
        for command in &mut self.commands {
            command.execute()?;
        }
        Ok(())
    }

    /// Undo every member in replay order.
    pub fn undo(&mut self) -> CommandResult {
        for command in &mut self.commands {
            command.undo()?;
        }
        Ok(())
    }

    /// Redo every member in replay order.
    pub fn redo(&mut self) -> CommandResult {
        for command in &mut self.commands {
            command.redo()?;
        }
        Ok(())
    }

    /// Render the group as one line of token text.
    ///
    /// An [`EncodeError`] from any member aborts the whole call; a group
    /// record is written completely or not at all.
    pub fn serialize(&self) -> Result<String, EncodeError> {
        let mut out = token::tokenize(token::BEGIN_COMMAND_GROUP);
        out.push_str(&token::tokenize_value(token::GROUP_COMMENT, &self.comment)?);
        for command in &self.commands {
            out.push_str(&token::tokenize(token::BEGIN_COMMAND));
            out.push_str(&command.serialize()?);
            out.push_str(&token::tokenize(token::END_COMMAND));
        }
        out.push_str(&token::tokenize(token::END_COMMAND_GROUP));
        Ok(out)
    }

    /// Reconstruct a group from a serialized record.
    ///
    /// Each `<BEGIN_COMMAND>`…`<END_COMMAND>` span is resolved through the
    /// registry and deserialized. A span that fails either step is logged,
    /// reported in [`DecodedGroup::skipped`], and skipped; scanning
    /// continues with the next span. Only group-level problems (missing
    /// comment, unterminated command span) fail the whole call.
    pub fn deserialize(
        record: &str,
        registry: &CommandRegistry,
    ) -> Result<DecodedGroup, DecodeError> {
        let comment = token::detokenize(token::GROUP_COMMENT, record)?;
        let mut group = CommandGroup::new(comment);
        let mut skipped = Vec::new();

        let begin = token::tokenize(token::BEGIN_COMMAND);
        let end = token::tokenize(token::END_COMMAND);
        let mut cursor = 0;
        let mut index = 0;
        while let Some(found) = record[cursor..].find(&begin) {
            let body_start = cursor + found + begin.len();
            let body_len = record[body_start..]
                .find(&end)
                .ok_or_else(|| DecodeError::TokenNotFound(token::END_COMMAND.to_string()))?;
            let body = &record[body_start..body_start + body_len];

            match Self::decode_command(body, registry) {
                Ok(command) => group.add_command(command),
                Err(reason) => {
                    tracing::warn!(index, error = %reason, "skipping unreconstructable command");
                    skipped.push(SkippedCommand {
                        index,
                        kind: token::detokenize(token::COMMAND_CLASS, body).ok(),
                        reason,
                    });
                }
            }
            index += 1;
            cursor = body_start + body_len + end.len();
        }

        Ok(DecodedGroup { group, skipped })
    }

    fn decode_command(
        body: &str,
        registry: &CommandRegistry,
    ) -> Result<Box<dyn Command>, SkipReason> {
        let kind = token::detokenize(token::COMMAND_CLASS, body).map_err(SkipReason::Decode)?;
        let mut command = registry.resolve(&kind).map_err(SkipReason::Resolve)?;
        command.deserialize(body).map_err(SkipReason::Decode)?;
        Ok(command)
    }
}

/// Outcome of [`CommandGroup::deserialize`].
#[derive(Debug)]
pub struct DecodedGroup {
    /// The reconstructed group, holding every member that came back.
    pub group: CommandGroup,
    /// Diagnostics for members that did not come back.
    pub skipped: Vec<SkippedCommand>,
}

/// One member that could not be reconstructed.
#[derive(Debug)]
pub struct SkippedCommand {
    /// Position of the member in the serialized group.
    pub index: usize,
    /// Registry tag of the member, when it could at least be read.
    pub kind: Option<String>,
    /// Why reconstruction failed.
    pub reason: SkipReason,
}

impl fmt::Display for SkippedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "command #{} ({}): {}", self.index, kind, self.reason),
            None => write!(f, "command #{}: {}", self.index, self.reason),
        }
    }
}

/// Reason a member was skipped during reconstruction.
#[derive(Debug)]
pub enum SkipReason {
    /// The member's tokens were missing or malformed.
    Decode(DecodeError),
    /// The member's registry tag is unknown.
    Resolve(ResolveError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "{err}"),
            Self::Resolve(err) => write!(f, "{err}"),
        }
    }
}
