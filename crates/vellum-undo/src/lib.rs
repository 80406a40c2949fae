#![forbid(unsafe_code)]

//! Vellum undo/redo engine.
//!
//! A command-pattern transaction log for the Vellum diagram editor:
//! user edits become serializable [`Command`]s, commands batch into
//! [`CommandGroup`] transactions, and groups persist through a token-text
//! grammar so undo/redo replays across process restarts.
//!
//! # Key Components
//!
//! - [`token`]: the token grammar codec (escaping, reserved-sequence
//!   validation, `<id>` / `<id=value>` rendering and parsing)
//! - [`Command`]: the reversible-command contract
//!   (serialize / deserialize / execute / undo / redo)
//! - [`CommandRegistry`]: explicit tag-to-factory map used to reconstruct
//!   polymorphic commands by name
//! - [`CommandGroup`]: an ordered, atomically-(de)serialized batch
//!   forming one undo/redo slot, with partial-failure-tolerant
//!   reconstruction
//! - [`HistoryStore`]: the line-oriented backing file (one group per
//!   line, whole-file rewrite on every mutation)
//! - [`HistoryManager`]: the movable undo/redo cursor over the persisted
//!   record sequence
//! - [`HistoryWorkspace`]: factory allocating uniquely named backing
//!   files from an owned counter
//!
//! # Architecture
//!
//! ```text
//! domain edit ──► Command ──► CommandGroup ──► HistoryManager
//!                                  │                 │
//!                            serialize()       add / undo / redo
//!                                  │                 │
//!                                  ▼                 ▼
//!                            token grammar ──► HistoryStore (file)
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use vellum_undo::{CommandGroup, CommandRegistry, HistoryWorkspace};
//!
//! let mut registry = CommandRegistry::new();
//! // register concrete command factories here...
//! let registry = Arc::new(registry);
//!
//! let workspace = HistoryWorkspace::new("/tmp/vellum");
//! let mut history = workspace.create_manager(Arc::clone(&registry))?;
//!
//! let mut group = CommandGroup::new("create shape");
//! // group.add_command(...);
//! history.add_command_group(group)?;
//! history.execute()?;
//!
//! if history.is_undo_possible() {
//!     history.undo()?;
//! }
//! ```
//!
//! # Concurrency
//!
//! Single-threaded and fully synchronous: every public operation performs
//! blocking file I/O and returns only once the store is consistent. One
//! manager assumes sole ownership of its backing file; callers exposing a
//! manager to multiple threads must add their own synchronization.

pub mod command;
pub mod group;
pub mod history;
pub mod registry;
pub mod store;
pub mod token;

pub use command::{Command, CommandError, CommandResult, serialized_kind};
pub use group::{CommandGroup, DecodedGroup, SkipReason, SkippedCommand};
pub use history::{HistoryError, HistoryManager, HistoryWorkspace};
pub use registry::{CommandFactory, CommandRegistry, ResolveError};
pub use store::HistoryStore;
pub use token::{DecodeError, EncodeError};
