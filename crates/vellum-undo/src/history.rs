#![forbid(unsafe_code)]

//! The persisted undo/redo cursor over serialized command groups.
//!
//! [`HistoryManager`] owns one backing file and a movable cursor into its
//! record list. Groups are serialized on add and reconstructed on demand
//! for undo/redo, so a log written in one session replays in the next.
//!
//! # Invariants
//!
//! 1. `undo_index` is `None` or `Some(i)` with `i < group_count`; `None`
//!    means nothing to undo (the original's `-1` sentinel).
//! 2. `is_redo_possible()` holds exactly when the slot after the cursor
//!    exists: `insertion_point() < group_count`.
//! 3. Adding a group after undos discards every record past the insertion
//!    point. History is linear, never a tree.
//! 4. The cursor moves only after a successful fan-out; a failed undo or
//!    redo leaves the history position unchanged.
//!
//! # State machine
//!
//! ```text
//! add(A) add(B) add(C)
//! ┌──────────────────────────────┐
//! │ Records: [A, B, C]  cursor: C│
//! └──────────────────────────────┘
//! undo() x2
//! ┌──────────────────────────────┐
//! │ Records: [A, B, C]  cursor: A│   redo possible (B)
//! └──────────────────────────────┘
//! add(D)  -- truncates the redo branch
//! ┌──────────────────────────────┐
//! │ Records: [A, D]     cursor: D│   redo impossible
//! └──────────────────────────────┘
//! ```

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::command::CommandError;
use crate::group::CommandGroup;
use crate::registry::CommandRegistry;
use crate::store::HistoryStore;
use crate::token::{self, DecodeError, EncodeError};

/// Failure surfaced by a history operation.
#[derive(Debug)]
pub enum HistoryError {
    /// `undo()` was called with nothing to undo.
    NothingToUndo,
    /// `redo()` was called with nothing to redo.
    NothingToRedo,
    /// The cursor points past the end of the stored record list.
    MissingRecord {
        /// Record index the cursor expected.
        index: usize,
        /// Records actually present in the store.
        count: usize,
    },
    /// A group failed to serialize.
    Encode(EncodeError),
    /// A record failed to decode at the group level.
    Decode(DecodeError),
    /// A member command failed during fan-out.
    Command(CommandError),
    /// The backing store could not be read or written.
    Io(io::Error),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingToUndo => write!(f, "nothing to undo"),
            Self::NothingToRedo => write!(f, "nothing to redo"),
            Self::MissingRecord { index, count } => {
                write!(f, "record {index} missing from store of {count} records")
            }
            Self::Encode(err) => write!(f, "encode failed: {err}"),
            Self::Decode(err) => write!(f, "decode failed: {err}"),
            Self::Command(err) => write!(f, "command failed: {err}"),
            Self::Io(err) => write!(f, "history store I/O failed: {err}"),
        }
    }
}

impl std::error::Error for HistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Command(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EncodeError> for HistoryError {
    fn from(err: EncodeError) -> Self {
        Self::Encode(err)
    }
}

impl From<DecodeError> for HistoryError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}

impl From<CommandError> for HistoryError {
    fn from(err: CommandError) -> Self {
        Self::Command(err)
    }
}

impl From<io::Error> for HistoryError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Owns the persisted record sequence and the undo/redo cursor for one
/// editing session.
pub struct HistoryManager {
    store: HistoryStore,
    registry: Arc<CommandRegistry>,
    /// Cursor: index of the next group to undo. `None` means empty past.
    undo_index: Option<usize>,
    /// Cached record count; refreshed by every mutating operation.
    group_count: usize,
    /// The most recently added, not-yet-executed group.
    pending: Option<CommandGroup>,
}

impl fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryManager")
            .field("path", &self.store.path())
            .field("undo_index", &self.undo_index)
            .field("group_count", &self.group_count)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}

impl HistoryManager {
    /// Start a fresh session over a new (empty) backing file.
    pub fn create(
        path: impl Into<PathBuf>,
        registry: Arc<CommandRegistry>,
    ) -> Result<Self, HistoryError> {
        let store = HistoryStore::create(path)?;
        Ok(Self {
            store,
            registry,
            undo_index: None,
            group_count: 0,
            pending: None,
        })
    }

    /// Resume a session from a persisted backing file.
    ///
    /// The cursor lands on the last record: everything is undoable,
    /// nothing is redoable.
    pub fn open(
        path: impl Into<PathBuf>,
        registry: Arc<CommandRegistry>,
    ) -> Result<Self, HistoryError> {
        let store = HistoryStore::open(path)?;
        let count = store.read_records()?.len();
        tracing::debug!(path = %store.path().display(), records = count, "history session resumed");
        Ok(Self {
            store,
            registry,
            undo_index: count.checked_sub(1),
            group_count: count,
            pending: None,
        })
    }

    /// Serialize and persist a group, discarding any redo branch.
    ///
    /// The record lands at the slot after the cursor; every record past
    /// that slot is dropped. The group is retained in memory for a
    /// following [`execute`](Self::execute) call.
    pub fn add_command_group(&mut self, group: CommandGroup) -> Result<(), HistoryError> {
        let record = group.serialize()?;

        let mut records = self.store.read_records()?;
        let insert_at = self.insertion_point();
        records.truncate(insert_at);
        records.push(record);
        self.store.write_records(&records)?;

        self.group_count = records.len();
        self.undo_index = Some(insert_at);
        self.pending = Some(group);
        Ok(())
    }

    /// Execute the most recently added, not-yet-executed group.
    ///
    /// At most one execution happens per
    /// [`add_command_group`](Self::add_command_group) call; with nothing
    /// pending this is a no-op.
    pub fn execute(&mut self) -> Result<(), HistoryError> {
        if let Some(mut group) = self.pending.take() {
            group.execute()?;
        }
        Ok(())
    }

    /// Reverse the group at the cursor and step the cursor back.
    ///
    /// Returns the undone group's comment. Callers should gate on
    /// [`is_undo_possible`](Self::is_undo_possible); calling anyway yields
    /// [`HistoryError::NothingToUndo`].
    pub fn undo(&mut self) -> Result<String, HistoryError> {
        let index = self.undo_index.ok_or(HistoryError::NothingToUndo)?;
        let mut group = self.load_group(index)?;
        group.undo()?;
        self.undo_index = index.checked_sub(1);
        tracing::debug!(index, comment = %group.comment(), "group undone");
        Ok(group.comment().to_string())
    }

    /// Step the cursor forward and re-apply the group there.
    ///
    /// Returns the redone group's comment. Callers should gate on
    /// [`is_redo_possible`](Self::is_redo_possible); calling anyway yields
    /// [`HistoryError::NothingToRedo`].
    pub fn redo(&mut self) -> Result<String, HistoryError> {
        let index = self.insertion_point();
        if index >= self.group_count {
            return Err(HistoryError::NothingToRedo);
        }
        let mut group = self.load_group(index)?;
        group.redo()?;
        self.undo_index = Some(index);
        tracing::debug!(index, comment = %group.comment(), "group redone");
        Ok(group.comment().to_string())
    }

    /// Check whether a group is available to undo.
    #[must_use]
    pub fn is_undo_possible(&self) -> bool {
        self.undo_index.is_some()
    }

    /// Check whether a group is available to redo.
    #[must_use]
    pub fn is_redo_possible(&self) -> bool {
        self.insertion_point() < self.group_count
    }

    /// Comment of the group the next [`undo`](Self::undo) would reverse.
    pub fn undo_comment(&self) -> Result<Option<String>, HistoryError> {
        match self.undo_index {
            Some(index) => Ok(Some(self.peek_comment(index)?)),
            None => Ok(None),
        }
    }

    /// Comment of the group the next [`redo`](Self::redo) would re-apply.
    pub fn redo_comment(&self) -> Result<Option<String>, HistoryError> {
        let index = self.insertion_point();
        if index < self.group_count {
            Ok(Some(self.peek_comment(index)?))
        } else {
            Ok(None)
        }
    }

    /// Number of persisted groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Current cursor position; `None` means nothing to undo.
    #[must_use]
    pub fn undo_index(&self) -> Option<usize> {
        self.undo_index
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// End the session and delete the backing file.
    pub fn destroy(self) -> Result<(), HistoryError> {
        self.store.remove()?;
        Ok(())
    }

    /// Slot a newly added record would land in: one past the cursor.
    fn insertion_point(&self) -> usize {
        self.undo_index.map_or(0, |index| index + 1)
    }

    fn read_record(&self, index: usize) -> Result<String, HistoryError> {
        let mut records = self.store.read_records()?;
        let count = records.len();
        if index >= count {
            return Err(HistoryError::MissingRecord { index, count });
        }
        Ok(records.swap_remove(index))
    }

    /// Reconstruct the group stored at `index`.
    ///
    /// Members that fail to reconstruct were already reported by
    /// [`CommandGroup::deserialize`]; replay proceeds with the members
    /// that came back.
    fn load_group(&self, index: usize) -> Result<CommandGroup, HistoryError> {
        let record = self.read_record(index)?;
        let decoded = CommandGroup::deserialize(&record, &self.registry)?;
        for skip in &decoded.skipped {
            tracing::warn!(record = index, skipped = %skip, "group replayed without member");
        }
        Ok(decoded.group)
    }

    fn peek_comment(&self, index: usize) -> Result<String, HistoryError> {
        let record = self.read_record(index)?;
        Ok(token::detokenize(token::GROUP_COMMENT, &record)?)
    }
}

/// Factory for history sessions sharing one directory.
///
/// Owns the monotonically increasing counter that gives each session its
/// uniquely named backing file. The counter belongs to this value, not to
/// a process-wide static; two workspaces never contend.
#[derive(Debug)]
pub struct HistoryWorkspace {
    dir: PathBuf,
    prefix: String,
    next_session: AtomicU64,
}

impl HistoryWorkspace {
    /// Create a factory allocating files under `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "history".to_string(),
            next_session: AtomicU64::new(0),
        }
    }

    /// Use a custom file-name prefix instead of `history`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Start a session over a freshly allocated backing file.
    pub fn create_manager(
        &self,
        registry: Arc<CommandRegistry>,
    ) -> Result<HistoryManager, HistoryError> {
        std::fs::create_dir_all(&self.dir).map_err(HistoryError::Io)?;
        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let path = self.dir.join(format!("{}-{id}.log", self.prefix));
        tracing::debug!(path = %path.display(), "history session allocated");
        HistoryManager::create(path, registry)
    }

    /// Resume a session from a file previously allocated in this
    /// directory.
    pub fn reopen(
        &self,
        file_name: &str,
        registry: Arc<CommandRegistry>,
    ) -> Result<HistoryManager, HistoryError> {
        HistoryManager::open(self.dir.join(file_name), registry)
    }
}
