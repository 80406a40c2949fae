#![forbid(unsafe_code)]

//! Line-oriented backing file for the history log.
//!
//! One serialized [`CommandGroup`](crate::group::CommandGroup) per line.
//! Every mutation is a whole-file cycle: read all records, edit the list
//! in memory, rewrite all records. There is no append path and no atomic
//! rename; a crash in the middle of [`HistoryStore::write_records`] can
//! leave the file truncated. That durability gap is part of the contract
//! this store preserves rather than a bug to patch here.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Handle to one history backing file.
///
/// The store assumes it is the sole owner of the file for its lifetime;
/// nothing coordinates concurrent writers.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Create (or truncate) the backing file and return a handle to it.
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        File::create(&path)?;
        tracing::debug!(path = %path.display(), "history store created");
        Ok(Self { path })
    }

    /// Attach to an existing backing file.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("history store not found: {}", path.display()),
            ));
        }
        Ok(Self { path })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record, in file order.
    pub fn read_records(&self) -> io::Result<Vec<String>> {
        let text = fs::read_to_string(&self.path)?;
        Ok(text
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect())
    }

    /// Rewrite the whole file with the given records.
    pub fn write_records(&self, records: &[String]) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);
        for record in records {
            writeln!(writer, "{record}")?;
        }
        writer.flush()?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "history store rewritten");
        Ok(())
    }

    /// Delete the backing file, consuming the handle.
    pub fn remove(self) -> io::Result<()> {
        tracing::debug!(path = %self.path.display(), "history store removed");
        fs::remove_file(&self.path)
    }
}
