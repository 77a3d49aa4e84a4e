//! File-based metadata store.

use crate::error::{StoreError, StoreResult};
use crate::row::MetadataRow;
use crate::store::MetadataStore;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// An append-only JSON-lines metadata store.
///
/// One row per line. Appends are flushed and synced before `upsert`
/// returns, so a row is durable before the caller makes it visible to
/// anything else.
///
/// # Crash recovery
///
/// A crash between write and sync can leave a torn final line. Replay
/// stops at such a line and logs it; the row it would have held is simply
/// re-resolved on next use. A torn line anywhere else means real
/// corruption and is surfaced as an error.
///
/// # Example
///
/// ```no_run
/// use dedisync_store::{FileStore, MetadataStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("metadata.jsonl")).unwrap();
/// let rows = store.load_all().unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: File,
}

impl FileStore {
    /// Opens or creates a store file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Opens or creates a store file, creating parent directories if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file
    /// cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetadataStore for FileStore {
    fn load_all(&self) -> StoreResult<Vec<MetadataRow>> {
        let mut reader = BufReader::new(&self.file);
        reader.seek(SeekFrom::Start(0))?;

        let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
        let mut rows = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<MetadataRow>(line) {
                Ok(row) => rows.push(row),
                Err(err) if index + 1 == lines.len() => {
                    // Torn final line from a crash mid-append.
                    warn!(
                        path = %self.path.display(),
                        line = index + 1,
                        error = %err,
                        "dropping torn final row"
                    );
                    break;
                }
                Err(err) => {
                    return Err(StoreError::Corrupted {
                        line: index + 1,
                        detail: err.to_string(),
                    });
                }
            }
        }

        Ok(rows)
    }

    fn upsert(&mut self, row: &MetadataRow) -> StoreResult<()> {
        let mut line = serde_json::to_string(row)?;
        line.push('\n');

        self.file.write_all(line.as_bytes())?;
        self.file.sync_all()?;
        Ok(())
    }
}
