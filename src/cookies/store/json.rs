//! JSON-backed durable store.
//!
//! `JsonDurableStore` keeps all encoded cookie records in a single JSON file:
//!
//! ```json
//! { "records": ["01000000...", "01000000..."] }
//! ```
//!
//! ### I/O characteristics & caveats
//! - Every mutation **reads then rewrites** the whole file. For large jars,
//!   consider the SQLite-backed store.
//! - Writes go to a temporary file in the same directory which is then renamed
//!   over the target, so readers never observe a half-written file.
//! - A missing file is an empty bag. A file that is not valid JSON is an error,
//!   not silently treated as empty.
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::cookies::store::DurableStore;

/// On-disk representation of the record bag.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordFile {
    records: Vec<String>,
}

/// A JSON file based durable store.
pub struct JsonDurableStore {
    /// Path to the JSON file where records are stored.
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl JsonDurableStore {
    /// Creates a store at `path`. The file is created lazily on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_file(&self) -> Result<RecordFile> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RecordFile::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading cookie file {}", self.path.display()))
            }
        };

        serde_json::from_slice(&contents)
            .with_context(|| format!("parsing cookie file {}", self.path.display()))
    }

    fn save_file(&self, file: &RecordFile) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temporary file in {}", dir.display()))?;
        let contents = serde_json::to_vec_pretty(file).context("serializing cookie records")?;
        tmp.write_all(&contents).context("writing cookie records")?;
        tmp.persist(&self.path)
            .with_context(|| format!("replacing cookie file {}", self.path.display()))?;
        Ok(())
    }
}

impl DurableStore for JsonDurableStore {
    fn append(&self, record: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.load_file()?;
        file.records.push(record.to_string());
        self.save_file(&file)
    }

    fn list_all(&self) -> Result<Vec<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load_file()?.records)
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.save_file(&RecordFile::default())
    }

    fn replace_all(&self, records: &[String]) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.save_file(&RecordFile {
            records: records.to_vec(),
        })
    }
}
