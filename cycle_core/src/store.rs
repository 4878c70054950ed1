//! Period entry persistence with file locking.
//!
//! Entries for a user live in a single JSON array file inside the data
//! directory. Reads take a shared lock; writes go to a temp file that is
//! synced and renamed over the previous file. Edits hold an exclusive lock on
//! a sidecar `.lock` file from load to save so concurrent writers serialize.
//!
//! Records that fail to parse are skipped on load, and the file as it was is
//! copied to `<name>.json.corrupt` before any later save can replace it.

use crate::{Error, PeriodEntry, PeriodPatch, Result};
use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Base file name for stored entries
const ENTRIES_KEY: &str = "period_entries";

/// Exclusive hold on a store for one load, modify, save cycle
///
/// The lock is released when the guard is dropped.
#[derive(Debug)]
pub struct WriteLock {
    file: Option<File>,
}

impl WriteLock {
    /// Guard for stores with no other writers to exclude
    pub fn unlocked() -> Self {
        Self { file: None }
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            if let Err(e) = file.unlock() {
                tracing::warn!("Failed to release store lock: {}", e);
            }
        }
    }
}

/// Storage backend for a user's period entries
///
/// Implementors only provide whole-collection `load` and `save`; edits are
/// expressed as load, modify, save so the engine always sees a fresh
/// immutable collection. Stores shared between processes override
/// `lock_for_write` so those cycles cannot interleave.
pub trait PeriodStore {
    fn load(&self) -> Result<Vec<PeriodEntry>>;

    fn save(&mut self, entries: &[PeriodEntry]) -> Result<()>;

    /// Block until no other writer holds this store
    fn lock_for_write(&self) -> Result<WriteLock> {
        Ok(WriteLock::unlocked())
    }

    /// Append a new entry after validating it
    fn add(&mut self, entry: PeriodEntry) -> Result<()> {
        entry.validate()?;
        let _lock = self.lock_for_write()?;
        let mut entries = self.load()?;
        if entries.iter().any(|e| e.id == entry.id) {
            return Err(Error::InvalidEntry(format!(
                "an entry with id {} already exists",
                entry.id
            )));
        }
        tracing::info!("Logging period starting {}", entry.start_date);
        entries.push(entry);
        self.save(&entries)
    }

    /// Merge `patch` into the entry with `id`
    ///
    /// Returns `false` (and writes nothing) when no entry has that id.
    fn update(&mut self, id: &str, patch: &PeriodPatch) -> Result<bool> {
        let _lock = self.lock_for_write()?;
        let mut entries = self.load()?;
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(false);
        };

        let mut updated = entry.clone();
        patch.apply_to(&mut updated);
        updated.validate()?;
        *entry = updated;

        tracing::info!("Updated period entry {}", id);
        self.save(&entries)?;
        Ok(true)
    }

    /// Remove the entry with `id`, returning whether it existed
    fn delete(&mut self, id: &str) -> Result<bool> {
        let _lock = self.lock_for_write()?;
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }

        tracing::info!("Deleted period entry {}", id);
        self.save(&entries)?;
        Ok(true)
    }
}

/// Entries sorted newest first, for history listings
pub fn history(entries: &[PeriodEntry]) -> Vec<PeriodEntry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    sorted
}

/// JSON-file store, one file per user
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store at an explicit file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for `user` (or the anonymous user) inside `data_dir`
    pub fn for_user(data_dir: &Path, user: Option<&str>) -> Self {
        Self::new(data_dir.join(entries_file_name(user)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sidecar file whose exclusive lock serializes writers
    pub fn lock_path(&self) -> PathBuf {
        self.sibling("lock")
    }

    /// Where an unreadable entries file is preserved
    pub fn backup_path(&self) -> PathBuf {
        self.sibling("corrupt")
    }

    fn sibling(&self, extension: &str) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    }

    fn parent_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    fn preserve_unreadable(&self) -> Result<()> {
        let backup = self.backup_path();
        std::fs::copy(&self.path, &backup)?;
        tracing::warn!("Kept a copy of {:?} at {:?}", self.path, backup);
        Ok(())
    }
}

/// File name for a user's entries: `period_entries[_<user>].json`
///
/// Characters outside `[A-Za-z0-9_-]` in the user key become `_` so a key
/// can never point outside the data directory.
pub fn entries_file_name(user: Option<&str>) -> String {
    match user.map(str::trim).filter(|u| !u.is_empty()) {
        Some(user) => {
            let key: String = user
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect();
            format!("{}_{}.json", ENTRIES_KEY, key)
        }
        None => format!("{}.json", ENTRIES_KEY),
    }
}

impl PeriodStore for JsonFileStore {
    /// Load entries with a shared lock
    ///
    /// A missing file is an empty history. Unreadable records are logged and
    /// skipped rather than blocking the user; when any are dropped the file
    /// is first copied to [`JsonFileStore::backup_path`].
    fn load(&self) -> Result<Vec<PeriodEntry>> {
        if !self.path.exists() {
            tracing::debug!("No entries file at {:?}, starting empty", self.path);
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records = match serde_json::from_str::<Vec<serde_json::Value>>(&contents) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    "Failed to parse entries file {:?}: {}. Starting empty.",
                    self.path,
                    e
                );
                self.preserve_unreadable()?;
                return Ok(Vec::new());
            }
        };

        let total = records.len();
        let entries: Vec<PeriodEntry> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Skipping entry {} in {:?}: {}", index, self.path, e);
                    None
                }
            })
            .collect();

        if entries.len() < total {
            self.preserve_unreadable()?;
        }

        tracing::debug!("Loaded {} entries from {:?}", entries.len(), self.path);
        Ok(entries)
    }

    /// Exclusive lock on the sidecar `.lock` file
    fn lock_for_write(&self) -> Result<WriteLock> {
        std::fs::create_dir_all(self.parent_dir())?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?;
        file.lock_exclusive()?;
        Ok(WriteLock { file: Some(file) })
    }

    /// Atomically replace the entries file
    fn save(&mut self, entries: &[PeriodEntry]) -> Result<()> {
        let parent = self.parent_dir();
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, entries)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} entries to {:?}", entries.len(), self.path);
        Ok(())
    }
}
