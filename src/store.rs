/// Resumable per-commit result cache.
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
use crate::timing::Timing;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub commit: String,
    /// `cargo check` from a clean cache
    pub check: Timing,
    /// `cargo build` right after `check`
    pub build: Timing,
    pub test: Timing,
    /// Second `cargo test`, cache warm
    pub test2: Timing,
    /// `cargo check` after touching the entry point
    pub check2: Timing,
    /// `cargo build` after touching the entry point
    pub build2: Timing,
}

impl MeasurementRecord {
    pub fn new(commit: &str) -> Self {
        MeasurementRecord {
            commit: commit.to_string(),
            check: Timing::NotAttempted,
            build: Timing::NotAttempted,
            test: Timing::NotAttempted,
            test2: Timing::NotAttempted,
            check2: Timing::NotAttempted,
            build2: Timing::NotAttempted,
        }
    }
}

pub trait ResultStore {
    fn records(&self) -> &[MeasurementRecord];

    fn get(&self, commit: &str) -> Option<&MeasurementRecord> {
        self.records().iter().find(|r| r.commit == commit)
    }

    fn contains(&self, commit: &str) -> bool {
        self.get(commit).is_some()
    }

    /// Adds a record for a commit not yet in the store and persists it.
    fn append(&mut self, record: MeasurementRecord) -> Result<()>;
}

/// All records as one JSON array, replaced atomically on every append.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: Vec<MeasurementRecord>,
}

impl JsonFileStore {
    /// Empty store if `path` does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(path, &text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(JsonFileStore {
                path: path.to_path_buf(),
                records: vec![],
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Like `load`, but a missing file is an error.
    pub fn open_existing(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(path, &text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::CacheMissing(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn parse(path: &Path, text: &str) -> Result<Self> {
        let records: Vec<MeasurementRecord> =
            serde_json::from_str(text).map_err(|source| Error::MalformedCache {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(JsonFileStore {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer(&mut tmp, &self.records)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), records = self.records.len(), "cache written");
        Ok(())
    }
}

impl ResultStore for JsonFileStore {
    fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    fn append(&mut self, record: MeasurementRecord) -> Result<()> {
        if self.contains(&record.commit) {
            return Err(Error::DuplicateRecord(record.commit));
        }
        self.records.push(record);
        if let Err(e) = self.persist() {
            self.records.pop();
            return Err(e);
        }
        Ok(())
    }
}
