use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("cannot read history {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("malformed history {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("cannot serialize history: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("cannot write history {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// One published clip.
///
/// Fields missing from older or hand-edited documents deserialize to their
/// defaults instead of rejecting the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Source page URL of the clip. Empty when the source had none.
    #[serde(default)]
    pub url: String,
    /// Id assigned by the hosting platform.
    #[serde(default)]
    pub video_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl HistoryRecord {
    pub fn new(url: impl Into<String>, video_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            video_id: video_id.into(),
            uploaded_at: Some(Utc::now()),
        }
    }
}

/// On-disk shape. Entries stay raw so one unreadable entry neither hides
/// the others nor gets dropped on rewrite.
#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryDocument {
    #[serde(default)]
    uploaded: Vec<serde_json::Value>,
}

/// Anything that can list previously published records.
pub trait HistorySource {
    fn records(&self) -> Vec<HistoryRecord>;
}

impl HistorySource for [HistoryRecord] {
    fn records(&self) -> Vec<HistoryRecord> {
        self.to_vec()
    }
}

impl HistorySource for Vec<HistoryRecord> {
    fn records(&self) -> Vec<HistoryRecord> {
        self.clone()
    }
}

/// JSON document of `{ "uploaded": [...] }`, read and written wholesale.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<HistoryDocument, PersistenceError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HistoryDocument::default()),
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&raw).map_err(|source| PersistenceError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Read the document. A missing file is an empty history; entries that
    /// cannot be read as records are skipped with a warning.
    pub fn try_load(&self) -> Result<Vec<HistoryRecord>, PersistenceError> {
        let doc = self.read_document()?;
        let records = doc
            .uploaded
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("skipping history entry {} in {}: {}", i, self.path.display(), e);
                    None
                }
            })
            .collect();
        Ok(records)
    }

    /// Read the document, treating any failure as an empty history.
    pub fn load(&self) -> Vec<HistoryRecord> {
        match self.try_load() {
            Ok(records) => records,
            Err(e) => {
                warn!("could not load upload history, duplicates may slip through: {e}");
                Vec::new()
            }
        }
    }

    /// Append one record and rewrite the whole document. Existing entries
    /// are written back exactly as they were read.
    pub fn append(&self, record: HistoryRecord) -> Result<(), PersistenceError> {
        let mut doc = match self.read_document() {
            Ok(doc) => doc,
            Err(e) => {
                warn!("could not read upload history, starting a new one: {e}");
                HistoryDocument::default()
            }
        };
        doc.uploaded
            .push(serde_json::to_value(record).map_err(PersistenceError::Serialize)?);

        let json = serde_json::to_string_pretty(&doc).map_err(PersistenceError::Serialize)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, json).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            "history now holds {} entries ({})",
            doc.uploaded.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl HistorySource for HistoryStore {
    fn records(&self) -> Vec<HistoryRecord> {
        self.load()
    }
}
