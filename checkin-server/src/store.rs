//! Participant store
//!
//! In-memory roster keyed by participant ID, persisted as one JSON document.
//! The document is rewritten in full after every mutation; writes go to a
//! sibling temp file that is then renamed over the original, so a crash
//! mid-write leaves the previous document intact.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Most check-ins kept per participant
pub const MAX_CHECK_INS: usize = 10;

/// Participant ID → record, in roster order
pub type Roster = IndexMap<String, Participant>;

/// One roster entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Chinese display name
    #[serde(default)]
    pub name: String,
    /// English display name
    #[serde(default)]
    pub ename: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub voice: String,
    #[serde(default)]
    pub is_valid: bool,
    /// Newest first by insertion
    #[serde(default)]
    pub check_ins: Vec<DateTime<Utc>>,
}

impl Participant {
    /// Put `at` at the front and drop anything past [`MAX_CHECK_INS`]
    pub fn record_check_in(&mut self, at: DateTime<Utc>) {
        self.check_ins.insert(0, at);
        self.check_ins.truncate(MAX_CHECK_INS);
    }

    /// Number of check-ins falling on `date` in the event timezone
    pub fn check_ins_on(&self, date: NaiveDate, tz: Tz) -> usize {
        self.check_ins
            .iter()
            .filter(|ts| checkin_common::time::local_date(ts, tz) == date)
            .count()
    }
}

/// Persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Participant document {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize participants: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Participants plus the document they persist to
#[derive(Debug)]
pub struct ParticipantStore {
    path: PathBuf,
    participants: Roster,
}

impl ParticipantStore {
    /// Load the document at `path`
    ///
    /// A missing document gives an empty store. A document that exists but
    /// does not parse is an error; callers treat it as fatal.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if !path.exists() {
            info!("No participant document at {}, starting empty", path.display());
            return Ok(Self {
                path,
                participants: Roster::new(),
            });
        }

        let data = fs::read(&path).map_err(|source| StoreError::Read {
            path: path.clone(),
            source,
        })?;
        let participants: Roster =
            serde_json::from_slice(&data).map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;

        info!(
            "Loaded {} participants from {}",
            participants.len(),
            path.display()
        );
        Ok(Self { path, participants })
    }

    /// Write the whole map to disk, replacing the previous document
    pub fn save(&self) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(&self.participants)?;
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, data).map_err(write_err)?;
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;

        debug!(
            "Persisted {} participants to {}",
            self.participants.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Swap in a freshly imported roster and persist it
    pub fn replace(&mut self, roster: Roster) -> Result<usize, StoreError> {
        self.participants = roster;
        self.save()?;
        Ok(self.participants.len())
    }

    /// Remove every participant and persist
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.participants.clear();
        self.save()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Participant> {
        self.participants.get_mut(id)
    }

    /// Participants in roster order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Participant)> {
        self.participants.iter()
    }
}
