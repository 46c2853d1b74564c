//! Records: JSON documents stored in a table, one file each.
//!
//! A record's key is its insertion time in milliseconds, zero-padded to 13
//! digits, followed by a random suffix: `1718000000123-9f3c1a2b`. Two inserts
//! in the same millisecond get different keys, and sorting keys as strings
//! sorts records by insertion time.

use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_json::Value;

use crate::crypto::random::random_bytes;
use crate::error::{Result, StoreError};
use crate::time::now_millis;

use super::files::{list_json, read_json, spit, JSON_SUFFIX};
use super::table::TableStore;

/// Random bytes in a record key suffix.
const KEY_SUFFIX_BYTES: usize = 4;

/// One stored record with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordEntry {
    /// Record key (file stem).
    pub key: String,
    /// Insertion time, milliseconds since Unix epoch.
    pub inserted_at: u64,
    /// The stored document.
    pub data: Value,
}

/// Build a record key from a timestamp and a fresh random suffix.
pub fn record_key(millis: u64) -> String {
    format!(
        "{millis:013}-{}",
        hex::encode(random_bytes::<KEY_SUFFIX_BYTES>())
    )
}

/// Parse the insertion time out of a record key.
/// `"1718000000123-9f3c1a2b"` → `Some(1718000000123)`
pub fn parse_record_key(key: &str) -> Option<u64> {
    let (millis, suffix) = key.split_once('-')?;
    if millis.len() < 13 || suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    millis.parse().ok()
}

/// Filesystem-backed record store.
#[derive(Clone)]
pub struct RecordStore {
    tables: TableStore,
    max_id_attempts: u32,
}

impl RecordStore {
    pub fn new(tables: TableStore, max_id_attempts: u32) -> Self {
        Self {
            tables,
            max_id_attempts: max_id_attempts.max(1),
        }
    }

    /// Insert `data` as a new record of `db.table`. Returns the record key.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the database or table does not exist. Nothing is
    ///   written in that case.
    /// - `StorageUnavailable` if no unused key was found within the
    ///   configured number of attempts.
    pub fn insert(&self, db: &str, table: &str, data: &Value) -> Result<String> {
        let dir = self.tables.require_table(db, table)?;
        let json = serde_json::to_vec_pretty(data)?;
        let staging = self.tables.catalog().staging();

        for attempt in 1..=self.max_id_attempts {
            let key = record_key(now_millis());
            let path = dir.join(format!("{key}{JSON_SUFFIX}"));
            match spit(staging, &path, false, &json) {
                Ok(()) => {
                    debug!("Inserted record {key} into {db}.{table}");
                    return Ok(key);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    warn!("Record key collision in {db}.{table} on attempt {attempt}");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(StoreError::StorageUnavailable(format!(
            "no unused record key in {db}.{table} after {} attempts",
            self.max_id_attempts
        )))
    }

    /// All records of `db.table`, oldest first.
    ///
    /// # Errors
    ///
    /// `NotFound` if the database or table does not exist.
    pub fn view(&self, db: &str, table: &str) -> Result<Vec<Value>> {
        Ok(self
            .entries(db, table)?
            .into_iter()
            .map(|entry| entry.data)
            .collect())
    }

    /// All records of `db.table` with their keys, oldest first.
    pub fn entries(&self, db: &str, table: &str) -> Result<Vec<RecordEntry>> {
        let dir = self.tables.require_table(db, table)?;

        let mut keyed: Vec<(String, u64)> = list_json(&dir)?
            .into_iter()
            .filter_map(|name| {
                let key = name.strip_suffix(JSON_SUFFIX)?.to_string();
                let inserted_at = parse_record_key(&key)?;
                Some((key, inserted_at))
            })
            .collect();
        keyed.sort();

        let mut entries = Vec::with_capacity(keyed.len());
        for (key, inserted_at) in keyed {
            let data = read_json(&Self::record_path(&dir, &key))?;
            entries.push(RecordEntry {
                key,
                inserted_at,
                data,
            });
        }
        Ok(entries)
    }

    /// Number of records in `db.table`.
    pub fn count(&self, db: &str, table: &str) -> Result<usize> {
        let dir = self.tables.require_table(db, table)?;
        Ok(list_json(&dir)?
            .iter()
            .filter_map(|name| name.strip_suffix(JSON_SUFFIX))
            .filter(|key| parse_record_key(key).is_some())
            .count())
    }

    fn record_path(dir: &Path, key: &str) -> PathBuf {
        dir.join(format!("{key}{JSON_SUFFIX}"))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
