//! The catalog: the set of known databases.
//!
//! ```text
//! {databases_dir}/
//! ├── catalog.json      { "version": 1, "databases": [...] }
//! ├── .staging/
//! └── {db}/
//!     └── tables.json   { "version": 1, "tables": [...] }
//! ```
//!
//! The catalog is authoritative: a database exists when it is listed. A name
//! is listed only after its directory and table list are on disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::locks::PathLocks;
use crate::names::check_name;

use super::files::{ensure_dir, is_not_found, read_json, spit, write_json, STAGING_DIR};

// ── File format constants ─────────────────────────────────────────────────────

const CATALOG_FILE_VERSION: u32 = 1;
const TABLE_LIST_FILE_VERSION: u32 = 1;

const CATALOG_FILE: &str = "catalog.json";
pub(crate) const TABLE_LIST_FILE: &str = "tables.json";

// ── On-disk structures ────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    version: u32,
    databases: Vec<String>,
}

/// Per-database record of table names. Shared with the table store.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct TableListFile {
    pub version: u32,
    pub tables: Vec<String>,
}

impl TableListFile {
    pub(crate) fn empty() -> Self {
        Self {
            version: TABLE_LIST_FILE_VERSION,
            tables: Vec::new(),
        }
    }
}

// ── CatalogStore ──────────────────────────────────────────────────────────────

/// Filesystem-backed catalog of databases.
#[derive(Clone)]
pub struct CatalogStore {
    root: PathBuf,
    staging: PathBuf,
    catalog_path: PathBuf,
    locks: Arc<PathLocks>,
}

impl CatalogStore {
    /// Open the database tree under `config.databases_dir()`.
    ///
    /// Seeds an empty catalog if none exists. An existing catalog is never
    /// replaced, even when another process seeds one at the same time.
    pub fn open(config: &StoreConfig, locks: Arc<PathLocks>) -> Result<Self> {
        let root = config.databases_dir();
        let staging = root.join(STAGING_DIR);
        ensure_dir(&staging)?;
        let catalog_path = root.join(CATALOG_FILE);

        if !catalog_path.exists() {
            let empty = serde_json::to_vec_pretty(&CatalogFile {
                version: CATALOG_FILE_VERSION,
                databases: Vec::new(),
            })?;
            match spit(&staging, &catalog_path, false, &empty) {
                Ok(()) => debug!("Seeded empty catalog at {}", catalog_path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Self {
            root,
            staging,
            catalog_path,
            locks,
        })
    }

    /// Names of all databases.
    ///
    /// # Errors
    ///
    /// `CatalogUnreadable` if the catalog record is missing or malformed.
    pub fn list_databases(&self) -> Result<Vec<String>> {
        Ok(self.read_catalog()?.databases)
    }

    /// Whether `name` is listed in the catalog.
    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.read_catalog()?.databases.iter().any(|db| db == name))
    }

    /// Create a database with an empty table list.
    ///
    /// # Errors
    ///
    /// - `InvalidName` if `name` is unsafe as a path segment or is the
    ///   catalog's own file name.
    /// - `AlreadyExists` if the catalog lists `name` already; nothing is
    ///   modified in that case.
    pub fn create_database(&self, name: &str) -> Result<()> {
        check_name(name)?;
        if name == CATALOG_FILE {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        let _guard = self.locks.lock(&self.catalog_path);

        let mut catalog = self.read_catalog()?;
        if catalog.databases.iter().any(|db| db == name) {
            return Err(StoreError::AlreadyExists(format!("database {name}")));
        }

        // Directory and table list first, so a listed database always has both.
        let db_dir = self.database_dir(name);
        ensure_dir(&db_dir)?;
        write_json(
            &self.staging,
            &db_dir.join(TABLE_LIST_FILE),
            &TableListFile::empty(),
        )?;

        catalog.databases.push(name.to_string());
        write_json(&self.staging, &self.catalog_path, &catalog)?;

        debug!("Created database {name}");
        Ok(())
    }

    /// Root of the database tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of database `name`, whether or not it exists.
    pub fn database_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub(crate) fn staging(&self) -> &Path {
        &self.staging
    }

    pub(crate) fn locks(&self) -> &Arc<PathLocks> {
        &self.locks
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn read_catalog(&self) -> Result<CatalogFile> {
        read_json(&self.catalog_path).map_err(|e| {
            let reason = if is_not_found(&e) {
                "catalog record is missing".to_string()
            } else {
                e.to_string()
            };
            error!("Catalog at {} unreadable: {reason}", self.catalog_path.display());
            StoreError::CatalogUnreadable(reason)
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
