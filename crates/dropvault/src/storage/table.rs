//! Tables within a database.
//!
//! ```text
//! {db}/
//! ├── tables.json       table list
//! └── {table}/
//!     ├── config.json   { "version": 1, "columns": [] }
//!     └── {key}.json    records
//! ```
//!
//! The column list in `config.json` is a placeholder; no schema is enforced.

use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::names::check_name;

use super::catalog::{CatalogStore, TableListFile, TABLE_LIST_FILE};
use super::files::{ensure_dir, is_not_found, read_json, write_json};

const TABLE_CONFIG_FILE_VERSION: u32 = 1;

pub(crate) const TABLE_CONFIG_FILE: &str = "config.json";

/// Column configuration of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    pub version: u32,
    pub columns: Vec<String>,
}

/// Filesystem-backed table lists, one per database.
#[derive(Clone)]
pub struct TableStore {
    catalog: CatalogStore,
}

impl TableStore {
    pub fn new(catalog: CatalogStore) -> Self {
        Self { catalog }
    }

    /// Names of the tables in database `db`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the database is not in the catalog or its table list is
    /// missing.
    pub fn list_tables(&self, db: &str) -> Result<Vec<String>> {
        Ok(self.read_table_list(db)?.tables)
    }

    /// Create table `table` in database `db`.
    ///
    /// # Errors
    ///
    /// - `InvalidName` if either name is unsafe as a path segment.
    /// - `NotFound` if the database does not exist.
    /// - `AlreadyExists` if the table is already listed; nothing is modified.
    pub fn create_table(&self, db: &str, table: &str) -> Result<()> {
        check_name(db)?;
        check_name(table)?;
        if table == TABLE_LIST_FILE {
            return Err(StoreError::InvalidName(table.to_string()));
        }

        let list_path = self.table_list_path(db);
        let _guard = self.catalog.locks().lock(&list_path);

        let mut list = self.read_table_list(db)?;
        if list.tables.iter().any(|t| t == table) {
            return Err(StoreError::AlreadyExists(format!("table {db}.{table}")));
        }

        let table_dir = self.table_dir(db, table);
        ensure_dir(&table_dir)?;
        write_json(
            self.catalog.staging(),
            &table_dir.join(TABLE_CONFIG_FILE),
            &TableConfig {
                version: TABLE_CONFIG_FILE_VERSION,
                columns: Vec::new(),
            },
        )?;

        list.tables.push(table.to_string());
        write_json(self.catalog.staging(), &list_path, &list)?;

        debug!("Created table {db}.{table}");
        Ok(())
    }

    /// Column configuration of `db.table`.
    pub fn table_config(&self, db: &str, table: &str) -> Result<TableConfig> {
        let dir = self.require_table(db, table)?;
        read_json(&dir.join(TABLE_CONFIG_FILE)).map_err(|e| {
            if is_not_found(&e) {
                StoreError::NotFound(format!("config of table {db}.{table}"))
            } else {
                e
            }
        })
    }

    /// Return the directory of `db.table`, or `NotFound` if either is absent.
    pub fn require_table(&self, db: &str, table: &str) -> Result<PathBuf> {
        check_name(table)?;
        let list = self.read_table_list(db)?;
        if !list.tables.iter().any(|t| t == table) {
            return Err(StoreError::NotFound(format!("table {db}.{table}")));
        }
        Ok(self.table_dir(db, table))
    }

    /// Directory of `db.table`, whether or not it exists.
    pub fn table_dir(&self, db: &str, table: &str) -> PathBuf {
        self.catalog.database_dir(db).join(table)
    }

    pub(crate) fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn table_list_path(&self, db: &str) -> PathBuf {
        self.catalog.database_dir(db).join(TABLE_LIST_FILE)
    }

    fn read_table_list(&self, db: &str) -> Result<TableListFile> {
        check_name(db)?;
        if !self.catalog.contains(db)? {
            return Err(StoreError::NotFound(format!("database {db}")));
        }
        read_json(&self.table_list_path(db)).map_err(|e| {
            if is_not_found(&e) {
                StoreError::NotFound(format!("table list of database {db}"))
            } else {
                e
            }
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
