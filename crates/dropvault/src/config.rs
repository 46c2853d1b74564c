//! Store configuration.
//!
//! Every store receives its root paths from a [`StoreConfig`] at
//! construction, so separate instances never share state.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sub-directory of the data dir holding per-token mailboxes.
const MAILBOX_DIR: &str = "mailbox";

/// Sub-directory of the data dir holding the catalog and databases.
const DATABASES_DIR: &str = "databases";

/// Identity records file inside the data dir.
const USERS_FILE: &str = "users.json";

/// Configuration shared by all stores of one instance.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory for all persisted state.
    ///
    /// ```text
    /// {data_dir}/
    /// ├── users.json
    /// ├── mailbox/
    /// └── databases/
    /// ```
    pub data_dir: PathBuf,

    /// How many fresh identifiers to try before giving up on a unique name.
    pub max_id_attempts: u32,

    /// How long an issued login token stays valid.
    pub token_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            max_id_attempts: 5,
            token_ttl: Duration::from_secs(60 * 60),
        }
    }
}

impl StoreConfig {
    /// Create a new config builder.
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Root of the mailbox tree.
    pub fn mailbox_dir(&self) -> PathBuf {
        self.data_dir.join(MAILBOX_DIR)
    }

    /// Root of the catalog and database tree.
    pub fn databases_dir(&self) -> PathBuf {
        self.data_dir.join(DATABASES_DIR)
    }

    /// Path of the identity records file.
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }

    /// The data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

/// Builder for [`StoreConfig`].
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the data directory (root for all storage).
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the bound on identifier collision retries. Zero is raised to one.
    pub fn max_id_attempts(mut self, attempts: u32) -> Self {
        self.config.max_id_attempts = attempts.max(1);
        self
    }

    /// Set the login token lifetime.
    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.config.token_ttl = ttl;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
