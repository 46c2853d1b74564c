//! Identity records: registered users and their current login tokens.
//!
//! Stored as a single JSON file:
//! ```json
//! {
//!     "version": 1,
//!     "users": {
//!         "alice": { "email": "alice@example.com", "token": "…", "token_issued_at": 1718000000123 }
//!     }
//! }
//! ```
//!
//! A login issues a fresh opaque token and replaces the previous one. The
//! store doubles as the mailbox's [`TokenAuthority`]: a token is authorized
//! while it belongs to a user and is younger than the configured lifetime.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::capability::{Mailer, TokenAuthority};
use crate::config::StoreConfig;
use crate::crypto::random::new_token;
use crate::error::{Result, StoreError};
use crate::locks::PathLocks;
use crate::time::now_millis;

use super::files::{ensure_dir, is_not_found, read_json, write_json, STAGING_DIR};

const USERS_FILE_VERSION: u32 = 1;

// ── On-disk structures ────────────────────────────────────────────────────────

/// One registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_issued_at: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct UsersFile {
    version: u32,
    users: BTreeMap<String, UserRecord>,
}

impl Default for UsersFile {
    fn default() -> Self {
        Self {
            version: USERS_FILE_VERSION,
            users: BTreeMap::new(),
        }
    }
}

/// Summary of a user for listings. Never carries the token itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub username: String,
    pub email: String,
    pub has_live_token: bool,
}

// ── UserStore ─────────────────────────────────────────────────────────────────

/// Filesystem-backed store of identity records.
pub struct UserStore {
    path: PathBuf,
    staging: PathBuf,
    token_ttl: Duration,
    mailer: Arc<dyn Mailer>,
    locks: Arc<PathLocks>,
}

impl UserStore {
    /// Open the identity records at `config.users_path()`. Password-reset
    /// messages are handed to `mailer`.
    pub fn open(
        config: &StoreConfig,
        mailer: Arc<dyn Mailer>,
        locks: Arc<PathLocks>,
    ) -> Result<Self> {
        let staging = config.data_dir().join(STAGING_DIR);
        ensure_dir(&staging)?;
        Ok(Self {
            path: config.users_path(),
            staging,
            token_ttl: config.token_ttl,
            mailer,
            locks,
        })
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// `UserExists` if `username` is taken, `InvalidName` if it is blank.
    pub fn register(&self, username: &str, email: &str) -> Result<()> {
        if username.trim().is_empty() {
            return Err(StoreError::InvalidName(username.to_string()));
        }

        let _guard = self.locks.lock(&self.path);
        let mut file = self.load()?;
        if file.users.contains_key(username) {
            return Err(StoreError::UserExists(username.to_string()));
        }

        file.users.insert(
            username.to_string(),
            UserRecord {
                email: email.to_string(),
                token: None,
                token_issued_at: None,
            },
        );
        write_json(&self.staging, &self.path, &file)?;

        info!("Registered user {username}");
        Ok(())
    }

    /// Log a user in and return a freshly issued token.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` unless `username` exists with `email`.
    pub fn login(&self, username: &str, email: &str) -> Result<String> {
        let _guard = self.locks.lock(&self.path);
        let mut file = self.load()?;

        let user = match file.users.get_mut(username) {
            Some(user) if user.email == email => user,
            _ => return Err(StoreError::InvalidCredentials),
        };

        let token = new_token();
        user.token = Some(token.clone());
        user.token_issued_at = Some(now_millis());
        write_json(&self.staging, &self.path, &file)?;

        debug!("Issued login token for {username}");
        Ok(token)
    }

    /// Send a password-reset token to `email`.
    ///
    /// # Errors
    ///
    /// `EmailNotFound` if no user has that email.
    pub fn forgot_password(&self, email: &str) -> Result<()> {
        let file = self.load()?;
        if !file.users.values().any(|u| u.email == email) {
            return Err(StoreError::EmailNotFound);
        }

        let reset_token = new_token();
        self.mailer.send(
            email,
            "Password Reset",
            &format!("Your password reset token is {reset_token}"),
        )
    }

    /// All registered users, ordered by username.
    pub fn list_users(&self) -> Result<Vec<UserSummary>> {
        let now = now_millis();
        Ok(self
            .load()?
            .users
            .into_iter()
            .map(|(username, user)| UserSummary {
                has_live_token: user.token.is_some() && self.is_live(&user, now),
                username,
                email: user.email,
            })
            .collect())
    }

    /// Path of the identity records file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn load(&self) -> Result<UsersFile> {
        match read_json(&self.path) {
            Ok(file) => Ok(file),
            Err(e) if is_not_found(&e) => Ok(UsersFile::default()),
            Err(e) => Err(e),
        }
    }

    fn is_live(&self, user: &UserRecord, now: u64) -> bool {
        let ttl_ms = self.token_ttl.as_millis() as u64;
        user.token_issued_at
            .map(|issued| now.saturating_sub(issued) < ttl_ms)
            .unwrap_or(false)
    }
}

impl TokenAuthority for UserStore {
    fn is_authorized(&self, token: &str) -> Result<bool> {
        let now = now_millis();
        Ok(self
            .load()?
            .users
            .values()
            .any(|u| u.token.as_deref() == Some(token) && self.is_live(u, now)))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
