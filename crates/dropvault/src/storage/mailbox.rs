//! Dead-drop mailboxes: deposit a JSON blob under a token, withdraw it once.
//!
//! ```text
//! {mailbox_dir}/
//! ├── .staging/         temp files waiting to be linked in
//! └── {token}/
//!     └── {id}.json     one deposited payload each
//! ```
//!
//! A token's directory exists exactly while it holds pending items: it is
//! created by the first deposit and removed by the withdrawal that drains it.
//! Entries that fail to parse are moved to `{mailbox_dir}/.corrupt/`.
//!
//! Tokens are live bearer credentials. Log lines name entries by file name
//! only, never by a path that contains the token.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, warn};
use rand::Rng;
use serde_json::Value;

use crate::capability::TokenAuthority;
use crate::config::StoreConfig;
use crate::crypto::random::new_id;
use crate::error::{Result, StoreError};
use crate::locks::PathLocks;
use crate::names::is_safe_name;

use super::files::{ensure_dir, list_json, spit, JSON_SUFFIX, STAGING_DIR};

/// Directory inside the mailbox root that holds unparseable entries.
const QUARANTINE_DIR: &str = ".corrupt";

/// Bound on retries after the mailbox directory vanished under a deposit.
const MAX_VANISHED_RETRIES: u32 = 64;

/// One item taken out of a mailbox.
#[derive(Debug, Clone, PartialEq)]
pub struct Withdrawal {
    /// The deposited payload.
    pub payload: Value,
    /// File name the payload was stored under (`{id}.json`).
    pub name: String,
}

/// Filesystem-backed dead-drop store.
#[derive(Clone)]
pub struct MailboxStore {
    root: PathBuf,
    staging: PathBuf,
    quarantine: PathBuf,
    max_id_attempts: u32,
    authority: Arc<dyn TokenAuthority>,
    locks: Arc<PathLocks>,
    id_source: fn() -> String,
}

impl MailboxStore {
    /// Open the mailbox tree under `config.mailbox_dir()`, creating it if
    /// needed. Deposits are authorized through `authority`.
    pub fn open(
        config: &StoreConfig,
        authority: Arc<dyn TokenAuthority>,
        locks: Arc<PathLocks>,
    ) -> Result<Self> {
        let root = config.mailbox_dir();
        let staging = root.join(STAGING_DIR);
        let quarantine = root.join(QUARANTINE_DIR);
        ensure_dir(&staging)?;
        ensure_dir(&quarantine)?;
        Ok(Self {
            root,
            staging,
            quarantine,
            max_id_attempts: config.max_id_attempts,
            authority,
            locks,
            id_source: new_id,
        })
    }

    /// Store `payload` as a new item in `token`'s mailbox.
    ///
    /// Returns the full path of the created file.
    ///
    /// # Errors
    ///
    /// - `InvalidToken` if the token is unsafe as a path segment or not
    ///   authorized.
    /// - `StorageUnavailable` if no unique file name was found within the
    ///   configured number of attempts. Only name collisions count toward
    ///   that bound; a directory pruned by a concurrent withdrawal is
    ///   recreated and retried separately.
    pub fn deposit(&self, token: &str, payload: &Value) -> Result<PathBuf> {
        if !is_safe_name(token) || !self.authority.is_authorized(token)? {
            return Err(StoreError::InvalidToken);
        }

        let json = serde_json::to_vec_pretty(payload)?;
        let dir = self.root.join(token);
        let _guard = self.locks.lock(&dir);
        ensure_dir(&dir)?;

        let mut collisions = 0;
        let mut vanished = 0;
        while collisions < self.max_id_attempts {
            let name = format!("{}{JSON_SUFFIX}", (self.id_source)());
            let path = dir.join(&name);
            match spit(&self.staging, &path, false, &json) {
                Ok(()) => {
                    debug!("Deposited mailbox entry {name} ({} bytes)", json.len());
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    collisions += 1;
                    warn!("Mailbox name collision on attempt {collisions}, retrying");
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // Pruned by a withdrawal in another process.
                    vanished += 1;
                    if vanished > MAX_VANISHED_RETRIES {
                        return Err(StoreError::StorageUnavailable(format!(
                            "mailbox directory vanished {vanished} times during one deposit"
                        )));
                    }
                    ensure_dir(&dir)?;
                    ensure_dir(&self.staging)?;
                }
                Err(e) => {
                    error!("Mailbox deposit failed: {e}");
                    return Err(e.into());
                }
            }
        }

        Err(StoreError::StorageUnavailable(format!(
            "no unique mailbox entry name after {} attempts",
            self.max_id_attempts
        )))
    }

    /// Take one pending item out of `token`'s mailbox, chosen uniformly at
    /// random.
    ///
    /// The item's file is deleted before this returns. If the delete shows
    /// that another withdrawal already took the file, that item is skipped,
    /// so an item is handed out at most once. An entry that is not valid
    /// JSON is moved to quarantine and skipped. The mailbox directory is
    /// removed once it is empty.
    ///
    /// # Errors
    ///
    /// `NotFound` if the mailbox does not exist or holds no items.
    pub fn withdraw(&self, token: &str) -> Result<Withdrawal> {
        if !is_safe_name(token) {
            return Err(StoreError::NotFound("No data found for this token".into()));
        }

        let dir = self.root.join(token);
        let _guard = self.locks.lock(&dir);

        let mut names = match list_json(&dir) {
            Ok(names) => names,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound("No data found for this token".into()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut rng = rand::thread_rng();
        while !names.is_empty() {
            let name = names.swap_remove(rng.gen_range(0..names.len()));
            let path = dir.join(&name);

            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!("Mailbox entry {name} taken concurrently, skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let payload: Value = match serde_json::from_slice(&bytes) {
                Ok(payload) => payload,
                Err(e) => {
                    error!("Mailbox entry {name} is not valid JSON, quarantining: {e}");
                    self.quarantine_entry(&path, &name)?;
                    continue;
                }
            };

            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!("Mailbox entry {name} deleted concurrently, skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            debug!("Withdrew mailbox entry {name}");
            Self::prune_if_empty(&dir);
            return Ok(Withdrawal { payload, name });
        }

        Self::prune_if_empty(&dir);
        Err(StoreError::NotFound("No more data available".into()))
    }

    /// Number of items waiting in `token`'s mailbox.
    pub fn pending(&self, token: &str) -> Result<usize> {
        if !is_safe_name(token) {
            return Ok(0);
        }
        match list_json(&self.root.join(token)) {
            Ok(names) => Ok(names.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Root of the mailbox tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory that holds `token`'s pending items, whether or not it exists.
    pub fn mailbox_dir(&self, token: &str) -> PathBuf {
        self.root.join(token)
    }

    #[cfg(test)]
    fn with_id_source(mut self, id_source: fn() -> String) -> Self {
        self.id_source = id_source;
        self
    }

    /// Directory holding quarantined entries of all mailboxes.
    pub fn quarantine_dir(&self) -> &Path {
        &self.quarantine
    }

    /// Move an unparseable entry out of its mailbox. The new name carries a
    /// fresh id so entries from different mailboxes never collide.
    fn quarantine_entry(&self, path: &Path, name: &str) -> Result<()> {
        let target = self.quarantine.join(format!("{}-{name}", new_id()));
        match fs::rename(path, target) {
            Ok(()) => Ok(()),
            // Taken or quarantined by another withdrawal.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                error!("Failed to quarantine mailbox entry {name}: {e}");
                Err(e.into())
            }
        }
    }

    /// Remove `dir` if empty. `remove_dir` refuses non-empty directories, so
    /// a concurrent deposit is never lost.
    fn prune_if_empty(dir: &Path) {
        if fs::remove_dir(dir).is_ok() {
            debug!("Pruned an emptied mailbox");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
