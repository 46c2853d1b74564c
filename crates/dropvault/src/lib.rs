//! DropVault: file-backed dead-drop mailboxes and a directory-addressed
//! database store.
//!
//! Provides token-keyed mailboxes whose items can be withdrawn exactly once,
//! a catalog of databases holding tables of JSON records, the identity
//! records that issue mailbox tokens, and stateless passphrase encryption.
//! Everything is persisted as plain files under one data directory.

pub mod capability;
pub mod config;
pub mod crypto;
pub mod error;
pub mod locks;
pub mod names;
pub mod storage;
pub mod time;

// Re-export primary types
pub use capability::{AllowAll, LogMailer, Mailer, TokenAuthority};
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use locks::PathLocks;
pub use storage::{
    CatalogStore, MailboxStore, RecordEntry, RecordStore, Storage, TableStore, UserStore,
    UserSummary, Withdrawal,
};
