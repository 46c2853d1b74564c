//! Storage layer: mailboxes, the database catalog, tables, records and
//! identity records. The filesystem tree is the only copy of the data.
//!
//! # Directory layout
//!
//! ```text
//! {data_dir}/
//! ├── users.json
//! ├── mailbox/
//! │   └── {token}/{id}.json
//! └── databases/
//!     ├── catalog.json
//!     └── {db}/
//!         ├── tables.json
//!         └── {table}/
//!             ├── config.json
//!             └── {record-key}.json
//! ```
//!
//! # Modules
//!
//! - [`mailbox`]: dead-drop deposit and withdraw.
//! - [`catalog`]: create and list databases.
//! - [`table`]: create and list tables.
//! - [`record`]: insert and view records.
//! - [`user_store`]: registered users and login tokens.

mod files;

pub mod catalog;
pub mod mailbox;
pub mod record;
pub mod table;
pub mod user_store;

pub use catalog::CatalogStore;
pub use mailbox::{MailboxStore, Withdrawal};
pub use record::{RecordEntry, RecordStore};
pub use table::{TableConfig, TableStore};
pub use user_store::{UserRecord, UserStore, UserSummary};

use std::sync::Arc;

use crate::capability::TokenAuthority;
use crate::config::StoreConfig;
use crate::error::Result;
use crate::locks::PathLocks;

/// All data stores of one instance, sharing a config and a lock table.
#[derive(Clone)]
pub struct Storage {
    pub mailbox: MailboxStore,
    pub catalog: CatalogStore,
    pub tables: TableStore,
    pub records: RecordStore,
}

impl Storage {
    /// Open every store under `config.data_dir`, creating directories as
    /// needed. Mailbox deposits are authorized through `authority`.
    pub fn open(config: &StoreConfig, authority: Arc<dyn TokenAuthority>) -> Result<Self> {
        Self::open_with_locks(config, authority, Arc::new(PathLocks::new()))
    }

    /// Like [`Storage::open`], sharing an existing lock table (for example
    /// with a [`UserStore`] over the same data dir).
    pub fn open_with_locks(
        config: &StoreConfig,
        authority: Arc<dyn TokenAuthority>,
        locks: Arc<PathLocks>,
    ) -> Result<Self> {
        let mailbox = MailboxStore::open(config, authority, Arc::clone(&locks))?;
        let catalog = CatalogStore::open(config, locks)?;
        let tables = TableStore::new(catalog.clone());
        let records = RecordStore::new(tables.clone(), config.max_id_attempts);
        Ok(Self {
            mailbox,
            catalog,
            tables,
            records,
        })
    }
}
