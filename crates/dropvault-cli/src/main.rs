//! DropVault admin CLI: the `dvault` command.
//!
//! Works directly on a data directory, without a running server: inspect and
//! create databases, tables and records, count waiting mailbox items, and
//! list registered users.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use dropvault::time::millis_to_rfc3339;
use dropvault::{AllowAll, LogMailer, PathLocks, Storage, StoreConfig, UserStore};

// ── CLI structure ─────────────────────────────────────────────────────────────

/// DropVault admin CLI
#[derive(Parser, Debug)]
#[command(
    name = "dvault",
    about = "DropVault admin CLI",
    version,
    long_about = "dvault: DropVault admin CLI\n\nInspect and edit a DropVault data directory: databases, tables,\nrecords, mailboxes and users."
)]
struct Cli {
    /// Data directory
    #[arg(long, global = true, env = "DROPVAULT_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage databases
    Db {
        #[command(subcommand)]
        subcommand: DbCommands,
    },

    /// Manage tables
    Table {
        #[command(subcommand)]
        subcommand: TableCommands,
    },

    /// Insert and view records
    Record {
        #[command(subcommand)]
        subcommand: RecordCommands,
    },

    /// Inspect mailboxes
    Mailbox {
        #[command(subcommand)]
        subcommand: MailboxCommands,
    },

    /// Inspect registered users
    User {
        #[command(subcommand)]
        subcommand: UserCommands,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommands {
    /// List all databases
    List,
    /// Create a database
    Create {
        /// Database name
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum TableCommands {
    /// List the tables of a database
    List {
        /// Database name
        db: String,
    },
    /// Create a table in a database
    Create {
        /// Database name
        db: String,
        /// Table name
        table: String,
    },
}

#[derive(Subcommand, Debug)]
enum RecordCommands {
    /// Insert a JSON document into a table
    Insert {
        /// Database name
        db: String,
        /// Table name
        table: String,
        /// JSON document, e.g. '{"a":1}'
        data: String,
    },
    /// Show all records of a table, oldest first
    View {
        /// Database name
        db: String,
        /// Table name
        table: String,
        /// Print a JSON array of documents instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum MailboxCommands {
    /// Count the items waiting under a token
    Pending {
        /// Mailbox token
        token: String,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommands {
    /// List registered users
    List,
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let config = StoreConfig::builder().data_dir(&cli.data_dir).build();
    let verbose = cli.verbose;

    let result = match cli.command {
        Commands::Db { subcommand } => match subcommand {
            DbCommands::List => cmd_db_list(&config),
            DbCommands::Create { name } => cmd_db_create(&config, &name, verbose),
        },
        Commands::Table { subcommand } => match subcommand {
            TableCommands::List { db } => cmd_table_list(&config, &db),
            TableCommands::Create { db, table } => cmd_table_create(&config, &db, &table, verbose),
        },
        Commands::Record { subcommand } => match subcommand {
            RecordCommands::Insert { db, table, data } => {
                cmd_record_insert(&config, &db, &table, &data)
            }
            RecordCommands::View { db, table, json } => cmd_record_view(&config, &db, &table, json),
        },
        Commands::Mailbox { subcommand } => match subcommand {
            MailboxCommands::Pending { token } => cmd_mailbox_pending(&config, &token),
        },
        Commands::User { subcommand } => match subcommand {
            UserCommands::List => cmd_user_list(&config),
        },
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── Store helpers ─────────────────────────────────────────────────────────────

fn open_storage(config: &StoreConfig) -> Result<Storage> {
    log::debug!("Opening data dir {}", config.data_dir().display());
    Storage::open(config, Arc::new(AllowAll))
        .with_context(|| format!("failed to open data dir {}", config.data_dir().display()))
}

fn open_users(config: &StoreConfig) -> Result<UserStore> {
    UserStore::open(config, Arc::new(LogMailer), Arc::new(PathLocks::new()))
        .context("failed to open identity records")
}

// ── Command implementations ───────────────────────────────────────────────────

/// `dvault db list`
fn cmd_db_list(config: &StoreConfig) -> Result<()> {
    let storage = open_storage(config)?;
    let names = storage.catalog.list_databases()?;

    if names.is_empty() {
        println!("No databases in {}", storage.catalog.root().display());
        return Ok(());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// `dvault db create NAME`
fn cmd_db_create(config: &StoreConfig, name: &str, verbose: bool) -> Result<()> {
    let storage = open_storage(config)?;
    storage
        .catalog
        .create_database(name)
        .with_context(|| format!("failed to create database '{name}'"))?;

    println!("Created database '{name}'");
    if verbose {
        println!("  Dir: {}", storage.catalog.database_dir(name).display());
    }
    Ok(())
}

/// `dvault table list DB`
fn cmd_table_list(config: &StoreConfig, db: &str) -> Result<()> {
    let storage = open_storage(config)?;
    let names = storage.tables.list_tables(db)?;

    if names.is_empty() {
        println!("No tables in database '{db}'");
        return Ok(());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// `dvault table create DB TABLE`
fn cmd_table_create(config: &StoreConfig, db: &str, table: &str, verbose: bool) -> Result<()> {
    let storage = open_storage(config)?;
    storage
        .tables
        .create_table(db, table)
        .with_context(|| format!("failed to create table '{db}.{table}'"))?;

    println!("Created table '{db}.{table}'");
    if verbose {
        println!("  Dir: {}", storage.tables.table_dir(db, table).display());
    }
    Ok(())
}

/// `dvault record insert DB TABLE JSON`
fn cmd_record_insert(config: &StoreConfig, db: &str, table: &str, data: &str) -> Result<()> {
    let value: Value =
        serde_json::from_str(data).map_err(|e| anyhow!("data is not valid JSON: {e}"))?;

    let storage = open_storage(config)?;
    let key = storage.records.insert(db, table, &value)?;
    println!("Inserted record {key}");
    Ok(())
}

/// `dvault record view DB TABLE [--json]`
fn cmd_record_view(config: &StoreConfig, db: &str, table: &str, json: bool) -> Result<()> {
    let storage = open_storage(config)?;

    if json {
        let rows = storage.records.view(db, table)?;
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let entries = storage.records.entries(db, table)?;
    if entries.is_empty() {
        println!("No records in '{db}.{table}'");
        return Ok(());
    }

    println!("{:<24} {:<26} DATA", "KEY", "INSERTED");
    println!("{}", "-".repeat(72));
    for entry in &entries {
        println!(
            "{:<24} {:<26} {}",
            entry.key,
            millis_to_rfc3339(entry.inserted_at),
            entry.data
        );
    }
    println!("{} record(s)", entries.len());
    Ok(())
}

/// `dvault mailbox pending TOKEN`
fn cmd_mailbox_pending(config: &StoreConfig, token: &str) -> Result<()> {
    let storage = open_storage(config)?;
    let count = storage.mailbox.pending(token)?;
    println!("{count}");
    Ok(())
}

/// `dvault user list`
fn cmd_user_list(config: &StoreConfig) -> Result<()> {
    let users = open_users(config)?;
    let summaries = users.list_users()?;

    if summaries.is_empty() {
        println!("No users registered");
        return Ok(());
    }

    println!("{:<20} {:<32} TOKEN", "USERNAME", "EMAIL");
    println!("{}", "-".repeat(64));
    for user in &summaries {
        let token = if user.has_live_token { "live" } else { "-" };
        println!("{:<20} {:<32} {token}", user.username, user.email);
    }
    Ok(())
}
