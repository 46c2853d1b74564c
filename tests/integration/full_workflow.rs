//! Integration test: full end-to-end workflow over one data directory.
//!
//! Tests the complete lifecycle:
//! 1. Open the stores
//! 2. Create a database and a table
//! 3. Insert and view records
//! 4. Deposit into and drain a mailbox
//! 5. Reopen the stores and find the same state on disk

use std::sync::Arc;

use dropvault::{AllowAll, Storage, StoreConfig, StoreError};
use serde_json::json;

fn open(dir: &std::path::Path) -> Storage {
    let config = StoreConfig::builder().data_dir(dir).build();
    Storage::open(&config, Arc::new(AllowAll)).expect("stores should open")
}

#[test]
fn full_workflow_database_to_mailbox() {
    let tmp = tempfile::tempdir().unwrap();

    // ── Step 1: Open the stores ─────────────────────────────────────────
    let storage = open(tmp.path());
    assert!(storage.catalog.list_databases().unwrap().is_empty());

    // ── Step 2: Create a database and a table ───────────────────────────
    storage.catalog.create_database("shop").unwrap();
    storage.tables.create_table("shop", "orders").unwrap();
    storage.tables.create_table("shop", "customers").unwrap();

    assert_eq!(storage.catalog.list_databases().unwrap(), vec!["shop"]);
    assert_eq!(
        storage.tables.list_tables("shop").unwrap(),
        vec!["orders", "customers"]
    );
    assert!(storage
        .tables
        .table_config("shop", "orders")
        .unwrap()
        .columns
        .is_empty());

    // ── Step 3: Insert and view records ─────────────────────────────────
    let mut keys = Vec::new();
    for a in 1..=3 {
        keys.push(
            storage
                .records
                .insert("shop", "orders", &json!({ "a": a }))
                .unwrap(),
        );
    }
    for pair in keys.windows(2) {
        assert!(
            pair[0][..13] <= pair[1][..13],
            "record keys should carry non-decreasing timestamps"
        );
    }

    let rows = storage.records.view("shop", "orders").unwrap();
    assert_eq!(rows.len(), 3);
    for a in 1..=3 {
        assert!(rows.contains(&json!({ "a": a })), "missing record a={a}");
    }
    assert!(storage.records.view("shop", "customers").unwrap().is_empty());

    // ── Step 4: Deposit into and drain a mailbox ────────────────────────
    let token = "f00dfeedf00dfeed";
    let path = storage.mailbox.deposit(token, &json!({"drop": 1})).unwrap();
    assert!(path.starts_with(storage.mailbox.mailbox_dir(token)));
    storage.mailbox.deposit(token, &json!({"drop": 2})).unwrap();
    assert_eq!(storage.mailbox.pending(token).unwrap(), 2);

    let mut drops = vec![
        storage.mailbox.withdraw(token).unwrap().payload,
        storage.mailbox.withdraw(token).unwrap().payload,
    ];
    drops.sort_by_key(|v| v["drop"].as_i64());
    assert_eq!(drops, vec![json!({"drop": 1}), json!({"drop": 2})]);
    assert!(matches!(
        storage.mailbox.withdraw(token),
        Err(StoreError::NotFound(_))
    ));
    assert!(!storage.mailbox.mailbox_dir(token).exists());

    // ── Step 5: Reopen and find the same state ──────────────────────────
    drop(storage);
    let reopened = open(tmp.path());
    assert_eq!(reopened.catalog.list_databases().unwrap(), vec!["shop"]);
    assert_eq!(reopened.records.count("shop", "orders").unwrap(), 3);
    assert!(matches!(
        reopened.catalog.create_database("shop"),
        Err(StoreError::AlreadyExists(_))
    ));
}

#[test]
fn unknown_targets_mutate_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let storage = open(tmp.path());
    storage.catalog.create_database("d").unwrap();

    assert!(matches!(
        storage.records.view("missing", "t"),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        storage.records.insert("d", "missing", &json!({})),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        storage.tables.create_table("missing", "t"),
        Err(StoreError::NotFound(_))
    ));

    assert!(!storage.catalog.database_dir("missing").exists());
    assert!(!storage.tables.table_dir("d", "missing").exists());
    assert_eq!(storage.catalog.list_databases().unwrap(), vec!["d"]);
}

#[test]
fn create_twice_leaves_state_unchanged() {
    let tmp = tempfile::tempdir().unwrap();
    let storage = open(tmp.path());

    storage.catalog.create_database("d").unwrap();
    storage.tables.create_table("d", "t").unwrap();
    storage.records.insert("d", "t", &json!({"kept": true})).unwrap();

    let catalog_before = std::fs::read(tmp.path().join("databases/catalog.json")).unwrap();
    let tables_before = std::fs::read(tmp.path().join("databases/d/tables.json")).unwrap();

    assert!(matches!(
        storage.catalog.create_database("d"),
        Err(StoreError::AlreadyExists(_))
    ));
    assert!(matches!(
        storage.tables.create_table("d", "t"),
        Err(StoreError::AlreadyExists(_))
    ));

    assert_eq!(
        std::fs::read(tmp.path().join("databases/catalog.json")).unwrap(),
        catalog_before
    );
    assert_eq!(
        std::fs::read(tmp.path().join("databases/d/tables.json")).unwrap(),
        tables_before
    );
    assert_eq!(storage.records.view("d", "t").unwrap(), vec![json!({"kept": true})]);
}
