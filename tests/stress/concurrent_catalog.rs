//! Concurrency test: parallel database, table and record creation.
//!
//! Validates that check-then-create sequences stay consistent when many
//! threads share one `Storage`.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use dropvault::{AllowAll, Storage, StoreConfig, StoreError};
use serde_json::json;

fn open(dir: &std::path::Path) -> Arc<Storage> {
    let config = StoreConfig::builder().data_dir(dir).build();
    Arc::new(Storage::open(&config, Arc::new(AllowAll)).expect("stores should open"))
}

#[test]
fn stress_same_database_created_once() {
    let tmp = tempfile::tempdir().unwrap();
    let storage = open(tmp.path());
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let storage = Arc::clone(&storage);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                storage.catalog.create_database("contested")
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(StoreError::AlreadyExists(_)))));
    assert_eq!(storage.catalog.list_databases().unwrap(), vec!["contested"]);
}

#[test]
fn stress_distinct_databases_all_listed() {
    let tmp = tempfile::tempdir().unwrap();
    let storage = open(tmp.path());

    let handles: Vec<_> = (0..32)
        .map(|n| {
            let storage = Arc::clone(&storage);
            thread::spawn(move || storage.catalog.create_database(&format!("db{n}")))
        })
        .collect();
    for h in handles {
        h.join().unwrap().expect("create should succeed");
    }

    let listed: HashSet<String> = storage.catalog.list_databases().unwrap().into_iter().collect();
    let expected: HashSet<String> = (0..32).map(|n| format!("db{n}")).collect();
    assert_eq!(listed, expected);
}

#[test]
fn stress_distinct_tables_all_listed() {
    let tmp = tempfile::tempdir().unwrap();
    let storage = open(tmp.path());
    storage.catalog.create_database("d").unwrap();

    let handles: Vec<_> = (0..24)
        .map(|n| {
            let storage = Arc::clone(&storage);
            thread::spawn(move || storage.tables.create_table("d", &format!("t{n}")))
        })
        .collect();
    for h in handles {
        h.join().unwrap().expect("create should succeed");
    }

    let listed = storage.tables.list_tables("d").unwrap();
    assert_eq!(listed.len(), 24);
    let listed: HashSet<String> = listed.into_iter().collect();
    assert_eq!(listed.len(), 24, "no table should be listed twice");
    for n in 0..24 {
        assert!(storage.tables.table_dir("d", &format!("t{n}")).is_dir());
    }
}

#[test]
fn stress_parallel_inserts_get_unique_keys() {
    let tmp = tempfile::tempdir().unwrap();
    let storage = open(tmp.path());
    storage.catalog.create_database("d").unwrap();
    storage.tables.create_table("d", "t").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|thread_id| {
            let storage = Arc::clone(&storage);
            thread::spawn(move || {
                (0..50)
                    .map(|i| {
                        storage
                            .records
                            .insert("d", "t", &json!({ "t": thread_id, "i": i }))
                            .expect("insert should succeed")
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut keys = HashSet::new();
    for h in handles {
        for key in h.join().unwrap() {
            assert!(keys.insert(key), "duplicate record key");
        }
    }

    assert_eq!(keys.len(), 400);
    assert_eq!(storage.records.count("d", "t").unwrap(), 400);
    assert_eq!(storage.records.view("d", "t").unwrap().len(), 400);
}
