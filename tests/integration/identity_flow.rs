//! Integration test: identity records issue the tokens that open mailboxes.
//!
//! Tests the lifecycle:
//! 1. Register and log in
//! 2. Deposit with the issued token, withdraw it once
//! 3. Reject forged, replaced and expired tokens
//! 4. Deliver password-reset mail through the injected mailer

use std::sync::{Arc, Mutex};
use std::time::Duration;

use dropvault::crypto::{decrypt_text, encrypt_text};
use dropvault::{Mailer, PathLocks, Storage, StoreConfig, StoreError, TokenAuthority, UserStore};
use serde_json::json;

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl Mailer for Outbox {
    fn send(&self, to: &str, subject: &str, body: &str) -> dropvault::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

struct Instance {
    users: Arc<UserStore>,
    storage: Storage,
    outbox: Arc<Outbox>,
}

fn open(dir: &std::path::Path, ttl: Duration) -> Instance {
    let config = StoreConfig::builder().data_dir(dir).token_ttl(ttl).build();
    let locks = Arc::new(PathLocks::new());
    let outbox = Arc::new(Outbox::default());
    let users = Arc::new(UserStore::open(&config, outbox.clone(), Arc::clone(&locks)).unwrap());
    let storage = Storage::open_with_locks(&config, users.clone(), locks).unwrap();
    Instance {
        users,
        storage,
        outbox,
    }
}

#[test]
fn identity_flow_login_to_withdrawal() {
    let tmp = tempfile::tempdir().unwrap();
    let vault = open(tmp.path(), Duration::from_secs(3600));

    // ── Step 1: Register and log in ─────────────────────────────────────
    vault.users.register("alice", "alice@example.com").unwrap();
    let token = vault.users.login("alice", "alice@example.com").unwrap();
    assert_eq!(token.len(), 64);
    assert!(vault.users.is_authorized(&token).unwrap());

    // ── Step 2: Deposit and withdraw once ───────────────────────────────
    vault
        .storage
        .mailbox
        .deposit(&token, &json!({"msg": "meet at noon"}))
        .unwrap();
    let got = vault.storage.mailbox.withdraw(&token).unwrap();
    assert_eq!(got.payload, json!({"msg": "meet at noon"}));
    assert!(matches!(
        vault.storage.mailbox.withdraw(&token),
        Err(StoreError::NotFound(_))
    ));

    // ── Step 3: Forged and replaced tokens ──────────────────────────────
    assert!(matches!(
        vault.storage.mailbox.deposit("0123456789abcdef", &json!(1)),
        Err(StoreError::InvalidToken)
    ));

    let fresh = vault.users.login("alice", "alice@example.com").unwrap();
    assert_ne!(fresh, token);
    assert!(!vault.users.is_authorized(&token).unwrap());
    assert!(matches!(
        vault.storage.mailbox.deposit(&token, &json!(1)),
        Err(StoreError::InvalidToken)
    ));
    vault.storage.mailbox.deposit(&fresh, &json!(1)).unwrap();
}

#[test]
fn expired_tokens_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let vault = open(tmp.path(), Duration::from_millis(50));

    vault.users.register("bob", "bob@example.com").unwrap();
    let token = vault.users.login("bob", "bob@example.com").unwrap();
    std::thread::sleep(Duration::from_millis(120));

    assert!(!vault.users.is_authorized(&token).unwrap());
    assert!(matches!(
        vault.storage.mailbox.deposit(&token, &json!({})),
        Err(StoreError::InvalidToken)
    ));
    let users = vault.users.list_users().unwrap();
    assert!(!users[0].has_live_token);
}

#[test]
fn password_reset_goes_through_mailer() {
    let tmp = tempfile::tempdir().unwrap();
    let vault = open(tmp.path(), Duration::from_secs(3600));

    vault.users.register("carol", "carol@example.com").unwrap();
    vault.users.forgot_password("carol@example.com").unwrap();
    assert!(matches!(
        vault.users.forgot_password("nobody@example.com"),
        Err(StoreError::EmailNotFound)
    ));

    let sent = vault.outbox.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (to, subject, body) = &sent[0];
    assert_eq!(to, "carol@example.com");
    assert_eq!(subject, "Password Reset");
    assert!(body.starts_with("Your password reset token is "));
}

#[test]
fn users_survive_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let token = {
        let vault = open(tmp.path(), Duration::from_secs(3600));
        vault.users.register("dave", "dave@example.com").unwrap();
        vault.users.login("dave", "dave@example.com").unwrap()
    };

    let vault = open(tmp.path(), Duration::from_secs(3600));
    assert!(vault.users.is_authorized(&token).unwrap());
    assert!(matches!(
        vault.users.register("dave", "other@example.com"),
        Err(StoreError::UserExists(_))
    ));
}

#[test]
fn encrypted_text_round_trips_only_with_its_key() {
    let sealed = encrypt_text("the drop is under the bench", "correct horse").unwrap();
    assert_eq!(
        decrypt_text(&sealed, "correct horse").unwrap(),
        "the drop is under the bench"
    );
    assert!(matches!(
        decrypt_text(&sealed, "wrong horse"),
        Err(StoreError::DecryptionFailed(_))
    ));
    assert!(matches!(
        decrypt_text("not hex at all", "correct horse"),
        Err(StoreError::DecryptionFailed(_))
    ));
}
