//! Capabilities the stores receive from the outside.
//!
//! The mailbox never decides on its own who may deposit, and nothing in the
//! core sends mail directly. Both are injected at construction.

use crate::error::Result;

/// Answers whether a bearer token belongs to a live, authenticated principal.
pub trait TokenAuthority: Send + Sync {
    fn is_authorized(&self, token: &str) -> Result<bool>;
}

/// Delivers a short text message to an email address.
pub trait Mailer: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// A `TokenAuthority` that accepts every token. Used by tools that operate on
/// a data dir directly, and in tests.
pub struct AllowAll;

impl TokenAuthority for AllowAll {
    fn is_authorized(&self, _token: &str) -> Result<bool> {
        Ok(true)
    }
}

/// A `Mailer` that logs the recipient and subject instead of sending.
/// Bodies carry reset tokens and are never logged.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
        log::info!("Mail to {to}: {subject}");
        Ok(())
    }
}
