//! Cryptographic primitives for DropVault.
//!
//! This module provides:
//! - Cryptographically secure identifiers and bearer tokens
//! - Argon2id passphrase-based key derivation
//! - ChaCha20-Poly1305 authenticated encryption

pub mod encryption;
pub mod random;

pub use encryption::{decrypt_text, encrypt_text};
pub use random::{new_id, new_token};
