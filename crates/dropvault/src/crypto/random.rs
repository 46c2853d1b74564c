//! Secure random identifiers.
//!
//! Uses the operating system's cryptographic random source via `rand`.
//! A failing random source panics inside `rand`; there is no safe way to
//! continue without one.

use rand::RngCore;

/// Random bytes behind a file identifier.
pub const ID_BYTES: usize = 8;

/// Random bytes behind a bearer token.
pub const TOKEN_BYTES: usize = 32;

/// Fill a buffer with cryptographically secure random bytes.
pub fn fill_random(buf: &mut [u8]) {
    rand::thread_rng().fill_bytes(buf);
}

/// Generate a fixed-size array of cryptographically secure random bytes.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    fill_random(&mut buf);
    buf
}

/// Generate a new file identifier: 16 lowercase hex characters.
///
/// The result never contains a path separator and is usable as-is as a
/// path segment.
pub fn new_id() -> String {
    hex::encode(random_bytes::<ID_BYTES>())
}

/// Generate a new opaque bearer token: 64 lowercase hex characters.
pub fn new_token() -> String {
    hex::encode(random_bytes::<TOKEN_BYTES>())
}

/// Generate a random 12-byte nonce (for ChaCha20-Poly1305).
pub fn random_nonce_12() -> [u8; 12] {
    random_bytes()
}

/// Generate a random 16-byte salt.
pub fn random_salt_16() -> [u8; 16] {
    random_bytes()
}
