//! Stateless passphrase encryption behind `/encrypt` and `/decrypt`.
//!
//! Keys are derived from the caller's passphrase with Argon2id and a random
//! salt, then data is sealed with ChaCha20-Poly1305. The transport form is a
//! single hex string: `salt (16) ‖ nonce (12) ‖ ciphertext`.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use zeroize::Zeroize;

use crate::crypto::random::{random_nonce_12, random_salt_16};
use crate::error::{Result, StoreError};

/// Argon2id parameters for passphrase-based key derivation.
const ARGON2_M_COST: u32 = 19456; // 19 MiB
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

/// Derive a 32-byte encryption key from a passphrase and salt using Argon2id.
pub fn derive_passphrase_key(passphrase: &[u8], salt: &[u8; SALT_LEN]) -> Result<[u8; 32]> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
        .map_err(|e| StoreError::DerivationFailed(format!("Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; 32];
    argon2
        .hash_password_into(passphrase, salt, &mut output)
        .map_err(|e| StoreError::DerivationFailed(format!("Argon2 hash: {e}")))?;

    Ok(output)
}

/// Encrypt plaintext with ChaCha20-Poly1305. Returns `(nonce, ciphertext)`.
fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<([u8; NONCE_LEN], Vec<u8>)> {
    let nonce_bytes = random_nonce_12();
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| StoreError::EncryptionFailed(format!("cipher init: {e}")))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| StoreError::EncryptionFailed(format!("encrypt: {e}")))?;
    Ok((nonce_bytes, ciphertext))
}

fn open(key: &[u8; 32], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| StoreError::EncryptionFailed(format!("cipher init: {e}")))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| StoreError::DecryptionFailed("wrong key or corrupted data".into()))
}

/// Encrypt `data` under `passphrase`, returning the hex transport form.
pub fn encrypt_text(data: &str, passphrase: &str) -> Result<String> {
    let salt = random_salt_16();
    let mut key = derive_passphrase_key(passphrase.as_bytes(), &salt)?;
    let sealed = seal(&key, data.as_bytes());
    key.zeroize();
    let (nonce, ciphertext) = sealed?;

    let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(hex::encode(out))
}

/// Decrypt the hex transport form produced by [`encrypt_text`].
pub fn decrypt_text(encrypted: &str, passphrase: &str) -> Result<String> {
    let raw = hex::decode(encrypted.trim())
        .map_err(|e| StoreError::DecryptionFailed(format!("not hex: {e}")))?;
    if raw.len() <= SALT_LEN + NONCE_LEN {
        return Err(StoreError::DecryptionFailed("input too short".into()));
    }

    let (salt, rest) = raw.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    let mut salt_arr = [0u8; SALT_LEN];
    salt_arr.copy_from_slice(salt);

    let mut key = derive_passphrase_key(passphrase.as_bytes(), &salt_arr)?;
    let opened = open(&key, nonce, ciphertext);
    key.zeroize();

    String::from_utf8(opened?)
        .map_err(|_| StoreError::DecryptionFailed("plaintext is not UTF-8".into()))
}
