//! Authenticated encryption of whole artifacts with a single pre-shared key.
//!
//! # Token format
//!
//! ```text
//! version (1 byte, 0x01) || nonce (12 bytes) || ciphertext || tag (16 bytes)
//! ```
//!
//! AES-256-GCM with a fresh random nonce per call. The version byte is bound
//! as associated data, so flipping any bit of the token fails decryption.

use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use thiserror::Error;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const TOKEN_VERSION: u8 = 0x01;
const HEADER_LEN: usize = 1 + NONCE_LEN;

#[derive(Debug, Error)]
#[error("encryption failed: plaintext too large for a single token")]
pub struct EncryptionError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecryptionError {
    #[error("token is {len} bytes, shorter than the minimum {min}")]
    Truncated { len: usize, min: usize },
    #[error("unsupported token version {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("authentication failed: wrong key or tampered token")]
    Authentication,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("symmetric key must be {expected} bytes, got {found}")]
pub struct InvalidKeyLength {
    pub expected: usize,
    pub found: usize,
}

#[derive(Clone)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(key.as_slice());
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, InvalidKeyLength> {
        let bytes: [u8; KEY_LEN] = bytes.try_into().map_err(|_| InvalidKeyLength {
            expected: KEY_LEN,
            found: bytes.len(),
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

pub fn generate_key() -> SymmetricKey {
    SymmetricKey::generate()
}

pub fn encrypt(plaintext: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, EncryptionError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = key
        .cipher()
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad: &[TOKEN_VERSION],
            },
        )
        .map_err(|_| EncryptionError)?;

    let mut token = Vec::with_capacity(HEADER_LEN + sealed.len());
    token.push(TOKEN_VERSION);
    token.extend_from_slice(nonce.as_slice());
    token.extend_from_slice(&sealed);
    Ok(token)
}

pub fn decrypt(token: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, DecryptionError> {
    let min = HEADER_LEN + TAG_LEN;
    if token.len() < min {
        return Err(DecryptionError::Truncated {
            len: token.len(),
            min,
        });
    }

    let (version, rest) = (token[0], &token[1..]);
    if version != TOKEN_VERSION {
        return Err(DecryptionError::UnsupportedVersion(version));
    }

    let (nonce, sealed) = rest.split_at(NONCE_LEN);
    key.cipher()
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: sealed,
                aad: &[TOKEN_VERSION],
            },
        )
        .map_err(|_| DecryptionError::Authentication)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_length_is_header_plus_plaintext_plus_tag() {
        let key = generate_key();
        let token = encrypt(b"hello", &key).unwrap();
        assert_eq!(token.len(), HEADER_LEN + 5 + TAG_LEN);
        assert_eq!(token[0], TOKEN_VERSION);
    }

    #[test]
    fn debug_does_not_print_key_material() {
        let key = SymmetricKey::from_bytes(&[7u8; KEY_LEN]).unwrap();
        assert_eq!(format!("{key:?}"), "SymmetricKey(<redacted>)");
    }

    #[test]
    fn rejects_short_keys() {
        let err = SymmetricKey::from_bytes(&[0u8; 16]).unwrap_err();
        assert_eq!(err, InvalidKeyLength { expected: 32, found: 16 });
    }
}
