//! Envelope encryption for device credentials at rest (§4.7).
//!
//! The original service derived a Fernet key from its app secret via
//! SHA-256 and stored base64 ciphertext, decrypting leniently so rows
//! written before encryption was enabled keep working. This keeps that
//! contract but swaps Fernet (AES-128-CBC+HMAC) for AES-256-GCM, the
//! authenticated-encryption primitive `ferrex-core`'s crypto stack already
//! depends on.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{rngs::OsRng, TryRngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

const NONCE_LEN: usize = 12;

#[derive(Clone)]
pub struct SecretBox {
    key: Zeroizing<[u8; 32]>,
}

impl SecretBox {
    /// Derives a stable 32-byte key from the application secret the same
    /// way the original derived its Fernet key: a single SHA-256 pass.
    pub fn from_application_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key: Zeroizing::new(key) }
    }

    /// Encrypts `plaintext`, returning a base64 blob of `nonce || ciphertext`.
    /// An empty string is returned unchanged (nothing to protect).
    pub fn encrypt(&self, plaintext: &str) -> String {
        if plaintext.is_empty() {
            return plaintext.to_string();
        }

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.key.as_ref()));
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .expect("OS RNG must be available to encrypt a secret");
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .expect("AES-GCM encryption with a 96-bit nonce never fails");

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        STANDARD.encode(blob)
    }

    /// Decrypts a value produced by [`Self::encrypt`]. Any input that isn't
    /// valid base64, too short to contain a nonce, or fails authentication
    /// is returned unchanged rather than propagated as an error — the same
    /// leniency the original gave legacy unencrypted rows.
    pub fn decrypt(&self, value: &str) -> String {
        if value.is_empty() {
            return value.to_string();
        }

        let Ok(blob) = STANDARD.decode(value) else {
            return value.to_string();
        };
        if blob.len() <= NONCE_LEN {
            return value.to_string();
        }

        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.key.as_ref()));
        match cipher.decrypt(Nonce::from_slice(nonce_bytes), ciphertext) {
            Ok(plaintext) => String::from_utf8(plaintext).unwrap_or_else(|_| value.to_string()),
            Err(_) => value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_recovers_plaintext() {
        let secrets = SecretBox::from_application_secret("test-secret");
        let ciphertext = secrets.encrypt("hunter2");
        assert_ne!(ciphertext, "hunter2");
        assert_eq!(secrets.decrypt(&ciphertext), "hunter2");
    }

    #[test]
    fn decrypting_a_legacy_plaintext_value_returns_it_unchanged() {
        let secrets = SecretBox::from_application_secret("test-secret");
        assert_eq!(secrets.decrypt("not-encrypted-at-all"), "not-encrypted-at-all");
    }

    #[test]
    fn empty_values_pass_through_both_directions() {
        let secrets = SecretBox::from_application_secret("test-secret");
        assert_eq!(secrets.encrypt(""), "");
        assert_eq!(secrets.decrypt(""), "");
    }

    #[test]
    fn different_secrets_cannot_decrypt_each_others_ciphertext() {
        let a = SecretBox::from_application_secret("secret-a");
        let b = SecretBox::from_application_secret("secret-b");
        let ciphertext = a.encrypt("hunter2");
        assert_eq!(b.decrypt(&ciphertext), ciphertext);
    }
}
