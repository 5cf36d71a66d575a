//! Check-in token codec
//!
//! A token is `base64url(nonce || AES-256-GCM(email "|" event_id))`. The key is
//! the SHA-256 digest of the configured secret, so any secret length yields a
//! 256-bit key. The nonce is derived from the key and the payload, which makes
//! encoding deterministic: the same (email, event) pair always produces the
//! same token, and the token for a registration can be re-rendered at any time.
//!
//! The codec knows nothing about events or registrations.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};
use std::fmt;
use crate::utils::errors::{EventDeskError, Result};

const DELIMITER: char = '|';
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Clone)]
pub struct CheckinTokenCodec {
    cipher: Aes256Gcm,
    key: [u8; 32],
}

impl fmt::Debug for CheckinTokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckinTokenCodec").finish_non_exhaustive()
    }
}

impl CheckinTokenCodec {
    /// Build a codec keyed by the SHA-256 digest of `secret`
    pub fn new(secret: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(EventDeskError::Config("Check-in token secret is required".to_string()));
        }

        let key: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| EventDeskError::Processing(format!("Failed to initialize token cipher: {}", e)))?;

        Ok(Self { cipher, key })
    }

    fn nonce_for(&self, payload: &[u8]) -> [u8; NONCE_LEN] {
        let digest = Sha256::new()
            .chain_update(self.key)
            .chain_update(payload)
            .finalize();
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&digest[..NONCE_LEN]);
        nonce
    }

    /// Bind an email and an event id into an opaque token
    pub fn encode(&self, email: &str, event_id: i64) -> Result<String> {
        if email.is_empty() {
            return Err(EventDeskError::validation("Email is required for a check-in token"));
        }
        if email.contains(DELIMITER) {
            return Err(EventDeskError::validation(format!(
                "Email cannot contain '{}'",
                DELIMITER
            )));
        }

        let payload = format!("{}{}{}", email, DELIMITER, event_id);
        let nonce = self.nonce_for(payload.as_bytes());
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), payload.as_bytes())
            .map_err(|e| EventDeskError::Processing(format!("Token encryption failed: {}", e)))?;

        let mut bytes = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        bytes.extend_from_slice(&nonce);
        bytes.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Recover (email, event id) from a token
    pub fn decode(&self, token: &str) -> Result<(String, i64)> {
        let token = token.trim();
        if token.is_empty() {
            return Err(EventDeskError::decoding("token is empty"));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| EventDeskError::decoding("token is not valid base64url"))?;
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(EventDeskError::decoding("token is too short"));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| EventDeskError::decoding("token cannot be decrypted"))?;
        let payload = String::from_utf8(plaintext)
            .map_err(|_| EventDeskError::decoding("token payload is not UTF-8"))?;

        let parts: Vec<&str> = payload.split(DELIMITER).collect();
        let [email, event_id] = parts.as_slice() else {
            return Err(EventDeskError::decoding("token payload must have exactly two parts"));
        };
        if email.is_empty() {
            return Err(EventDeskError::decoding("token payload has an empty email"));
        }
        let event_id = event_id
            .parse::<i64>()
            .map_err(|_| EventDeskError::decoding("token payload has an invalid event id"))?;

        Ok((email.to_string(), event_id))
    }
}
