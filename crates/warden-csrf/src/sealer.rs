//! Token sealing.
//!
//! Claims are sealed with ChaCha20-Poly1305 so the client can neither
//! read nor forge the embedded binding: the AEAD tag authenticates the
//! claims and the ciphertext hides them. Wire form is
//! `base64url(nonce || ciphertext)`, no padding.
//!
//! Any failure to open a token collapses into one opaque outcome; the
//! guard never learns (or leaks) whether the input was malformed,
//! tampered with, or sealed under another key.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use warden_core::{WardenError, WardenResult};

/// AEAD nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Upper bound on an encoded token accepted for opening.
const MAX_TOKEN_LEN: usize = 1024;

/// Fields sealed into an anti-forgery token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Identity the token is bound to: the caller's user id
    /// (authenticated issue) or the derived session identifier
    /// (pre-auth issue).
    pub binding: String,
    /// Session the token was issued for.
    pub session_id: String,
    /// Unix seconds at issue time.
    pub issued_at: u64,
    /// Unix seconds after which the token is dead.
    pub expires_at: u64,
}

impl TokenClaims {
    /// Whether the token is past its expiry at `now`.
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// Seals and opens anti-forgery tokens under one symmetric key.
pub struct TokenSealer {
    cipher: ChaCha20Poly1305,
}

impl TokenSealer {
    /// Create a sealer from a 32-byte key.
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key)),
        }
    }

    /// Create a sealer with a freshly generated random key.
    ///
    /// Tokens sealed by it do not survive a process restart; production
    /// deployments pass a configured key to [`TokenSealer::new`].
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self::new(key)
    }

    /// Seal claims into an opaque wire token.
    pub fn seal(&self, claims: &TokenClaims) -> WardenResult<String> {
        let plaintext = bincode::serialize(claims)
            .map_err(|e| WardenError::internal(format!("token encoding failed: {e}")))?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_ref())
            .map_err(|_| WardenError::internal("token sealing failed"))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);

        use base64::Engine;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Open a wire token. `None` for anything that does not decrypt to
    /// claims sealed under this key.
    pub fn open(&self, token: &str) -> Option<TokenClaims> {
        if token.is_empty() || token.len() > MAX_TOKEN_LEN {
            return None;
        }

        use base64::Engine;
        let sealed = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(token)
            .ok()?;
        if sealed.len() <= NONCE_LEN {
            return None;
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .ok()?;
        bincode::deserialize(&plaintext).ok()
    }
}
