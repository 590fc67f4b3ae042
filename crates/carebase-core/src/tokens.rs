//! Opaque bearer tokens.
//!
//! Tokens are 32 random bytes, URL-safe base64. The registry only keeps the
//! SHA-256 of each token, so a dump of it cannot be replayed.

use std::{collections::HashMap, sync::Mutex};

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

use carebase_contracts::{
    auth::{TokenKind, TokenPair},
    error::{CarebaseError, CarebaseResult},
};

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a bearer token string using SHA-256.
pub fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

#[derive(Debug, Clone)]
struct TokenEntry {
    user_id: String,
    kind: TokenKind,
    expires_at: DateTime<Utc>,
}

/// Issued tokens keyed by hash.
pub struct TokenRegistry {
    access_ttl: Duration,
    refresh_ttl: Duration,
    entries: Mutex<HashMap<[u8; 32], TokenEntry>>,
}

impl TokenRegistry {
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            access_ttl,
            refresh_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue a fresh access/refresh pair for `user_id`.
    pub fn issue_pair(&self, user_id: &str) -> CarebaseResult<TokenPair> {
        let now = Utc::now();
        let access_expires = expiry(now, self.access_ttl)?;
        let refresh_expires = expiry(now, self.refresh_ttl)?;
        let access = generate_token();
        let refresh = generate_token();

        let mut entries = self.lock()?;
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(
            hash_token(&access),
            TokenEntry {
                user_id: user_id.to_string(),
                kind: TokenKind::Access,
                expires_at: access_expires,
            },
        );
        entries.insert(
            hash_token(&refresh),
            TokenEntry {
                user_id: user_id.to_string(),
                kind: TokenKind::Refresh,
                expires_at: refresh_expires,
            },
        );
        debug!(user_id = %user_id, live = entries.len(), "issued token pair");

        Ok(TokenPair::bearer(access, refresh))
    }

    /// Return the user id a live token of the given kind was issued to.
    ///
    /// # Errors
    ///
    /// `Authentication` for unknown, expired or wrong-kind tokens.
    pub fn resolve(&self, token: &str, kind: TokenKind) -> CarebaseResult<String> {
        let mut entries = self.lock()?;
        lookup(&mut entries, &hash_token(token), kind)
    }

    /// Exchange a refresh token for a new pair. The old refresh token stops
    /// working immediately.
    pub fn rotate(&self, refresh_token: &str) -> CarebaseResult<TokenPair> {
        let user_id = {
            let mut entries = self.lock()?;
            let key = hash_token(refresh_token);
            let user_id = lookup(&mut entries, &key, TokenKind::Refresh)?;
            entries.remove(&key);
            user_id
        };
        self.issue_pair(&user_id)
    }

    /// Forget a token. Returns true if it was known.
    pub fn revoke(&self, token: &str) -> CarebaseResult<bool> {
        Ok(self.lock()?.remove(&hash_token(token)).is_some())
    }

    fn lock(&self) -> CarebaseResult<std::sync::MutexGuard<'_, HashMap<[u8; 32], TokenEntry>>> {
        self.entries
            .lock()
            .map_err(|e| CarebaseError::store(format!("token registry lock poisoned: {e}")))
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> CarebaseResult<DateTime<Utc>> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| CarebaseError::store(format!("token lifetime {ttl} overflows the clock")))
}

fn lookup(
    entries: &mut HashMap<[u8; 32], TokenEntry>,
    key: &[u8; 32],
    kind: TokenKind,
) -> CarebaseResult<String> {
    let invalid = || CarebaseError::authentication("Could not validate credentials");

    let entry = entries.get(key).ok_or_else(invalid)?;
    if entry.expires_at <= Utc::now() {
        entries.remove(key);
        return Err(invalid());
    }
    if entry.kind != kind {
        return Err(invalid());
    }
    Ok(entry.user_id.clone())
}
