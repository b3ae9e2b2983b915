//! Ephemeral credential store
//!
//! Maps issued bearer tokens to the username/password pair they stand
//! for. The mapping lives for the server process lifetime and is never
//! pruned; a restart invalidates every issued token and callers must
//! request a new one.

use std::collections::HashMap;

use parking_lot::Mutex;

/// A username/password pair held on behalf of an issued token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

/// Process-wide mapping from issued bearer token to credential.
///
/// A single mutex guards the map and is held only for the duration of the
/// map access, never across a backing-store round trip.
#[derive(Debug, Default)]
pub struct TokenStore {
    inner: Mutex<HashMap<String, Credential>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `token` as authenticating `credential`.
    pub fn issue(&self, token: impl Into<String>, credential: Credential) {
        self.inner.lock().insert(token.into(), credential);
    }

    /// Look up the credential a token stands for.
    pub fn lookup(&self, token: &str) -> Option<Credential> {
        self.inner.lock().get(token).cloned()
    }
}
