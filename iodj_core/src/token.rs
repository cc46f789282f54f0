use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StorageError;

/// Key under which the session token is persisted.
pub const TOKEN_KEY: &str = "token";

/// Bearer credential for the vendor API.
#[repr(transparent)]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Flat persistent string storage (browser `localStorage`, a file, memory).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Holds the single session token. There is no expiry handling: an expired
/// token only shows up as rejected requests.
pub struct TokenStore<S> {
    storage: S,
}

impl<S: KeyValueStore> TokenStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Unreadable storage counts as logged out.
    pub fn get_token(&self) -> Option<SessionToken> {
        match self.storage.get(TOKEN_KEY) {
            Ok(Some(token)) if !token.is_empty() => Some(SessionToken(token)),
            Ok(_) => None,
            Err(err) => {
                warn!(error = %err, "failed to read session token");
                None
            }
        }
    }

    pub fn set_token(&mut self, token: &SessionToken) -> Result<(), StorageError> {
        debug!("persisting session token");
        self.storage.set(TOKEN_KEY, token.as_str())
    }

    pub fn clear_token(&mut self) -> Result<(), StorageError> {
        debug!("clearing session token");
        self.storage.remove(TOKEN_KEY)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
