//! Access token storage

use anyhow::Context;
use chrono::Utc;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::jwt::decode_claims;

/// Storage key holding the bearer token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Persistent home of the bearer token (the browser's local storage, in effect).
///
/// Read on every request and cleared when the backend answers 401.
#[cfg_attr(test, mockall::automock)]
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// In-process token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token
            .read()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("Token store lock poisoned")))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .token
            .write()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("Token store lock poisoned")))?;
        *guard = None;
        Ok(())
    }
}

/// Token store backed by a small JSON object file.
///
/// Other keys in the file are preserved; only `access_token` is touched.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to read {}", self.path.display()))
                    .into())
            }
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(entries) => Ok(entries),
            _ => Err(ApiError::Decode(format!(
                "{} does not hold a JSON object",
                self.path.display()
            ))),
        }
    }

    fn write_entries(&self, entries: Map<String, Value>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&Value::Object(entries))?;
        std::fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        match self.read_entries() {
            Ok(entries) => entries
                .get(ACCESS_TOKEN_KEY)
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            Err(e) => {
                warn!(path = %self.path.display(), "Unreadable token file: {}", e);
                None
            }
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(ACCESS_TOKEN_KEY.to_string(), Value::String(token.to_string()));
        self.write_entries(entries)
    }

    fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut entries = self.read_entries()?;
        if entries.remove(ACCESS_TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.write_entries(entries)
    }
}

/// Whether the stored token is present and unexpired.
///
/// An expired or undecodable token is cleared from the store.
pub fn is_token_valid(store: &dyn TokenStore) -> bool {
    is_token_valid_at(store, Utc::now().timestamp())
}

pub fn is_token_valid_at(store: &dyn TokenStore, now: i64) -> bool {
    let Some(token) = store.load() else {
        return false;
    };

    let expired = match decode_claims(&token) {
        Ok(claims) => claims.is_expired_at(now),
        Err(e) => {
            debug!("Stored token is not a readable JWT: {}", e);
            true
        }
    };

    if expired {
        if let Err(e) = store.clear() {
            warn!("Failed to clear expired token: {}", e);
        }
        return false;
    }
    true
}
