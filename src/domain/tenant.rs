//! Tenant domain model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant the current user can act in, as held by the session store.
///
/// The backend addresses a tenant either by its UUID or by a human-readable
/// code (e.g. `TEN-KE-26-ABCDE`); the code is preferred wherever an
/// identifier ends up in a URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Backend UUID
    pub id: String,
    /// Backend-issued human-readable code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Workspace slug used in `/w/{slug}/...` page routes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Tenant {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Identifier to put on the wire: the code when present, otherwise the UUID
    pub fn preferred_identifier(&self) -> Option<&str> {
        self.code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .or_else(|| Some(self.id.trim()).filter(|id| !id.is_empty()))
    }

    /// Whether `key` names this tenant by slug, code or UUID
    pub fn matches(&self, key: &str) -> bool {
        self.slug.as_deref() == Some(key) || self.code.as_deref() == Some(key) || self.id == key
    }
}

/// Whether a string parses as a UUID
pub fn looks_like_uuid(value: &str) -> bool {
    Uuid::parse_str(value).is_ok()
}
