//! Module-prefix routing table
//!
//! Maps a logical endpoint path (e.g. `/purchases/orders`) onto its
//! tenant-scoped backend route. Entries are checked in order and the first
//! match wins; matching is segment-aware, so `/sales` never claims
//! `/salesforce`.

use serde::Deserialize;
use tracing::debug;

use crate::modules::ErpModule;

/// Tenant-level prefixes that are not ERP modules
pub const TENANT_LEVEL_PREFIXES: &[&str] = &["/reports", "/commissions", "/dashboard", "/files"];

/// Path segment marking an already tenant-scoped backend route
const TENANTS_SEGMENT: &str = "/tenants/";

/// How a matched prefix is rewritten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteScope {
    /// `/tenants/{tenant}/erp{path}`
    ErpModule,
    /// `/tenants/{tenant}{path}`
    Tenant,
}

impl RouteScope {
    fn rewrite(self, path: &str, tenant_id: &str) -> String {
        match self {
            RouteScope::ErpModule => format!("/tenants/{}/erp{}", tenant_id, path),
            RouteScope::Tenant => format!("/tenants/{}{}", tenant_id, path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteEntry {
    pub prefix: String,
    pub scope: RouteScope,
}

impl RouteEntry {
    pub fn new(prefix: impl Into<String>, scope: RouteScope) -> Self {
        Self {
            prefix: prefix.into(),
            scope,
        }
    }

    fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => {
                rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') || rest.starts_with('#')
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RouteTable {
    pub fn new(entries: Vec<RouteEntry>) -> Self {
        Self { entries }
    }

    /// The canonical table: every ERP module, then the tenant-level prefixes
    pub fn standard() -> Self {
        let erp = ErpModule::ALL
            .iter()
            .map(|module| RouteEntry::new(module.prefix(), RouteScope::ErpModule));
        let tenant_level = TENANT_LEVEL_PREFIXES
            .iter()
            .map(|prefix| RouteEntry::new(*prefix, RouteScope::Tenant));
        Self::new(erp.chain(tenant_level).collect())
    }

    /// Parse a JSON array of `{"prefix", "scope"}` entries
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let entries: Vec<RouteEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// First entry whose prefix owns `path`
    pub fn lookup(&self, path: &str) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.matches(path))
    }

    /// Rewrite a logical path into its tenant-scoped backend route.
    ///
    /// Paths already containing `/tenants/` and paths with no matching prefix
    /// are returned unchanged.
    pub fn rewrite_path(&self, path: &str, tenant_id: &str) -> String {
        if is_already_scoped(path) {
            return path.to_string();
        }
        match self.lookup(path) {
            Some(entry) => {
                let rewritten = entry.scope.rewrite(path, tenant_id);
                debug!(from = %path, to = %rewritten, "Rewrote tenant-scoped path");
                rewritten
            }
            None => path.to_string(),
        }
    }

    /// Whether requests to `path` belong to a tenant (and carry `X-Tenant-ID`)
    pub fn is_tenant_scoped(&self, path: &str) -> bool {
        is_already_scoped(path) || self.lookup(path).is_some()
    }
}

fn is_already_scoped(path: &str) -> bool {
    path.contains(TENANTS_SEGMENT)
}
