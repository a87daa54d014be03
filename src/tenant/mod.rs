//! Tenant resolution
//!
//! Works out which tenant an outgoing request belongs to. Resolution runs
//! fresh for every request, first match wins:
//!
//! 1. the workspace slug in the current page path (`/w/{slug}/...`),
//! 2. the tenant selected in the session store,
//! 3. a `/tenants/{id}/...` segment already present in the endpoint path.
//!
//! Human-readable tenant codes are preferred over UUIDs so that URLs stay
//! stable and readable.

use regex::Regex;
use tracing::debug;

use crate::config::TenancyConfig;
use crate::domain::{looks_like_uuid, Tenant};
use crate::error::{ApiError, Result};
use crate::session::RequestContextProvider;

lazy_static::lazy_static! {
    static ref TENANT_SEGMENT_REGEX: Regex = Regex::new(r"/tenants/([^/?#]+)").unwrap();
}

/// Where a resolved tenant came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantSource {
    WorkspaceRoute,
    Session,
    EndpointPath,
}

impl std::fmt::Display for TenantSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TenantSource::WorkspaceRoute => write!(f, "workspace_route"),
            TenantSource::Session => write!(f, "session"),
            TenantSource::EndpointPath => write!(f, "endpoint_path"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTenant {
    pub id: String,
    pub source: TenantSource,
}

#[derive(Debug, Clone)]
pub struct TenantResolver {
    workspace_prefix: String,
    code_pattern: Regex,
}

impl TenantResolver {
    pub fn new(workspace_prefix: impl Into<String>, code_pattern: &str) -> Result<Self> {
        let code_pattern = Regex::new(code_pattern).map_err(|e| {
            ApiError::Internal(anyhow::anyhow!("Invalid tenant code pattern: {}", e))
        })?;
        Ok(Self {
            workspace_prefix: workspace_prefix.into().trim_end_matches('/').to_string(),
            code_pattern,
        })
    }

    pub fn from_config(config: &TenancyConfig) -> Result<Self> {
        Self::new(config.workspace_prefix.clone(), &config.tenant_code_pattern)
    }

    /// Whether `value` has the shape of a backend-issued tenant code
    pub fn looks_like_code(&self, value: &str) -> bool {
        self.code_pattern.is_match(value)
    }

    /// UUID or tenant code
    pub fn is_tenant_identifier(&self, value: &str) -> bool {
        looks_like_uuid(value) || self.looks_like_code(value)
    }

    /// Resolve the tenant for a request to `endpoint`, if any
    pub fn resolve(
        &self,
        context: &dyn RequestContextProvider,
        endpoint: &str,
    ) -> Option<ResolvedTenant> {
        let resolved = self
            .from_workspace_route(context)
            .map(|id| (id, TenantSource::WorkspaceRoute))
            .or_else(|| from_session(context).map(|id| (id, TenantSource::Session)))
            .or_else(|| {
                self.tenant_in_path(endpoint)
                    .map(|id| (id, TenantSource::EndpointPath))
            })
            .map(|(id, source)| ResolvedTenant { id, source });

        match &resolved {
            Some(tenant) => {
                debug!(tenant = %tenant.id, source = %tenant.source, endpoint = %endpoint, "Resolved tenant")
            }
            None => debug!(endpoint = %endpoint, "No tenant resolved; request stays unscoped"),
        }
        resolved
    }

    fn from_workspace_route(&self, context: &dyn RequestContextProvider) -> Option<String> {
        let current = context.current_path()?;
        let slug = workspace_slug(&current, &self.workspace_prefix)?;

        if self.looks_like_code(slug) {
            return Some(slug.to_string());
        }

        let memberships = context.memberships();
        if let Some(id) = memberships
            .iter()
            .find(|tenant| tenant.matches(slug))
            .and_then(Tenant::preferred_identifier)
        {
            return Some(id.to_string());
        }

        if looks_like_uuid(slug) {
            return Some(slug.to_string());
        }

        debug!(slug = %slug, "Workspace slug matches no membership");
        None
    }

    /// Tenant named by a `/tenants/{id}` segment, if it is a UUID or tenant code
    pub fn tenant_in_path(&self, path: &str) -> Option<String> {
        let candidate = tenant_segment(path)?;
        self.is_tenant_identifier(candidate)
            .then(|| candidate.to_string())
    }
}

fn from_session(context: &dyn RequestContextProvider) -> Option<String> {
    context
        .selected_tenant()
        .and_then(|tenant| tenant.preferred_identifier().map(str::to_string))
}

/// Raw `{id}` of the first `/tenants/{id}` segment in a path
pub fn tenant_segment(path: &str) -> Option<&str> {
    TENANT_SEGMENT_REGEX
        .captures(path)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Slug segment following the workspace prefix in a page path
pub fn workspace_slug<'a>(path: &'a str, workspace_prefix: &str) -> Option<&'a str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let rest = path.strip_prefix(workspace_prefix)?.strip_prefix('/')?;
    let slug = rest.split('/').next().unwrap_or_default();
    (!slug.is_empty()).then_some(slug)
}
