//! Request context provider

use crate::domain::Tenant;

/// Read access to the in-memory session store and current page location.
///
/// Injected into the client at construction so that no caller has to thread
/// tenant or token through every request.
#[cfg_attr(test, mockall::automock)]
pub trait RequestContextProvider: Send + Sync {
    /// Current navigation path (e.g. `/w/acme/purchases/orders`)
    fn current_path(&self) -> Option<String>;

    /// Tenant currently selected in the session store
    fn selected_tenant(&self) -> Option<Tenant>;

    /// Locally cached tenant memberships of the signed-in user
    fn memberships(&self) -> Vec<Tenant>;

    /// Access token held by the session store
    fn session_token(&self) -> Option<String>;
}

/// Fixed context, for the CLI and tests
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    pub current_path: Option<String>,
    pub selected_tenant: Option<Tenant>,
    pub memberships: Vec<Tenant>,
    pub session_token: Option<String>,
}

impl StaticContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_current_path(mut self, path: impl Into<String>) -> Self {
        self.current_path = Some(path.into());
        self
    }

    pub fn with_selected_tenant(mut self, tenant: Tenant) -> Self {
        self.selected_tenant = Some(tenant);
        self
    }

    pub fn with_memberships(mut self, memberships: Vec<Tenant>) -> Self {
        self.memberships = memberships;
        self
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

impl RequestContextProvider for StaticContext {
    fn current_path(&self) -> Option<String> {
        self.current_path.clone()
    }

    fn selected_tenant(&self) -> Option<Tenant> {
        self.selected_tenant.clone()
    }

    fn memberships(&self) -> Vec<Tenant> {
        self.memberships.clone()
    }

    fn session_token(&self) -> Option<String> {
        self.session_token.clone()
    }
}
