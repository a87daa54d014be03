//! Tenant-scoped request pipeline
//!
//! [`ApiClient`] takes a logical endpoint path, resolves the active tenant,
//! rewrites the path into its tenant-scoped backend route, attaches auth and
//! tenant headers, executes the call with bounded retry on transport
//! failures, and classifies the response.

pub mod headers;
pub mod response;
pub mod retry;
pub mod transport;

pub use headers::{attach_headers, TENANT_HEADER};
pub use response::parse_response;
pub use retry::{Sleeper, TokioSleeper};
pub use transport::{HttpTransport, OutgoingRequest, ReqwestTransport, TransportResponse};

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::config::{ApiConfig, Config, RetryConfig};
use crate::domain::{ApiRequest, FormPart, RequestBody};
use crate::error::{ApiError, Result};
use crate::modules::{ErpModule, ModuleApi};
use crate::routing::RouteTable;
use crate::session::{
    is_token_valid, LogNavigator, Navigator, RequestContextProvider, TokenStore,
};
use crate::telemetry::metrics as telemetry_metrics;
use crate::tenant::{tenant_segment, ResolvedTenant, TenantResolver};

/// A request after tenant resolution, rewriting and header augmentation
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub tenant: Option<ResolvedTenant>,
    /// Rewritten backend path (before the base URL is applied)
    pub path: String,
    pub request: OutgoingRequest,
}

/// Where a logical path would be sent, without sending it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePreview {
    pub tenant: Option<ResolvedTenant>,
    pub path: String,
    pub url: String,
    pub tenant_header: bool,
}

#[derive(Clone)]
pub struct ApiClient {
    api: ApiConfig,
    retry: RetryConfig,
    login_location: String,
    routes: RouteTable,
    resolver: TenantResolver,
    context: Arc<dyn RequestContextProvider>,
    tokens: Arc<dyn TokenStore>,
    transport: Arc<dyn HttpTransport>,
    sleeper: Arc<dyn Sleeper>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Create a client with the reqwest transport, real sleeping and a
    /// logging navigator
    pub fn new(
        config: Config,
        context: Arc<dyn RequestContextProvider>,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config.api)?);
        let resolver = TenantResolver::from_config(&config.tenancy)?;

        Ok(Self {
            login_location: config.session.expired_login_location(),
            api: config.api,
            retry: config.retry,
            routes: config.tenancy.routes,
            resolver,
            context,
            tokens,
            transport,
            sleeper: Arc::new(TokioSleeper),
            navigator: Arc::new(LogNavigator),
        })
    }

    pub fn with_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// CRUD helper for one ERP module
    pub fn module(&self, module: ErpModule) -> ModuleApi<'_> {
        ModuleApi::new(self, module)
    }

    /// Whether the stored token is present and unexpired (clears it if not)
    pub fn is_authenticated(&self) -> bool {
        is_token_valid(self.tokens.as_ref())
    }

    /// Resolve the tenant for a request to `endpoint`
    pub fn resolve_tenant(&self, endpoint: &str) -> Option<ResolvedTenant> {
        self.resolver.resolve(self.context.as_ref(), endpoint)
    }

    /// Bearer token: the token store first, then the session store
    pub fn access_token(&self) -> Option<String> {
        self.tokens
            .load()
            .or_else(|| self.context.session_token())
            .filter(|t| !t.is_empty())
    }

    /// Resolve, rewrite and attach headers
    pub fn prepare(&self, request: ApiRequest) -> Result<PreparedRequest> {
        let ApiRequest {
            method,
            path,
            mut headers,
            body,
        } = request;

        let tenant = self.resolve_tenant(&path);
        let path = match &tenant {
            Some(resolved) => self.routes.rewrite_path(&path, &resolved.id),
            None => path,
        };
        let scoped_tenant = self.header_tenant(&path, tenant.as_ref());

        let token = self.access_token();
        attach_headers(&mut headers, &body, token.as_deref(), scoped_tenant.as_deref())?;

        let url = self.api.url_for(&path);
        Ok(PreparedRequest {
            tenant,
            path,
            request: OutgoingRequest {
                method,
                url,
                headers,
                body,
            },
        })
    }

    /// Show where a GET to `path` would go
    pub fn preview(&self, path: &str) -> RoutePreview {
        let tenant = self.resolve_tenant(path);
        let rewritten = match &tenant {
            Some(resolved) => self.routes.rewrite_path(path, &resolved.id),
            None => path.to_string(),
        };
        let tenant_header = self.header_tenant(&rewritten, tenant.as_ref()).is_some();
        RoutePreview {
            url: self.api.url_for(&rewritten),
            tenant,
            path: rewritten,
            tenant_header,
        }
    }

    /// `X-Tenant-ID` value for a final backend path.
    ///
    /// A path that names its tenant (`/tenants/{id}/...`) is authoritative, so
    /// the header always agrees with the URL; an unrecognised segment gets no
    /// header at all.
    fn header_tenant(&self, path: &str, resolved: Option<&ResolvedTenant>) -> Option<String> {
        let resolved = resolved?;
        if !self.routes.is_tenant_scoped(path) {
            return None;
        }
        match tenant_segment(path) {
            None => Some(resolved.id.clone()),
            Some(segment) if segment == resolved.id => Some(resolved.id.clone()),
            Some(segment) => {
                let embedded = self.resolver.tenant_in_path(path);
                match &embedded {
                    Some(id) => debug!(
                        path = %path,
                        resolved = %resolved.id,
                        header = %id,
                        "Path names a different tenant; header follows the path"
                    ),
                    None => debug!(
                        path = %path,
                        segment = %segment,
                        "Unrecognised tenant segment; sending no tenant header"
                    ),
                }
                embedded
            }
        }
    }

    /// Send a prepared request, retrying transport failures with linear backoff.
    ///
    /// HTTP responses of any status are returned as-is and never retried.
    pub async fn execute(&self, request: &OutgoingRequest) -> Result<TransportResponse> {
        let mut retries = 0;
        loop {
            match self.transport.send(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    telemetry_metrics::record_transport_failure(err.kind.as_str());

                    if !err.is_retryable() || retries >= self.retry.max_retries {
                        if err.is_retryable() {
                            error!(
                                method = %request.method,
                                url = %request.url,
                                attempts = retries + 1,
                                "Request failed after retries: {}",
                                err
                            );
                        }
                        return Err(ApiError::Transport(err));
                    }

                    retries += 1;
                    let delay = self.retry.delay_for(retries);
                    warn!(
                        method = %request.method,
                        url = %request.url,
                        "Transport failure (retry {}/{} in {:?}): {}",
                        retries,
                        self.retry.max_retries,
                        delay,
                        err
                    );
                    telemetry_metrics::record_retry();
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }

    /// Classify a response; a 401 also ends the local session.
    pub fn handle_response(&self, response: TransportResponse) -> Result<Value> {
        if response.status == 401 {
            self.expire_session();
        }
        parse_response(response)
    }

    fn expire_session(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!("Failed to clear stored token: {}", e);
        }
        telemetry_metrics::record_session_expired();
        self.navigator.redirect(&self.login_location);
    }

    /// Run a request through the whole pipeline
    pub async fn send(&self, request: ApiRequest) -> Result<Value> {
        let started = Instant::now();
        let prepared = self.prepare(request)?;
        let method = prepared.request.method.clone();
        debug!(
            method = %method,
            url = %prepared.request.url,
            tenant = prepared.tenant.as_ref().map(|t| t.id.as_str()).unwrap_or("-"),
            "Sending request"
        );

        let result = match self.execute(&prepared.request).await {
            Ok(response) => self.handle_response(response),
            Err(err) => Err(err),
        };

        let outcome = match &result {
            Ok(_) => "ok".to_string(),
            Err(err) => match err.status() {
                Some(status) => status.to_string(),
                None => "transport_error".to_string(),
            },
        };
        telemetry_metrics::record_request(method.as_str(), outcome, started.elapsed());
        result
    }

    /// Run a request and deserialize the JSON result
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let value = self.send(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.send(ApiRequest::new(Method::POST, path).with_json(body)?)
            .await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.send(ApiRequest::new(Method::PUT, path).with_json(body)?)
            .await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.send(ApiRequest::new(Method::PATCH, path).with_json(body)?)
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Multipart upload; the transport sets the content type and boundary
    pub async fn upload(&self, path: &str, parts: Vec<FormPart>) -> Result<Value> {
        self.send(ApiRequest::new(Method::POST, path).with_body(RequestBody::Multipart(parts)))
            .await
    }
}
