//! Configuration management for the ERP gateway client

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::routing::RouteTable;

/// Default pattern for backend-issued tenant codes, e.g. `TEN-KE-26-ABCDE`
pub const DEFAULT_TENANT_CODE_PATTERN: &str = "^TEN-[A-Z]{2}-[0-9]{2}-[A-Z0-9]{5}$";

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Where requests are sent
    pub api: ApiConfig,
    /// Transport failure retry policy
    pub retry: RetryConfig,
    /// Token storage and login redirect
    pub session: SessionConfig,
    /// Tenant resolution and path routing
    pub tenancy: TenancyConfig,
    /// Logging configuration
    pub telemetry: TelemetryConfig,
}

/// How the final request URL is formed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMode {
    /// Browser-like: requests go through the local API proxy path
    Proxy,
    /// Requests go straight to the backend base URL
    Direct,
}

impl std::str::FromStr for ClientMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "proxy" => Ok(ClientMode::Proxy),
            "direct" => Ok(ClientMode::Direct),
            _ => Err(format!("Unknown client mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub mode: ClientMode,
    /// Origin serving the local API proxy (e.g. http://localhost:3000)
    pub app_origin: String,
    /// Proxy path prefix (e.g. /api)
    pub proxy_prefix: String,
    /// Absolute backend base URL used in direct mode
    pub backend_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl ApiConfig {
    /// Fully qualified URL for an already rewritten path
    pub fn url_for(&self, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        match self.mode {
            ClientMode::Proxy => format!(
                "{}{}{}",
                self.app_origin.trim_end_matches('/'),
                normalize_prefix(&self.proxy_prefix),
                path
            ),
            ClientMode::Direct => format!("{}{}", self.backend_url.trim_end_matches('/'), path),
        }
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            mode: ClientMode::Proxy,
            app_origin: "http://localhost:3000".to_string(),
            proxy_prefix: "/api".to_string(),
            backend_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Retry policy for transport failures (never for HTTP error statuses)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Linear backoff unit: retry `n` waits `n * base_delay_ms`
    pub base_delay_ms: u64,
}

impl RetryConfig {
    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(u64::from(retry)))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// File backing the persisted access token
    pub token_file: PathBuf,
    /// Login route used for the session-expired redirect
    pub login_path: String,
}

impl SessionConfig {
    /// Redirect target after a 401
    pub fn expired_login_location(&self) -> String {
        let separator = if self.login_path.contains('?') { '&' } else { '?' };
        format!("{}{}session_expired=true", self.login_path, separator)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_file: PathBuf::from(".erp-session.json"),
            login_path: "/login".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TenancyConfig {
    /// Page route prefix introducing a workspace slug (`/w/{slug}/...`)
    pub workspace_prefix: String,
    /// Regex recognising backend-issued tenant codes
    pub tenant_code_pattern: String,
    pub routes: RouteTable,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            workspace_prefix: "/w".to_string(),
            tenant_code_pattern: DEFAULT_TENANT_CODE_PATTERN.to_string(),
            routes: RouteTable::standard(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "json" or "pretty"
    pub log_format: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            retry: RetryConfig::default(),
            session: SessionConfig::default(),
            tenancy: TenancyConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mode: ClientMode = env::var("ERP_CLIENT_MODE")
            .unwrap_or_else(|_| "proxy".to_string())
            .parse()
            .map_err(anyhow::Error::msg)
            .context("Invalid ERP_CLIENT_MODE")?;

        let tenant_code_pattern = env::var("ERP_TENANT_CODE_PATTERN")
            .unwrap_or_else(|_| DEFAULT_TENANT_CODE_PATTERN.to_string());
        regex::Regex::new(&tenant_code_pattern).context("Invalid ERP_TENANT_CODE_PATTERN")?;

        let routes = match env::var("ERP_ROUTE_TABLE") {
            Ok(json) if !json.trim().is_empty() => {
                RouteTable::from_json(&json).context("Invalid ERP_ROUTE_TABLE")?
            }
            _ => RouteTable::standard(),
        };

        let workspace_prefix =
            env::var("ERP_WORKSPACE_PREFIX").unwrap_or_else(|_| "/w".to_string());
        if !workspace_prefix.starts_with('/') {
            bail!("ERP_WORKSPACE_PREFIX must start with '/'");
        }

        Ok(Self {
            api: ApiConfig {
                mode,
                app_origin: env::var("ERP_APP_ORIGIN")
                    .unwrap_or_else(|_| "http://localhost:3000".to_string()),
                proxy_prefix: env::var("ERP_PROXY_PREFIX").unwrap_or_else(|_| "/api".to_string()),
                backend_url: env::var("ERP_BACKEND_URL")
                    .unwrap_or_else(|_| "http://localhost:8000".to_string()),
                timeout_secs: env::var("ERP_HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .context("Invalid ERP_HTTP_TIMEOUT_SECS")?,
                connect_timeout_secs: env::var("ERP_HTTP_CONNECT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("Invalid ERP_HTTP_CONNECT_TIMEOUT_SECS")?,
            },
            retry: RetryConfig {
                max_retries: env::var("ERP_RETRY_MAX")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
                base_delay_ms: env::var("ERP_RETRY_BASE_DELAY_MS")
                    .unwrap_or_else(|_| "1000".to_string())
                    .parse()
                    .unwrap_or(1000),
            },
            session: SessionConfig {
                token_file: env::var("ERP_TOKEN_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(".erp-session.json")),
                login_path: env::var("ERP_LOGIN_PATH").unwrap_or_else(|_| "/login".to_string()),
            },
            tenancy: TenancyConfig {
                workspace_prefix,
                tenant_code_pattern,
                routes,
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            },
        })
    }
}
