//! Common test utilities

#![allow(dead_code)]

use erp_gateway_client::config::{ApiConfig, Config, RetryConfig};
use erp_gateway_client::domain::Tenant;
use erp_gateway_client::session::{MemoryTokenStore, StaticContext};
use erp_gateway_client::ApiClient;
use std::sync::Arc;

pub const TENANT_UUID: &str = "5f0c1e9a-6a3e-4f7e-9a55-0c4c1a0f1b2d";
pub const TENANT_CODE: &str = "TEN-KE-26-ABCDE";
pub const ACCESS_TOKEN: &str = "test-access-token";

/// Proxy-mode config pointing at `origin`, retrying without delay
pub fn test_config(origin: &str) -> Config {
    Config {
        api: ApiConfig {
            app_origin: origin.to_string(),
            timeout_secs: 5,
            connect_timeout_secs: 2,
            ..Default::default()
        },
        retry: RetryConfig {
            max_retries: 2,
            base_delay_ms: 0,
        },
        ..Default::default()
    }
}

pub fn acme_tenant() -> Tenant {
    Tenant::new(TENANT_UUID)
        .with_code(TENANT_CODE)
        .with_slug("acme")
}

/// Context with `acme` selected in the session store
pub fn acme_context() -> StaticContext {
    StaticContext::new()
        .with_selected_tenant(acme_tenant())
        .with_memberships(vec![acme_tenant()])
}

pub fn create_test_client(
    origin: &str,
    context: StaticContext,
) -> (ApiClient, Arc<MemoryTokenStore>) {
    let tokens = Arc::new(MemoryTokenStore::with_token(ACCESS_TOKEN));
    let client = ApiClient::new(test_config(origin), Arc::new(context), tokens.clone())
        .expect("client should build");
    (client, tokens)
}
