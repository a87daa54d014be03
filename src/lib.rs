//! ERP Gateway Client
//!
//! Tenant-scoped request pipeline for a multi-tenant ERP backend: resolves
//! the active tenant, rewrites module paths into tenant-scoped routes,
//! attaches auth and tenant headers, retries transport failures and
//! classifies backend errors.

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod modules;
pub mod routing;
pub mod session;
pub mod telemetry;
pub mod tenant;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::Config;
pub use error::{ApiError, Result};
pub use modules::{ErpModule, ModuleApi};
