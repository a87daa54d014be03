//! Per-module API objects
//!
//! Thin CRUD wrappers that build logical module paths and hand them to the
//! pipeline. They carry no tenant logic of their own.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::client::ApiClient;
use crate::domain::ApiRequest;
use crate::error::Result;

/// Functional ERP areas exposed under `/tenants/{id}/erp/{module}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErpModule {
    Inventory,
    Purchases,
    Accounting,
    Crm,
    Hr,
    Manufacturing,
    Projects,
    Sales,
    Support,
    Assets,
    Quality,
    Pos,
}

impl ErpModule {
    pub const ALL: [ErpModule; 12] = [
        ErpModule::Inventory,
        ErpModule::Purchases,
        ErpModule::Accounting,
        ErpModule::Crm,
        ErpModule::Hr,
        ErpModule::Manufacturing,
        ErpModule::Projects,
        ErpModule::Sales,
        ErpModule::Support,
        ErpModule::Assets,
        ErpModule::Quality,
        ErpModule::Pos,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            ErpModule::Inventory => "/inventory",
            ErpModule::Purchases => "/purchases",
            ErpModule::Accounting => "/accounting",
            ErpModule::Crm => "/crm",
            ErpModule::Hr => "/hr",
            ErpModule::Manufacturing => "/manufacturing",
            ErpModule::Projects => "/projects",
            ErpModule::Sales => "/sales",
            ErpModule::Support => "/support",
            ErpModule::Assets => "/assets",
            ErpModule::Quality => "/quality",
            ErpModule::Pos => "/pos",
        }
    }
}

impl std::fmt::Display for ErpModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix().trim_start_matches('/'))
    }
}

impl std::str::FromStr for ErpModule {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('/').to_lowercase();
        ErpModule::ALL
            .iter()
            .copied()
            .find(|m| m.to_string() == wanted)
            .ok_or_else(|| format!("Unknown ERP module: {}", s))
    }
}

/// CRUD helper bound to one ERP module
pub struct ModuleApi<'a> {
    client: &'a ApiClient,
    module: ErpModule,
}

impl<'a> ModuleApi<'a> {
    pub(crate) fn new(client: &'a ApiClient, module: ErpModule) -> Self {
        Self { client, module }
    }

    pub fn module(&self) -> ErpModule {
        self.module
    }

    /// Logical path for a resource, optionally addressing one record
    pub fn path(&self, resource: &str, id: Option<&str>) -> String {
        let resource = resource.trim_matches('/');
        let mut path = format!("{}/{}", self.module.prefix(), resource);
        if let Some(id) = id {
            path.push('/');
            path.push_str(id);
        }
        path
    }

    pub async fn list(&self, resource: &str, query: &[(&str, &str)]) -> Result<Value> {
        let mut path = self.path(resource, None);
        if !query.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query)
                .finish();
            path.push('?');
            path.push_str(&encoded);
        }
        self.client.send(ApiRequest::get(path)).await
    }

    pub async fn get(&self, resource: &str, id: &str) -> Result<Value> {
        self.client
            .send(ApiRequest::get(self.path(resource, Some(id))))
            .await
    }

    pub async fn create<B: Serialize + ?Sized>(&self, resource: &str, body: &B) -> Result<Value> {
        let request = ApiRequest::new(Method::POST, self.path(resource, None)).with_json(body)?;
        self.client.send(request).await
    }

    pub async fn update<B: Serialize + ?Sized>(
        &self,
        resource: &str,
        id: &str,
        body: &B,
    ) -> Result<Value> {
        let request =
            ApiRequest::new(Method::PUT, self.path(resource, Some(id))).with_json(body)?;
        self.client.send(request).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        resource: &str,
        id: &str,
        body: &B,
    ) -> Result<Value> {
        let request =
            ApiRequest::new(Method::PATCH, self.path(resource, Some(id))).with_json(body)?;
        self.client.send(request).await
    }

    pub async fn delete(&self, resource: &str, id: &str) -> Result<Value> {
        self.client
            .send(ApiRequest::delete(self.path(resource, Some(id))))
            .await
    }
}
