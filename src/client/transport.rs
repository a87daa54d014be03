//! HTTP transport seam
//!
//! The pipeline talks to the network only through [`HttpTransport`], which
//! keeps its unit tests hermetic (no TCP listeners required).

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Client, Method};
use std::time::Duration;
use tracing::warn;

use crate::config::ApiConfig;
use crate::domain::{FormPart, FormValue, RequestBody};
use crate::error::{ApiError, Result, TransportError, TransportErrorKind};

/// Fully prepared request handed to the transport
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

/// Response as received, body not yet interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Canonical reason phrase, e.g. "Not Found"
    pub reason: Option<String>,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            reason: reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string),
            body: body.into(),
        }
    }

    /// Status text used when the body carries no usable message
    pub fn status_text(&self) -> String {
        match &self.reason {
            Some(reason) => reason.clone(),
            None => format!("HTTP {}", self.status),
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(
        &self,
        request: OutgoingRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        request: OutgoingRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let OutgoingRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, &url).headers(headers);
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Binary { data, content_type } => {
                let builder = builder.body(data);
                match content_type {
                    Some(content_type) => builder.header(CONTENT_TYPE, content_type),
                    None => builder,
                }
            }
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)),
        };

        let response = builder.send().await.map_err(classify_send_error)?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(TransportErrorKind::Body, e.to_string()))?;

        Ok(TransportResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            body,
        })
    }
}

fn classify_send_error(err: reqwest::Error) -> TransportError {
    let kind = if err.is_builder() {
        TransportErrorKind::Build
    } else if err.is_redirect() {
        TransportErrorKind::Redirect
    } else if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Request
    };
    TransportError::new(kind, err.to_string())
}

fn build_form(parts: Vec<FormPart>) -> reqwest::multipart::Form {
    parts
        .into_iter()
        .fold(reqwest::multipart::Form::new(), |form, part| match part.value {
            FormValue::Text(text) => form.text(part.name, text),
            FormValue::File {
                file_name,
                data,
                mime,
            } => {
                let file = match mime {
                    Some(mime) => reqwest::multipart::Part::bytes(data.clone())
                        .file_name(file_name.clone())
                        .mime_str(&mime)
                        .unwrap_or_else(|e| {
                            warn!(mime = %mime, "Ignoring invalid multipart mime type: {}", e);
                            reqwest::multipart::Part::bytes(data).file_name(file_name)
                        }),
                    None => reqwest::multipart::Part::bytes(data).file_name(file_name),
                };
                form.part(part.name, file)
            }
        })
}
