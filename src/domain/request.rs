//! Outgoing request descriptor

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, Result};

/// A request as supplied by a caller: logical path, method, headers and body.
///
/// The pipeline rewrites `path` and augments `headers` before dispatch.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Add a caller header; fails on names or values that are not valid HTTP
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid header name {name}: {e}")))?;
        let value = reqwest::header::HeaderValue::from_str(value)
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    /// Raw bytes; the transport decides the content type unless one is given
    Binary {
        data: Vec<u8>,
        content_type: Option<String>,
    },
    Multipart(Vec<FormPart>),
}

impl RequestBody {
    /// Binary and multipart bodies let the transport set `Content-Type`
    pub fn is_opaque(&self) -> bool {
        matches!(self, RequestBody::Binary { .. } | RequestBody::Multipart(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        data: Vec<u8>,
        mime: Option<String>,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                file_name: file_name.into(),
                data,
                mime: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_json_serializes_body() {
        let req = ApiRequest::new(Method::POST, "/purchases/orders")
            .with_json(&json!({"supplier": "SUP-001"}))
            .unwrap();
        assert_eq!(req.body, RequestBody::Json(json!({"supplier": "SUP-001"})));
    }

    #[test]
    fn test_opaque_bodies() {
        assert!(!RequestBody::Empty.is_opaque());
        assert!(!RequestBody::Json(json!({})).is_opaque());
        assert!(RequestBody::Binary {
            data: vec![1, 2, 3],
            content_type: None
        }
        .is_opaque());
        assert!(RequestBody::Multipart(vec![FormPart::text("a", "b")]).is_opaque());
    }

    #[test]
    fn test_with_header_rejects_invalid_value() {
        let result = ApiRequest::get("/files").with_header("X-Trace", "bad\nvalue");
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}
