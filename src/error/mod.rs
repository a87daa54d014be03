//! Error taxonomy surfaced by the request pipeline

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Pipeline-wide result type
pub type Result<T> = std::result::Result<T, ApiError>;

/// Fixed message raised for HTTP 403 responses
pub const PERMISSION_DENIED_MESSAGE: &str = "You do not have permission to perform this action.";

/// Classified errors returned to callers of the pipeline
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
        payload: Value,
    },

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        payload: Value,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// HTTP status associated with this error, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Authentication(_) => Some(401),
            ApiError::Permission(_) => Some(403),
            ApiError::Validation { .. } => Some(422),
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw error payload returned by the backend, when there was one
    pub fn payload(&self) -> Option<&Value> {
        match self {
            ApiError::Validation { payload, .. } | ApiError::Api { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Failure raised by the transport before (or while) a response was received
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection could not be established (refused, DNS, TLS)
    Connect,
    /// Transport-level timeout
    Timeout,
    /// Request failed before any response was received
    Request,
    /// A response arrived but its body could not be read
    Body,
    /// The request could not be built (e.g. malformed URL)
    Build,
    /// Redirect policy rejected the response
    Redirect,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Request => "request",
            TransportErrorKind::Body => "body",
            TransportErrorKind::Build => "build",
            TransportErrorKind::Redirect => "redirect",
        }
    }
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    /// Only failed connection attempts are worth another try.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Connect | TransportErrorKind::Timeout | TransportErrorKind::Request
        )
    }
}

/// One entry of a structured 422 `detail` array
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub loc: Vec<Value>,
    pub msg: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Leading `loc` segments naming where the field lives rather than which field it is
const LOCATION_MARKERS: &[&str] = &["body", "query", "path", "header"];

impl FieldError {
    /// Dotted field path with the request-location marker removed
    pub fn field_path(&self) -> String {
        let mut segments: Vec<String> = self
            .loc
            .iter()
            .map(|segment| match segment {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();

        if segments.len() > 1 && LOCATION_MARKERS.contains(&segments[0].as_str()) {
            segments.remove(0);
        }
        segments.join(".")
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = self.field_path();
        if path.is_empty() {
            write!(f, "{}", self.msg)
        } else {
            write!(f, "{}: {}", path, self.msg)
        }
    }
}

/// Join field errors into a single human readable message
pub fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
