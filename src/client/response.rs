//! Response classification

use serde_json::{Map, Value};

use super::transport::TransportResponse;
use crate::error::{join_field_errors, ApiError, FieldError, Result, PERMISSION_DENIED_MESSAGE};

const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

/// Turn a received response into a JSON value or a classified error.
///
/// Session side effects of a 401 are the caller's business; this only
/// classifies.
pub fn parse_response(response: TransportResponse) -> Result<Value> {
    match response.status {
        401 => Err(ApiError::Authentication(SESSION_EXPIRED_MESSAGE.to_string())),
        403 => Err(ApiError::Permission(PERMISSION_DENIED_MESSAGE.to_string())),
        204 => Ok(empty_object()),
        200..=299 => parse_success_body(&response.body),
        _ => Err(classify_error(response)),
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn parse_success_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(empty_object());
    }
    serde_json::from_str(body)
        .map_err(|e| ApiError::Decode(format!("Response body is not valid JSON: {}", e)))
}

fn classify_error(response: TransportResponse) -> ApiError {
    let payload = error_payload(&response.body);

    if response.status == 422 {
        if let Some(errors) = field_errors(&payload) {
            return ApiError::Validation {
                message: join_field_errors(&errors),
                errors,
                payload,
            };
        }
    }

    let message = best_effort_message(&payload).unwrap_or_else(|| response.status_text());
    ApiError::Api {
        status: response.status,
        message,
        payload,
    }
}

/// Error bodies are JSON when possible, raw text otherwise
fn error_payload(body: &str) -> Value {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

fn field_errors(payload: &Value) -> Option<Vec<FieldError>> {
    let detail = payload.get("detail")?.as_array()?;
    let errors: Vec<FieldError> = detail
        .iter()
        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
        .collect();
    (!errors.is_empty()).then_some(errors)
}

fn best_effort_message(payload: &Value) -> Option<String> {
    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    match payload {
        Value::String(text) if !text.trim().is_empty() && text.len() <= 500 => {
            Some(text.trim().to_string())
        }
        Value::Object(_) => non_empty(payload.get("detail"))
            .or_else(|| non_empty(payload.get("message")))
            .or_else(|| non_empty(payload.get("error")))
            .or_else(|| non_empty(payload.get("error").and_then(|e| e.get("message")))),
        _ => None,
    }
}
