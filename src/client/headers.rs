//! Header augmentation

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::domain::RequestBody;
use crate::error::{ApiError, Result};

pub const TENANT_HEADER: &str = "x-tenant-id";

/// Add the pipeline-owned headers to a caller's header map.
///
/// - `Content-Type: application/json` unless the caller set one; opaque
///   bodies (binary, multipart) get none so the transport can choose.
/// - `Authorization: Bearer {token}` when a token is available.
/// - `X-Tenant-ID` only when `scoped_tenant` is given.
///
/// `Authorization` and `X-Tenant-ID` are always replaced, never appended,
/// so a request carries at most one of each.
pub fn attach_headers(
    headers: &mut HeaderMap,
    body: &RequestBody,
    token: Option<&str>,
    scoped_tenant: Option<&str>,
) -> Result<()> {
    if body.is_opaque() {
        headers.remove(CONTENT_TYPE);
    } else if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    headers.remove(AUTHORIZATION);
    if let Some(token) = token {
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidRequest("Access token is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, value);
    }

    let tenant_header = HeaderName::from_static(TENANT_HEADER);
    headers.remove(&tenant_header);
    if let Some(tenant) = scoped_tenant {
        let value = HeaderValue::from_str(tenant).map_err(|_| {
            ApiError::InvalidRequest(format!("Tenant identifier {:?} is not a valid header value", tenant))
        })?;
        headers.insert(tenant_header, value);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FormPart;
    use serde_json::json;

    #[test]
    fn test_json_request_headers() {
        let mut headers = HeaderMap::new();
        attach_headers(
            &mut headers,
            &RequestBody::Json(json!({})),
            Some("tok"),
            Some("TEN-KE-26-ABCDE"),
        )
        .unwrap();

        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
        assert_eq!(headers[TENANT_HEADER], "TEN-KE-26-ABCDE");
    }

    #[test]
    fn test_unscoped_request_has_no_tenant_header() {
        let mut headers = HeaderMap::new();
        attach_headers(&mut headers, &RequestBody::Empty, None, None).unwrap();

        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert!(!headers.contains_key(AUTHORIZATION));
        assert!(!headers.contains_key(TENANT_HEADER));
    }

    #[test]
    fn test_multipart_leaves_content_type_to_transport() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        attach_headers(
            &mut headers,
            &RequestBody::Multipart(vec![FormPart::text("folder", "invoices")]),
            Some("tok"),
            None,
        )
        .unwrap();

        assert!(!headers.contains_key(CONTENT_TYPE));
        assert_eq!(headers[AUTHORIZATION], "Bearer tok");
    }

    #[test]
    fn test_caller_content_type_respected() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/merge-patch+json"));
        attach_headers(&mut headers, &RequestBody::Json(json!({})), None, None).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/merge-patch+json");
    }

    #[test]
    fn test_caller_tenant_header_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_HEADER, HeaderValue::from_static("spoofed"));
        headers.append(TENANT_HEADER, HeaderValue::from_static("another"));

        attach_headers(&mut headers, &RequestBody::Empty, None, Some("TEN-KE-26-ABCDE")).unwrap();
        let values: Vec<_> = headers.get_all(TENANT_HEADER).iter().collect();
        assert_eq!(values, vec!["TEN-KE-26-ABCDE"]);

        attach_headers(&mut headers, &RequestBody::Empty, None, None).unwrap();
        assert!(!headers.contains_key(TENANT_HEADER));
    }

    #[test]
    fn test_invalid_token_rejected() {
        let mut headers = HeaderMap::new();
        let result = attach_headers(&mut headers, &RequestBody::Empty, Some("bad\r\ntoken"), None);
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }
}
