//! Request pipeline tests against a mock backend (using WireMock)
//! The mock server stands in for the local API proxy.

mod common;

use common::{acme_context, create_test_client, test_config, ACCESS_TOKEN, TENANT_CODE};
use erp_gateway_client::domain::{ApiRequest, FormPart};
use erp_gateway_client::session::{MemoryTokenStore, StaticContext, TokenStore};
use erp_gateway_client::{ApiClient, ApiError};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_module_path_rewritten_for_session_tenant() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/tenants/{}/erp/purchases/orders", TENANT_CODE)))
        .and(header("x-tenant-id", TENANT_CODE))
        .and(header("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "PO-0001", "supplier": "Nairobi Steel"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = create_test_client(&mock_server.uri(), acme_context());
    let orders = client.get("/purchases/orders").await.unwrap();

    assert_eq!(orders, json!([{"name": "PO-0001", "supplier": "Nairobi Steel"}]));
}

#[tokio::test]
async fn test_workspace_route_slug_resolves_tenant() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/tenants/{}/erp/sales/invoices", TENANT_CODE)))
        .and(query_param("status", "unpaid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let context = StaticContext::new()
        .with_current_path("/w/acme/sales")
        .with_memberships(vec![common::acme_tenant()]);
    let (client, _) = create_test_client(&mock_server.uri(), context);

    client.get("/sales/invoices?status=unpaid").await.unwrap();
}

#[tokio::test]
async fn test_tenant_level_prefix_has_no_erp_segment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/tenants/{}/reports/trial-balance", TENANT_CODE)))
        .and(header("x-tenant-id", TENANT_CODE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rows": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = create_test_client(&mock_server.uri(), acme_context());
    client.get("/reports/trial-balance").await.unwrap();
}

#[tokio::test]
async fn test_unscoped_path_sent_without_tenant_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": "buyer@example.com"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = create_test_client(&mock_server.uri(), acme_context());
    client.get("/auth/me").await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("x-tenant-id").is_none());
    assert!(requests[0].headers.get("authorization").is_some());
}

#[tokio::test]
async fn test_caller_tenant_header_replaced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/tenants/{}/erp/hr/employees", TENANT_CODE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let (client, _) = create_test_client(&mock_server.uri(), acme_context());
    let request = ApiRequest::get("/hr/employees")
        .with_header("X-Tenant-ID", "TEN-UG-25-ZZZZZ")
        .unwrap()
        .with_header("X-Request-Source", "cli")
        .unwrap();
    client.send(request).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let tenant_headers: Vec<_> = requests[0].headers.get_all("x-tenant-id").iter().collect();
    assert_eq!(tenant_headers.len(), 1);
    assert_eq!(tenant_headers[0], TENANT_CODE);
    assert_eq!(requests[0].headers.get("x-request-source").unwrap(), "cli");
}

#[tokio::test]
async fn test_json_body_sent_with_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/api/tenants/{}/erp/inventory/items", TENANT_CODE)))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"item_code": "STEEL-10MM", "uom": "kg"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "ITEM-1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = create_test_client(&mock_server.uri(), acme_context());
    let created = client
        .post("/inventory/items", &json!({"item_code": "STEEL-10MM", "uom": "kg"}))
        .await
        .unwrap();

    assert_eq!(created["id"], "ITEM-1");
}

#[tokio::test]
async fn test_unauthorized_clears_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/tenants/{}/erp/crm/leads", TENANT_CODE)))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, tokens) = create_test_client(&mock_server.uri(), acme_context());
    let err = client.get("/crm/leads").await.unwrap_err();

    assert!(matches!(err, ApiError::Authentication(_)));
    assert_eq!(err.status(), Some(401));
    assert!(tokens.load().is_none());
}

#[tokio::test]
async fn test_forbidden_keeps_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("/api/tenants/{}/erp/accounting/journals/JV-9", TENANT_CODE)))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Role lacks delete"})))
        .mount(&mock_server)
        .await;

    let (client, tokens) = create_test_client(&mock_server.uri(), acme_context());
    let err = client.delete("/accounting/journals/JV-9").await.unwrap_err();

    match &err {
        ApiError::Permission(message) => {
            assert_eq!(message, "You do not have permission to perform this action.")
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(tokens.load().as_deref(), Some(ACCESS_TOKEN));
}

#[tokio::test]
async fn test_validation_error_lists_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/api/tenants/{}/erp/inventory/stock-entries", TENANT_CODE)))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [
                {"loc": ["body", "qty"], "msg": "required", "type": "missing"},
                {"loc": ["body", "warehouse"], "msg": "unknown warehouse", "type": "value_error"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let (client, _) = create_test_client(&mock_server.uri(), acme_context());
    let err = client
        .post("/inventory/stock-entries", &json!({"item_code": "STEEL-10MM"}))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("qty: required"), "{}", message);
    assert!(message.contains("warehouse: unknown warehouse"), "{}", message);
    match err {
        ApiError::Validation { errors, .. } => assert_eq!(errors.len(), 2),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/tenants/{}/erp/pos/sessions", TENANT_CODE)))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = create_test_client(&mock_server.uri(), acme_context());
    let err = client.get("/pos/sessions").await.unwrap_err();

    match err {
        ApiError::Api {
            status,
            message,
            payload,
        } => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
            assert_eq!(payload, json!("upstream exploded"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_no_content_yields_empty_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("/api/tenants/{}/erp/projects/tasks/T-7", TENANT_CODE)))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let (client, _) = create_test_client(&mock_server.uri(), acme_context());
    assert_eq!(client.delete("/projects/tasks/T-7").await.unwrap(), json!({}));
}

#[tokio::test]
async fn test_multipart_upload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/api/tenants/{}/files", TENANT_CODE)))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"file_id": "F-1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (client, _) = create_test_client(&mock_server.uri(), acme_context());
    let uploaded = client
        .upload(
            "/files",
            vec![
                FormPart::text("folder", "invoices"),
                FormPart::file("file", "invoice-001.pdf", b"%PDF-1.7".to_vec()),
            ],
        )
        .await
        .unwrap();
    assert_eq!(uploaded["file_id"], "F-1");

    let requests = mock_server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("invoice-001.pdf"));
    assert!(body.contains("invoices"));
}

#[tokio::test]
async fn test_direct_mode_uses_backend_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/tenants/{}/erp/support/tickets", TENANT_CODE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = test_config("http://localhost:1");
    config.api.mode = erp_gateway_client::config::ClientMode::Direct;
    config.api.backend_url = mock_server.uri();

    let client = ApiClient::new(
        config,
        Arc::new(acme_context()),
        Arc::new(MemoryTokenStore::with_token(ACCESS_TOKEN)),
    )
    .unwrap();
    client.get("/support/tickets").await.unwrap();
}

#[tokio::test]
async fn test_connection_refused_retried_then_propagated() {
    // Reserve a port, then free it so nothing is listening
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let (client, tokens) = create_test_client(&format!("http://127.0.0.1:{}", port), acme_context());
    let err = client.get("/purchases/orders").await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)), "{:?}", err);
    assert_eq!(err.status(), None);
    assert_eq!(tokens.load().as_deref(), Some(ACCESS_TOKEN));
}
