//! Google Sheets Client Tests
//!
//! These tests run the Sheets client against a local mock server standing in
//! for both the OAuth token endpoint and the Sheets v4 values API.
//!
//! Run with: `cargo test --test sheets_client_tests`

use chrono::NaiveDate;
use expense_tracker::expense::{Category, ExpenseRow};
use expense_tracker::sheets::{ExpenseSheet, GoogleSheets, ServiceAccountKey};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_PRIVATE_KEY: &str = include_str!("fixtures/test_rsa_key.pem");

fn client_for(server: &MockServer) -> GoogleSheets {
    let key = ServiceAccountKey {
        client_email: "bot@test-project.iam.gserviceaccount.com".to_string(),
        private_key: TEST_PRIVATE_KEY.to_string(),
        token_uri: format!("{}/token", server.uri()),
    };

    GoogleSheets::new(key, "sheet-id".to_string(), "Sheet1".to_string())
        .with_base_url(format!("{}/v4/spreadsheets", server.uri()))
}

async fn mount_token(server: &MockServer, expires_in: i64, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in": expires_in,
            "token_type": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn lunch() -> ExpenseRow {
    ExpenseRow {
        date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        amount: 12.5,
        category: Category::Food,
        description: "lunch".to_string(),
    }
}

// ============================================================================
// Append
// ============================================================================

/// Test that an append posts one row to the A:D range with user-entered values
#[tokio::test]
async fn test_append_row_request_shape() {
    let server = MockServer::start().await;
    mount_token(&server, 3600, 1).await;

    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-id/values/Sheet1!A:D:append"))
        .and(query_param("valueInputOption", "USER_ENTERED"))
        .and(query_param("insertDataOption", "INSERT_ROWS"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "values": [["2026-10-16", 12.5, "food", "lunch"]]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "spreadsheetId": "sheet-id",
            "updates": { "updatedRows": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sheets = client_for(&server);
    sheets.append_row(&lunch()).await.unwrap();
}

/// Test that a rejected append reports the HTTP status and Google's error body
#[tokio::test]
async fn test_append_row_permission_denied() {
    let server = MockServer::start().await;
    mount_token(&server, 3600, 1).await;

    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-id/values/Sheet1!A:D:append"))
        .respond_with(ResponseTemplate::new(403).set_body_string(
            r#"{"error": {"code": 403, "status": "PERMISSION_DENIED", "message": "The caller does not have permission"}}"#,
        ))
        .mount(&server)
        .await;

    let sheets = client_for(&server);
    let err = sheets.append_row(&lunch()).await.unwrap_err().to_string();

    assert!(err.contains("403"), "missing status in: {}", err);
    assert!(err.contains("PERMISSION_DENIED"), "missing body in: {}", err);
}

// ============================================================================
// Read
// ============================================================================

/// Test that reads fetch the range below the header row
#[tokio::test]
async fn test_read_rows_from_data_range() {
    let server = MockServer::start().await;
    mount_token(&server, 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-id/values/Sheet1!A2:D"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Sheet1!A2:D3",
            "majorDimension": "ROWS",
            "values": [
                ["2026-10-16", "12.5", "food", "lunch"],
                ["2026-10-15", "$30.00", "transport"]
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sheets = client_for(&server);
    let rows = sheets.read_rows().await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].cells, vec!["2026-10-16", "12.5", "food", "lunch"]);
    assert_eq!(rows[1].amount(), Some(30.0));
    assert_eq!(rows[1].category(), "transport");
}

/// Test that a sheet with only a header row reads as empty
#[tokio::test]
async fn test_read_rows_without_values_field() {
    let server = MockServer::start().await;
    mount_token(&server, 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-id/values/Sheet1!A2:D"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Sheet1!A2:D1000",
            "majorDimension": "ROWS"
        })))
        .mount(&server)
        .await;

    let sheets = client_for(&server);
    assert!(sheets.read_rows().await.unwrap().is_empty());
}

/// Test that a read error keeps the status and body
#[tokio::test]
async fn test_read_rows_error_surfaces_status() {
    let server = MockServer::start().await;
    mount_token(&server, 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-id/values/Sheet1!A2:D"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Requested entity was not found."))
        .mount(&server)
        .await;

    let sheets = client_for(&server);
    let err = sheets.read_rows().await.unwrap_err().to_string();

    assert!(err.contains("404"));
    assert!(err.contains("Requested entity was not found."));
}

// ============================================================================
// Access Tokens
// ============================================================================

/// Test that one token serves several calls while it is still valid
#[tokio::test]
async fn test_access_token_is_reused() {
    let server = MockServer::start().await;
    mount_token(&server, 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-id/values/Sheet1!A2:D"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "values": [] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet-id/values/Sheet1!A:D:append"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let sheets = client_for(&server);
    sheets.read_rows().await.unwrap();
    sheets.append_row(&lunch()).await.unwrap();
}

/// Test that a token inside the refresh margin is exchanged again
#[tokio::test]
async fn test_access_token_near_expiry_is_refreshed() {
    let server = MockServer::start().await;
    mount_token(&server, 30, 2).await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/sheet-id/values/Sheet1!A2:D"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let sheets = client_for(&server);
    sheets.read_rows().await.unwrap();
    sheets.read_rows().await.unwrap();
}

/// Test that a failed token exchange stops the request
#[tokio::test]
async fn test_token_endpoint_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let sheets = client_for(&server);
    let err = sheets.read_rows().await.unwrap_err().to_string();

    assert!(err.contains("400"));
    assert!(err.contains("invalid_grant"));
}
