#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{api_client, mount_b2c_login, mount_refresh};
use moultrie_api::{
    ApiClient, CaptureKind, DeviceId, Error, SettingsGroup, TokenManager, TokenPair,
    TransportConfig,
};

fn device_json(id: i64) -> serde_json::Value {
    json!({
        "DeviceId": id,
        "DeviceName": format!("Camera {id}"),
        "MEID": format!("MEID{id}"),
        "ModemId": id + 1000
    })
}

async fn mount_devices(server: &MockServer, token: &str, status: u16, expected: u64) {
    let template = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!({ "Devices": [device_json(12345)] }))
    } else {
        ResponseTemplate::new(status)
    };
    Mock::given(method("GET"))
        .and(path("/api/v1/Device/Devices"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(template)
        .expect(expected)
        .mount(server)
        .await;
}

// ── Request executor ────────────────────────────────────────────────

#[tokio::test]
async fn test_request_sends_bearer_and_json_content_type() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    Mock::given(method("GET"))
        .and(path("/api/v1/Device/Devices"))
        .and(header("authorization", "Bearer old-access"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Devices": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let devices = client.get_devices().await.unwrap();
    assert!(devices.is_empty());
}

#[tokio::test]
async fn test_401_refreshes_and_retries_once() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    mount_devices(&server, "old-access", 401, 1).await;
    mount_devices(&server, "new-access", 200, 1).await;
    mount_refresh(&server, 200, "new-access", "new-refresh").await;

    let devices = client.get_devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].device_id, DeviceId(12345));
    assert_eq!(
        client.tokens().current(),
        TokenPair::new("new-access", "new-refresh")
    );
}

#[tokio::test]
async fn test_second_401_is_auth_error() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    mount_devices(&server, "old-access", 401, 1).await;
    mount_devices(&server, "new-access", 401, 1).await;
    mount_refresh(&server, 200, "new-access", "new-refresh").await;

    let result = client.get_devices().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert_eq!(
        client.tokens().current(),
        TokenPair::new("new-access", "new-refresh")
    );
}

#[tokio::test]
async fn test_rejected_refresh_falls_back_to_login() {
    let server = MockServer::start().await;
    let client = api_client(&server, true);

    mount_devices(&server, "old-access", 401, 1).await;
    mount_devices(&server, "login-access", 200, 1).await;
    mount_refresh(&server, 400, "", "").await;
    mount_b2c_login(&server, "login-access", "login-refresh").await;

    let devices = client.get_devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(
        client.tokens().current(),
        TokenPair::new("login-access", "login-refresh")
    );
}

#[tokio::test]
async fn test_rejected_refresh_without_credentials() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    mount_devices(&server, "old-access", 401, 1).await;
    mount_refresh(&server, 400, "", "").await;

    let result = client.get_devices().await;

    assert!(matches!(result, Err(Error::CredentialsRequired)));
    assert_eq!(
        client.tokens().current(),
        TokenPair::new("old-access", "old-refresh")
    );
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    Mock::given(method("GET"))
        .and(path("/api/v1/Device/Devices"))
        .and(header("authorization", "Bearer old-access"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Device/Devices"))
        .and(header("authorization", "Bearer new-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Devices": [] })))
        .mount(&server)
        .await;
    mount_refresh(&server, 200, "new-access", "new-refresh").await;

    let (a, b) = tokio::join!(client.get_devices(), client.get_devices());
    a.unwrap();
    b.unwrap();
}

#[tokio::test]
async fn test_non_401_failure_is_api_error() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    mount_devices(&server, "old-access", 503, 1).await;

    let result = client.get_devices().await;

    match result {
        Err(e @ Error::Api { status: 503, .. }) => assert!(e.is_transient()),
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_reports_configured_limit() {
    let server = MockServer::start().await;
    let tokens = TokenManager::new(
        common::login_flow(&server),
        TokenPair::new("old-access", "old-refresh"),
        None,
    );
    let client = ApiClient::new(
        common::endpoints(&server),
        TransportConfig::default().with_timeout(Duration::from_secs(1)),
        Arc::new(tokens),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/api/v1/Device/Devices"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "Devices": [] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    match client.get_devices().await {
        Err(e @ Error::Timeout { timeout_secs: 1 }) => {
            assert!(e.is_transient());
            assert_eq!(e.to_string(), "Request timed out after 1s");
        }
        other => panic!("expected Timeout error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_body_is_empty_object() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    Mock::given(method("POST"))
        .and(path("/api/v1/Device/OnDemand"))
        .and(body_json(json!({
            "Meid": "MEID12345",
            "DidConsent": true,
            "OnDemandEventType": "video"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let ack = client
        .request_on_demand("MEID12345", CaptureKind::Video)
        .await
        .unwrap();
    assert_eq!(ack, json!({}));
}

// ── Devices & settings ──────────────────────────────────────────────

#[tokio::test]
async fn test_get_device_settings_and_save() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    let groups = json!([{
        "GroupName": "Modem",
        "Settings": [{ "SettingShortText": "ODE", "Value": "T", "Options": [] }]
    }]);

    Mock::given(method("GET"))
        .and(path("/api/v1/Device/GetGroupedSettings"))
        .and(query_param("id", "12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "GroupedSettings": groups })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/Device/SaveDeviceSettings"))
        .and(body_json(json!({
            "CameraId": 12345,
            "ModemId": 67890,
            "Settings": groups
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "SettingsSaved": true })))
        .expect(1)
        .mount(&server)
        .await;

    let fetched: Vec<SettingsGroup> = client.get_device_settings(DeviceId(12345)).await.unwrap();
    assert_eq!(fetched[0].settings()[0].short_code(), Some("ODE"));

    let saved = client
        .save_device_settings(DeviceId(12345), Some(67890), &fetched)
        .await
        .unwrap();
    assert!(saved);
}

#[tokio::test]
async fn test_save_without_flag_reads_false() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    Mock::given(method("POST"))
        .and(path("/api/v1/Device/SaveDeviceSettings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Message": "queued" })))
        .mount(&server)
        .await;

    let saved = client
        .save_device_settings(DeviceId(1), None, &[])
        .await
        .unwrap();
    assert!(!saved);
}

#[tokio::test]
async fn test_get_single_device() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    Mock::given(method("GET"))
        .and(path("/api/v1/Device/GetSingleDevice"))
        .and(query_param("cameraId", "12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_json(12345)))
        .mount(&server)
        .await;

    let device = client.get_device(DeviceId(12345)).await.unwrap();
    assert_eq!(device.meid.as_deref(), Some("MEID12345"));
    assert_eq!(device.modem_id, Some(13345));
}

// ── Images ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_latest_image_first_result() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    Mock::given(method("POST"))
        .and(path("/api/v2/Image/ImageSearch"))
        .and(body_json(json!({ "PageSize": 1, "PageNumber": 1, "CameraId": 12345 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Results": { "Results": [{
                "imageUrl": "https://cdn.example.com/image1.jpg",
                "takenOn": "2024-01-15T08:00:00Z",
                "temperature": "45",
                "IsOnDemand": false
            }] }
        })))
        .mount(&server)
        .await;

    let image = client
        .get_latest_image(DeviceId(12345))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        image.image_url.as_deref(),
        Some("https://cdn.example.com/image1.jpg")
    );
    assert_eq!(image.is_on_demand, Some(false));
}

#[tokio::test]
async fn test_latest_image_empty_results_is_none() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    Mock::given(method("POST"))
        .and(path("/api/v2/Image/ImageSearch"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "Results": { "Results": [] } })),
        )
        .mount(&server)
        .await;

    assert!(client.get_latest_image(DeviceId(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_latest_image_missing_results_is_none() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    Mock::given(method("POST"))
        .and(path("/api/v2/Image/ImageSearch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    assert!(client.get_latest_image(DeviceId(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_image_bytes_and_errors() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    Mock::given(method("GET"))
        .and(path("/image1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let bytes = client
        .fetch_image(&format!("{}/image1.jpg", server.uri()))
        .await
        .unwrap();
    assert_eq!(bytes.as_ref(), &[0xFF, 0xD8, 0xFF]);

    let err = client
        .fetch_image(&format!("{}/missing.jpg", server.uri()))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

// ── Account ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unread_notifications() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    Mock::given(method("GET"))
        .and(path("/api/v1/NotificationCenter/HasUnreadNotification"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "HasUnreadNotification": true })),
        )
        .mount(&server)
        .await;

    assert!(client.has_unread_notifications().await);
}

#[tokio::test]
async fn test_unread_notifications_degrades_to_false() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    Mock::given(method("GET"))
        .and(path("/api/v1/NotificationCenter/HasUnreadNotification"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(!client.has_unread_notifications().await);
}

#[tokio::test]
async fn test_account_details_query() {
    let server = MockServer::start().await;
    let client = api_client(&server, false);

    Mock::given(method("GET"))
        .and(path("/api/v1/Account/AccountDetails"))
        .and(query_param("Update", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Email": "test@example.com" })))
        .mount(&server)
        .await;

    let account = client.get_account().await.unwrap();
    assert_eq!(account["Email"], "test@example.com");
    assert_eq!(
        client.tokens().current().access_token().expose_secret(),
        "old-access"
    );
}
