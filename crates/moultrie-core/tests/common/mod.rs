// Wiremock fixtures for the consumer API and the B2C sign-in.
#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use moultrie_api::endpoints::TENANT_ID;
use moultrie_api::{ApiClient, Credentials, LoginFlow, TokenManager, TransportConfig};
use moultrie_core::{Coordinator, Endpoints, SessionConfig, TokenPair};

pub const POLICY_PATH: &str = "B2C_1A_signup_signin";

pub fn endpoints(server: &MockServer) -> Endpoints {
    Endpoints::with_base(Url::parse(&server.uri()).unwrap())
}

pub fn session_config(server: &MockServer) -> SessionConfig {
    SessionConfig {
        endpoints: endpoints(server),
        refresh_interval: Duration::ZERO,
        ..SessionConfig::default()
    }
}

/// Coordinator holding `access`/`refresh`, optionally with credentials.
pub fn coordinator(server: &MockServer, with_credentials: bool) -> Coordinator {
    let endpoints = endpoints(server);
    let login = LoginFlow::new(endpoints.clone(), TransportConfig::default());
    let credentials =
        with_credentials.then(|| Credentials::new("test@example.com", "hunter2".to_string().into()));
    let tokens = TokenManager::new(login, TokenPair::new("access", "refresh"), credentials);
    let client = ApiClient::with_client(reqwest::Client::new(), endpoints, Arc::new(tokens));
    Coordinator::new(client, session_config(server))
}

pub fn device_json(id: i64) -> Value {
    json!({
        "DeviceId": id,
        "DeviceName": format!("Camera {id}"),
        "DisplayName": "Moultrie Delta Cellular",
        "Model": "MCG-14072",
        "SerialNumber": format!("SN{id}"),
        "SoftwareVersion": "4.20",
        "DeviceBatteryLevel": 85,
        "SignalStrength": 70,
        "FreeStorageBytes": 5_368_709_120_u64,
        "TotalStorageBytes": 16_106_127_360_u64,
        "IsActive": true,
        "OnDemandSwitchSetting": true,
        "CanUploadVideo": false,
        "HasPendingSettingsUpdates": false,
        "LatestActivity": "2024-01-15T10:30:00Z",
        "MEID": format!("MEID{id}"),
        "ModemId": 67890,
        "Subscription": { "PlanName": "Elite", "TotalImagesUsed": 1500, "IsPendingCancellation": false }
    })
}

pub fn settings_json() -> Value {
    json!([
        {
            "GroupName": "Camera",
            "GroupOrder": 1,
            "Settings": [
                {
                    "SettingShortText": "CTD",
                    "Name": "Capture Mode",
                    "Value": "T",
                    "Options": [
                        { "Text": "Time Lapse", "Value": "T" },
                        { "Text": "Motion Detect", "Value": "M" }
                    ]
                },
                { "SettingShortText": "CFF", "Name": "Motion Freeze", "Value": "F", "ReadOnly": false }
            ]
        },
        {
            "GroupName": "Advanced",
            "Settings": [
                { "SettingShortText": "CFF", "Name": "Motion Freeze", "Value": "F" },
                { "SettingShortText": "ODE", "Name": "On Demand", "Value": "T" }
            ]
        }
    ])
}

/// Device list answered once with `ids`.
pub async fn mount_devices_once(server: &MockServer, ids: &[i64]) {
    let devices: Vec<Value> = ids.iter().copied().map(device_json).collect();
    Mock::given(method("GET"))
        .and(path("/api/v1/Device/Devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Devices": devices })))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// Latest image and settings for one device.
pub async fn mount_device_details(server: &MockServer, id: i64, images: Value) {
    Mock::given(method("POST"))
        .and(path("/api/v2/Image/ImageSearch"))
        .and(body_partial_json(json!({ "CameraId": id })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "Results": { "Results": images } })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/Device/GetGroupedSettings"))
        .and(query_param("id", id.to_string()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "GroupedSettings": settings_json() })),
        )
        .mount(server)
        .await;
}

pub fn image_json(server: &MockServer) -> Value {
    json!([{
        "imageUrl": format!("{}/cdn/image1.jpg", server.uri()),
        "enhancedImageUrl": format!("{}/cdn/image1_enhanced.jpg", server.uri()),
        "takenOn": "2024-01-15T08:00:00Z",
        "temperature": "45",
        "IsOnDemand": false,
        "flash": true
    }])
}

fn tenant_path(suffix: &str) -> String {
    format!("/{TENANT_ID}/{suffix}")
}

/// All four sign-in steps, ending in `access`/`refresh`.
pub async fn mount_b2c_login(server: &MockServer, access: &str, refresh: &str) {
    let settings = json!({
        "csrf": "csrf-1",
        "transId": "StateProperties=tx1",
        "hosts": { "policy": POLICY_PATH }
    });
    Mock::given(method("GET"))
        .and(path(tenant_path("oauth2/v2.0/authorize")))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "x-ms-cpim-trans=abc; path=/")
                .set_body_string(format!("<script>var SETTINGS = {settings};</script>")),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(tenant_path(&format!("{POLICY_PATH}/SelfAsserted"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "200" })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(tenant_path(&format!(
            "{POLICY_PATH}/api/CombinedSigninAndSignup/confirmed"
        ))))
        .respond_with(ResponseTemplate::new(302).append_header(
            "location",
            "https://app.moultriemobile.com/authentication/login-callback#state=s&code=auth-code",
        ))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(tenant_path("oauth2/v2.0/token")))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access,
            "refresh_token": refresh,
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

/// Refresh grant answered with `status`.
pub async fn mount_refresh(server: &MockServer, status: u16, access: &str, refresh: &str) {
    let body = if status == 200 {
        json!({ "access_token": access, "refresh_token": refresh })
    } else {
        json!({ "error": "invalid_grant" })
    };
    Mock::given(method("POST"))
        .and(path(tenant_path("oauth2/v2.0/token")))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}
