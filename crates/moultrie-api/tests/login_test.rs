#![allow(clippy::unwrap_used)]
// Integration tests for the B2C PKCE login using wiremock.

mod common;

use secrecy::ExposeSecret;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{EMAIL, PASSWORD, POLICY_PATH, login_flow, mount_b2c_login, tenant_path};
use moultrie_api::Error;

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_returns_token_pair() {
    let server = MockServer::start().await;
    mount_b2c_login(&server, "access-1", "refresh-1").await;

    let pair = login_flow(&server)
        .login(EMAIL, &PASSWORD.to_string().into())
        .await
        .unwrap();

    assert_eq!(pair.access_token().expose_secret(), "access-1");
    assert_eq!(pair.refresh_token().expose_secret(), "refresh-1");
}

#[tokio::test]
async fn test_authenticate_keeps_full_response() {
    let server = MockServer::start().await;
    mount_b2c_login(&server, "access-1", "refresh-1").await;

    let response = login_flow(&server)
        .authenticate(EMAIL, &PASSWORD.to_string().into())
        .await
        .unwrap();

    assert_eq!(response.expires_in, Some(3600));
    assert_eq!(response.extra.get("id_token"), Some(&json!("id-token")));
}

#[tokio::test]
async fn test_each_attempt_uses_fresh_pkce() {
    let server = MockServer::start().await;
    mount_b2c_login(&server, "access-1", "refresh-1").await;
    let flow = login_flow(&server);

    flow.login(EMAIL, &PASSWORD.to_string().into()).await.unwrap();
    flow.login(EMAIL, &PASSWORD.to_string().into()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let challenges: Vec<String> = requests
        .iter()
        .filter(|r| r.url.path().ends_with("/authorize"))
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "code_challenge")
                .map(|(_, v)| v.into_owned())
        })
        .collect();

    assert_eq!(challenges.len(), 2);
    assert_ne!(challenges[0], challenges[1]);
}

// ── Step failures ───────────────────────────────────────────────────

#[tokio::test]
async fn test_login_page_without_settings_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(tenant_path("oauth2/v2.0/authorize")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = login_flow(&server)
        .login(EMAIL, &PASSWORD.to_string().into())
        .await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_rejected_credentials_fail() {
    let server = MockServer::start().await;

    // Higher priority than the mounted happy-path SelfAsserted mock.
    Mock::given(method("POST"))
        .and(path(tenant_path(&format!("{POLICY_PATH}/SelfAsserted"))))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "400",
            "errorCode": "AADB2C90225",
            "message": "The username or password provided in the request are invalid."
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_b2c_login(&server, "access-1", "refresh-1").await;

    let result = login_flow(&server)
        .login(EMAIL, &"wrong".to_string().into())
        .await;

    match result {
        Err(Error::Authentication { message }) => assert!(message.contains("invalid")),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_redirect_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(tenant_path(&format!(
            "{POLICY_PATH}/api/CombinedSigninAndSignup/confirmed"
        ))))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_b2c_login(&server, "access-1", "refresh-1").await;

    let result = login_flow(&server)
        .login(EMAIL, &PASSWORD.to_string().into())
        .await;

    match result {
        Err(Error::Authentication { message }) => assert!(message.contains("redirect")),
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_redirect_without_code_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(tenant_path(&format!(
            "{POLICY_PATH}/api/CombinedSigninAndSignup/confirmed"
        ))))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "https://app.example/cb#error=access_denied"),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    mount_b2c_login(&server, "access-1", "refresh-1").await;

    let result = login_flow(&server)
        .login(EMAIL, &PASSWORD.to_string().into())
        .await;

    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_partial_token_response_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(tenant_path("oauth2/v2.0/token")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-only",
            "expires_in": 3600
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_b2c_login(&server, "access-1", "refresh-1").await;

    let result = login_flow(&server)
        .login(EMAIL, &PASSWORD.to_string().into())
        .await;

    assert!(matches!(result, Err(Error::Authentication { .. })));
}

// ── Refresh grant ───────────────────────────────────────────────────

#[tokio::test]
async fn test_refresh_grant_returns_new_pair() {
    let server = MockServer::start().await;
    common::mount_refresh(&server, 200, "access-2", "refresh-2").await;

    let response = login_flow(&server)
        .refresh(&"old-refresh".to_string().into())
        .await
        .unwrap();
    let pair = response.token_pair().unwrap();

    assert_eq!(pair.access_token().expose_secret(), "access-2");
    assert_eq!(pair.refresh_token().expose_secret(), "refresh-2");
}

#[tokio::test]
async fn test_rejected_refresh_grant_is_auth_failure() {
    let server = MockServer::start().await;
    common::mount_refresh(&server, 400, "", "").await;

    let result = login_flow(&server)
        .refresh(&"old-refresh".to_string().into())
        .await;

    assert!(matches!(result, Err(Error::Authentication { .. })));
}
