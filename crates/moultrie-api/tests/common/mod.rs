// Shared wiremock fixtures for the B2C login and token endpoints.
#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use moultrie_api::endpoints::TENANT_ID;
use moultrie_api::{
    ApiClient, Credentials, Endpoints, LoginFlow, TokenManager, TokenPair, TransportConfig,
};

pub const POLICY_PATH: &str = "B2C_1A_signup_signin";
pub const EMAIL: &str = "test@example.com";
pub const PASSWORD: &str = "testpassword123";

pub fn endpoints(server: &MockServer) -> Endpoints {
    Endpoints::with_base(Url::parse(&server.uri()).unwrap())
}

pub fn login_flow(server: &MockServer) -> LoginFlow {
    LoginFlow::new(endpoints(server), TransportConfig::default())
}

pub fn credentials() -> Credentials {
    Credentials::new(EMAIL, PASSWORD.to_string().into())
}

pub fn tenant_path(suffix: &str) -> String {
    format!("/{TENANT_ID}/{suffix}")
}

/// Client holding `old-access`/`old-refresh`, optionally with credentials.
pub fn api_client(server: &MockServer, with_credentials: bool) -> ApiClient {
    let tokens = TokenManager::new(
        login_flow(server),
        TokenPair::new("old-access", "old-refresh"),
        with_credentials.then(credentials),
    );
    ApiClient::with_client(reqwest::Client::new(), endpoints(server), Arc::new(tokens))
}

fn sign_in_page() -> String {
    let settings = json!({
        "csrf": "csrf-token-1",
        "transId": "StateProperties=tx123",
        "hosts": { "tenant": format!("/{TENANT_ID}"), "policy": POLICY_PATH },
        "api": "CombinedSigninAndSignup"
    });
    format!(
        "<!DOCTYPE html><html><head><script>var SETTINGS = {settings};\nvar CONTENT = {{}};</script></head></html>"
    )
}

/// Mount all four B2C steps. The token step returns `access`/`refresh`.
pub async fn mount_b2c_login(server: &MockServer, access: &str, refresh: &str) {
    Mock::given(method("GET"))
        .and(path(tenant_path("oauth2/v2.0/authorize")))
        .and(query_param("code_challenge_method", "S256"))
        .and(query_param("response_mode", "fragment"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "x-ms-cpim-trans=abc; path=/; secure; HttpOnly")
                .append_header("set-cookie", "x-ms-cpim-cache|tx_0=blob; path=/")
                .set_body_string(sign_in_page()),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(tenant_path(&format!("{POLICY_PATH}/SelfAsserted"))))
        .and(query_param("tx", "StateProperties=tx123"))
        .and(query_param("p", POLICY_PATH))
        .and(header("x-csrf-token", "csrf-token-1"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(header("cookie", "x-ms-cpim-trans=abc; x-ms-cpim-cache|tx_0=blob"))
        .and(body_string_contains("request_type=RESPONSE"))
        .and(body_string_contains("signInName=test%40example.com"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "x-ms-cpim-sso=sso1; path=/")
                .set_body_json(json!({ "status": "200" })),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(tenant_path(&format!(
            "{POLICY_PATH}/api/CombinedSigninAndSignup/confirmed"
        ))))
        .and(query_param("rememberMe", "false"))
        .and(query_param("csrf_token", "csrf-token-1"))
        .and(header(
            "cookie",
            "x-ms-cpim-trans=abc; x-ms-cpim-cache|tx_0=blob; x-ms-cpim-sso=sso1",
        ))
        .respond_with(ResponseTemplate::new(302).insert_header(
            "location",
            "https://app.moultriemobile.com/authentication/login-callback#state=s&code=auth-code-123",
        ))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(tenant_path("oauth2/v2.0/token")))
        .and(query_param("p", "B2C_1A_SIGNUP_SIGNIN"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-123"))
        .and(body_string_contains("code_verifier="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access,
            "refresh_token": refresh,
            "id_token": "id-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

/// Mount the refresh grant for `old-refresh`, answering with `status`.
pub async fn mount_refresh(server: &MockServer, status: u16, access: &str, refresh: &str) {
    let body = if status == 200 {
        json!({ "access_token": access, "refresh_token": refresh, "expires_in": 3600 })
    } else {
        json!({ "error": "invalid_grant", "error_description": "AADB2C90080: expired" })
    };
    Mock::given(method("POST"))
        .and(path(tenant_path("oauth2/v2.0/token")))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=old-refresh"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}
