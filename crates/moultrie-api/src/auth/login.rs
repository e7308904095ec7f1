// Azure AD B2C PKCE login
//
// Browser-less replay of the hosted sign-in page:
//   1. GET authorize      -> SETTINGS blob (csrf, transId, policy path) + cookies
//   2. POST SelfAsserted  -> credentials check, body status must be "200"
//   3. GET confirmed      -> 302 whose Location fragment carries `code`
//   4. POST token         -> access/refresh pair
// Each attempt builds its own redirect-less client and cookie map. Refresh
// token redemption goes to the same token endpoint.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, LOCATION};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::auth::cookies::CookieJar;
use crate::auth::pkce::PkceChallenge;
use crate::auth::token::{TokenPair, TokenResponse};
use crate::endpoints::Endpoints;
use crate::error::{Error, preview};
use crate::transport::TransportConfig;

static SETTINGS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)var SETTINGS\s*=\s*(\{.*?\});").expect("valid SETTINGS regex")
});

/// Fields of the sign-in page's `var SETTINGS = {...};` blob.
#[derive(Debug, Deserialize)]
struct PageSettings {
    csrf: Option<String>,
    #[serde(rename = "transId")]
    trans_id: Option<String>,
    hosts: Option<PageHosts>,
}

#[derive(Debug, Deserialize)]
struct PageHosts {
    policy: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SelfAssertedResult {
    status: Option<serde_json::Value>,
    message: Option<String>,
}

/// Transaction values extracted in step 1 and replayed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Transaction {
    csrf: String,
    trans_id: String,
    policy_path: String,
}

/// State for one login attempt. Dropped once the code is exchanged.
struct LoginSession {
    http: reqwest::Client,
    pkce: PkceChallenge,
    cookies: CookieJar,
}

/// Four-step PKCE login against the B2C identity provider.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    endpoints: Endpoints,
    transport: TransportConfig,
}

impl LoginFlow {
    pub fn new(endpoints: Endpoints, transport: TransportConfig) -> Self {
        Self {
            endpoints,
            transport,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Sign in and return the complete pair.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<TokenPair, Error> {
        self.authenticate(email, password).await?.token_pair()
    }

    /// Sign in and return the raw token endpoint response.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<TokenResponse, Error> {
        let mut session = LoginSession {
            http: self.transport.build_login_client()?,
            pkce: PkceChallenge::generate(),
            cookies: CookieJar::new(),
        };

        debug!(email, "starting B2C login");
        let tx = self.load_sign_in_page(&mut session).await?;
        self.submit_credentials(&mut session, &tx, email, password)
            .await?;
        let code = self.confirm(&session, &tx).await?;
        let response = self.exchange_code(&session, &code).await?;
        debug!("B2C login complete");
        Ok(response)
    }

    /// Redeem a refresh token at the token endpoint.
    ///
    /// A non-success status means the provider rejected the token and is
    /// reported as an authentication failure.
    pub async fn refresh(&self, refresh_token: &SecretString) -> Result<TokenResponse, Error> {
        let http = self.transport.build_login_client()?;
        let url = self.endpoints.token_url()?;
        debug!("POST {} (refresh)", url);

        let resp = http
            .post(url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.endpoints.client_id.as_str()),
                ("refresh_token", refresh_token.expose_secret()),
                ("scope", self.endpoints.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::from_send(e, self.transport.timeout))?;

        let status = resp.status();
        let body = resp.text().await?;
        ensure_success("token refresh", status, &body)?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })
    }

    // ── Step 1 ───────────────────────────────────────────────────────

    async fn load_sign_in_page(&self, session: &mut LoginSession) -> Result<Transaction, Error> {
        let url = self.endpoints.authorize_url()?;
        debug!("GET {}", url);

        let resp = session
            .http
            .get(url)
            .query(&[
                ("p", self.endpoints.policy.as_str()),
                ("client_id", self.endpoints.client_id.as_str()),
                ("redirect_uri", self.endpoints.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", self.endpoints.scope.as_str()),
                ("response_mode", "fragment"),
                ("code_challenge", session.pkce.challenge.as_str()),
                ("code_challenge_method", "S256"),
                ("nonce", session.pkce.nonce.as_str()),
                ("state", session.pkce.state.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::from_send(e, self.transport.timeout))?;

        let status = resp.status();
        session.cookies.absorb(resp.headers());
        let page = resp.text().await?;
        ensure_success("authorize", status, &page)?;

        parse_page_settings(&page)
    }

    // ── Step 2 ───────────────────────────────────────────────────────

    async fn submit_credentials(
        &self,
        session: &mut LoginSession,
        tx: &Transaction,
        email: &str,
        password: &SecretString,
    ) -> Result<(), Error> {
        let url = self.endpoints.self_asserted_url(&tx.policy_path)?;
        debug!("POST {}", url);

        let resp = session
            .http
            .post(url)
            .query(&[("tx", tx.trans_id.as_str()), ("p", tx.policy_path.as_str())])
            .header("X-CSRF-TOKEN", &tx.csrf)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(COOKIE, session.cookies.header_value())
            .form(&[
                ("request_type", "RESPONSE"),
                ("signInName", email),
                ("password", password.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| Error::from_send(e, self.transport.timeout))?;

        let status = resp.status();
        session.cookies.absorb(resp.headers());
        let body = resp.text().await?;
        ensure_success("SelfAsserted", status, &body)?;

        let result: SelfAssertedResult = serde_json::from_str(&body)
            .map_err(|e| Error::auth(format!("unreadable SelfAsserted response: {e}")))?;
        check_self_asserted(&result)
    }

    // ── Step 3 ───────────────────────────────────────────────────────

    async fn confirm(&self, session: &LoginSession, tx: &Transaction) -> Result<String, Error> {
        let url = self.endpoints.confirmed_url(&tx.policy_path)?;
        debug!("GET {}", url);

        let resp = session
            .http
            .get(url)
            .query(&[
                ("rememberMe", "false"),
                ("csrf_token", tx.csrf.as_str()),
                ("tx", tx.trans_id.as_str()),
                ("p", tx.policy_path.as_str()),
            ])
            .header(COOKIE, session.cookies.header_value())
            .send()
            .await
            .map_err(|e| Error::from_send(e, self.transport.timeout))?;

        let status = resp.status();
        if status != StatusCode::FOUND && status != StatusCode::MOVED_PERMANENTLY {
            return Err(Error::auth(format!("expected redirect, got HTTP {status}")));
        }
        code_from_redirect(resp.headers())
    }

    // ── Step 4 ───────────────────────────────────────────────────────

    async fn exchange_code(
        &self,
        session: &LoginSession,
        code: &str,
    ) -> Result<TokenResponse, Error> {
        let url = self.endpoints.token_url()?;
        debug!("POST {}", url);

        let resp = session
            .http
            .post(url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.endpoints.client_id.as_str()),
                ("code", code),
                ("redirect_uri", self.endpoints.redirect_uri.as_str()),
                ("code_verifier", session.pkce.verifier.as_str()),
                ("scope", self.endpoints.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::from_send(e, self.transport.timeout))?;

        let status = resp.status();
        let body = resp.text().await?;
        ensure_success("token exchange", status, &body)?;

        let response: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::auth(format!("unreadable token response: {e}")))?;
        // Reject a partial pair before handing the response out.
        response.token_pair()?;
        Ok(response)
    }
}

fn ensure_success(step: &str, status: StatusCode, body: &str) -> Result<(), Error> {
    if status.is_success() {
        Ok(())
    } else {
        Err(Error::auth(format!(
            "{step} failed (HTTP {status}): {}",
            preview(body)
        )))
    }
}

fn parse_page_settings(page: &str) -> Result<Transaction, Error> {
    let blob = SETTINGS_RE
        .captures(page)
        .and_then(|c| c.get(1))
        .ok_or_else(|| Error::auth("could not find SETTINGS on B2C login page"))?;

    let settings: PageSettings = serde_json::from_str(blob.as_str())
        .map_err(|e| Error::auth(format!("malformed SETTINGS on B2C login page: {e}")))?;

    let missing = |field: &str| Error::auth(format!("B2C SETTINGS missing `{field}`"));
    Ok(Transaction {
        csrf: settings.csrf.ok_or_else(|| missing("csrf"))?,
        trans_id: settings.trans_id.ok_or_else(|| missing("transId"))?,
        policy_path: settings
            .hosts
            .and_then(|h| h.policy)
            .ok_or_else(|| missing("hosts.policy"))?,
    })
}

fn check_self_asserted(result: &SelfAssertedResult) -> Result<(), Error> {
    match &result.status {
        Some(serde_json::Value::String(s)) if s == "200" => Ok(()),
        status => Err(Error::auth(format!(
            "sign-in rejected (status {}): {}",
            status
                .as_ref()
                .map_or_else(|| "missing".to_owned(), ToString::to_string),
            result.message.as_deref().unwrap_or("no message")
        ))),
    }
}

fn code_from_redirect(headers: &HeaderMap) -> Result<String, Error> {
    let location = headers
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Error::auth("redirect without Location header"))?;

    let fragment = location.split_once('#').map_or("", |(_, f)| f);
    url::form_urlencoded::parse(fragment.as_bytes())
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::auth("no authorization code in redirect"))
}
