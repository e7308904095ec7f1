// Authenticated API request executor
//
// Wraps `reqwest::Client` with bearer-token injection, the single
// refresh-and-retry on 401, and body decoding. Endpoint methods live in
// `devices`, `images` and `account` as inherent methods on `ApiClient`.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::auth::token::TokenManager;
use crate::endpoints::Endpoints;
use crate::error::{Error, preview};
use crate::transport::TransportConfig;

/// HTTP client for the Moultrie consumer API.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct ApiClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    tokens: Arc<TokenManager>,
    transport: TransportConfig,
}

impl ApiClient {
    pub fn new(
        endpoints: Endpoints,
        transport: TransportConfig,
        tokens: Arc<TokenManager>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            endpoints,
            tokens,
            transport,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, endpoints: Endpoints, tokens: Arc<TokenManager>) -> Self {
        Self {
            http,
            endpoints,
            tokens,
            transport: TransportConfig::default(),
        }
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn transport(&self) -> &TransportConfig {
        &self.transport
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated request and return the decoded JSON body.
    ///
    /// A 401 triggers token recovery and exactly one retry; a second 401
    /// is an authentication error. An empty body decodes as `{}`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        let url = self.endpoints.api_url(path)?;
        let token = self.tokens.current().access_token().clone();

        let resp = self.send(&method, &url, query, body, &token).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return parse_body(resp).await;
        }

        debug!("{} {} rejected with 401, renewing token", method, url.path());
        let renewed = self.tokens.recover(&token).await?;
        let resp = self
            .send(&method, &url, query, body, renewed.access_token())
            .await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::auth(format!(
                "{method} {} rejected after token refresh",
                url.path()
            )));
        }
        parse_body(resp).await
    }

    pub(crate) async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, Error> {
        self.request(Method::GET, path, query, None).await
    }

    pub(crate) async fn post(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<Value, Error> {
        let body = serde_json::to_value(body).map_err(|e| Error::Deserialization {
            message: format!("failed to encode request body: {e}"),
            body: String::new(),
        })?;
        self.request(Method::POST, path, &[], Some(&body)).await
    }

    async fn send(
        &self,
        method: &Method,
        url: &Url,
        query: &[(&str, String)],
        body: Option<&Value>,
        token: &SecretString,
    ) -> Result<reqwest::Response, Error> {
        debug!("{} {}", method, url);

        let mut builder = self
            .http
            .request(method.clone(), url.clone())
            .bearer_auth(token.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder
            .send()
            .await
            .map_err(|e| Error::from_send(e, self.transport.timeout))
    }
}

async fn parse_body(resp: reqwest::Response) -> Result<Value, Error> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            message: preview(&body).to_owned(),
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body: body.clone(),
    })
}

/// Decode a field of a response object, treating absence as `default`.
pub(crate) fn field_or<T: DeserializeOwned>(
    value: &Value,
    key: &str,
    default: T,
) -> Result<T, Error> {
    match value.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(field) => decode(field.clone()),
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value::<T>(value.clone()).map_err(|e| {
        let body = value.to_string();
        Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        }
    })
}
