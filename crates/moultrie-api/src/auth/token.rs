// Token pair ownership and recovery
//
// The manager is the only writer of the current pair. Refresh and re-login
// run under one async mutex so concurrent 401s trigger a single refresh;
// every replacement is published on a watch channel for persistence.

use std::collections::BTreeMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::auth::login::LoginFlow;
use crate::error::Error;

/// Raw token endpoint response.
///
/// `access_token`/`refresh_token` are optional on the wire; conversion to
/// [`TokenPair`] rejects a response missing either one.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Remaining provider fields (`id_token`, `scope`, ...), kept so the
    /// full response can be written out verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

impl TokenResponse {
    /// Extract a complete pair; any missing or empty token is an
    /// authentication failure.
    pub fn token_pair(&self) -> Result<TokenPair, Error> {
        let access = non_empty(self.access_token.as_deref())
            .ok_or_else(|| Error::auth("token response missing access_token"))?;
        let refresh = non_empty(self.refresh_token.as_deref())
            .ok_or_else(|| Error::auth("token response missing refresh_token"))?;
        Ok(TokenPair::new(access, refresh))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Bearer access token plus the refresh token that renews it.
#[derive(Clone)]
pub struct TokenPair {
    access_token: SecretString,
    refresh_token: SecretString,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            refresh_token: SecretString::from(refresh_token.into()),
        }
    }

    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &SecretString {
        &self.refresh_token
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.expose_secret().is_empty()
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for TokenPair {
    fn eq(&self, other: &Self) -> bool {
        self.access_token.expose_secret() == other.access_token.expose_secret()
            && self.refresh_token.expose_secret() == other.refresh_token.expose_secret()
    }
}

impl Eq for TokenPair {}

/// Account credentials, retained only to re-derive tokens when the
/// refresh token is rejected.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Owner of the current token pair.
pub struct TokenManager {
    login: LoginFlow,
    credentials: Option<Credentials>,
    tokens: watch::Sender<TokenPair>,
    /// Serializes refresh and re-login.
    renew: Mutex<()>,
}

impl TokenManager {
    /// Wrap an existing pair (e.g. loaded from storage).
    pub fn new(login: LoginFlow, tokens: TokenPair, credentials: Option<Credentials>) -> Self {
        let (tokens, _) = watch::channel(tokens);
        Self {
            login,
            credentials,
            tokens,
            renew: Mutex::new(()),
        }
    }

    /// Run a full login with `credentials` and keep them for later re-login.
    pub async fn sign_in(login: LoginFlow, credentials: Credentials) -> Result<Self, Error> {
        let pair = login.login(&credentials.email, &credentials.password).await?;
        Ok(Self::new(login, pair, Some(credentials)))
    }

    /// Snapshot of the current pair.
    pub fn current(&self) -> TokenPair {
        self.tokens.borrow().clone()
    }

    /// Receiver notified on every replacement of the pair.
    pub fn subscribe(&self) -> watch::Receiver<TokenPair> {
        self.tokens.subscribe()
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Exchange the current refresh token for a new pair.
    ///
    /// Failure leaves the stored pair untouched.
    pub async fn refresh(&self) -> Result<TokenPair, Error> {
        let _guard = self.renew.lock().await;
        self.refresh_locked().await
    }

    /// Full login with the stored credentials.
    pub async fn relogin(&self) -> Result<TokenPair, Error> {
        let _guard = self.renew.lock().await;
        self.relogin_locked().await
    }

    /// Recover after the API rejected `stale_access`.
    ///
    /// If another task already replaced that token, its pair is returned
    /// as-is. Otherwise refresh; a rejected refresh token escalates to a
    /// full login with stored credentials.
    pub async fn recover(&self, stale_access: &SecretString) -> Result<TokenPair, Error> {
        let _guard = self.renew.lock().await;

        let current = self.current();
        if current.access_token().expose_secret() != stale_access.expose_secret() {
            debug!("token already renewed by another request");
            return Ok(current);
        }

        match self.refresh_locked().await {
            Ok(pair) => Ok(pair),
            Err(e) if e.is_auth_failure() => {
                warn!(error = %e, "refresh token rejected, signing in again");
                self.relogin_locked().await
            }
            Err(e) => Err(e),
        }
    }

    async fn refresh_locked(&self) -> Result<TokenPair, Error> {
        let current = self.current();
        let pair = self
            .login
            .refresh(current.refresh_token())
            .await?
            .token_pair()?;
        self.tokens.send_replace(pair.clone());
        debug!("access token refreshed");
        Ok(pair)
    }

    async fn relogin_locked(&self) -> Result<TokenPair, Error> {
        let Some(credentials) = &self.credentials else {
            return Err(Error::CredentialsRequired);
        };
        info!(email = %credentials.email, "re-authenticating with stored credentials");
        let pair = self
            .login
            .login(&credentials.email, &credentials.password)
            .await?;
        self.tokens.send_replace(pair.clone());
        Ok(pair)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn token_pair_requires_both_tokens() {
        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "abc",
            "refresh_token": "",
            "expires_in": 3600
        }))
        .unwrap();
        assert!(matches!(
            response.token_pair(),
            Err(Error::Authentication { .. })
        ));
    }

    #[test]
    fn token_response_keeps_extra_fields() {
        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "abc",
            "refresh_token": "def",
            "id_token": "ghi",
            "expires_in": 3600
        }))
        .unwrap();
        assert_eq!(response.extra.get("id_token"), Some(&serde_json::json!("ghi")));
        let pair = response.token_pair().unwrap();
        assert_eq!(pair.access_token().expose_secret(), "abc");
        assert_eq!(pair.refresh_token().expose_secret(), "def");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let pair = TokenPair::new("secret-access", "secret-refresh");
        let rendered = format!("{pair:?}");
        assert!(!rendered.contains("secret-access"));
        assert!(rendered.contains("REDACTED"));
    }
}
