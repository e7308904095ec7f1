// Access token claims
//
// The B2C access token is a JWT. Only the payload segment is decoded for
// display; the signature is not checked (the API does that).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Identity fields carried in a Moultrie access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub email: Option<String>,
    /// B2C puts sign-in emails in an array when `email` is absent.
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(rename = "MMId", default)]
    pub mm_id: Option<serde_json::Value>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Decode the payload of `token`. `None` if it is not a JWT.
    pub fn decode(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .or_else(|| self.emails.first().map(String::as_str))
    }

    /// Moultrie member id, rendered as text whether the claim is a
    /// string or a number.
    pub fn member_id(&self) -> Option<String> {
        match self.mm_id.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp?, 0)
    }
}
