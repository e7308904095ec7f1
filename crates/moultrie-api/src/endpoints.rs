// Identity provider and API locations
//
// The defaults are the production Moultrie Mobile constants. Every URL is
// derived from these fields, so tests point the whole set at a mock server.

use url::Url;

use crate::error::Error;

pub const B2C_HOST: &str = "https://login.moultriemobile.com";
pub const TENANT_ID: &str = "46148adf-3109-46fc-ac67-9b17d664afc3";
pub const CLIENT_ID: &str = "ab523e40-983c-4f89-adf8-e258d78cb689";
pub const POLICY: &str = "B2C_1A_SIGNUP_SIGNIN";
pub const REDIRECT_URI: &str = "https://app.moultriemobile.com/authentication/login-callback";
pub const SCOPE: &str = "https://moultriemobile.onmicrosoft.com/9e848fa3-9069-4bf0-bcc3-ab9451d97416/access_as_user openid offline_access";
pub const API_BASE: &str = "https://consumerapi-web-v2.moultriemobile.com";
pub const IMAGE_CDN: &str = "https://primaryviewer2.moultriemobile.com";

/// Locations and OAuth client parameters for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub b2c_host: Url,
    pub tenant_id: String,
    pub client_id: String,
    pub policy: String,
    pub redirect_uri: String,
    pub scope: String,
    pub api_base: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            b2c_host: Url::parse(B2C_HOST).expect("valid B2C host"),
            tenant_id: TENANT_ID.into(),
            client_id: CLIENT_ID.into(),
            policy: POLICY.into(),
            redirect_uri: REDIRECT_URI.into(),
            scope: SCOPE.into(),
            api_base: Url::parse(API_BASE).expect("valid API base"),
        }
    }
}

impl Endpoints {
    /// Production endpoints with both hosts replaced by `base`.
    pub fn with_base(base: Url) -> Self {
        Self {
            b2c_host: base.clone(),
            api_base: base,
            ..Self::default()
        }
    }

    // ── B2C ──────────────────────────────────────────────────────────

    /// `{host}/{tenant}/oauth2/v2.0/authorize`
    pub fn authorize_url(&self) -> Result<Url, Error> {
        self.b2c_url(&format!("{}/oauth2/v2.0/authorize", self.tenant_id))
    }

    /// `{host}/{tenant}/{policy_path}/SelfAsserted`
    pub fn self_asserted_url(&self, policy_path: &str) -> Result<Url, Error> {
        self.b2c_url(&format!("{}/{policy_path}/SelfAsserted", self.tenant_id))
    }

    /// `{host}/{tenant}/{policy_path}/api/CombinedSigninAndSignup/confirmed`
    pub fn confirmed_url(&self, policy_path: &str) -> Result<Url, Error> {
        self.b2c_url(&format!(
            "{}/{policy_path}/api/CombinedSigninAndSignup/confirmed",
            self.tenant_id
        ))
    }

    /// `{host}/{tenant}/oauth2/v2.0/token?p={policy}`
    pub fn token_url(&self) -> Result<Url, Error> {
        let mut url = self.b2c_url(&format!("{}/oauth2/v2.0/token", self.tenant_id))?;
        url.query_pairs_mut().append_pair("p", &self.policy);
        Ok(url)
    }

    // ── Consumer API ─────────────────────────────────────────────────

    /// Join an API path such as `api/v1/Device/Devices` onto the API base.
    pub fn api_url(&self, path: &str) -> Result<Url, Error> {
        join(&self.api_base, path)
    }

    fn b2c_url(&self, path: &str) -> Result<Url, Error> {
        join(&self.b2c_host, path)
    }
}

fn join(base: &Url, path: &str) -> Result<Url, Error> {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}
