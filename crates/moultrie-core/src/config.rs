// ── Runtime session configuration ──
//
// Describes how to reach Moultrie and which secrets to start from.
// The CLI builds a `SessionConfig` and hands it in -- core never reads
// config files or token files.

use std::time::Duration;

use moultrie_api::{Credentials, Endpoints, TokenPair, TransportConfig};

/// Default poll period.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Configuration for one Moultrie account session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Identity provider and API locations.
    pub endpoints: Endpoints,
    /// Email/password kept for automatic re-login.
    pub credentials: Option<Credentials>,
    /// Previously issued tokens. When absent, `credentials` are used to
    /// sign in on connect.
    pub tokens: Option<TokenPair>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Timeout for image downloads.
    pub image_timeout: Duration,
    /// Background poll period. Zero disables the background task.
    pub refresh_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            credentials: None,
            tokens: None,
            timeout: Duration::from_secs(30),
            image_timeout: Duration::from_secs(30),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

impl SessionConfig {
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_tokens(mut self, tokens: TokenPair) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            image_timeout: self.image_timeout,
        }
    }
}
