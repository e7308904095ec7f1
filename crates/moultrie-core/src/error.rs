// ── Core error types ──
//
// Errors surfaced to consumers of the coordinator. The
// `From<moultrie_api::Error>` impl sorts transport-layer failures into
// "the user must sign in again" versus "try again on the next poll".

use moultrie_api::DeviceId;
use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    /// Tokens and stored credentials were rejected.
    #[error("Reauthentication required: {message}")]
    ReauthRequired { message: String },

    /// Re-login is needed but no credentials are stored.
    #[error("Credentials required -- sign in again with email and password")]
    CredentialsRequired,

    // ── Polling ──────────────────────────────────────────────────────
    /// A refresh cycle failed for a reason that may clear on its own.
    #[error("Error fetching Moultrie data: {message}")]
    UpdateFailed { message: String },

    /// The cycle was abandoned because the coordinator shut down.
    #[error("Refresh cancelled")]
    Cancelled,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {device_id}")]
    DeviceNotFound { device_id: DeviceId },

    #[error("Setting {short_code} not found on device {device_id}")]
    SettingNotFound {
        device_id: DeviceId,
        short_code: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Device {device_id} did not confirm the settings change")]
    SettingsNotSaved { device_id: DeviceId },

    #[error("On-demand capture unavailable for device {device_id}: {reason}")]
    CaptureUnavailable { device_id: DeviceId, reason: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    #[error("Cannot reach Moultrie: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// `true` when only new credentials will fix this.
    pub fn is_reauth_required(&self) -> bool {
        matches!(self, Self::ReauthRequired { .. } | Self::CredentialsRequired)
    }

    /// `true` if the next poll may succeed without user action.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::UpdateFailed { .. } | Self::ConnectionFailed { .. } | Self::Timeout { .. } => {
                true
            }
            Self::Api { status, .. } => status.is_none_or(|s| s >= 500 || s == 429),
            _ => false,
        }
    }

    /// Reclassify a failed refresh cycle: auth problems stay as they are,
    /// everything else becomes an update failure.
    pub(crate) fn into_cycle_failure(self) -> Self {
        match self {
            e @ (Self::ReauthRequired { .. } | Self::CredentialsRequired | Self::Cancelled) => e,
            other => Self::UpdateFailed {
                message: other.to_string(),
            },
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<moultrie_api::Error> for CoreError {
    fn from(err: moultrie_api::Error) -> Self {
        match err {
            moultrie_api::Error::Authentication { message } => CoreError::ReauthRequired { message },
            moultrie_api::Error::CredentialsRequired => CoreError::CredentialsRequired,
            moultrie_api::Error::Transport(ref e) => {
                if e.is_timeout() || e.is_connect() {
                    CoreError::ConnectionFailed {
                        message: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            moultrie_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            moultrie_api::Error::Api { status, message } => CoreError::Api {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
            },
            moultrie_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            moultrie_api::Error::Deserialization { message, .. } => CoreError::Api {
                message: format!("unexpected response: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_reauth() {
        let err: CoreError = moultrie_api::Error::Authentication {
            message: "rejected after token refresh".into(),
        }
        .into();
        assert!(err.is_reauth_required());
        assert!(err.into_cycle_failure().is_reauth_required());

        let err: CoreError = moultrie_api::Error::CredentialsRequired.into();
        assert!(matches!(err, CoreError::CredentialsRequired));
    }

    #[test]
    fn timeouts_keep_their_limit() {
        let err: CoreError = moultrie_api::Error::Timeout { timeout_secs: 30 }.into();
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 30 }));
        assert_eq!(err.to_string(), "Request timed out after 30s");
    }

    #[test]
    fn api_errors_become_update_failures() {
        let err: CoreError = moultrie_api::Error::Api {
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert!(err.is_transient());
        let cycle = err.into_cycle_failure();
        assert!(matches!(cycle, CoreError::UpdateFailed { .. }));
        assert!(cycle.to_string().contains("502"));
    }
}
