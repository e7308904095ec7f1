//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use moultrie_config::ConfigError;
use moultrie_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNAVAILABLE: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach Moultrie Mobile: {message}")]
    #[diagnostic(
        code(moultrie::connection_failed),
        help("Check your network connection and try again.")
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(moultrie::auth_failed),
        help(
            "Sign in again with: moultrie auth --email <EMAIL>\n\
             The password is read from --password, MOULTRIE_PASSWORD, or the keyring."
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(moultrie::no_credentials),
        help(
            "Run: moultrie auth --email <EMAIL>\n\
             Or set MOULTRIE_EMAIL and MOULTRIE_PASSWORD."
        )
    )]
    NoCredentials { profile: String },

    #[error("No refresh token given and none saved at {path}")]
    #[diagnostic(
        code(moultrie::no_refresh_token),
        help("Pass one with --refresh <TOKEN>, or sign in with --email.")
    )]
    NoRefreshToken { path: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(moultrie::not_found),
        help("Run: moultrie {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Operations ───────────────────────────────────────────────────
    #[error("{operation} is not available: {reason}")]
    #[diagnostic(code(moultrie::unavailable))]
    Unavailable { operation: String, reason: String },

    #[error("{message}")]
    #[diagnostic(
        code(moultrie::operation_failed),
        help("The camera applies changes at its next check-in; try again later.")
    )]
    OperationFailed { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error: {message}")]
    #[diagnostic(code(moultrie::api_error))]
    ApiError {
        status: Option<u16>,
        message: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(moultrie::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(moultrie::config),
        help("Check ~/.config/moultrie/config.toml and the MOULTRIE_* environment variables.")
    )]
    Config(Box<ConfigError>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(moultrie::timeout),
        help("Increase the timeout with --timeout.")
    )]
    Timeout { seconds: u64 },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(moultrie::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } | Self::NoRefreshToken { .. } => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Unavailable { .. } => exit_code::UNAVAILABLE,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    pub fn device_not_found(identifier: impl ToString) -> Self {
        Self::NotFound {
            resource_type: "device".into(),
            identifier: identifier.to_string(),
            list_command: "devices list".into(),
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl From<moultrie_api::Error> for CliError {
    fn from(err: moultrie_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ReauthRequired { message } => Self::AuthFailed { message },
            CoreError::CredentialsRequired => Self::NoCredentials {
                profile: "current".into(),
            },
            CoreError::ConnectionFailed { message } => Self::ConnectionFailed { message },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::DeviceNotFound { device_id } => Self::device_not_found(device_id),
            CoreError::SettingNotFound {
                device_id,
                short_code,
            } => Self::NotFound {
                resource_type: "setting".into(),
                identifier: short_code,
                list_command: format!("settings show {device_id}"),
            },
            CoreError::CaptureUnavailable { device_id, reason } => Self::Unavailable {
                operation: format!("On-demand capture for device {device_id}"),
                reason,
            },
            CoreError::Api { message, status } => Self::ApiError { status, message },
            CoreError::Config { message } => Self::Validation {
                field: "configuration".into(),
                reason: message,
            },
            other @ (CoreError::SettingsNotSaved { .. }
            | CoreError::UpdateFailed { .. }
            | CoreError::Cancelled) => {
                Self::OperationFailed {
                    message: other.to_string(),
                }
            }
        }
    }
}
