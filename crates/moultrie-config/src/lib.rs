//! Shared configuration for the Moultrie CLI.
//!
//! TOML profiles (one per account), credential resolution
//! (flag + env + keyring + plaintext), token-file persistence, and
//! translation to `moultrie_core::SessionConfig`.

mod tokens;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use moultrie_core::{Credentials, SessionConfig, TokenPair};

pub use tokens::{REFRESH_FILE, TOKEN_FILE, TOKEN_JSON_FILE, TokenFiles};

/// Keyring service name; entries are `{profile}/password`.
pub const KEYRING_SERVICE: &str = "moultrie";
pub const EMAIL_ENV: &str = "MOULTRIE_EMAIL";
pub const PASSWORD_ENV: &str = "MOULTRIE_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to encode token response: {0}")]
    TokenJson(#[from] serde_json::Error),

    #[error("{path}: {source}")]
    TokenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Profile to use: the explicit name, else `default_profile`, else
    /// `"default"`.
    pub fn profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Named profile, or an empty one when the file does not define it.
    pub fn profile(&self, name: &str) -> Profile {
        self.profiles.get(name).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Poll period of `moultrie watch`, in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Directory holding `.token`, `.refresh` and `.token_json`.
    pub token_dir: Option<PathBuf>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            refresh_interval: default_refresh_interval(),
            token_dir: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_refresh_interval() -> u64 {
    moultrie_core::DEFAULT_REFRESH_INTERVAL.as_secs()
}

/// One Moultrie account.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Account email.
    pub email: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override token directory.
    pub token_dir: Option<PathBuf>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override poll period.
    pub refresh_interval: Option<u64>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "moultrie", "moultrie")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Platform data directory, used for tokens when nothing else is set.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf())
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("moultrie");
    p
}

/// Token directory: flag, then profile, then defaults, then the data dir.
pub fn token_dir(flag: Option<&Path>, config: &Config, profile: &Profile) -> PathBuf {
    flag.map(Path::to_path_buf)
        .or_else(|| profile.token_dir.clone())
        .or_else(|| config.defaults.token_dir.clone())
        .unwrap_or_else(data_dir)
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, then `MOULTRIE_*` env
/// (`MOULTRIE_DEFAULTS__TIMEOUT=60`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MOULTRIE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve email + password. Each falls back flag → env → profile; the
/// password additionally tries the system keyring before the plaintext
/// profile value.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
    email_flag: Option<&str>,
    password_flag: Option<SecretString>,
) -> Result<Credentials, ConfigError> {
    resolve_credentials_with(profile, profile_name, email_flag, password_flag, |name| {
        std::env::var(name).ok()
    })
}

/// [`resolve_credentials`] with an injectable environment lookup.
pub fn resolve_credentials_with<E>(
    profile: &Profile,
    profile_name: &str,
    email_flag: Option<&str>,
    password_flag: Option<SecretString>,
    env: E,
) -> Result<Credentials, ConfigError>
where
    E: Fn(&str) -> Option<String>,
{
    let no_credentials = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };

    let email = email_flag
        .map(str::to_owned)
        .or_else(|| env(EMAIL_ENV))
        .or_else(|| profile.email.clone())
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(no_credentials)?;

    let password = password_flag
        .or_else(|| password_from_env(profile, &env))
        .or_else(|| password_from_keyring(profile_name))
        .or_else(|| profile.password.clone().map(SecretString::from))
        .ok_or_else(no_credentials)?;

    Ok(Credentials::new(email, password))
}

fn password_from_env<E>(profile: &Profile, env: &E) -> Option<SecretString>
where
    E: Fn(&str) -> Option<String>,
{
    profile
        .password_env
        .as_deref()
        .and_then(env)
        .or_else(|| env(PASSWORD_ENV))
        .map(SecretString::from)
}

fn password_from_keyring(profile_name: &str) -> Option<SecretString> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password")).ok()?;
    entry.get_password().ok().map(SecretString::from)
}

/// Store a password in the system keyring for `profile_name`.
pub fn store_password(profile_name: &str, password: &SecretString) -> Result<(), ConfigError> {
    use secrecy::ExposeSecret;

    let keyring_err = |e: keyring::Error| ConfigError::Validation {
        field: "keyring".into(),
        reason: e.to_string(),
    };
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .map_err(keyring_err)?
        .set_password(password.expose_secret())
        .map_err(keyring_err)
}

// ── SessionConfig translation ───────────────────────────────────────

/// Build a `SessionConfig` from a profile plus whatever secrets the
/// caller resolved. `timeout` overrides the profile and defaults.
pub fn session_config(
    config: &Config,
    profile: &Profile,
    credentials: Option<Credentials>,
    tokens: Option<TokenPair>,
    timeout: Option<u64>,
) -> SessionConfig {
    let timeout = Duration::from_secs(
        timeout
            .or(profile.timeout)
            .unwrap_or(config.defaults.timeout),
    );
    let refresh_interval = Duration::from_secs(
        profile
            .refresh_interval
            .unwrap_or(config.defaults.refresh_interval),
    );

    SessionConfig {
        credentials,
        tokens,
        timeout,
        refresh_interval,
        ..SessionConfig::default()
    }
}
