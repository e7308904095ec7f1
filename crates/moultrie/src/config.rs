//! Bridges global flags and the on-disk configuration into a
//! `moultrie_core::SessionConfig`.
//!
//! Core never sees profiles or token files -- it receives a pre-built
//! `SessionConfig`.

use moultrie_config::{Config, Profile, TokenFiles};
use moultrie_core::{Credentials, Endpoints, SessionConfig, TokenPair};
use secrecy::SecretString;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything resolved from the config file for one invocation.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub profile_name: String,
    pub profile: Profile,
    pub token_files: TokenFiles,
}

impl Context {
    /// Load the config file (defaults when missing) and resolve the
    /// active profile and token directory.
    pub fn load(global: &GlobalOpts) -> Self {
        let config = moultrie_config::load_config_or_default();
        let profile_name = config.profile_name(global.profile.as_deref());
        let profile = config.profile(&profile_name);
        let dir = moultrie_config::token_dir(global.token_dir.as_deref(), &config, &profile);

        Self {
            token_files: TokenFiles::new(dir),
            config,
            profile_name,
            profile,
        }
    }

    /// Email and password from flags, env, keyring, or the profile.
    pub fn credentials(
        &self,
        email: Option<&str>,
        password: Option<SecretString>,
    ) -> Result<Credentials, CliError> {
        Ok(moultrie_config::resolve_credentials(
            &self.profile,
            &self.profile_name,
            email,
            password,
        )?)
    }

    /// Session config for API commands: saved tokens plus credentials when
    /// they can be resolved, so an expired session re-logs in by itself.
    pub fn session(&self, global: &GlobalOpts) -> Result<SessionConfig, CliError> {
        let tokens = self.token_files.load()?;
        let credentials = self.credentials(None, None).ok();

        if tokens.is_none() && credentials.is_none() {
            return Err(CliError::NoCredentials {
                profile: self.profile_name.clone(),
            });
        }

        let mut session = moultrie_config::session_config(
            &self.config,
            &self.profile,
            credentials,
            tokens,
            global.timeout,
        );
        session.endpoints = endpoints(global)?;
        Ok(session)
    }

    /// Persist `pair` if it differs from what is on disk.
    pub fn save_tokens_if_changed(&self, pair: &TokenPair) -> Result<bool, CliError> {
        if pair.is_empty() || self.token_files.load()?.as_ref() == Some(pair) {
            return Ok(false);
        }
        self.token_files.save(pair, None)?;
        tracing::debug!(dir = %self.token_files.dir().display(), "saved rotated tokens");
        Ok(true)
    }
}

/// Production endpoints, or every host pointed at `--base-url`.
pub fn endpoints(global: &GlobalOpts) -> Result<Endpoints, CliError> {
    let Some(raw) = global.base_url.as_deref() else {
        return Ok(Endpoints::default());
    };
    let base: url::Url = raw.parse().map_err(|_| CliError::Validation {
        field: "base-url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    Ok(Endpoints::with_base(base))
}
