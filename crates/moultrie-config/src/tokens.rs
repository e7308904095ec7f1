// ── Token-file persistence ──
//
// The token pair lives in three sibling files: `.token` (access token),
// `.refresh` (refresh token) and `.token_json` (the raw token response).

use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use moultrie_core::TokenPair;

use crate::ConfigError;

pub const TOKEN_FILE: &str = ".token";
pub const REFRESH_FILE: &str = ".refresh";
pub const TOKEN_JSON_FILE: &str = ".token_json";

/// Token files inside one directory.
#[derive(Debug, Clone)]
pub struct TokenFiles {
    dir: PathBuf,
}

impl TokenFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    pub fn refresh_path(&self) -> PathBuf {
        self.dir.join(REFRESH_FILE)
    }

    pub fn json_path(&self) -> PathBuf {
        self.dir.join(TOKEN_JSON_FILE)
    }

    /// Write all three files. Without a raw response, `.token_json` holds
    /// just the two tokens.
    pub fn save(&self, pair: &TokenPair, raw: Option<&Value>) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.dir).map_err(|source| ConfigError::TokenFile {
            path: self.dir.clone(),
            source,
        })?;

        let json = match raw {
            Some(value) => serde_json::to_string_pretty(value)?,
            None => serde_json::to_string_pretty(&json!({
                "access_token": pair.access_token().expose_secret(),
                "refresh_token": pair.refresh_token().expose_secret(),
            }))?,
        };

        write_private(&self.token_path(), pair.access_token().expose_secret())?;
        write_private(&self.refresh_path(), pair.refresh_token().expose_secret())?;
        write_private(&self.json_path(), &json)
    }

    /// Read `.token` and `.refresh`. `None` unless both hold a value.
    pub fn load(&self) -> Result<Option<TokenPair>, ConfigError> {
        let (Some(access), Some(refresh)) = (
            read_trimmed(&self.token_path())?,
            read_trimmed(&self.refresh_path())?,
        ) else {
            return Ok(None);
        };
        Ok(Some(TokenPair::new(access, refresh)))
    }

    /// Saved refresh token alone.
    pub fn load_refresh_token(&self) -> Result<Option<SecretString>, ConfigError> {
        Ok(read_trimmed(&self.refresh_path())?.map(SecretString::from))
    }
}

fn read_trimmed(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(raw) => {
            let value = raw.trim();
            Ok((!value.is_empty()).then(|| value.to_owned()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::TokenFile {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write_private(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let to_err = |source| ConfigError::TokenFile {
        path: path.to_path_buf(),
        source,
    };
    fs::write(path, contents).map_err(to_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(to_err)?;
    }
    Ok(())
}
