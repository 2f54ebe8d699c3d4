//! Configuration loading and credential resolution
//!
//! Every path and credential resolves through the same priority order:
//! command-line argument, then environment variable, then TOML config file,
//! then compiled default (where a default makes sense). Provider credentials
//! have no default; a missing required credential is a fatal `Config` error
//! reported by the caller.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Optional TOML configuration file contents
///
/// All fields are optional; anything absent falls through to the next
/// resolution tier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to the SQLite database file
    pub database_path: Option<String>,
    /// Lyrics/metadata provider bearer token
    pub genius_token: Option<String>,
    /// Streaming metadata provider client credentials
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    /// Community tag provider API key
    pub lastfm_api_key: Option<String>,
    /// Industry data provider refresh token
    pub chartmetric_refresh_token: Option<String>,
}

/// Load the TOML config file
///
/// Uses the explicit path when given, otherwise looks for
/// `~/.config/hmdb/config.toml`. A missing file is not an error; it yields
/// an empty config so resolution falls through to environment variables.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit_path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(TomlConfig::default()),
        },
    };

    if !path.exists() {
        if explicit_path.is_some() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        debug!("No config file at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

    debug!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Default config file location for the platform
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hmdb").join("config.toml"))
}

/// Resolve the database path: CLI argument, `HMDB_DATABASE` environment
/// variable, TOML config, then the platform data directory.
pub fn resolve_database_path(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var("HMDB_DATABASE") {
        return PathBuf::from(path);
    }

    if let Some(path) = &config.database_path {
        return PathBuf::from(path);
    }

    dirs::data_local_dir()
        .map(|d| d.join("hmdb").join("hmdb.db"))
        .unwrap_or_else(|| PathBuf::from("./hmdb.db"))
}

/// Resolved API credentials for the external providers
///
/// Each provider is independently optional. The credit-enrichment entry
/// point requires the lyrics provider token and fails fast without it; the
/// genre classifier degrades to whichever providers are configured.
#[derive(Debug, Clone, Default)]
pub struct ApiCredentials {
    pub genius_token: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub lastfm_api_key: Option<String>,
    pub chartmetric_refresh_token: Option<String>,
}

impl ApiCredentials {
    /// Resolve credentials: environment variables take priority over the
    /// TOML config.
    pub fn resolve(config: &TomlConfig) -> Self {
        Self {
            genius_token: resolve_key("HMDB_GENIUS_TOKEN", config.genius_token.as_deref()),
            spotify_client_id: resolve_key(
                "HMDB_SPOTIFY_CLIENT_ID",
                config.spotify_client_id.as_deref(),
            ),
            spotify_client_secret: resolve_key(
                "HMDB_SPOTIFY_CLIENT_SECRET",
                config.spotify_client_secret.as_deref(),
            ),
            lastfm_api_key: resolve_key("HMDB_LASTFM_API_KEY", config.lastfm_api_key.as_deref()),
            chartmetric_refresh_token: resolve_key(
                "HMDB_CHARTMETRIC_REFRESH_TOKEN",
                config.chartmetric_refresh_token.as_deref(),
            ),
        }
    }

    /// Lyrics provider token, required for credit enrichment
    pub fn require_genius_token(&self) -> Result<&str> {
        self.genius_token.as_deref().ok_or_else(|| {
            Error::Config(
                "Lyrics provider token not configured. Set HMDB_GENIUS_TOKEN or \
                 genius_token in the config file."
                    .to_string(),
            )
        })
    }

    /// Streaming provider client-credential pair, if both halves are present
    pub fn spotify_pair(&self) -> Option<(&str, &str)> {
        match (
            self.spotify_client_id.as_deref(),
            self.spotify_client_secret.as_deref(),
        ) {
            (Some(id), Some(secret)) => Some((id, secret)),
            (Some(_), None) | (None, Some(_)) => {
                warn!("Streaming provider credentials incomplete (need both id and secret)");
                None
            }
            (None, None) => None,
        }
    }
}

fn resolve_key(env_var: &str, toml_value: Option<&str>) -> Option<String> {
    if let Ok(value) = std::env::var(env_var) {
        if is_valid_key(&value) {
            return Some(value);
        }
    }
    toml_value.filter(|v| is_valid_key(v)).map(String::from)
}

/// Validate an API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
