use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

use super::OAUTH_PLAYGROUND_URL;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} is missing. {hint}")]
    Missing { name: &'static str, hint: String },
    #[error("cannot read client secret file {path}: {source}")]
    SecretFileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed client secret file {path}: {source}")]
    SecretFileParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{name} is not an RFC 3339 timestamp: {value}")]
    InvalidTimestamp { name: &'static str, value: String },
}

/// Read `PIXABAY_API_KEY` from the process environment.
pub fn search_api_key_from_env() -> Result<String, ConfigError> {
    search_api_key(|name| std::env::var(name).ok())
}

/// The search key on its own. Searching never needs the OAuth client.
pub fn search_api_key<F>(lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup("PIXABAY_API_KEY")
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::Missing {
            name: "PIXABAY_API_KEY",
            hint: "Set it as an environment variable (get a key at https://pixabay.com/api/docs/).".into(),
        })
}

/// OAuth secrets needed to publish.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Previously issued access token, if any.
    pub access_token: Option<String>,
    /// Expiry of `access_token`. Unknown expiry forces a refresh.
    pub access_token_expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &abbreviate(&self.client_id))
            .field("refresh_token", &"<redacted>")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("access_token_expires_at", &self.access_token_expires_at)
            .finish_non_exhaustive()
    }
}

/// The `web` / `installed` sections of a Google client secret download.
#[derive(Deserialize)]
struct ClientSecretFile {
    web: Option<ClientSecretSection>,
    installed: Option<ClientSecretSection>,
}

#[derive(Deserialize)]
struct ClientSecretSection {
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl Credentials {
    /// Load credentials from the process environment, falling back to a
    /// `client_secret*.json` file in `secrets_dir` for the OAuth client pair.
    pub fn from_env(secrets_dir: &Path) -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok(), secrets_dir)
    }

    /// Same as [`Credentials::from_env`] with an injectable variable lookup.
    pub fn from_lookup<F>(lookup: F, secrets_dir: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut client_id = var("YOUTUBE_CLIENT_ID");
        let mut client_secret = var("YOUTUBE_CLIENT_SECRET");

        if client_id.is_none() || client_secret.is_none() {
            if let Some((file_id, file_secret)) = read_client_secret_file(secrets_dir)? {
                client_id = client_id.or(file_id);
                client_secret = client_secret.or(file_secret);
            }
        }

        let client_id = client_id.ok_or_else(|| ConfigError::Missing {
            name: "YOUTUBE_CLIENT_ID",
            hint: "Set it as an environment variable or provide a client_secret*.json file.".into(),
        })?;
        let client_secret = client_secret.ok_or_else(|| ConfigError::Missing {
            name: "YOUTUBE_CLIENT_SECRET",
            hint: "Set it as an environment variable or provide a client_secret*.json file.".into(),
        })?;
        let refresh_token = var("YOUTUBE_REFRESH_TOKEN").ok_or_else(|| ConfigError::Missing {
            name: "YOUTUBE_REFRESH_TOKEN",
            hint: format!("Get one from the OAuth Playground: {OAUTH_PLAYGROUND_URL}"),
        })?;

        let access_token_expires_at = match var("YOUTUBE_ACCESS_TOKEN_EXPIRES_AT") {
            Some(value) => Some(
                DateTime::parse_from_rfc3339(value.trim())
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|_| ConfigError::InvalidTimestamp {
                        name: "YOUTUBE_ACCESS_TOKEN_EXPIRES_AT",
                        value,
                    })?,
            ),
            None => None,
        };

        Ok(Self {
            client_id,
            client_secret,
            refresh_token,
            access_token: var("YOUTUBE_ACCESS_TOKEN"),
            access_token_expires_at,
        })
    }
}

/// Find the first `client_secret*.json` in `dir` (by name) and pull the
/// client id/secret out of its `web` or `installed` section.
fn read_client_secret_file(
    dir: &Path,
) -> Result<Option<(Option<String>, Option<String>)>, ConfigError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("could not scan {} for client secret files: {}", dir.display(), e);
            return Ok(None);
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("client_secret") && n.ends_with(".json"))
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();

    let Some(path) = candidates.into_iter().next() else {
        return Ok(None);
    };

    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::SecretFileRead {
        path: path.clone(),
        source,
    })?;
    let parsed: ClientSecretFile =
        serde_json::from_str(&raw).map_err(|source| ConfigError::SecretFileParse {
            path: path.clone(),
            source,
        })?;

    info!("loaded OAuth client from {}", path.display());
    let section = parsed.web.or(parsed.installed);
    Ok(section.map(|s| (s.client_id, s.client_secret)))
}

fn abbreviate(value: &str) -> String {
    let head: String = value.chars().take(20).collect();
    if head.len() < value.len() {
        format!("{head}...")
    } else {
        head
    }
}
