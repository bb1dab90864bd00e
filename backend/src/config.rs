//! Runtime configuration, read once at startup from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `SHEETVAULT_HOST` | `127.0.0.1` |
//! | `SHEETVAULT_PORT` (falls back to `PORT`) | `5000` |
//! | `SHEETVAULT_DATABASE` | `sheetvault.sqlite` |
//! | `SHEETVAULT_MAX_UPLOAD_BYTES` | 10 MiB |
//! | `SHEETVAULT_API_TOKENS` | empty |
//! | `SHEETVAULT_CORS_ORIGINS` | `http://localhost:3000` |
//!
//! `SHEETVAULT_API_TOKENS` is a comma separated list of `owner=token` pairs. Tokens are
//! issued by an external identity service; listing them here is how they get
//! provisioned into the token table.
//!
//! `SHEETVAULT_CORS_ORIGINS` is a comma separated list of browser origins allowed to
//! call the API, e.g. the origin the web client is served from.
//!
//! A `.env` file in the working directory, when present, is loaded into the process
//! environment by [`load_dotenv`] before anything else reads it. Variables already set
//! in the environment win over the file.

use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATABASE: &str = "sheetvault.sqlite";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024; // 10 MB
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub max_upload_bytes: usize,
    /// `(owner_id, token)` pairs to provision at startup.
    pub api_tokens: Vec<(String, String)>,
    /// Origins allowed to make cross-origin requests.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("SHEETVAULT_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match get("SHEETVAULT_PORT").map(|v| ("SHEETVAULT_PORT", v)).or_else(|| {
            get("PORT").map(|v| ("PORT", v))
        }) {
            Some((key, value)) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key, value })?,
            None => DEFAULT_PORT,
        };

        let database_path = get("SHEETVAULT_DATABASE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));

        let max_upload_bytes = match get("SHEETVAULT_MAX_UPLOAD_BYTES") {
            Some(value) => match value.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "SHEETVAULT_MAX_UPLOAD_BYTES",
                        value,
                    })
                }
            },
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let api_tokens = match get("SHEETVAULT_API_TOKENS") {
            Some(raw) => parse_api_tokens(&raw)?,
            None => Vec::new(),
        };

        let cors_origins = parse_cors_origins(
            &get("SHEETVAULT_CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
        )?;

        Ok(Self {
            host,
            port,
            database_path,
            max_upload_bytes,
            api_tokens,
            cors_origins,
        })
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn parse_api_tokens(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    let mut tokens = Vec::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let invalid = || ConfigError::Invalid {
            key: "SHEETVAULT_API_TOKENS",
            value: pair.to_string(),
        };
        let (owner, token) = pair.split_once('=').ok_or_else(invalid)?;
        let (owner, token) = (owner.trim(), token.trim());
        if owner.is_empty() || token.is_empty() {
            return Err(invalid());
        }
        tokens.push((owner.to_string(), token.to_string()));
    }
    Ok(tokens)
}

/// Loads `./.env` if there is one. Returns the loaded path, `Ok(None)` when no file exists.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    load_dotenv_from(Path::new(".env"))
}

fn load_dotenv_from(path: &Path) -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(Some(path.to_path_buf())),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

fn parse_cors_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|origin| {
            if origin.starts_with("http://") || origin.starts_with("https://") {
                Ok(origin.trim_end_matches('/').to_string())
            } else {
                Err(ConfigError::Invalid {
                    key: "SHEETVAULT_CORS_ORIGINS",
                    value: origin.to_string(),
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::uploads::UploadLimits;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.database_path, PathBuf::from("sheetvault.sqlite"));
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(UploadLimits::default().max_file_bytes, config.max_upload_bytes);
        assert!(config.api_tokens.is_empty());
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.url(), "http://127.0.0.1:5000");
    }

    #[test]
    fn generic_port_is_used_when_specific_one_is_missing() {
        assert_eq!(load(&[("PORT", "8081")]).unwrap().port, 8081);
        assert_eq!(
            load(&[("PORT", "8081"), ("SHEETVAULT_PORT", "9000")])
                .unwrap()
                .port,
            9000
        );
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert_eq!(
            load(&[("SHEETVAULT_PORT", "eighty")]),
            Err(ConfigError::Invalid {
                key: "SHEETVAULT_PORT",
                value: "eighty".to_string()
            })
        );
        assert!(load(&[("SHEETVAULT_MAX_UPLOAD_BYTES", "0")]).is_err());
    }

    #[test]
    fn api_tokens_are_parsed_as_owner_token_pairs() {
        let config = load(&[("SHEETVAULT_API_TOKENS", " alice=tok-a, bob = tok-b ,")]).unwrap();
        assert_eq!(
            config.api_tokens,
            vec![
                ("alice".to_string(), "tok-a".to_string()),
                ("bob".to_string(), "tok-b".to_string())
            ]
        );
        assert!(load(&[("SHEETVAULT_API_TOKENS", "alice")]).is_err());
        assert!(load(&[("SHEETVAULT_API_TOKENS", "=tok")]).is_err());
    }

    #[test]
    fn cors_origins_are_listed_without_trailing_slashes() {
        let config = load(&[(
            "SHEETVAULT_CORS_ORIGINS",
            "http://localhost:3000/, https://sheets.example.org",
        )])
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3000", "https://sheets.example.org"]
        );
        assert_eq!(
            load(&[("SHEETVAULT_CORS_ORIGINS", "localhost:3000")]),
            Err(ConfigError::Invalid {
                key: "SHEETVAULT_CORS_ORIGINS",
                value: "localhost:3000".to_string()
            })
        );
    }

    #[test]
    fn dotenv_file_fills_the_environment_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        assert_eq!(load_dotenv_from(&path).unwrap(), None);

        std::fs::write(&path, "SHEETVAULT_DOTENV_CHECK=from-file\n").unwrap();
        assert_eq!(load_dotenv_from(&path).unwrap(), Some(path.clone()));
        assert_eq!(
            std::env::var("SHEETVAULT_DOTENV_CHECK").as_deref(),
            Ok("from-file")
        );
    }
}
