//! CLI configuration: JSON file, then environment, then flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use solace_transport_http::HttpTransport;
use solace_turn::{DEFAULT_QUOTA_MESSAGE, TurnConfig};

use crate::error::CliError;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "solace.json";

/// Settings for one CLI session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolaceConfig {
    /// Backend root URL.
    pub base_url: String,
    /// Override for the incremental endpoint path.
    pub stream_path: Option<String>,
    /// Override for the non-incremental endpoint path.
    pub turn_path: Option<String>,
    /// Account to chat as.
    pub user_id: String,
    /// Locale sent with every turn.
    pub locale: String,
    /// Retry inconclusive streams once without streaming.
    pub fallback_enabled: bool,
    /// Text shown for quota errors that carry none.
    pub quota_message: Option<String>,
    /// Bearer token for the backend.
    pub token: Option<String>,
}

impl Default for SolaceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".into(),
            stream_path: None,
            turn_path: None,
            user_id: "anonymous".into(),
            locale: "en".into(),
            fallback_enabled: true,
            quota_message: None,
            token: None,
        }
    }
}

impl SolaceConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_path(path: &Path) -> Result<Self, CliError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given, else [`DEFAULT_CONFIG_FILE`] if it exists,
    /// else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::from_path(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `SOLACE_*` overrides. `lookup` is normally `std::env::var`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("SOLACE_BASE_URL") {
            self.base_url = url;
        }
        if let Some(user) = lookup("SOLACE_USER_ID") {
            self.user_id = user;
        }
        if let Some(locale) = lookup("SOLACE_LOCALE") {
            self.locale = locale;
        }
        if let Some(token) = lookup("SOLACE_TOKEN") {
            self.token = Some(token);
        }
    }

    /// Controller configuration derived from these settings.
    pub fn turn_config(&self) -> TurnConfig {
        TurnConfig {
            user_id: self.user_id.as_str().into(),
            locale: self.locale.clone(),
            fallback_enabled: self.fallback_enabled,
            quota_message: self
                .quota_message
                .clone()
                .unwrap_or_else(|| DEFAULT_QUOTA_MESSAGE.to_string()),
        }
    }

    /// HTTP transport for the configured backend.
    pub fn transport(&self) -> HttpTransport {
        let mut transport = HttpTransport::new(self.base_url.clone());
        if let Some(path) = &self.stream_path {
            transport = transport.stream_path(path.clone());
        }
        if let Some(path) = &self.turn_path {
            transport = transport.turn_path(path.clone());
        }
        if let Some(token) = &self.token {
            transport = transport.bearer_token(token.clone());
        }
        transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"base_url":"https://chat.example.com","locale":"fr"}}"#).unwrap();

        let config = SolaceConfig::from_path(file.path()).unwrap();
        assert_eq!(config.base_url, "https://chat.example.com");
        assert_eq!(config.locale, "fr");
        assert_eq!(config.user_id, "anonymous");
        assert!(config.fallback_enabled);
    }

    #[test]
    fn invalid_file_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = SolaceConfig::from_path(file.path()).unwrap_err();
        match err {
            CliError::Config { path, .. } => assert_eq!(path, file.path()),
            other => panic!("expected Config, got: {other:?}"),
        }
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");

        let err = SolaceConfig::load(Some(&missing)).unwrap_err();
        match err {
            CliError::ConfigRead { path, source } => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected ConfigRead, got: {other:?}"),
        }
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("SOLACE_BASE_URL", "https://override.example.com"),
            ("SOLACE_TOKEN", "t0k"),
        ]
        .into_iter()
        .collect();

        let mut config = SolaceConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.base_url, "https://override.example.com");
        assert_eq!(config.token.as_deref(), Some("t0k"));
        assert_eq!(config.locale, "en");
    }

    #[test]
    fn turn_config_uses_default_quota_text() {
        let config = SolaceConfig {
            user_id: "u7".into(),
            fallback_enabled: false,
            ..SolaceConfig::default()
        };
        let turn = config.turn_config();
        assert_eq!(turn.user_id.as_str(), "u7");
        assert!(!turn.fallback_enabled);
        assert_eq!(turn.quota_message, DEFAULT_QUOTA_MESSAGE);
    }
}
