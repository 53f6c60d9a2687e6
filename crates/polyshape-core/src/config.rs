//! Configuration types for the admin components.
//!
//! Settings are layered: built-in defaults, then the TOML config file, then
//! environment variables and command-line flags (applied by the CLI).
//!
//! ```toml
//! api_root = "https://example.com/api"
//! token = "eyJ..."
//! logout_url = "https://idp.example.com/v2/logout?returnTo=https%3A%2F%2Fexample.com"
//!
//! [http]
//! timeout_secs = 30
//!
//! [session]
//! enabled = true
//! idle_timeout_secs = 600
//! warning_secs = 60
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;

/// HTTP client configuration for API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Inactivity auto-logout configuration.
///
/// Auto-logout is off in debug builds unless the config file enables it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub enabled: bool,
    pub idle_timeout: Duration,
    /// How long before expiry the warning appears.
    pub warning: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: !cfg!(debug_assertions),
            idle_timeout: Duration::from_secs(10 * 60),
            warning: Duration::from_secs(60),
        }
    }
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub api_root: Option<String>,
    pub token: Option<String>,
    pub logout_url: Option<String>,
    #[serde(default)]
    pub http: HttpSection,
    #[serde(default)]
    pub session: SessionSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    pub enabled: Option<bool>,
    pub idle_timeout_secs: Option<u64>,
    pub warning_secs: Option<u64>,
}

/// Resolved settings shared by the client and the shell.
#[derive(Debug, Clone, Default)]
pub struct AdminConfig {
    pub api_root: Option<String>,
    pub token: Option<String>,
    pub logout_url: Option<String>,
    pub http: HttpConfig,
    pub session: SessionConfig,
}

impl AdminConfig {
    /// Applies a config file on top of the defaults.
    pub fn from_file(file: ConfigFile) -> Result<Self, AppError> {
        let defaults = AdminConfig::default();

        let http = HttpConfig {
            timeout: file
                .http
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.http.timeout),
        };
        if http.timeout.is_zero() {
            return Err(AppError::ConfigError(
                "http.timeout_secs must be greater than zero".to_string(),
            ));
        }

        let session = SessionConfig {
            enabled: file.session.enabled.unwrap_or(defaults.session.enabled),
            idle_timeout: file
                .session
                .idle_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.session.idle_timeout),
            warning: file
                .session
                .warning_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.session.warning),
        };
        if session.warning >= session.idle_timeout {
            return Err(AppError::ConfigError(format!(
                "session.warning_secs ({}) must be shorter than session.idle_timeout_secs ({})",
                session.warning.as_secs(),
                session.idle_timeout.as_secs()
            )));
        }

        Ok(Self {
            api_root: file.api_root.filter(|s| !s.trim().is_empty()),
            token: file.token.filter(|s| !s.trim().is_empty()),
            logout_url: file.logout_url.filter(|s| !s.trim().is_empty()),
            http,
            session,
        })
    }
}

/// Default location of the config file: `<config dir>/polyshape/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("polyshape").join("config.toml"))
}

/// Loads and resolves a config file.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_config(path: &Path) -> Result<Option<AdminConfig>, AppError> {
    if !path.exists() {
        debug!("No config file at {}", path.display());
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::ConfigError(format!("cannot read {}: {}", path.display(), e))
    })?;
    let file: ConfigFile = toml::from_str(&raw)
        .map_err(|e| AppError::ConfigError(format!("{}: {}", path.display(), e)))?;

    debug!("Loaded config from {}", path.display());
    AdminConfig::from_file(file).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
        assert_eq!(config.warning, Duration::from_secs(60));
        assert_eq!(config.enabled, !cfg!(debug_assertions));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(&dir.path().join("config.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_load_full_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
api_root = "https://example.com/api"
token = "secret"

[http]
timeout_secs = 5

[session]
enabled = true
idle_timeout_secs = 120
warning_secs = 20
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap().unwrap();
        assert_eq!(config.api_root.as_deref(), Some("https://example.com/api"));
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert!(config.logout_url.is_none());
        assert_eq!(config.http.timeout, Duration::from_secs(5));
        assert!(config.session.enabled);
        assert_eq!(config.session.idle_timeout, Duration::from_secs(120));
        assert_eq!(config.session.warning, Duration::from_secs(20));
    }

    #[test]
    fn test_rejects_warning_longer_than_timeout() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nidle_timeout_secs = 30\nwarning_secs = 30").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "api_rot = \"typo\"").unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let file = ConfigFile {
            token: Some("  ".to_string()),
            ..ConfigFile::default()
        };
        let config = AdminConfig::from_file(file).unwrap();
        assert!(config.token.is_none());
    }
}
