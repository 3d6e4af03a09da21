use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::guard::{DEFAULT_HOME_PATH, DEFAULT_LOGIN_PATH};
use crate::domain::SessionGuard;
use crate::infrastructure::identity::DEFAULT_IDENTITY_ENDPOINT;
use crate::infrastructure::session::SessionOptions;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub identity: IdentityConfig,
    pub credentials: CredentialsConfig,
    pub guard: GuardConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// Where and how to reach the identity service
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub endpoint: String,
    /// Transport timeout per request; `None` waits indefinitely
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// File holding the session token between runs
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub login_path: String,
    pub home_path: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SessionConfig {
    pub retain_on_network_failure: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_IDENTITY_ENDPOINT.to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".session/token.json"),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            home_path: DEFAULT_HOME_PATH.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl IdentityConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl GuardConfig {
    pub fn guard(&self) -> SessionGuard {
        SessionGuard::new(&self.login_path, &self.home_path)
    }
}

impl AppConfig {
    /// Layered load: `config/default`, `config/local`, `APP__*` environment
    /// variables, then `API_URL` for the identity endpoint.
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("identity.endpoint", std::env::var("API_URL").ok())?
            .build()?;

        config.try_deserialize()
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            redirect_to: self.guard.login_path.clone(),
            retain_on_network_failure: self.session.retain_on_network_failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{Config, File, FileFormat};

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.identity.endpoint, "http://localhost:4000/graphql");
        assert!(config.identity.timeout().is_none());
        assert_eq!(config.credentials.path, PathBuf::from(".session/token.json"));
        assert_eq!(config.guard.login_path, "/login");
        assert!(!config.session.retain_on_network_failure);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let source = r#"
            [identity]
            endpoint = "https://id.example.com/graphql"
            timeout_secs = 5

            [session]
            retain_on_network_failure = true

            [logging]
            format = "json"
        "#;

        let config: AppConfig = Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.identity.endpoint, "https://id.example.com/graphql");
        assert_eq!(config.identity.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.guard.home_path, "/dashboard");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "warn");

        let options = config.session_options();
        assert!(options.retain_on_network_failure);
        assert_eq!(options.redirect_to, "/login");
    }

    #[test]
    fn test_guard_from_config() {
        let config = GuardConfig {
            login_path: "/signin".to_string(),
            home_path: "/home".to_string(),
        };

        let guard = config.guard();
        assert_eq!(guard.login_path(), "/signin");
        assert_eq!(guard.home_path(), "/home");
    }
}
