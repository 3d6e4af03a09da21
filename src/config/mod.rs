//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, CredentialsConfig, GuardConfig, IdentityConfig, LogFormat, LoggingConfig,
    SessionConfig,
};
