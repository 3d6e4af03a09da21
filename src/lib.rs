//! Identity Session
//!
//! Authenticates users against a remote identity service and keeps a single,
//! observable session state for the rest of an application:
//! - Persisted session token (file or in-memory)
//! - GraphQL identity service client
//! - Session state machine with stale-response protection
//! - Stateless view guard

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{
    AuthError, AuthState, CredentialStore, GuardDecision, IdentityServiceClient, SessionGuard,
    SessionToken, User, ViewKind,
};
pub use infrastructure::session::{SessionEvent, SessionManager, SessionOptions};
