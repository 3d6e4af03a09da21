//! Domain layer - Core session entities and collaborator contracts

pub mod credentials;
pub mod error;
pub mod guard;
pub mod identity;
pub mod session;
pub mod user;

pub use credentials::CredentialStore;
pub use error::DomainError;
pub use guard::{GuardDecision, SessionGuard, ViewKind};
pub use identity::{AuthError, AuthPayload, IdentityServiceClient};
pub use session::{AuthState, SessionError, SessionToken};
pub use user::{User, UserId};
