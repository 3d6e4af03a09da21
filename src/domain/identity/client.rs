use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::AuthError;
use crate::domain::session::SessionToken;
use crate::domain::user::{User, UserId};

/// Successful login/register answer: the issued token and its user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: SessionToken,
    pub user: User,
}

impl AuthPayload {
    pub fn new(token: impl Into<SessionToken>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }
}

/// Contract the session core needs from the remote identity service
///
/// The service is the sole authority on whether a token is still valid.
#[async_trait]
pub trait IdentityServiceClient: Send + Sync + Debug {
    /// Exchange credentials for a session token
    async fn login(&self, email: &str, password: &str) -> Result<AuthPayload, AuthError>;

    /// Create an account and open a session for it
    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthPayload, AuthError>;

    /// Resolve the user behind a token
    async fn fetch_current_user(&self, token: &SessionToken) -> Result<User, AuthError>;

    /// Profile edit: replace name and email of the given user
    async fn update_user(
        &self,
        token: &SessionToken,
        id: &UserId,
        name: &str,
        email: &str,
    ) -> Result<User, AuthError>;

    /// Get client name for logging/debugging
    fn client_name(&self) -> &'static str;
}
