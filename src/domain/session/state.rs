use serde::{Deserialize, Serialize};

use crate::domain::user::User;

/// Authentication state owned by the session manager
///
/// A rejected token is not a state of its own: it collapses straight back to
/// `Unauthenticated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "status", content = "user", rename_all = "snake_case")]
pub enum AuthState {
    /// No valid token, no user
    #[default]
    Unauthenticated,
    /// A token is stored but the identity service has not confirmed its user yet
    Resolving,
    /// Token and confirmed user are both present
    Authenticated(User),
}

impl AuthState {
    /// `Resolving` is the only transitional state. Consumers must neither
    /// redirect nor render protected content while it holds.
    pub fn is_transitional(&self) -> bool {
        matches!(self, Self::Resolving)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Resolving => "resolving",
            Self::Authenticated(_) => "authenticated",
        }
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
