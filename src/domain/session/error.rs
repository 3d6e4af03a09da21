use thiserror::Error;

use crate::domain::identity::AuthError;

/// Errors from session operations that need an established session
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No authenticated session")]
    NotAuthenticated,

    #[error(transparent)]
    Auth(#[from] AuthError),
}
