use std::sync::RwLock;

use crate::domain::{CredentialStore, DomainError, SessionToken};

/// Credential store that lives as long as the process
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    token: RwLock<Option<SessionToken>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<SessionToken>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    fn lock_error() -> DomainError {
        DomainError::storage("Failed to acquire credential lock")
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self) -> Option<SessionToken> {
        self.token.read().ok().and_then(|token| token.clone())
    }

    fn set(&self, token: &SessionToken) -> Result<(), DomainError> {
        let mut slot = self.token.write().map_err(|_| Self::lock_error())?;
        *slot = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), DomainError> {
        let mut slot = self.token.write().map_err(|_| Self::lock_error())?;
        *slot = None;
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}
