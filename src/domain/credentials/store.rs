use std::fmt::Debug;

use crate::domain::session::SessionToken;
use crate::domain::DomainError;

/// Durable cell holding at most one session token
///
/// Implementations do no validation, expiry checking or encryption. Only the
/// session manager writes to a store.
pub trait CredentialStore: Send + Sync + Debug {
    /// Read the stored token. Absence is a normal state, and backends report
    /// unreadable contents as absence.
    fn get(&self) -> Option<SessionToken>;

    /// Overwrite the stored token
    fn set(&self, token: &SessionToken) -> Result<(), DomainError>;

    /// Remove the stored token. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), DomainError>;

    /// Get store name for logging/debugging
    fn store_name(&self) -> &'static str;
}
