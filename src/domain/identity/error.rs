use thiserror::Error;

/// Failures surfaced by the identity service, plus the one the session
/// manager itself produces when a result arrives for a session that no
/// longer exists.
///
/// Every variant renders a non-empty message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Login or registration rejected
    #[error("{}", or_fallback(.0, "Invalid credentials"))]
    InvalidCredentials(String),

    /// Request shape rejected server-side
    #[error("Request rejected: {}", or_fallback(.0, "validation failed"))]
    ValidationRejected(String),

    /// The service no longer accepts the session token
    #[error("Session token rejected: {}", or_fallback(.0, "token invalid"))]
    TokenInvalid(String),

    /// Transport-level failure reaching the service
    #[error("Identity service unreachable: {}", or_fallback(.0, "network failure"))]
    NetworkFailure(String),

    #[error("{}", or_fallback(.0, "Unexpected identity service error"))]
    Unknown(String),

    /// A logout happened while the request was in flight; its result was dropped
    #[error("Session changed while the request was in flight")]
    Superseded,
}

fn or_fallback<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    if message.trim().is_empty() {
        fallback
    } else {
        message
    }
}

impl AuthError {
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::InvalidCredentials(message.into())
    }

    pub fn validation_rejected(message: impl Into<String>) -> Self {
        Self::ValidationRejected(message.into())
    }

    pub fn token_invalid(message: impl Into<String>) -> Self {
        Self::TokenInvalid(message.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkFailure(message.into())
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown(message.into())
    }

    /// Message suitable for showing to the person who submitted the request
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Transport failures may succeed on retry; everything else is a verdict
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkFailure(_))
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCredentials(_) => "invalid_credentials",
            Self::ValidationRejected(_) => "validation_rejected",
            Self::TokenInvalid(_) => "token_invalid",
            Self::NetworkFailure(_) => "network_failure",
            Self::Unknown(_) => "unknown",
            Self::Superseded => "superseded",
        }
    }
}
