use serde::{Deserialize, Serialize};

use crate::domain::User;

/// Session changes the surrounding application may want to react to
///
/// Navigation is only ever requested through these events; the session
/// manager never performs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A login or registration opened a session
    SignedIn { user: User },
    /// A stored token was confirmed by the identity service
    Restored { user: User },
    ProfileUpdated { user: User },
    /// Explicit logout; the application should navigate to `redirect_to`
    SignedOut { redirect_to: String },
    /// The identity service rejected the stored token
    SessionExpired { redirect_to: String },
}

impl SessionEvent {
    /// Navigation target requested by this event, if any
    pub fn redirect_to(&self) -> Option<&str> {
        match self {
            Self::SignedOut { redirect_to } | Self::SessionExpired { redirect_to } => {
                Some(redirect_to.as_str())
            }
            _ => None,
        }
    }
}
