//! View guard
//!
//! Maps the current [`AuthState`] to what a view may do. It holds no state of
//! its own and must be re-evaluated whenever the session state changes.

use serde::{Deserialize, Serialize};

use crate::domain::session::AuthState;

pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_HOME_PATH: &str = "/dashboard";

/// Kind of view being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Requires an authenticated user
    Protected,
    /// Open to everyone
    Public,
    /// Login and registration pages, pointless once signed in
    GuestOnly,
}

/// Outcome of guarding a view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "target", rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    /// Session still resolving: render nothing and do not redirect yet
    AllowPending,
    Redirect(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGuard {
    login_path: String,
    home_path: String,
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new(DEFAULT_LOGIN_PATH, DEFAULT_HOME_PATH)
    }
}

impl SessionGuard {
    pub fn new(login_path: impl Into<String>, home_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
            home_path: home_path.into(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn home_path(&self) -> &str {
        &self.home_path
    }

    pub fn evaluate(&self, state: &AuthState, view: ViewKind) -> GuardDecision {
        match (state, view) {
            (AuthState::Resolving, _) => GuardDecision::AllowPending,
            (AuthState::Unauthenticated, ViewKind::Protected) => {
                GuardDecision::Redirect(self.login_path.clone())
            }
            (AuthState::Authenticated(_), ViewKind::GuestOnly) => {
                GuardDecision::Redirect(self.home_path.clone())
            }
            _ => GuardDecision::Allow,
        }
    }
}
