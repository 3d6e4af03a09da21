//! Identity service contract
//!
//! The remote identity service verifies passwords, issues tokens and owns
//! user records. This module only describes what the session core needs from
//! it.

mod client;
mod error;

pub use client::{AuthPayload, IdentityServiceClient};
pub use error::AuthError;

#[cfg(test)]
pub use client::mock;
