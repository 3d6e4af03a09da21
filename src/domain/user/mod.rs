//! User domain
//!
//! The identity record the session caches once the identity service has
//! confirmed who holds the current token.

mod entity;

pub use entity::{User, UserId};
