//! Infrastructure layer - Credential stores, identity service adapters and
//! the session manager

pub mod credentials;
pub mod identity;
pub mod logging;
pub mod session;
