//! Session credential persistence domain

mod store;

pub use store::CredentialStore;

#[cfg(test)]
pub use store::mock;
