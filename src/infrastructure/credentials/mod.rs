//! Credential store implementations

mod file;
mod in_memory;

pub use file::FileCredentialStore;
pub use in_memory::InMemoryCredentialStore;
