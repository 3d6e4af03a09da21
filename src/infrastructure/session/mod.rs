//! Session state management

mod events;
mod manager;

pub use events::SessionEvent;
pub use manager::{GenerationMarker, Reconciliation, SessionManager, SessionOptions};
