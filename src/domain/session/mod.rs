//! Session domain: the opaque token and the authentication state machine's
//! states.

mod error;
mod state;
mod token;

pub use error::SessionError;
pub use state::AuthState;
pub use token::SessionToken;
