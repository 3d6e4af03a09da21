//! Identity service adapters

mod graphql;
mod http_client;

pub use graphql::{GraphQlIdentityClient, DEFAULT_IDENTITY_ENDPOINT};
pub use http_client::{HttpClient, HttpClientTrait, TransportError};

#[cfg(test)]
pub use http_client::mock;
