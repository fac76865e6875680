//! Credential and token management
//!
//! Credentials are provisioned per location in the credential store; only
//! the cached bearer token and its creation time are ever written back.
//! The `CredentialResolver` reads the record, checks token age against the
//! server-reported clock, and refreshes through the `TokenIssuer` when the
//! cache TTL has passed.

mod issuer;
mod resolver;
mod types;

pub use issuer::{OauthTokenIssuer, TokenIssuer};
pub use resolver::CredentialResolver;
pub use types::CredentialRecord;
