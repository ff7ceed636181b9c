//! Anonymous player identity.
//!
//! An [`IdentityProvider`] turns an anonymous sign-in request into a
//! [`Session`]. Two providers ship with the crate:
//! - [`LocalIdentityProvider`] keeps a generated player id in the workspace
//! - [`HttpIdentityProvider`] signs in against a remote authentication service

mod error;
mod http;
mod local;
mod session;

pub use error::{AuthError, AuthResult};
pub use http::HttpIdentityProvider;
pub use local::LocalIdentityProvider;
pub use session::Session;

use async_trait::async_trait;

/// Source of authenticated player sessions.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign the player in without credentials.
    ///
    /// Providers that can remember a player between runs return the same
    /// player id on every call.
    async fn sign_in_anonymously(&self) -> AuthResult<Session>;
}
