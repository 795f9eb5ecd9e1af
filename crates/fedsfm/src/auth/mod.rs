//! Authentication types and the login exchange.
//!
//! Login is the only call that presents the client certificate; everything
//! after it authenticates with the issued [`AccessToken`].

mod authenticator;
mod credentials;
mod token;

pub use authenticator::Authenticator;
pub use credentials::Credentials;
pub use token::AccessToken;
