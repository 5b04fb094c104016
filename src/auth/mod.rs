//! Authentication gate and delegated token acquisition.

pub mod gate;
pub mod token;

pub use gate::{AuthGate, ConsentChallenge, Principal, PrincipalAuthGate, REQUIRED_SCOPES};
pub use token::{AccessToken, BearerTokenSource, CachedTokenSource, TokenSource};
