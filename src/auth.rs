//! Token material produced by the authorization-code exchange.

pub mod grant;
pub mod secret;

pub use grant::*;
pub use secret::*;
