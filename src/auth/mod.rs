//! Request authentication
//!
//! API key, Basic, static bearer, and session login. A session login
//! exchanges a JSON body for a token that is cached until it nears expiry.

mod authenticator;
mod types;

pub use authenticator::{scalar_at, Authenticator};
pub use types::{AuthConfig, CachedToken, Location, SessionLogin, EXPIRY_MARGIN_SECS};
