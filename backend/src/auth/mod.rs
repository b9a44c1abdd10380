//! Authentication module
//!
//! Argon2id credential hashing, HS256 access tokens, opaque refresh tokens
//! and the bearer token gate. The session lifecycle built from these lives in
//! [`crate::services::AuthService`].

mod clock;
mod error;
mod jwt;
mod middleware;
mod password;
mod refresh;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::AuthError;
pub use jwt::{Claims, TokenCodec, TokenError};
pub use middleware::{auth_middleware, authenticate, AuthUser};
pub use password::{PasswordError, PasswordService};
pub use refresh::generate_refresh_token;
