mod ingest_auth;
mod user_auth;

pub use ingest_auth::*;
pub use user_auth::*;

/// Name of the cookie carrying the session token.
pub const AUTH_COOKIE: &str = "auth-token";
