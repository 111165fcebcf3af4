use serde::{Deserialize, Serialize};

/// Custom claims carried in a session token.
/// Standard claims (iss, sub, iat, exp) are handled by jwt-simple; `sub` is
/// the user id as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: i64,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}
