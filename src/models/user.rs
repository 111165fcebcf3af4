use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, msg};

/// Loose sanity check: one `@`, non-empty local part, dotted domain.
fn validate_email_format(email: &str) -> Result<()> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL_FORMAT.into()));
    };

    if local.is_empty()
        || local.contains(' ')
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL_FORMAT.into()));
    }

    Ok(())
}

/// Lower-cased, trimmed email used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    /// Reward points available to spend
    pub balance: i64,
    pub is_admin: bool,
    pub group_id: Option<i64>,
    /// Amount other members owe this user (cents)
    pub group_spend_cents: i64,
    /// Amount this user owes other members (cents)
    pub group_debt_cents: i64,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
}

impl RegisterUser {
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty()
            || self.password.is_empty()
            || self.first_name.trim().is_empty()
        {
            return Err(AppError::BadRequest(msg::MISSING_REGISTRATION_FIELDS.into()));
        }
        validate_email_format(self.email.trim())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Stored credentials for a login attempt.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub data: RegisteredUser,
    pub token: String,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: &'static str,
    pub user_id: i64,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub id: i64,
    pub email: String,
    pub balance: i64,
}
