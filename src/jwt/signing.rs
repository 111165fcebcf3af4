use jwt_simple::prelude::*;

use super::SessionClaims;
use crate::error::{AppError, Result};

/// Issuer stamped on every session token.
pub const ISSUER: &str = "housrcash";

/// Signs and verifies HS256 session tokens.
#[derive(Clone)]
pub struct SessionSigner {
    key: HS256Key,
    ttl_secs: u64,
}

impl SessionSigner {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            key: HS256Key::from_bytes(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a token for a user.
    pub fn sign(&self, claims: &SessionClaims) -> Result<String> {
        let jwt_claims =
            Claims::with_custom_claims(claims.clone(), Duration::from_secs(self.ttl_secs))
                .with_issuer(ISSUER)
                .with_subject(claims.user_id.to_string());

        self.key
            .authenticate(jwt_claims)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a token's signature, issuer and expiry and return its claims.
    ///
    /// Any failure maps to `Unauthorized`; the reason is only logged.
    pub fn verify(&self, token: &str) -> Result<SessionClaims> {
        let options = VerificationOptions {
            allowed_issuers: Some(HashSet::from_strings(&[ISSUER])),
            ..Default::default()
        };

        let claims = self
            .key
            .verify_token::<SessionClaims>(token, Some(options))
            .map_err(|e| {
                tracing::debug!("Rejected session token: {}", e);
                AppError::Unauthorized
            })?;

        // sub and the custom user_id must agree
        if claims.subject.as_deref() != Some(claims.custom.user_id.to_string().as_str()) {
            return Err(AppError::Unauthorized);
        }

        Ok(claims.custom)
    }
}
