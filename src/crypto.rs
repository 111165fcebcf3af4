//! Password hashing and secret comparison.
//!
//! Passwords are stored as PBKDF2-HMAC-SHA256 with a random per-user salt:
//!
//! `pbkdf2-sha256$<iterations>$<salt hex>$<hash hex>`
//!
//! The iteration count travels with the hash, so raising
//! `PASSWORD_HASH_ITERATIONS` only affects newly hashed passwords.

use hmac::Hmac;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_SIZE: usize = 16;
const HASH_SIZE: usize = 32;

/// Default work factor for production.
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Hashes and verifies user passwords.
///
/// Cheap to clone; holds only the work factor.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_SIZE];
        OsRng.fill_bytes(&mut salt);
        let hash = pbkdf2(password.as_bytes(), &salt, self.iterations);
        format!(
            "{}${}${}${}",
            SCHEME,
            self.iterations,
            hex::encode(salt),
            hex::encode(hash)
        )
    }

    /// [`hash`](Self::hash) on the blocking pool, off the async workers.
    pub async fn hash_blocking(self, password: String) -> Result<String> {
        tokio::task::spawn_blocking(move || self.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))
    }

    /// [`verify`](Self::verify) on the blocking pool, off the async workers.
    pub async fn verify_blocking(self, password: String, stored: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || self.verify(&password, &stored))
            .await
            .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?
    }

    /// Check a password against a stored hash.
    ///
    /// Malformed stored values are an internal error, not a failed login,
    /// so they surface in logs instead of looking like a wrong password.
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool> {
        let mut parts = stored.split('$');
        let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(AppError::Internal("Malformed password hash".into()));
        };

        if scheme != SCHEME {
            return Err(AppError::Internal(format!(
                "Unsupported password hash scheme: {}",
                scheme
            )));
        }

        let iterations: u32 = iterations
            .parse()
            .map_err(|_| AppError::Internal("Malformed password hash iterations".into()))?;
        let salt = hex::decode(salt)
            .map_err(|_| AppError::Internal("Malformed password hash salt".into()))?;
        let expected = hex::decode(expected)
            .map_err(|_| AppError::Internal("Malformed password hash digest".into()))?;

        let actual = pbkdf2(password.as_bytes(), &salt, iterations.max(1));
        Ok(actual[..].ct_eq(&expected[..]).into())
    }
}

fn pbkdf2(password: &[u8], salt: &[u8], iterations: u32) -> [u8; HASH_SIZE] {
    let mut output = [0u8; HASH_SIZE];
    pbkdf2::pbkdf2::<HmacSha256>(password, salt, iterations, &mut output)
        .expect("HMAC can take key of any size");
    output
}

/// Constant-time comparison for shared secrets presented on requests.
pub fn secrets_match(presented: &str, expected: &str) -> bool {
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.as_slice().ct_eq(b.as_slice()).into()
}
