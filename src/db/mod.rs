mod from_row;
pub mod queries;
mod schema;
mod seed;

pub use from_row::{FromRow, query_all, query_one};
pub use schema::init_db;
pub use seed::seed_catalog;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::crypto::PasswordHasher;
use crate::email::EmailService;
use crate::jwt::SessionSigner;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Issues and verifies session tokens
    pub signer: SessionSigner,
    pub password_hasher: PasswordHasher,
    /// Shared secret accepted on the payment ingestion endpoint (None = admin only)
    pub payment_ingest_key: Option<Arc<str>>,
    pub email_service: Arc<EmailService>,
    /// Set the `Secure` flag on the session cookie
    pub secure_cookies: bool,
}

/// Build a connection pool. Every connection enforces foreign keys.
pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;"));
    Pool::builder().max_size(10).build(manager)
}
