use std::env;

/// Fallback signing secret, only accepted in dev mode.
const DEV_JWT_SECRET: &str = "housrcash-dev-secret-do-not-use-in-prod";

/// Rate limiting for the unauthenticated login/registration endpoints.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Requests per minute per IP. 0 disables rate limiting.
    pub auth_rpm: u32,
}

impl RateLimitConfig {
    pub fn disabled() -> Self {
        Self { auth_rpm: 0 }
    }

    pub fn is_enabled(&self) -> bool {
        self.auth_rpm > 0
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { auth_rpm: 20 }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub jwt_secret: String,
    pub jwt_ttl_secs: u64,
    pub cors_origins: Vec<String>,
    /// Shared secret for the payment ingestion endpoint (None = admin only)
    pub payment_ingest_key: Option<String>,
    pub bootstrap_admin_email: Option<String>,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub password_hash_iterations: u32,
    pub rate_limit: RateLimitConfig,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("HOUSRCASH_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(4000);

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if dev_mode => {
                tracing::warn!("JWT_SECRET not set, using the development fallback secret");
                DEV_JWT_SECRET.to_string()
            }
            _ => panic!("JWT_SECRET must be set outside dev mode"),
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let rate_limit = RateLimitConfig {
            auth_rpm: env::var("RATE_LIMIT_AUTH_RPM")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(RateLimitConfig::default().auth_rpm),
        };

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "housrcash.db".to_string()),
            jwt_secret,
            jwt_ttl_secs: env::var("JWT_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            cors_origins,
            payment_ingest_key: env::var("PAYMENT_INGEST_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            resend_api_key: env::var("RESEND_API_KEY").ok().filter(|k| !k.is_empty()),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "HousrCash <rewards@housrcash.local>".to_string()),
            password_hash_iterations: env::var("PASSWORD_HASH_ITERATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(100_000),
            rate_limit,
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
