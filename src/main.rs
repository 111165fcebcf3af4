use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use housrcash::config::Config;
use housrcash::crypto::PasswordHasher;
use housrcash::db::{AppState, create_pool, init_db, queries, seed_catalog};
use housrcash::email::EmailService;
use housrcash::handlers;
use housrcash::jwt::SessionSigner;
use housrcash::models::RegisterUser;

const DEV_ADMIN_EMAIL: &str = "admin@housrcash.local";
const DEV_ADMIN_PASSWORD: &str = "housrcash-dev";
const DEV_ADMIN_POINTS: i64 = 5000;

#[derive(Parser, Debug)]
#[command(name = "housrcash")]
#[command(about = "Cashback rewards and shared household expenses")]
struct Cli {
    /// Seed the database with the sample reward catalog and a dev admin
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,

    /// Credit reward points to a user and exit: --grant-points <USER_ID> <POINTS>
    #[arg(long, num_args = 2, value_names = ["USER_ID", "POINTS"])]
    grant_points: Option<Vec<i64>>,
}

/// Promote the configured account to admin. The account must already exist.
fn bootstrap_admin(state: &AppState, email: &str) {
    let conn = state.db.get().expect("Failed to get db connection for bootstrap");
    match queries::set_user_admin(&conn, email, true) {
        Ok(true) => tracing::info!("Bootstrap admin granted to {}", email),
        Ok(false) => tracing::warn!(
            "BOOTSTRAP_ADMIN_EMAIL {} has no account yet; register it and restart",
            email
        ),
        Err(e) => tracing::error!("Failed to bootstrap admin {}: {}", email, e),
    }
}

/// Seeds the sample catalog and a dev admin with some points.
/// Only runs in dev mode; each part is skipped if it already exists.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    match seed_catalog(&conn) {
        Ok(true) => tracing::info!("Sample reward catalog created"),
        Ok(false) => tracing::info!("Rewards already exist, skipping catalog"),
        Err(e) => tracing::error!("Failed to seed reward catalog: {}", e),
    }

    let existing = queries::get_user_by_email(&conn, DEV_ADMIN_EMAIL)
        .expect("Failed to look up dev admin");
    if existing.is_some() {
        tracing::info!("Dev admin already exists, skipping");
        return;
    }

    let input = RegisterUser {
        email: DEV_ADMIN_EMAIL.to_string(),
        password: DEV_ADMIN_PASSWORD.to_string(),
        first_name: "Admin".to_string(),
    };
    let hash = state.password_hasher.hash(&input.password);
    let admin = queries::create_user(&conn, &input, &hash).expect("Failed to create dev admin");
    queries::set_user_admin(&conn, &admin.email, true).expect("Failed to promote dev admin");
    queries::grant_points(&conn, admin.id, DEV_ADMIN_POINTS).expect("Failed to grant dev points");

    tracing::info!("Dev admin: {} / {}", DEV_ADMIN_EMAIL, DEV_ADMIN_PASSWORD);
    tracing::info!("Dev admin balance: {} points", DEV_ADMIN_POINTS);
    tracing::info!("============================================");
}

fn cors_layer(config: &Config) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE];
    let headers = [header::AUTHORIZATION, header::CONTENT_TYPE];

    if config.cors_origins.is_empty() {
        if config.dev_mode {
            tracing::info!("CORS_ORIGINS not set, allowing any origin in dev mode");
            return CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(methods)
                .allow_headers(headers);
        }
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    // Credentials so the browser sends the session cookie
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(true)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "housrcash=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    // Admin tool: credit points without starting the server
    if let Some(args) = cli.grant_points.as_deref() {
        let [user_id, points] = args else {
            eprintln!("--grant-points takes <USER_ID> <POINTS>");
            std::process::exit(2);
        };
        let conn = db_pool.get().expect("Failed to get connection");
        match queries::grant_points(&conn, *user_id, *points) {
            Ok(balance) => {
                println!("Granted {} points to user {} (new balance: {})", points, user_id, balance);
                return;
            }
            Err(e) => {
                eprintln!("ERROR: {}", e);
                std::process::exit(1);
            }
        }
    }

    let state = AppState {
        db: db_pool,
        signer: SessionSigner::new(&config.jwt_secret, config.jwt_ttl_secs),
        password_hasher: PasswordHasher::new(config.password_hash_iterations),
        payment_ingest_key: config.payment_ingest_key.as_deref().map(Arc::from),
        email_service: Arc::new(EmailService::new(
            config.resend_api_key.clone(),
            config.email_from.clone(),
        )),
        secure_cookies: !config.dev_mode,
    };

    if state.payment_ingest_key.is_none() {
        tracing::info!("PAYMENT_INGEST_KEY not set, only admins can record payments");
    }
    if !state.email_service.is_enabled() {
        tracing::info!("RESEND_API_KEY not set, redemption receipts will be skipped");
    }

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set HOUSRCASH_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    if let Some(ref email) = config.bootstrap_admin_email {
        bootstrap_admin(&state, email);
    }

    let app = handlers::app(state, config.rate_limit).layer(cors_layer(&config));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("HousrCash server listening on {}", addr);

    // Connect info feeds the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
