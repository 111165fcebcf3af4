pub mod groups;
pub mod payments;
pub mod redeem;
pub mod rewards;
pub mod settings;
pub mod users;

use axum::{
    Json, Router, middleware,
    routing::{delete, get, post, put},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::config::RateLimitConfig;
use crate::db::AppState;
use crate::middleware::{admin_auth, payment_ingest_auth, user_auth};
use crate::rate_limit;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Login and registration, rate limited per IP when enabled.
fn auth_router(rate_limit: RateLimitConfig) -> Router<AppState> {
    let router = Router::new()
        .route("/users/register", post(users::register))
        .route("/users/login", post(users::login));

    if rate_limit.is_enabled() {
        router.layer(rate_limit::auth_layer(rate_limit.auth_rpm))
    } else {
        router
    }
}

fn public_router() -> Router<AppState> {
    Router::new()
        .route("/users/logout", post(users::logout))
        .route("/rewards", get(rewards::list_rewards))
        .route("/rewards/categories", get(rewards::list_categories))
        .route("/rewards/{reward_id}", get(rewards::get_reward))
        .route("/settings", get(settings::get_settings))
        .route("/settings/cashback-rate", get(settings::get_cashback_rate))
}

fn user_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users/me", get(users::me))
        .route("/users/{user_id}/balance", get(users::get_balance))
        .route("/rewards/favourites", get(rewards::list_favourites))
        .route("/rewards/{reward_id}/favourite", post(rewards::add_favourite))
        .route("/rewards/{reward_id}/favourite", delete(rewards::remove_favourite))
        .route("/payments/user/{user_id}", get(payments::payment_history))
        .route("/redeem", post(redeem::redeem))
        .route("/redeem/history/{user_id}", get(redeem::redemption_history))
        .layer(middleware::from_fn_with_state(state, user_auth))
}

fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/rewards", post(rewards::create_reward))
        .route("/rewards/{reward_id}", put(rewards::update_reward))
        .route("/settings/cashback-rate", put(settings::set_cashback_rate))
        .route("/users/{user_id}/points", post(payments::grant_points))
        .layer(middleware::from_fn_with_state(state, admin_auth))
}

fn ingest_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/payments", post(payments::record_payment))
        .layer(middleware::from_fn_with_state(state, payment_ingest_auth))
}

/// The complete application: `/health` plus everything under `/api/v0`.
pub fn app(state: AppState, rate_limit: RateLimitConfig) -> Router {
    let api = Router::new()
        .merge(auth_router(rate_limit))
        .merge(public_router())
        .merge(user_router(state.clone()))
        .merge(admin_router(state.clone()))
        .merge(ingest_router(state.clone()))
        .merge(groups::router(state.clone()));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v0", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
