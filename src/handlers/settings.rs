use std::collections::BTreeMap;

use axum::extract::{Extension, State};

use crate::db::{AppState, queries};
use crate::error::{OptionExt, Result, msg};
use crate::extractors::Json;
use crate::middleware::UserContext;
use crate::models::CashbackRate;
use crate::response::ApiResponse;

pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<BTreeMap<String, String>>>> {
    let conn = state.db.get()?;
    let settings = queries::list_settings(&conn)?
        .into_iter()
        .map(|s| (s.key, s.value))
        .collect();
    Ok(Json(ApiResponse::ok(settings)))
}

pub async fn get_cashback_rate(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CashbackRate>>> {
    let conn = state.db.get()?;
    let cashback_rate = queries::get_cashback_rate(&conn)?.or_not_found(msg::CASHBACK_RATE_NOT_FOUND)?;
    Ok(Json(ApiResponse::ok(CashbackRate { cashback_rate })))
}

pub async fn set_cashback_rate(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<CashbackRate>,
) -> Result<Json<ApiResponse<CashbackRate>>> {
    input.validate()?;

    let conn = state.db.get()?;
    queries::set_cashback_rate(&conn, &input)?;

    tracing::info!(
        cashback_rate = input.cashback_rate,
        admin_id = ctx.user_id,
        "Cashback rate updated"
    );

    Ok(Json(ApiResponse::ok(input)))
}
