use axum::{
    extract::{Extension, State},
    http::StatusCode,
};

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{Json, Path};
use crate::middleware::UserContext;
use crate::models::{CreateGroupTransaction, MarkPaid, PaymentMark, TransactionClosed, TransactionCreated};
use crate::response::ApiResponse;

pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<CreateGroupTransaction>,
) -> Result<(StatusCode, Json<ApiResponse<TransactionCreated>>)> {
    input.validate()?;

    let mut conn = state.db.get()?;
    let created = queries::create_group_transaction(&mut conn, ctx.user_id, &input)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

pub async fn close_transaction(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(transaction_id): Path<i64>,
) -> Result<Json<ApiResponse<TransactionClosed>>> {
    let mut conn = state.db.get()?;
    let closed = queries::close_group_transaction(&mut conn, transaction_id, ctx.user_id)?;

    tracing::info!(
        transaction_id,
        amount_cents = closed.amount_settled_cents,
        "Group transaction closed"
    );

    Ok(Json(ApiResponse::ok(closed)))
}

pub async fn mark_paid(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(transaction_id): Path<i64>,
    Json(input): Json<MarkPaid>,
) -> Result<Json<ApiResponse<PaymentMark>>> {
    let conn = state.db.get()?;
    let mark = queries::mark_transaction_paid(&conn, transaction_id, ctx.user_id, input.paid)?;
    Ok(Json(ApiResponse::ok(mark)))
}
