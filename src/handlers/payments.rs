use axum::{
    extract::{Extension, State},
    http::StatusCode,
};

use crate::db::{AppState, queries};
use crate::error::Result;
use crate::extractors::{Json, Path, Query};
use crate::middleware::{PaymentSource, UserContext};
use crate::models::{GrantPoints, Payment, PaymentRecorded, PointsGranted, RecordPayment};
use crate::pagination::{Paginated, PaginationQuery};
use crate::response::ApiResponse;

pub async fn record_payment(
    State(state): State<AppState>,
    Extension(source): Extension<PaymentSource>,
    Json(input): Json<RecordPayment>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentRecorded>>)> {
    input.validate()?;

    let mut conn = state.db.get()?;
    let recorded = queries::record_payment(&mut conn, &input)?;

    tracing::info!(
        payment_id = recorded.payment_id,
        user_id = recorded.user_id,
        points = recorded.points_awarded,
        source = ?source,
        "Payment recorded"
    );

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(recorded))))
}

pub async fn payment_history(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(user_id): Path<i64>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Paginated<Payment>>>> {
    ctx.require_self_or_admin(user_id)?;

    let conn = state.db.get()?;
    let limit = pagination.limit();
    let offset = pagination.offset();
    let (payments, total) = queries::list_payments_paginated(&conn, user_id, limit, offset)?;
    Ok(Json(ApiResponse::ok(Paginated::new(payments, total, limit, offset))))
}

pub async fn grant_points(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(user_id): Path<i64>,
    Json(input): Json<GrantPoints>,
) -> Result<Json<ApiResponse<PointsGranted>>> {
    input.validate()?;

    let conn = state.db.get()?;
    let new_balance = queries::grant_points(&conn, user_id, input.points)?;

    tracing::info!(user_id, points = input.points, admin_id = ctx.user_id, "Points granted");

    Ok(Json(ApiResponse::ok(PointsGranted {
        user_id,
        points: input.points,
        new_balance,
    })))
}
