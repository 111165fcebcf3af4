use axum::extract::{Extension, State};

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path};
use crate::middleware::UserContext;
use crate::models::{CreditEntry, DebtEntry, GroupDetails, GroupTransactionEntry, Ledger};
use crate::response::ApiResponse;

pub async fn group_details(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Option<GroupDetails>>>> {
    ctx.require_self_or_admin(user_id)?;

    let conn = state.db.get()?;
    Ok(Json(match queries::group_details(&conn, user_id)? {
        Some(details) => ApiResponse::ok(Some(details)),
        None => ApiResponse::with_message(msg::NOT_IN_GROUP_DETAILS, None),
    }))
}

pub async fn user_debts(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Ledger<DebtEntry>>>> {
    ctx.require_self_or_admin(user_id)?;

    let conn = state.db.get()?;
    Ok(Json(ApiResponse::ok(queries::user_debts(&conn, user_id)?)))
}

pub async fn user_credits(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Ledger<CreditEntry>>>> {
    ctx.require_self_or_admin(user_id)?;

    let conn = state.db.get()?;
    Ok(Json(ApiResponse::ok(queries::user_credits(&conn, user_id)?)))
}

pub async fn group_transactions(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(group_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<GroupTransactionEntry>>>> {
    let conn = state.db.get()?;
    queries::get_group_by_id(&conn, group_id)?.or_not_found(msg::GROUP_NOT_FOUND)?;

    if !ctx.is_admin {
        let actor = queries::get_user_by_id(&conn, ctx.user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
        if actor.group_id != Some(group_id) {
            return Err(AppError::Forbidden(msg::NOT_GROUP_MEMBER.into()));
        }
    }

    Ok(Json(ApiResponse::ok(queries::list_group_transactions(&conn, group_id)?)))
}
