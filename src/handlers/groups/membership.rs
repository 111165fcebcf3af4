use axum::{
    extract::{Extension, State},
    http::StatusCode,
};

use crate::db::{AppState, queries};
use crate::error::{Result, msg};
use crate::extractors::{Json, Path};
use crate::middleware::UserContext;
use crate::models::{CreateGroup, GroupCreated, GroupJoined, InviteCode, JoinGroup};
use crate::response::ApiResponse;

pub async fn create_group(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<CreateGroup>,
) -> Result<(StatusCode, Json<ApiResponse<GroupCreated>>)> {
    input.validate()?;

    let mut conn = state.db.get()?;
    let created = queries::create_group(&mut conn, ctx.user_id, &input)?;

    tracing::info!(group_id = created.group_id, creator_id = ctx.user_id, "Group created");

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

pub async fn join_group(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<JoinGroup>,
) -> Result<Json<ApiResponse<GroupJoined>>> {
    let mut conn = state.db.get()?;
    let joined = queries::join_group(&mut conn, ctx.user_id, &input.invite_code)?;

    tracing::info!(group_id = joined.group_id, user_id = ctx.user_id, "User joined group");

    Ok(Json(ApiResponse::ok(joined)))
}

#[derive(serde::Serialize)]
pub struct LeftGroup {
    pub group_id: i64,
    pub user_id: i64,
}

pub async fn leave_group(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<ApiResponse<LeftGroup>>> {
    let mut conn = state.db.get()?;
    let group_id = queries::leave_group(&mut conn, ctx.user_id)?;

    tracing::info!(group_id, user_id = ctx.user_id, "User left group");

    Ok(Json(ApiResponse::with_message(
        msg::GROUP_LEFT,
        LeftGroup {
            group_id,
            user_id: ctx.user_id,
        },
    )))
}

#[derive(serde::Serialize)]
pub struct DeletedGroup {
    pub group_id: i64,
}

pub async fn delete_group(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(group_id): Path<i64>,
) -> Result<Json<ApiResponse<DeletedGroup>>> {
    let mut conn = state.db.get()?;
    queries::delete_group(&mut conn, group_id, ctx.user_id)?;

    tracing::info!(group_id, deleted_by = ctx.user_id, "Group deleted");

    Ok(Json(ApiResponse::with_message(
        msg::GROUP_DELETED,
        DeletedGroup { group_id },
    )))
}

pub async fn get_invite_code(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(group_id): Path<i64>,
) -> Result<Json<ApiResponse<InviteCode>>> {
    let conn = state.db.get()?;
    let code = queries::get_invite_code(&conn, group_id, ctx.user_id)?;
    Ok(Json(ApiResponse::ok(code)))
}
