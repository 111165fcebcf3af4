use axum::{
    extract::{Extension, State},
    http::StatusCode,
};

use crate::db::{AppState, queries};
use crate::error::{OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::middleware::UserContext;
use crate::models::{Category, CreateReward, Favourite, Reward, RewardListQuery, UpdateReward};
use crate::pagination::CursorPage;
use crate::response::ApiResponse;

pub async fn list_rewards(
    State(state): State<AppState>,
    Query(query): Query<RewardListQuery>,
) -> Result<Json<ApiResponse<CursorPage<Reward>>>> {
    let conn = state.db.get()?;
    Ok(Json(ApiResponse::ok(queries::list_rewards(&conn, &query)?)))
}

pub async fn get_reward(
    State(state): State<AppState>,
    Path(reward_id): Path<i64>,
) -> Result<Json<ApiResponse<Reward>>> {
    let conn = state.db.get()?;
    let reward = queries::get_reward_by_id(&conn, reward_id)?.or_not_found(msg::REWARD_NOT_FOUND)?;
    Ok(Json(ApiResponse::ok(reward)))
}

pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Category>>>> {
    let conn = state.db.get()?;
    Ok(Json(ApiResponse::ok(queries::list_categories(&conn)?)))
}

pub async fn create_reward(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<CreateReward>,
) -> Result<(StatusCode, Json<ApiResponse<Reward>>)> {
    input.validate()?;

    let conn = state.db.get()?;
    let reward = queries::create_reward(&conn, &input)?;

    tracing::info!(reward_id = reward.id, admin_id = ctx.user_id, "Reward created");

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(reward))))
}

pub async fn update_reward(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(reward_id): Path<i64>,
    Json(input): Json<UpdateReward>,
) -> Result<Json<ApiResponse<Reward>>> {
    input.validate()?;

    let conn = state.db.get()?;
    let reward = queries::update_reward(&conn, reward_id, &input)?.or_not_found(msg::REWARD_NOT_FOUND)?;

    tracing::info!(reward_id, admin_id = ctx.user_id, "Reward updated");

    Ok(Json(ApiResponse::ok(reward)))
}

// ============ Favourites ============

pub async fn list_favourites(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<ApiResponse<Vec<Reward>>>> {
    let conn = state.db.get()?;
    Ok(Json(ApiResponse::ok(queries::list_favourite_rewards(&conn, ctx.user_id)?)))
}

pub async fn add_favourite(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(reward_id): Path<i64>,
) -> Result<Json<ApiResponse<Favourite>>> {
    let conn = state.db.get()?;
    let favourite = queries::add_favourite(&conn, ctx.user_id, reward_id)?;
    Ok(Json(ApiResponse::ok(favourite)))
}

#[derive(serde::Serialize)]
pub struct FavouriteRemoved {
    pub reward_id: i64,
    pub removed: bool,
}

pub async fn remove_favourite(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(reward_id): Path<i64>,
) -> Result<Json<ApiResponse<FavouriteRemoved>>> {
    let conn = state.db.get()?;
    let removed = queries::remove_favourite(&conn, ctx.user_id, reward_id)?;
    Ok(Json(ApiResponse::ok(FavouriteRemoved { reward_id, removed })))
}
