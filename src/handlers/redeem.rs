use axum::extract::{Extension, State};

use crate::db::{AppState, queries};
use crate::email::RedemptionReceipt;
use crate::error::{OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::middleware::UserContext;
use crate::models::{RedeemRequest, Redemption, RedemptionHistory, RedemptionHistoryQuery};
use crate::response::ApiResponse;

pub async fn redeem(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Json(input): Json<RedeemRequest>,
) -> Result<Json<ApiResponse<Redemption>>> {
    let mut conn = state.db.get()?;
    let redemption = queries::redeem_reward(&mut conn, ctx.user_id, input.reward_id)?;
    let user = queries::get_user_by_id(&conn, ctx.user_id)?.or_not_found(msg::USER_NOT_FOUND)?;

    tracing::info!(
        redemption_id = redemption.redemption_id,
        user_id = ctx.user_id,
        reward_id = redemption.reward_id,
        points = redemption.points_spent,
        "Reward redeemed"
    );

    // Receipt delivery never affects the redemption outcome
    let receipt = RedemptionReceipt {
        to_email: user.email,
        first_name: user.first_name,
        reward_title: redemption.reward_title.clone(),
        points_spent: redemption.points_spent,
        previous_balance: redemption.previous_balance,
        new_balance: redemption.new_balance,
    };
    let email_service = state.email_service.clone();
    tokio::spawn(async move {
        if let Err(e) = email_service.send_redemption_receipt(&receipt).await {
            tracing::warn!(error = %e, to = %receipt.to_email, "Failed to send redemption receipt");
        }
    });

    Ok(Json(ApiResponse::ok(redemption)))
}

pub async fn redemption_history(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(user_id): Path<i64>,
    Query(query): Query<RedemptionHistoryQuery>,
) -> Result<Json<ApiResponse<RedemptionHistory>>> {
    ctx.require_self_or_admin(user_id)?;
    let (start, end) = query.bounds()?;

    let conn = state.db.get()?;
    let redemptions = queries::list_redemptions(&conn, user_id, start, end)?;
    Ok(Json(ApiResponse::ok(RedemptionHistory { redemptions })))
}
