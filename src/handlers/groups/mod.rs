mod balances;
mod membership;
mod transactions;

pub use balances::*;
pub use membership::*;
pub use transactions::*;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::db::AppState;
use crate::middleware::user_auth;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // Membership
        .route("/groups", post(create_group))
        .route("/groups/join", post(join_group))
        .route("/groups/leave", post(leave_group))
        .route("/groups/{group_id}", delete(delete_group))
        .route("/groups/{group_id}/invite-code", get(get_invite_code))
        // Transactions
        .route("/groups/transactions", post(create_transaction))
        .route("/groups/transactions/{transaction_id}/close", post(close_transaction))
        .route("/groups/transactions/{transaction_id}/mark-paid", post(mark_paid))
        .route("/groups/{group_id}/transactions", get(group_transactions))
        // Balances
        .route("/groups/user/{user_id}", get(group_details))
        .route("/groups/user/{user_id}/owes", get(user_debts))
        .route("/groups/user/{user_id}/owed", get(user_credits))
        .layer(middleware::from_fn_with_state(state, user_auth))
}
