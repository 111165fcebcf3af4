use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// User-facing messages shared between handlers and queries.
pub mod msg {
    pub const USER_NOT_FOUND: &str = "User not found";
    pub const GROUP_NOT_FOUND: &str = "Group not found";
    pub const TRANSACTION_NOT_FOUND: &str = "Transaction not found";
    pub const REWARD_NOT_FOUND: &str = "Reward not found";
    pub const CASHBACK_RATE_NOT_FOUND: &str = "Cashback rate not found";

    pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
    pub const EMAIL_EXISTS: &str = "Email already exists";
    pub const MISSING_REGISTRATION_FIELDS: &str = "Missing required fields";
    pub const INVALID_EMAIL_FORMAT: &str = "Invalid email format";
    pub const ADMIN_REQUIRED: &str = "Admin access required";
    pub const NOT_YOUR_ACCOUNT: &str = "You can only access your own account";

    pub const INVALID_INVITE_CODE: &str = "Invalid invite code";
    pub const INVITE_GROUP_MISSING: &str = "Invalid invite code - group not found";
    pub const NOT_IN_GROUP_DETAILS: &str = "User is not in any group";
    pub const GROUP_LEFT: &str = "Left group successfully";
    pub const GROUP_DELETED: &str = "Group deleted successfully";
    pub const LOGGED_IN: &str = "Login successful";
    pub const LOGGED_OUT: &str = "Logged out";
    pub const GROUP_NAME_EMPTY: &str = "Group name is required";
    pub const ALREADY_IN_GROUP: &str = "User is already in a group. Leave current group first.";
    pub const NOT_IN_GROUP: &str = "User is not in a group";
    pub const NOT_GROUP_MEMBER: &str = "You are not a member of this group";
    pub const OUTSTANDING_DEBT: &str =
        "Cannot leave group with outstanding debt. Please settle your debts first.";
    pub const OPEN_CREDITS: &str =
        "Cannot leave group while transactions you created are still open. Close them first.";
    pub const GROUP_BALANCE_NONZERO: &str =
        "Cannot delete group with non-zero balance. All transactions must be closed.";
    pub const NO_DEBTORS: &str = "No other members in group to split with";
    pub const AMOUNT_NOT_POSITIVE: &str = "Amount must be greater than zero";
    pub const AMOUNT_TOO_LARGE: &str = "Amount exceeds the maximum allowed";
    pub const TOTAL_OUT_OF_RANGE: &str = "This would push a running total out of range";
    pub const ONLY_CREATOR_CAN_CLOSE: &str = "Only the transaction creator can close this transaction";
    pub const CANNOT_MARK_OWN: &str = "You cannot mark your own transaction as paid";

    pub const REWARD_TITLE_EMPTY: &str = "Title is required";
    pub const REWARD_COST_NOT_POSITIVE: &str = "Cost must be greater than zero";
    pub const REWARD_INACTIVE: &str = "Reward is not currently available";
    pub const NO_FIELDS_TO_UPDATE: &str = "No fields to update";
    pub const CATEGORY_NOT_FOUND: &str = "Category not found";

    pub const CASHBACK_RATE_RANGE: &str = "Cashback rate must be between 0 and 100";
    pub const POINTS_NOT_POSITIVE: &str = "Points must be greater than zero";
    pub const POINTS_TOO_LARGE: &str = "Points exceed the maximum allowed";
    pub const REFERENCE_EMPTY: &str = "Reference is required";
    pub const INVALID_DATE_RANGE: &str = "Invalid date filter, expected RFC 3339 timestamps";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient points: need {required}, have {balance}")]
    InsufficientPoints { required: i64, balance: i64 },

    /// A group operation refused because money is still outstanding.
    /// `field` names the extra amount attached to the response body.
    #[error("{message}")]
    Unsettled {
        message: &'static str,
        field: &'static str,
        amount_cents: i64,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code for the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) | AppError::Unsettled { .. } => {
                "BAD_REQUEST"
            }
            AppError::Unauthorized | AppError::InvalidCredentials => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Conflict(_) => "CONFLICT",
            AppError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: &'static str,
    message: String,
    #[serde(flatten)]
    detail: Map<String, Value>,
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let mut detail = Map::new();
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, msg::INVALID_CREDENTIALS.to_string())
            }
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::InsufficientPoints { required, balance } => {
                let shortfall = required - balance;
                detail.insert("shortfall".into(), shortfall.into());
                (
                    StatusCode::BAD_REQUEST,
                    format!("You need {} more points to redeem this reward", shortfall),
                )
            }
            AppError::Unsettled {
                message,
                field,
                amount_cents,
            } => {
                detail.insert((*field).into(), (*amount_cents).into());
                (StatusCode::BAD_REQUEST, (*message).to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = ErrorResponse {
            success: false,
            error: code,
            message,
            detail,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Turns a missing row into a `NotFound` error.
pub trait OptionExt<T> {
    fn or_not_found(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, message: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.to_string()))
    }
}
