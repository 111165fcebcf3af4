use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, msg};

/// A bill payment that earned cashback points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub reference: String,
    pub amount_cents: i64,
    pub points_awarded: i64,
    /// Rate in effect when the payment was recorded
    pub cashback_rate: f64,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct RecordPayment {
    pub user_id: i64,
    #[serde(default)]
    pub reference: String,
    pub amount_cents: i64,
}

impl RecordPayment {
    pub fn validate(&self) -> Result<()> {
        if self.reference.trim().is_empty() {
            return Err(AppError::BadRequest(msg::REFERENCE_EMPTY.into()));
        }
        if self.amount_cents <= 0 {
            return Err(AppError::BadRequest(msg::AMOUNT_NOT_POSITIVE.into()));
        }
        if self.amount_cents > super::MAX_AMOUNT {
            return Err(AppError::BadRequest(msg::AMOUNT_TOO_LARGE.into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentRecorded {
    pub payment_id: i64,
    pub user_id: i64,
    pub reference: String,
    pub amount_cents: i64,
    pub points_awarded: i64,
    pub new_balance: i64,
}

#[derive(Debug, Deserialize)]
pub struct GrantPoints {
    pub points: i64,
}

impl GrantPoints {
    pub fn validate(&self) -> Result<()> {
        if self.points <= 0 {
            return Err(AppError::BadRequest(msg::POINTS_NOT_POSITIVE.into()));
        }
        if self.points > super::MAX_AMOUNT {
            return Err(AppError::BadRequest(msg::POINTS_TOO_LARGE.into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct PointsGranted {
    pub user_id: i64,
    pub points: i64,
    pub new_balance: i64,
}
