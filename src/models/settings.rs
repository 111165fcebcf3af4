use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, msg};

/// Settings key holding the global cashback percentage.
pub const CASHBACK_RATE_KEY: &str = "cashback_rate";

/// Value inserted on first start.
pub const DEFAULT_CASHBACK_RATE: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CashbackRate {
    pub cashback_rate: f64,
}

impl CashbackRate {
    pub fn validate(&self) -> Result<()> {
        if !self.cashback_rate.is_finite() || !(0.0..=100.0).contains(&self.cashback_rate) {
            return Err(AppError::BadRequest(msg::CASHBACK_RATE_RANGE.into()));
        }
        Ok(())
    }
}

/// Points earned for a payment: `floor(amount_cents * rate / 100)`.
///
/// One point per cent at 100%; never negative.
pub fn cashback_points(amount_cents: i64, rate_percent: f64) -> i64 {
    if amount_cents <= 0 || !rate_percent.is_finite() || rate_percent <= 0.0 {
        return 0;
    }
    ((amount_cents as f64) * rate_percent / 100.0).floor() as i64
}
