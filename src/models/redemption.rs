use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, msg};

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub reward_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Redemption {
    pub redemption_id: i64,
    pub reward_id: i64,
    pub reward_title: String,
    pub points_spent: i64,
    pub previous_balance: i64,
    pub new_balance: i64,
}

/// Reward fields embedded in a history entry.
#[derive(Debug, Clone, Serialize)]
pub struct RedeemedRewardInfo {
    pub title: String,
    pub description: Option<String>,
    pub cost: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedemptionEntry {
    pub id: i64,
    pub reward_id: i64,
    pub points_spent: i64,
    pub redeemed_at: i64,
    pub reward: RedeemedRewardInfo,
}

/// Optional RFC 3339 bounds for the redemption history.
#[derive(Debug, Default, Deserialize)]
pub struct RedemptionHistoryQuery {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl RedemptionHistoryQuery {
    /// Parse the bounds into Unix seconds. Blank values count as absent.
    pub fn bounds(&self) -> Result<(Option<i64>, Option<i64>)> {
        fn parse(value: &Option<String>) -> Result<Option<i64>> {
            match value.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => DateTime::parse_from_rfc3339(s)
                    .map(|dt| Some(dt.timestamp()))
                    .map_err(|_| AppError::BadRequest(msg::INVALID_DATE_RANGE.into())),
            }
        }

        let start = parse(&self.start)?;
        let end = parse(&self.end)?;
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(AppError::BadRequest(msg::INVALID_DATE_RANGE.into()));
        }
        Ok((start, end))
    }
}

#[derive(Debug, Serialize)]
pub struct RedemptionHistory {
    pub redemptions: Vec<RedemptionEntry>,
}
