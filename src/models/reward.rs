use serde::{Deserialize, Serialize};

use super::deserialize_optional_nullable;
use crate::error::{AppError, Result, msg};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Price in points
    pub cost: i64,
    pub image_url: Option<String>,
    pub is_active: bool,
    /// Number of times this reward has been redeemed
    pub redemptions: i64,
    pub category_id: Option<i64>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateReward {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub cost: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub category_id: Option<i64>,
}

fn default_active() -> bool {
    true
}

impl CreateReward {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest(msg::REWARD_TITLE_EMPTY.into()));
        }
        if self.cost <= 0 {
            return Err(AppError::BadRequest(msg::REWARD_COST_NOT_POSITIVE.into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateReward {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub description: Option<Option<String>>,
    pub cost: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub image_url: Option<Option<String>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_nullable")]
    pub category_id: Option<Option<i64>>,
}

impl UpdateReward {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.cost.is_none()
            && self.image_url.is_none()
            && self.is_active.is_none()
            && self.category_id.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(AppError::BadRequest(msg::NO_FIELDS_TO_UPDATE.into()));
        }
        if let Some(ref title) = self.title
            && title.trim().is_empty()
        {
            return Err(AppError::BadRequest(msg::REWARD_TITLE_EMPTY.into()));
        }
        if let Some(cost) = self.cost
            && cost <= 0
        {
            return Err(AppError::BadRequest(msg::REWARD_COST_NOT_POSITIVE.into()));
        }
        Ok(())
    }
}

/// Query string for the reward catalog.
#[derive(Debug, Default, Deserialize)]
pub struct RewardListQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    /// Return rewards with an id greater than this
    #[serde(default)]
    pub cursor: Option<i64>,
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Serialize)]
pub struct Favourite {
    pub user_id: i64,
    pub reward_id: i64,
    pub created_at: i64,
}
