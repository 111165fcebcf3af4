mod group;
mod payment;
mod redemption;
mod reward;
mod settings;
mod user;

pub use group::*;
pub use payment::*;
pub use redemption::*;
pub use reward::*;
pub use settings::*;
pub use user::*;

use serde::{Deserialize, Deserializer};

/// Largest amount (cents) or points value accepted in a single request.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Deserialize a double Option field where:
/// - Field absent in JSON → None (don't update)
/// - Field present with null → Some(None) (set to NULL in DB)
/// - Field present with value → Some(Some(value)) (set to value)
pub(crate) fn deserialize_optional_nullable<'de, D, T>(
    deserializer: D,
) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value: Option<T> = Option::deserialize(deserializer)?;
    Ok(Some(value))
}
