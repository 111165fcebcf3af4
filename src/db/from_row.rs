//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` and `query_all`
/// helper functions.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str =
    "id, email, first_name, balance, is_admin, group_id, group_spend, group_debt, created_at";

pub const GROUP_COLS: &str = "id, name, creator_id, balance, created_at";

pub const GROUP_TRANSACTION_COLS: &str = "id, group_id, user_id, amount, reference, created_at";

pub const REWARD_COLS: &str =
    "id, title, description, cost, image_url, is_active, redemptions, category_id, created_at";

pub const CATEGORY_COLS: &str = "id, name";

pub const PAYMENT_COLS: &str =
    "id, user_id, reference, amount, points_awarded, cashback_rate, created_at";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            first_name: row.get(2)?,
            balance: row.get(3)?,
            is_admin: row.get(4)?,
            group_id: row.get(5)?,
            group_spend_cents: row.get(6)?,
            group_debt_cents: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl FromRow for UserCredentials {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(UserCredentials {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            is_admin: row.get(3)?,
        })
    }
}

impl FromRow for Group {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Group {
            id: row.get(0)?,
            name: row.get(1)?,
            creator_id: row.get(2)?,
            balance_cents: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for GroupTransaction {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(GroupTransaction {
            id: row.get(0)?,
            group_id: row.get(1)?,
            user_id: row.get(2)?,
            amount_cents: row.get(3)?,
            reference: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for GroupMember {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(GroupMember {
            id: row.get(0)?,
            first_name: row.get(1)?,
            group_spend_cents: row.get(2)?,
            group_debt_cents: row.get(3)?,
        })
    }
}

/// Columns: transaction id, creditor id, creditor name (nullable), share,
/// reference, created_at, marked_paid (nullable), marked_at.
impl FromRow for DebtEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let creditor_name: Option<String> = row.get(2)?;
        let marked_paid: Option<bool> = row.get(6)?;
        Ok(DebtEntry {
            transaction_id: row.get(0)?,
            creditor_id: row.get(1)?,
            creditor_name: creditor_name.unwrap_or_else(|| DELETED_USER_NAME.to_string()),
            amount_cents: row.get(3)?,
            reference: row.get(4)?,
            timestamp: row.get(5)?,
            marked_paid: marked_paid.unwrap_or(false),
            marked_at: row.get(7)?,
        })
    }
}

/// Columns: transaction id, debtor id, debtor name (nullable), share,
/// reference, created_at, marked_paid (nullable).
impl FromRow for CreditEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let debtor_name: Option<String> = row.get(2)?;
        let marked_paid: Option<bool> = row.get(6)?;
        Ok(CreditEntry {
            transaction_id: row.get(0)?,
            debtor_id: row.get(1)?,
            debtor_name: debtor_name.unwrap_or_else(|| DELETED_USER_NAME.to_string()),
            amount_cents: row.get(3)?,
            reference: row.get(4)?,
            timestamp: row.get(5)?,
            marked_paid: marked_paid.unwrap_or(false),
            status: TRANSACTION_STATUS_OPEN,
        })
    }
}

/// Columns: id, creditor id, creditor name (nullable), amount, reference, created_at.
impl FromRow for GroupTransactionEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let user_name: Option<String> = row.get(2)?;
        Ok(GroupTransactionEntry {
            id: row.get(0)?,
            user_id: row.get(1)?,
            user_name: user_name.unwrap_or_else(|| DELETED_USER_NAME.to_string()),
            amount_cents: row.get(3)?,
            reference: row.get(4)?,
            timestamp: row.get(5)?,
            status: TRANSACTION_STATUS_OPEN,
        })
    }
}

impl FromRow for Reward {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Reward {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            cost: row.get(3)?,
            image_url: row.get(4)?,
            is_active: row.get(5)?,
            redemptions: row.get(6)?,
            category_id: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl FromRow for Category {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

impl FromRow for Setting {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Setting {
            key: row.get(0)?,
            value: row.get(1)?,
        })
    }
}

impl FromRow for Payment {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Payment {
            id: row.get(0)?,
            user_id: row.get(1)?,
            reference: row.get(2)?,
            amount_cents: row.get(3)?,
            points_awarded: row.get(4)?,
            cashback_rate: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

/// Columns: redemption id, reward id, points spent, created_at, then the
/// reward's title, description, cost, image_url.
impl FromRow for RedemptionEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(RedemptionEntry {
            id: row.get(0)?,
            reward_id: row.get(1)?,
            points_spent: row.get(2)?,
            redeemed_at: row.get(3)?,
            reward: RedeemedRewardInfo {
                title: row.get(4)?,
                description: row.get(5)?,
                cost: row.get(6)?,
                image_url: row.get(7)?,
            },
        })
    }
}

impl FromRow for Favourite {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Favourite {
            user_id: row.get(0)?,
            reward_id: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}

impl FromRow for crate::split::Share {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(crate::split::Share {
            user_id: row.get(0)?,
            amount_cents: row.get(1)?,
        })
    }
}
