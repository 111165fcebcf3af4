use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, msg};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub creator_id: Option<i64>,
    /// Sum of all open transaction amounts (cents)
    pub balance_cents: i64,
    pub created_at: i64,
}

/// An open expense recorded by one member and split between the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupTransaction {
    pub id: i64,
    pub group_id: i64,
    /// The creditor
    pub user_id: i64,
    pub amount_cents: i64,
    pub reference: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroup {
    #[serde(default)]
    pub name: String,
}

impl CreateGroup {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest(msg::GROUP_NAME_EMPTY.into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct JoinGroup {
    #[serde(default)]
    pub invite_code: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupTransaction {
    pub amount_cents: i64,
    #[serde(default)]
    pub reference: Option<String>,
}

impl CreateGroupTransaction {
    pub fn validate(&self) -> Result<()> {
        if self.amount_cents <= 0 {
            return Err(AppError::BadRequest(msg::AMOUNT_NOT_POSITIVE.into()));
        }
        if self.amount_cents > super::MAX_AMOUNT {
            return Err(AppError::BadRequest(msg::AMOUNT_TOO_LARGE.into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct MarkPaid {
    #[serde(default = "default_true")]
    pub paid: bool,
}

fn default_true() -> bool {
    true
}

// ============ Responses ============

#[derive(Debug, Serialize)]
pub struct GroupCreated {
    pub group_id: i64,
    pub name: String,
    pub creator_id: i64,
    pub invite_code: String,
}

#[derive(Debug, Serialize)]
pub struct GroupJoined {
    pub group_id: i64,
    pub group_name: String,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct InviteCode {
    pub group_id: i64,
    pub invite_code: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionCreated {
    pub transaction_id: i64,
    pub amount_cents: i64,
    pub split_among: usize,
    pub amount_per_person_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct TransactionClosed {
    pub transaction_id: i64,
    pub amount_settled_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct PaymentMark {
    pub transaction_id: i64,
    pub user_id: i64,
    pub marked_paid: bool,
    pub marked_at: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct GroupSummary {
    pub id: i64,
    pub name: String,
    pub balance_cents: i64,
    pub member_count: usize,
    pub invite_code: String,
}

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub total_owed_cents: i64,
    pub total_owes_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupMember {
    pub id: i64,
    pub first_name: String,
    pub group_spend_cents: i64,
    pub group_debt_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct GroupDetails {
    pub group: GroupSummary,
    pub user_stats: UserStats,
    pub members: Vec<GroupMember>,
}

/// A share the user owes on someone else's open transaction.
#[derive(Debug, Clone, Serialize)]
pub struct DebtEntry {
    pub transaction_id: i64,
    pub creditor_id: i64,
    pub creditor_name: String,
    pub amount_cents: i64,
    pub reference: Option<String>,
    pub timestamp: i64,
    pub marked_paid: bool,
    pub marked_at: Option<i64>,
}

/// A share another member owes on the user's own open transaction.
#[derive(Debug, Clone, Serialize)]
pub struct CreditEntry {
    pub transaction_id: i64,
    pub debtor_id: i64,
    pub debtor_name: String,
    pub amount_cents: i64,
    pub reference: Option<String>,
    pub timestamp: i64,
    pub marked_paid: bool,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Ledger<T> {
    pub entries: Vec<T>,
    pub total_owed_cents: i64,
}

impl<T> Ledger<T> {
    pub fn new(entries: Vec<T>, amount: impl Fn(&T) -> i64) -> Self {
        let total_owed_cents = entries.iter().map(amount).sum();
        Self {
            entries,
            total_owed_cents,
        }
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            total_owed_cents: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupTransactionEntry {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub amount_cents: i64,
    pub reference: Option<String>,
    pub timestamp: i64,
    pub status: &'static str,
}

/// Status of every transaction that still exists; closing deletes it.
pub const TRANSACTION_STATUS_OPEN: &str = "open";

/// Shown in place of a creditor/debtor whose account no longer exists.
pub const DELETED_USER_NAME: &str = "User Deleted";
