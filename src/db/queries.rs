use chrono::Utc;
use rusqlite::{Connection, ErrorCode, OptionalExtension, TransactionBehavior, params, types::Value};

use crate::error::{AppError, OptionExt, Result, msg};
use crate::invite;
use crate::models::*;
use crate::pagination::{CursorPage, cursor_limit};
use crate::split::{self, Share};

use super::from_row::{
    CATEGORY_COLS, FromRow, GROUP_COLS, GROUP_TRANSACTION_COLS, PAYMENT_COLS, REWARD_COLS,
    USER_COLS, query_all, query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Add to a running total, rejecting the change if it would leave the i64 range.
fn add_to_total(total: i64, delta: i64) -> Result<i64> {
    total
        .checked_add(delta)
        .ok_or_else(|| AppError::BadRequest(msg::TOTAL_OUT_OF_RANGE.into()))
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Builder for dynamic UPDATE statements with optional fields.
struct UpdateBuilder {
    table: &'static str,
    id: i64,
    fields: Vec<(&'static str, Value)>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: i64) -> Self {
        Self {
            table,
            id,
            fields: Vec::new(),
        }
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Set a column to an explicit value (including NULL).
    fn set_nullable<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.fields.push((column, v.into())),
            None => self.fields.push((column, Value::Null)),
        }
        self
    }

    /// Execute the update and return the updated entity using RETURNING clause.
    /// Returns None if no rows matched.
    fn execute_returning<T: FromRow>(self, conn: &Connection, returning_cols: &str) -> Result<Option<T>> {
        if self.fields.is_empty() {
            return Ok(None);
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ? RETURNING {}",
            self.table,
            sets.join(", "),
            returning_cols
        );
        conn.query_row(&sql, rusqlite::params_from_iter(values), T::from_row)
            .optional()
            .map_err(Into::into)
    }
}

// ============ Users ============

/// Create a user. The email is stored normalized; duplicates are a conflict.
pub fn create_user(conn: &Connection, input: &RegisterUser, password_hash: &str) -> Result<User> {
    let email = normalize_email(&input.email);
    let first_name = input.first_name.trim().to_string();
    let now = now();

    conn.execute(
        "INSERT INTO users (email, first_name, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![&email, &first_name, password_hash, now],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(msg::EMAIL_EXISTS.into())
        } else {
            e.into()
        }
    })?;

    Ok(User {
        id: conn.last_insert_rowid(),
        email,
        first_name,
        balance: 0,
        is_admin: false,
        group_id: None,
        group_spend_cents: 0,
        group_debt_cents: 0,
        created_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    let email = normalize_email(email);
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email],
    )
}

pub fn get_credentials_by_email(conn: &Connection, email: &str) -> Result<Option<UserCredentials>> {
    let email = normalize_email(email);
    query_one(
        conn,
        "SELECT id, email, password_hash, is_admin FROM users WHERE email = ?1",
        &[&email],
    )
}

/// Promote a user to admin. Returns false if no such email exists.
pub fn set_user_admin(conn: &Connection, email: &str, is_admin: bool) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE users SET is_admin = ?1 WHERE email = ?2",
        params![is_admin, normalize_email(email)],
    )?;
    Ok(affected > 0)
}

/// Add points to a user's balance, returning the new balance.
///
/// The update only matches while the sum still fits in an i64.
pub fn grant_points(conn: &Connection, user_id: i64, points: i64) -> Result<i64> {
    GrantPoints { points }.validate()?;

    let updated: Option<i64> = conn
        .query_row(
            "UPDATE users SET balance = balance + ?1 WHERE id = ?2 AND balance <= ?3 RETURNING balance",
            params![points, user_id, i64::MAX - points],
            |row| row.get(0),
        )
        .optional()?;

    match updated {
        Some(balance) => Ok(balance),
        None => {
            get_user_by_id(conn, user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
            Err(AppError::BadRequest(msg::TOTAL_OUT_OF_RANGE.into()))
        }
    }
}

// ============ Groups ============

pub fn get_group_by_id(conn: &Connection, id: i64) -> Result<Option<Group>> {
    query_one(
        conn,
        &format!("SELECT {} FROM expense_groups WHERE id = ?1", GROUP_COLS),
        &[&id],
    )
}

pub fn list_group_members(conn: &Connection, group_id: i64) -> Result<Vec<GroupMember>> {
    query_all(
        conn,
        "SELECT id, first_name, group_spend, group_debt FROM users WHERE group_id = ?1 ORDER BY id",
        &[&group_id],
    )
}

/// Create a group and make the creator its first member.
pub fn create_group(conn: &mut Connection, creator_id: i64, input: &CreateGroup) -> Result<GroupCreated> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let creator = get_user_by_id(&tx, creator_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    if creator.group_id.is_some() {
        return Err(AppError::Conflict(msg::ALREADY_IN_GROUP.into()));
    }

    let name = input.name.trim().to_string();
    tx.execute(
        "INSERT INTO expense_groups (name, creator_id, balance, created_at) VALUES (?1, ?2, 0, ?3)",
        params![&name, creator_id, now()],
    )?;
    let group_id = tx.last_insert_rowid();

    tx.execute(
        "UPDATE users SET group_id = ?1, group_spend = 0, group_debt = 0 WHERE id = ?2",
        params![group_id, creator_id],
    )?;

    tx.commit()?;

    Ok(GroupCreated {
        group_id,
        name,
        creator_id,
        invite_code: invite::encode(group_id),
    })
}

/// Join the group behind an invite code.
pub fn join_group(conn: &mut Connection, user_id: i64, invite_code: &str) -> Result<GroupJoined> {
    let group_id =
        invite::decode(invite_code).ok_or_else(|| AppError::BadRequest(msg::INVALID_INVITE_CODE.into()))?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let group = get_group_by_id(&tx, group_id)?
        .ok_or_else(|| AppError::BadRequest(msg::INVITE_GROUP_MISSING.into()))?;
    let user = get_user_by_id(&tx, user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    if user.group_id.is_some() {
        return Err(AppError::BadRequest(msg::ALREADY_IN_GROUP.into()));
    }

    tx.execute(
        "UPDATE users SET group_id = ?1, group_spend = 0, group_debt = 0 WHERE id = ?2",
        params![group.id, user_id],
    )?;

    tx.commit()?;

    Ok(GroupJoined {
        group_id: group.id,
        group_name: group.name,
        user_id,
    })
}

/// Leave the current group. Refused while the user owes money or is owed
/// money on a transaction they created.
pub fn leave_group(conn: &mut Connection, user_id: i64) -> Result<i64> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let user = get_user_by_id(&tx, user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    let group_id = user
        .group_id
        .ok_or_else(|| AppError::BadRequest(msg::NOT_IN_GROUP.into()))?;

    if user.group_debt_cents > 0 {
        return Err(AppError::Unsettled {
            message: msg::OUTSTANDING_DEBT,
            field: "debt_cents",
            amount_cents: user.group_debt_cents,
        });
    }

    let open_credits: i64 = tx.query_row(
        "SELECT COUNT(*) FROM group_transactions WHERE user_id = ?1 AND group_id = ?2",
        params![user_id, group_id],
        |row| row.get(0),
    )?;
    if open_credits > 0 {
        return Err(AppError::BadRequest(msg::OPEN_CREDITS.into()));
    }

    tx.execute(
        "UPDATE users SET group_id = NULL, group_spend = 0, group_debt = 0 WHERE id = ?1",
        params![user_id],
    )?;

    tx.commit()?;
    Ok(group_id)
}

/// Delete a group whose balance has been fully settled. Members are released.
pub fn delete_group(conn: &mut Connection, group_id: i64, actor_id: i64) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let group = get_group_by_id(&tx, group_id)?.or_not_found(msg::GROUP_NOT_FOUND)?;
    let actor = get_user_by_id(&tx, actor_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    if actor.group_id != Some(group.id) {
        return Err(AppError::Forbidden(msg::NOT_GROUP_MEMBER.into()));
    }

    if group.balance_cents != 0 {
        return Err(AppError::Unsettled {
            message: msg::GROUP_BALANCE_NONZERO,
            field: "current_balance_cents",
            amount_cents: group.balance_cents,
        });
    }

    tx.execute(
        "UPDATE users SET group_id = NULL, group_spend = 0, group_debt = 0 WHERE group_id = ?1",
        params![group_id],
    )?;
    tx.execute("DELETE FROM expense_groups WHERE id = ?1", params![group_id])?;

    tx.commit()?;
    Ok(())
}

/// The invite code of a group, for its own members.
pub fn get_invite_code(conn: &Connection, group_id: i64, actor_id: i64) -> Result<InviteCode> {
    let group = get_group_by_id(conn, group_id)?.or_not_found(msg::GROUP_NOT_FOUND)?;
    let actor = get_user_by_id(conn, actor_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    if actor.group_id != Some(group.id) {
        return Err(AppError::Forbidden(msg::NOT_GROUP_MEMBER.into()));
    }
    Ok(InviteCode {
        group_id: group.id,
        invite_code: invite::encode(group.id),
    })
}

// ============ Group Transactions ============

pub fn get_group_transaction(conn: &Connection, id: i64) -> Result<Option<GroupTransaction>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM group_transactions WHERE id = ?1",
            GROUP_TRANSACTION_COLS
        ),
        &[&id],
    )
}

pub fn list_transaction_shares(conn: &Connection, transaction_id: i64) -> Result<Vec<Share>> {
    query_all(
        conn,
        "SELECT user_id, amount FROM group_transaction_shares WHERE transaction_id = ?1 ORDER BY user_id",
        &[&transaction_id],
    )
}

/// Record an expense paid by `creditor_id`, split equally between every other
/// current member of their group.
///
/// Runs in an IMMEDIATE transaction so the member list, the share rows and all
/// running totals are written against the same snapshot.
pub fn create_group_transaction(
    conn: &mut Connection,
    creditor_id: i64,
    input: &CreateGroupTransaction,
) -> Result<TransactionCreated> {
    input.validate()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let creditor = get_user_by_id(&tx, creditor_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    let group_id = creditor
        .group_id
        .ok_or_else(|| AppError::BadRequest(msg::NOT_IN_GROUP.into()))?;
    let group = get_group_by_id(&tx, group_id)?.or_not_found(msg::GROUP_NOT_FOUND)?;

    let debtors: Vec<(i64, i64)> = {
        let mut stmt = tx.prepare(
            "SELECT id, group_debt FROM users WHERE group_id = ?1 AND id != ?2 ORDER BY id",
        )?;
        stmt.query_map(params![group_id, creditor_id], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<std::result::Result<_, _>>()?
    };
    if debtors.is_empty() {
        return Err(AppError::BadRequest(msg::NO_DEBTORS.into()));
    }

    let debtor_ids: Vec<i64> = debtors.iter().map(|(id, _)| *id).collect();
    let shares = split::split_even(input.amount_cents, &debtor_ids);

    // Every total is checked before anything is written
    add_to_total(creditor.group_spend_cents, input.amount_cents)?;
    add_to_total(group.balance_cents, input.amount_cents)?;
    for (share, (_, debt)) in shares.iter().zip(&debtors) {
        add_to_total(*debt, share.amount_cents)?;
    }

    let reference = input
        .reference
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    tx.execute(
        "INSERT INTO group_transactions (group_id, user_id, amount, reference, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![group_id, creditor_id, input.amount_cents, reference, now()],
    )?;
    let transaction_id = tx.last_insert_rowid();

    for share in &shares {
        tx.execute(
            "INSERT INTO group_transaction_shares (transaction_id, user_id, amount) VALUES (?1, ?2, ?3)",
            params![transaction_id, share.user_id, share.amount_cents],
        )?;
        tx.execute(
            "UPDATE users SET group_debt = group_debt + ?1 WHERE id = ?2",
            params![share.amount_cents, share.user_id],
        )?;
    }

    tx.execute(
        "UPDATE users SET group_spend = group_spend + ?1 WHERE id = ?2",
        params![input.amount_cents, creditor_id],
    )?;
    tx.execute(
        "UPDATE expense_groups SET balance = balance + ?1 WHERE id = ?2",
        params![input.amount_cents, group_id],
    )?;

    tx.commit()?;

    tracing::debug!(
        transaction_id,
        group_id,
        amount_cents = input.amount_cents,
        debtors = shares.len(),
        "Group transaction created"
    );

    Ok(TransactionCreated {
        transaction_id,
        amount_cents: input.amount_cents,
        split_among: shares.len(),
        amount_per_person_cents: split::per_person(input.amount_cents, shares.len()),
    })
}

/// Settle and remove a transaction, reversing exactly the recorded shares.
/// Only the creditor may close it.
pub fn close_group_transaction(
    conn: &mut Connection,
    transaction_id: i64,
    actor_id: i64,
) -> Result<TransactionClosed> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let transaction =
        get_group_transaction(&tx, transaction_id)?.or_not_found(msg::TRANSACTION_NOT_FOUND)?;
    if transaction.user_id != actor_id {
        return Err(AppError::Forbidden(msg::ONLY_CREATOR_CAN_CLOSE.into()));
    }

    for share in list_transaction_shares(&tx, transaction_id)? {
        tx.execute(
            "UPDATE users SET group_debt = group_debt - ?1 WHERE id = ?2",
            params![share.amount_cents, share.user_id],
        )?;
    }

    tx.execute(
        "UPDATE users SET group_spend = group_spend - ?1 WHERE id = ?2",
        params![transaction.amount_cents, transaction.user_id],
    )?;
    tx.execute(
        "UPDATE expense_groups SET balance = balance - ?1 WHERE id = ?2",
        params![transaction.amount_cents, transaction.group_id],
    )?;
    tx.execute(
        "DELETE FROM group_transactions WHERE id = ?1",
        params![transaction_id],
    )?;

    tx.commit()?;

    Ok(TransactionClosed {
        transaction_id,
        amount_settled_cents: transaction.amount_cents,
    })
}

/// Record (or withdraw) a debtor's "I've paid" mark. Does not move money.
pub fn mark_transaction_paid(
    conn: &Connection,
    transaction_id: i64,
    actor_id: i64,
    paid: bool,
) -> Result<PaymentMark> {
    let transaction =
        get_group_transaction(conn, transaction_id)?.or_not_found(msg::TRANSACTION_NOT_FOUND)?;
    if transaction.user_id == actor_id {
        return Err(AppError::BadRequest(msg::CANNOT_MARK_OWN.into()));
    }

    let actor = get_user_by_id(conn, actor_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    if actor.group_id != Some(transaction.group_id) {
        return Err(AppError::Forbidden(msg::NOT_GROUP_MEMBER.into()));
    }

    let marked_at = paid.then(now);
    conn.execute(
        "INSERT INTO group_payment_status (transaction_id, user_id, marked_paid, marked_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (transaction_id, user_id)
         DO UPDATE SET marked_paid = excluded.marked_paid, marked_at = excluded.marked_at",
        params![transaction_id, actor_id, paid, marked_at],
    )?;

    Ok(PaymentMark {
        transaction_id,
        user_id: actor_id,
        marked_paid: paid,
        marked_at,
    })
}

// ============ Group Queries ============

/// The user's group with running totals. `Ok(None)` when not in a group.
pub fn group_details(conn: &Connection, user_id: i64) -> Result<Option<GroupDetails>> {
    let user = get_user_by_id(conn, user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    let Some(group_id) = user.group_id else {
        return Ok(None);
    };
    let group = get_group_by_id(conn, group_id)?.or_not_found(msg::GROUP_NOT_FOUND)?;
    let members = list_group_members(conn, group_id)?;

    Ok(Some(GroupDetails {
        group: GroupSummary {
            id: group.id,
            name: group.name,
            balance_cents: group.balance_cents,
            member_count: members.len(),
            invite_code: invite::encode(group.id),
        },
        user_stats: UserStats {
            total_owed_cents: user.group_spend_cents,
            total_owes_cents: user.group_debt_cents,
        },
        members,
    }))
}

/// Shares the user owes on other members' open transactions.
pub fn user_debts(conn: &Connection, user_id: i64) -> Result<Ledger<DebtEntry>> {
    let user = get_user_by_id(conn, user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    let Some(group_id) = user.group_id else {
        return Ok(Ledger::empty());
    };

    let entries: Vec<DebtEntry> = query_all(
        conn,
        "SELECT t.id, t.user_id, c.first_name, s.amount, t.reference, t.created_at,
                p.marked_paid, p.marked_at
         FROM group_transaction_shares s
         JOIN group_transactions t ON t.id = s.transaction_id
         LEFT JOIN users c ON c.id = t.user_id
         LEFT JOIN group_payment_status p ON p.transaction_id = t.id AND p.user_id = s.user_id
         WHERE s.user_id = ?1 AND t.group_id = ?2 AND t.user_id != ?1
         ORDER BY t.created_at DESC, t.id DESC",
        &[&user_id, &group_id],
    )?;

    Ok(Ledger::new(entries, |e| e.amount_cents))
}

/// One entry per debtor share on the user's own open transactions.
pub fn user_credits(conn: &Connection, user_id: i64) -> Result<Ledger<CreditEntry>> {
    get_user_by_id(conn, user_id)?.or_not_found(msg::USER_NOT_FOUND)?;

    let entries: Vec<CreditEntry> = query_all(
        conn,
        "SELECT t.id, s.user_id, d.first_name, s.amount, t.reference, t.created_at,
                p.marked_paid
         FROM group_transactions t
         JOIN group_transaction_shares s ON s.transaction_id = t.id
         LEFT JOIN users d ON d.id = s.user_id
         LEFT JOIN group_payment_status p ON p.transaction_id = t.id AND p.user_id = s.user_id
         WHERE t.user_id = ?1
         ORDER BY t.created_at DESC, t.id DESC, s.user_id",
        &[&user_id],
    )?;

    Ok(Ledger::new(entries, |e| e.amount_cents))
}

/// Open transactions of a group, newest first.
pub fn list_group_transactions(conn: &Connection, group_id: i64) -> Result<Vec<GroupTransactionEntry>> {
    query_all(
        conn,
        "SELECT t.id, t.user_id, u.first_name, t.amount, t.reference, t.created_at
         FROM group_transactions t
         LEFT JOIN users u ON u.id = t.user_id
         WHERE t.group_id = ?1
         ORDER BY t.created_at DESC, t.id DESC",
        &[&group_id],
    )
}

/// (Σ group_spend, Σ group_debt, balance) for a group. All three are equal
/// whenever no operation is in flight.
pub fn group_totals(conn: &Connection, group_id: i64) -> Result<(i64, i64, i64)> {
    let (spend, debt): (i64, i64) = conn.query_row(
        "SELECT COALESCE(SUM(group_spend), 0), COALESCE(SUM(group_debt), 0)
         FROM users WHERE group_id = ?1",
        params![group_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let group = get_group_by_id(conn, group_id)?.or_not_found(msg::GROUP_NOT_FOUND)?;
    Ok((spend, debt, group.balance_cents))
}

// ============ Rewards ============

pub fn get_reward_by_id(conn: &Connection, id: i64) -> Result<Option<Reward>> {
    query_one(
        conn,
        &format!("SELECT {} FROM rewards WHERE id = ?1", REWARD_COLS),
        &[&id],
    )
}

/// Rewards in id order, starting after `cursor`.
pub fn list_rewards(conn: &Connection, query: &RewardListQuery) -> Result<CursorPage<Reward>> {
    let limit = cursor_limit(query.limit);
    let cursor = query.cursor.unwrap_or(0);
    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM rewards
             WHERE id > ?1 AND (?2 = 0 OR is_active = 1)
             ORDER BY id ASC LIMIT ?3",
            REWARD_COLS
        ),
        &[&cursor, &query.active_only, &limit],
    )?;
    Ok(CursorPage::new(items, limit, |r: &Reward| r.id))
}

fn ensure_category_exists(conn: &Connection, category_id: Option<i64>) -> Result<()> {
    if let Some(id) = category_id
        && get_category_by_id(conn, id)?.is_none()
    {
        return Err(AppError::BadRequest(msg::CATEGORY_NOT_FOUND.into()));
    }
    Ok(())
}

pub fn create_reward(conn: &Connection, input: &CreateReward) -> Result<Reward> {
    ensure_category_exists(conn, input.category_id)?;

    let title = input.title.trim().to_string();
    let now = now();
    conn.execute(
        "INSERT INTO rewards (title, description, cost, image_url, is_active, category_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            &title,
            &input.description,
            input.cost,
            &input.image_url,
            input.is_active,
            input.category_id,
            now
        ],
    )?;

    Ok(Reward {
        id: conn.last_insert_rowid(),
        title,
        description: input.description.clone(),
        cost: input.cost,
        image_url: input.image_url.clone(),
        is_active: input.is_active,
        redemptions: 0,
        category_id: input.category_id,
        created_at: now,
    })
}

pub fn update_reward(conn: &Connection, id: i64, input: &UpdateReward) -> Result<Option<Reward>> {
    if input.is_empty() {
        return Err(AppError::BadRequest(msg::NO_FIELDS_TO_UPDATE.into()));
    }
    if let Some(category_id) = input.category_id {
        ensure_category_exists(conn, category_id)?;
    }

    let mut builder = UpdateBuilder::new("rewards", id)
        .set_opt("title", input.title.as_ref().map(|t| t.trim().to_string()))
        .set_opt("cost", input.cost)
        .set_opt("is_active", input.is_active);
    if let Some(ref description) = input.description {
        builder = builder.set_nullable("description", description.clone());
    }
    if let Some(ref image_url) = input.image_url {
        builder = builder.set_nullable("image_url", image_url.clone());
    }
    if let Some(category_id) = input.category_id {
        builder = builder.set_nullable("category_id", category_id);
    }

    builder.execute_returning(conn, REWARD_COLS)
}

pub fn get_category_by_id(conn: &Connection, id: i64) -> Result<Option<Category>> {
    query_one(
        conn,
        &format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLS),
        &[&id],
    )
}

pub fn list_categories(conn: &Connection) -> Result<Vec<Category>> {
    query_all(
        conn,
        &format!("SELECT {} FROM categories ORDER BY name", CATEGORY_COLS),
        &[],
    )
}

/// Insert a category if missing and return it either way.
pub fn upsert_category(conn: &Connection, name: &str) -> Result<Category> {
    conn.execute(
        "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
        params![name],
    )?;
    query_one(
        conn,
        &format!("SELECT {} FROM categories WHERE name = ?1", CATEGORY_COLS),
        &[&name],
    )?
    .or_not_found(msg::CATEGORY_NOT_FOUND)
}

// ============ Favourites ============

/// Favourite a reward. Favouriting twice is a no-op.
pub fn add_favourite(conn: &Connection, user_id: i64, reward_id: i64) -> Result<Favourite> {
    get_reward_by_id(conn, reward_id)?.or_not_found(msg::REWARD_NOT_FOUND)?;
    conn.execute(
        "INSERT OR IGNORE INTO favourite_rewards (user_id, reward_id, created_at) VALUES (?1, ?2, ?3)",
        params![user_id, reward_id, now()],
    )?;
    query_one(
        conn,
        "SELECT user_id, reward_id, created_at FROM favourite_rewards WHERE user_id = ?1 AND reward_id = ?2",
        &[&user_id, &reward_id],
    )?
    .or_not_found(msg::REWARD_NOT_FOUND)
}

pub fn remove_favourite(conn: &Connection, user_id: i64, reward_id: i64) -> Result<bool> {
    let affected = conn.execute(
        "DELETE FROM favourite_rewards WHERE user_id = ?1 AND reward_id = ?2",
        params![user_id, reward_id],
    )?;
    Ok(affected > 0)
}

pub fn list_favourite_rewards(conn: &Connection, user_id: i64) -> Result<Vec<Reward>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM rewards
             WHERE id IN (SELECT reward_id FROM favourite_rewards WHERE user_id = ?1)
             ORDER BY id",
            REWARD_COLS
        ),
        &[&user_id],
    )
}

// ============ Settings ============

pub fn list_settings(conn: &Connection) -> Result<Vec<Setting>> {
    query_all(conn, "SELECT key, value FROM settings ORDER BY key", &[])
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM settings WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, now()],
    )?;
    Ok(())
}

pub fn get_cashback_rate(conn: &Connection) -> Result<Option<f64>> {
    get_setting(conn, CASHBACK_RATE_KEY)?
        .map(|value| {
            value.trim().parse::<f64>().map_err(|_| {
                AppError::Internal(format!("Stored cashback rate is not a number: {}", value))
            })
        })
        .transpose()
}

pub fn set_cashback_rate(conn: &Connection, rate: &CashbackRate) -> Result<()> {
    rate.validate()?;
    set_setting(conn, CASHBACK_RATE_KEY, &rate.cashback_rate.to_string())
}

// ============ Payments ============

/// Record a bill payment and credit the cashback points in one transaction.
pub fn record_payment(conn: &mut Connection, input: &RecordPayment) -> Result<PaymentRecorded> {
    input.validate()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let user = get_user_by_id(&tx, input.user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    let rate = get_cashback_rate(&tx)?
        .ok_or_else(|| AppError::Internal(msg::CASHBACK_RATE_NOT_FOUND.into()))?;
    let points_awarded = cashback_points(input.amount_cents, rate);
    add_to_total(user.balance, points_awarded)?;
    let reference = input.reference.trim().to_string();

    tx.execute(
        "INSERT INTO payments (user_id, reference, amount, points_awarded, cashback_rate, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![input.user_id, &reference, input.amount_cents, points_awarded, rate, now()],
    )?;
    let payment_id = tx.last_insert_rowid();

    let new_balance: i64 = tx.query_row(
        "UPDATE users SET balance = balance + ?1 WHERE id = ?2 RETURNING balance",
        params![points_awarded, input.user_id],
        |row| row.get(0),
    )?;

    tx.commit()?;

    Ok(PaymentRecorded {
        payment_id,
        user_id: input.user_id,
        reference,
        amount_cents: input.amount_cents,
        points_awarded,
        new_balance,
    })
}

pub fn list_payments_paginated(
    conn: &Connection,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Payment>, i64)> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM payments WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    let items = query_all(
        conn,
        &format!(
            "SELECT {} FROM payments WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            PAYMENT_COLS
        ),
        &[&user_id, &limit, &offset],
    )?;
    Ok((items, total))
}

// ============ Redemptions ============

/// Spend points on a reward.
///
/// The balance update is guarded with `balance >= cost` so concurrent
/// redemptions can never drive it negative.
pub fn redeem_reward(conn: &mut Connection, user_id: i64, reward_id: i64) -> Result<Redemption> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let reward = get_reward_by_id(&tx, reward_id)?.or_not_found(msg::REWARD_NOT_FOUND)?;
    if !reward.is_active {
        return Err(AppError::BadRequest(msg::REWARD_INACTIVE.into()));
    }

    let user = get_user_by_id(&tx, user_id)?.or_not_found(msg::USER_NOT_FOUND)?;
    if user.balance < reward.cost {
        return Err(AppError::InsufficientPoints {
            required: reward.cost,
            balance: user.balance,
        });
    }

    let new_balance: i64 = tx
        .query_row(
            "UPDATE users SET balance = balance - ?1 WHERE id = ?2 AND balance >= ?1 RETURNING balance",
            params![reward.cost, user_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(AppError::InsufficientPoints {
            required: reward.cost,
            balance: user.balance,
        })?;

    tx.execute(
        "UPDATE rewards SET redemptions = redemptions + 1 WHERE id = ?1",
        params![reward_id],
    )?;
    tx.execute(
        "INSERT INTO redeemed_rewards (user_id, reward_id, points_spent, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, reward_id, reward.cost, now()],
    )?;
    let redemption_id = tx.last_insert_rowid();

    tx.commit()?;

    Ok(Redemption {
        redemption_id,
        reward_id,
        reward_title: reward.title,
        points_spent: reward.cost,
        previous_balance: user.balance,
        new_balance,
    })
}

/// Redemptions newest first, optionally bounded by Unix timestamps (inclusive).
pub fn list_redemptions(
    conn: &Connection,
    user_id: i64,
    start: Option<i64>,
    end: Option<i64>,
) -> Result<Vec<RedemptionEntry>> {
    query_all(
        conn,
        "SELECT rr.id, rr.reward_id, rr.points_spent, rr.created_at,
                r.title, r.description, r.cost, r.image_url
         FROM redeemed_rewards rr
         JOIN rewards r ON r.id = rr.reward_id
         WHERE rr.user_id = ?1
           AND (?2 IS NULL OR rr.created_at >= ?2)
           AND (?3 IS NULL OR rr.created_at <= ?3)
         ORDER BY rr.created_at DESC, rr.id DESC",
        &[&user_id, &start, &end],
    )
}
