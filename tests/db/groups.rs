//! Expense group membership, transactions and running totals

#[path = "../common/mod.rs"]
mod common;

use common::*;
use rusqlite::Connection;

fn reconciled(conn: &Connection, group_id: i64) -> bool {
    let (spend, debt, balance) = queries::group_totals(conn, group_id).unwrap();
    spend == debt && debt == balance
}

fn refresh(conn: &Connection, user: &User) -> User {
    queries::get_user_by_id(conn, user.id).unwrap().unwrap()
}

// ============ Membership ============

#[test]
fn test_create_group_adds_creator() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");

    let group = create_test_group(&mut conn, alice.id, "  Flat 4B ");
    assert_eq!(group.name, "Flat 4B", "name should be trimmed");
    assert_eq!(group.creator_id, alice.id);
    assert_eq!(group.invite_code, housrcash::invite::encode(group.group_id));

    let alice = refresh(&conn, &alice);
    assert_eq!(alice.group_id, Some(group.group_id));

    let stored = queries::get_group_by_id(&conn, group.group_id).unwrap().unwrap();
    assert_eq!(stored.balance_cents, 0);
    assert_eq!(stored.creator_id, Some(alice.id));
}

#[test]
fn test_create_group_while_in_group_is_conflict() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    create_test_group(&mut conn, alice.id, "First");

    let result = queries::create_group(&mut conn, alice.id, &CreateGroup { name: "Second".into() });
    assert!(matches!(result, Err(AppError::Conflict(_))), "got {:?}", result);
}

#[test]
fn test_join_group_by_invite_code() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    let group = create_test_group(&mut conn, alice.id, "Flat");

    // The prefix is case-insensitive
    let code = group.invite_code.replacen("GRP-", "grp-", 1);
    let joined = queries::join_group(&mut conn, bob.id, &code).unwrap();
    assert_eq!(joined.group_id, group.group_id);
    assert_eq!(joined.group_name, "Flat");
    assert_eq!(refresh(&conn, &bob).group_id, Some(group.group_id));
}

#[test]
fn test_join_group_rejections() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    let group = create_test_group(&mut conn, alice.id, "Flat");

    let bad_code = queries::join_group(&mut conn, bob.id, "GRP-1J");
    assert!(matches!(bad_code, Err(AppError::BadRequest(_))), "checksum mismatch");

    let missing_group = queries::join_group(&mut conn, bob.id, &housrcash::invite::encode(999));
    assert!(
        matches!(&missing_group, Err(AppError::BadRequest(m)) if m.contains("group not found")),
        "got {:?}",
        missing_group
    );

    let own_group = queries::join_group(&mut conn, alice.id, &group.invite_code);
    assert!(matches!(own_group, Err(AppError::BadRequest(_))), "already in a group");
}

#[test]
fn test_leave_group() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    let group = create_test_group_with(&mut conn, &[&alice, &bob]);

    assert_eq!(queries::leave_group(&mut conn, bob.id).unwrap(), group.group_id);
    assert_eq!(refresh(&conn, &bob).group_id, None);

    let again = queries::leave_group(&mut conn, bob.id);
    assert!(matches!(again, Err(AppError::BadRequest(_))), "not in a group any more");
}

#[test]
fn test_leave_blocked_by_debt() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    create_test_group_with(&mut conn, &[&alice, &bob]);
    create_test_expense(&mut conn, alice.id, 1500);

    match queries::leave_group(&mut conn, bob.id) {
        Err(AppError::Unsettled { field, amount_cents, .. }) => {
            assert_eq!(field, "debt_cents");
            assert_eq!(amount_cents, 1500);
        }
        other => panic!("expected unsettled debt, got {:?}", other),
    }

    let creditor = queries::leave_group(&mut conn, alice.id);
    assert!(
        matches!(creditor, Err(AppError::BadRequest(_))),
        "creditor with open transactions cannot leave"
    );
}

#[test]
fn test_delete_group_requires_zero_balance() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    let group = create_test_group_with(&mut conn, &[&alice, &bob]);
    let expense = create_test_expense(&mut conn, alice.id, 1000);

    match queries::delete_group(&mut conn, group.group_id, alice.id) {
        Err(AppError::Unsettled { field, amount_cents, .. }) => {
            assert_eq!(field, "current_balance_cents");
            assert_eq!(amount_cents, 1000);
        }
        other => panic!("expected unsettled balance, got {:?}", other),
    }

    queries::close_group_transaction(&mut conn, expense.transaction_id, alice.id).unwrap();
    queries::delete_group(&mut conn, group.group_id, bob.id).unwrap();

    assert!(queries::get_group_by_id(&conn, group.group_id).unwrap().is_none());
    assert_eq!(refresh(&conn, &alice).group_id, None, "members are released");
    assert_eq!(refresh(&conn, &bob).group_id, None);
}

#[test]
fn test_delete_group_access() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let mallory = create_test_user(&conn, "mallory@example.com", "Mallory");
    let group = create_test_group(&mut conn, alice.id, "Flat");

    assert!(matches!(
        queries::delete_group(&mut conn, 999, alice.id),
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        queries::delete_group(&mut conn, group.group_id, mallory.id),
        Err(AppError::Forbidden(_))
    ));
}

#[test]
fn test_invite_code_members_only() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let mallory = create_test_user(&conn, "mallory@example.com", "Mallory");
    let group = create_test_group(&mut conn, alice.id, "Flat");

    let code = queries::get_invite_code(&conn, group.group_id, alice.id).unwrap();
    assert_eq!(code.invite_code, group.invite_code);

    assert!(matches!(
        queries::get_invite_code(&conn, group.group_id, mallory.id),
        Err(AppError::Forbidden(_))
    ));
}

// ============ Transactions ============

#[test]
fn test_expense_split_across_other_members() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    let carol = create_test_user(&conn, "carol@example.com", "Carol");
    let dave = create_test_user(&conn, "dave@example.com", "Dave");
    let group = create_test_group_with(&mut conn, &[&alice, &bob, &carol, &dave]);

    let created = create_test_expense(&mut conn, alice.id, 1000);
    assert_eq!(created.split_among, 3, "the creditor does not owe themself");
    assert_eq!(created.amount_per_person_cents, 333);

    let shares = queries::list_transaction_shares(&conn, created.transaction_id).unwrap();
    let amounts: Vec<i64> = shares.iter().map(|s| s.amount_cents).collect();
    assert_eq!(amounts, vec![334, 333, 333], "remainder goes to the lowest ids");
    assert_eq!(shares[0].user_id, bob.id);

    assert_eq!(refresh(&conn, &alice).group_spend_cents, 1000);
    assert_eq!(refresh(&conn, &bob).group_debt_cents, 334);
    assert_eq!(refresh(&conn, &carol).group_debt_cents, 333);
    assert_eq!(refresh(&conn, &dave).group_debt_cents, 333);

    let stored = queries::get_group_by_id(&conn, group.group_id).unwrap().unwrap();
    assert_eq!(stored.balance_cents, 1000);
    assert!(reconciled(&conn, group.group_id));
}

#[test]
fn test_expense_rejections() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let loner = create_test_user(&conn, "loner@example.com", "Loner");

    let not_in_group = queries::create_group_transaction(&mut conn, alice.id, &CreateGroupTransaction {
        amount_cents: 100,
        reference: None,
    });
    assert!(matches!(not_in_group, Err(AppError::BadRequest(_))));

    create_test_group(&mut conn, loner.id, "Solo");
    let nobody_to_split = queries::create_group_transaction(&mut conn, loner.id, &CreateGroupTransaction {
        amount_cents: 100,
        reference: None,
    });
    assert!(
        matches!(&nobody_to_split, Err(AppError::BadRequest(m)) if m.contains("No other members")),
        "got {:?}",
        nobody_to_split
    );

    let zero = queries::create_group_transaction(&mut conn, loner.id, &CreateGroupTransaction {
        amount_cents: 0,
        reference: None,
    });
    assert!(matches!(zero, Err(AppError::BadRequest(_))));
}

#[test]
fn test_expense_amount_upper_bound() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    let group = create_test_group_with(&mut conn, &[&alice, &bob]);

    for amount_cents in [MAX_AMOUNT + 1, i64::MAX] {
        let result = queries::create_group_transaction(&mut conn, alice.id, &CreateGroupTransaction {
            amount_cents,
            reference: None,
        });
        assert!(
            matches!(&result, Err(AppError::BadRequest(m)) if m.contains("maximum")),
            "got {:?}",
            result
        );
    }

    let at_limit = create_test_expense(&mut conn, alice.id, MAX_AMOUNT);
    assert_eq!(at_limit.amount_per_person_cents, MAX_AMOUNT);
    assert!(reconciled(&conn, group.group_id));
}

#[test]
fn test_expense_rejected_when_totals_would_overflow() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    let group = create_test_group_with(&mut conn, &[&alice, &bob]);

    conn.execute(
        "UPDATE users SET group_spend = ?1 WHERE id = ?2",
        rusqlite::params![i64::MAX - 10, alice.id],
    )
    .unwrap();

    let result = queries::create_group_transaction(&mut conn, alice.id, &CreateGroupTransaction {
        amount_cents: 100,
        reference: None,
    });
    assert!(
        matches!(&result, Err(AppError::BadRequest(m)) if m.contains("out of range")),
        "got {:?}",
        result
    );

    // Nothing was written and every row still reads back as integers
    let alice = refresh(&conn, &alice);
    assert_eq!(alice.group_spend_cents, i64::MAX - 10);
    assert_eq!(refresh(&conn, &bob).group_debt_cents, 0);
    let stored = queries::get_group_by_id(&conn, group.group_id).unwrap().unwrap();
    assert_eq!(stored.balance_cents, 0);
    assert!(queries::list_group_transactions(&conn, group.group_id).unwrap().is_empty());
}

#[test]
fn test_schema_rejects_overflowed_totals() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let group = create_test_group(&mut conn, alice.id, "Flat 4B");

    conn.execute(
        "UPDATE users SET group_spend = ?1 WHERE id = ?2",
        rusqlite::params![i64::MAX, alice.id],
    )
    .unwrap();
    let overflow = conn.execute(
        "UPDATE users SET group_spend = group_spend + 1 WHERE id = ?1",
        [alice.id],
    );
    assert!(overflow.is_err(), "REAL result must violate the CHECK");

    let overflow = conn.execute(
        "UPDATE expense_groups SET balance = ?1 + 1 WHERE id = ?2",
        rusqlite::params![i64::MAX, group.group_id],
    );
    assert!(overflow.is_err());

    assert_eq!(refresh(&conn, &alice).group_spend_cents, i64::MAX);
    assert!(queries::group_details(&conn, alice.id).is_ok());
}

#[test]
fn test_close_reverses_recorded_shares() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    let carol = create_test_user(&conn, "carol@example.com", "Carol");
    let group = create_test_group_with(&mut conn, &[&alice, &bob, &carol]);

    let expense = create_test_expense(&mut conn, alice.id, 1001);

    // A member joining later must not change what closing reverses
    let dave = create_test_user(&conn, "dave@example.com", "Dave");
    queries::join_group(&mut conn, dave.id, &group.invite_code).unwrap();

    let closed = queries::close_group_transaction(&mut conn, expense.transaction_id, alice.id).unwrap();
    assert_eq!(closed.amount_settled_cents, 1001);

    for user in [&alice, &bob, &carol, &dave] {
        let user = refresh(&conn, user);
        assert_eq!(user.group_spend_cents, 0, "{} spend", user.first_name);
        assert_eq!(user.group_debt_cents, 0, "{} debt", user.first_name);
    }
    assert_eq!(
        queries::get_group_by_id(&conn, group.group_id).unwrap().unwrap().balance_cents,
        0
    );
    assert!(queries::get_group_transaction(&conn, expense.transaction_id).unwrap().is_none());
    assert!(queries::list_transaction_shares(&conn, expense.transaction_id).unwrap().is_empty());
}

#[test]
fn test_close_only_by_creditor() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    create_test_group_with(&mut conn, &[&alice, &bob]);
    let expense = create_test_expense(&mut conn, alice.id, 500);

    assert!(matches!(
        queries::close_group_transaction(&mut conn, expense.transaction_id, bob.id),
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        queries::close_group_transaction(&mut conn, 999, alice.id),
        Err(AppError::NotFound(_))
    ));
}

#[test]
fn test_totals_reconcile_through_activity() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    let carol = create_test_user(&conn, "carol@example.com", "Carol");
    let group = create_test_group_with(&mut conn, &[&alice, &bob, &carol]);

    let first = create_test_expense(&mut conn, alice.id, 999);
    assert!(reconciled(&conn, group.group_id));
    let second = create_test_expense(&mut conn, bob.id, 2);
    assert!(reconciled(&conn, group.group_id));
    create_test_expense(&mut conn, carol.id, 12_345);
    assert!(reconciled(&conn, group.group_id));

    queries::close_group_transaction(&mut conn, first.transaction_id, alice.id).unwrap();
    assert!(reconciled(&conn, group.group_id));
    queries::close_group_transaction(&mut conn, second.transaction_id, bob.id).unwrap();
    assert!(reconciled(&conn, group.group_id));

    let (_, _, balance) = queries::group_totals(&conn, group.group_id).unwrap();
    assert_eq!(balance, 12_345);
}

#[test]
fn test_mark_paid() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    let mallory = create_test_user(&conn, "mallory@example.com", "Mallory");
    create_test_group_with(&mut conn, &[&alice, &bob]);
    let expense = create_test_expense(&mut conn, alice.id, 800);

    let mark = queries::mark_transaction_paid(&conn, expense.transaction_id, bob.id, true).unwrap();
    assert!(mark.marked_paid);
    assert!(mark.marked_at.is_some());
    assert_eq!(refresh(&conn, &bob).group_debt_cents, 800, "marking moves no money");

    let debts = queries::user_debts(&conn, bob.id).unwrap();
    assert!(debts.entries[0].marked_paid);

    let unmark = queries::mark_transaction_paid(&conn, expense.transaction_id, bob.id, false).unwrap();
    assert!(!unmark.marked_paid);
    assert_eq!(unmark.marked_at, None);

    assert!(matches!(
        queries::mark_transaction_paid(&conn, expense.transaction_id, alice.id, true),
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        queries::mark_transaction_paid(&conn, expense.transaction_id, mallory.id, true),
        Err(AppError::Forbidden(_))
    ));
}

// ============ Balances ============

#[test]
fn test_group_details() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    let loner = create_test_user(&conn, "loner@example.com", "Loner");
    let group = create_test_group_with(&mut conn, &[&alice, &bob]);
    create_test_expense(&mut conn, alice.id, 600);

    let details = queries::group_details(&conn, bob.id).unwrap().unwrap();
    assert_eq!(details.group.id, group.group_id);
    assert_eq!(details.group.member_count, 2);
    assert_eq!(details.group.balance_cents, 600);
    assert_eq!(details.group.invite_code, group.invite_code);
    assert_eq!(details.user_stats.total_owes_cents, 600);
    assert_eq!(details.user_stats.total_owed_cents, 0);
    assert_eq!(details.members.len(), 2);

    assert!(queries::group_details(&conn, loner.id).unwrap().is_none());
}

#[test]
fn test_debts_and_credits_ledgers() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    let carol = create_test_user(&conn, "carol@example.com", "Carol");
    create_test_group_with(&mut conn, &[&alice, &bob, &carol]);
    let expense = create_test_expense(&mut conn, alice.id, 1001);

    let debts = queries::user_debts(&conn, bob.id).unwrap();
    assert_eq!(debts.entries.len(), 1);
    assert_eq!(debts.entries[0].transaction_id, expense.transaction_id);
    assert_eq!(debts.entries[0].creditor_id, alice.id);
    assert_eq!(debts.entries[0].creditor_name, "Alice");
    assert_eq!(debts.entries[0].amount_cents, 501);
    assert_eq!(debts.total_owed_cents, 501);

    let credits = queries::user_credits(&conn, alice.id).unwrap();
    assert_eq!(credits.entries.len(), 2, "one entry per debtor");
    assert_eq!(credits.total_owed_cents, 1001);
    assert!(credits.entries.iter().all(|c| c.status == "open"));

    assert!(queries::user_debts(&conn, alice.id).unwrap().entries.is_empty());
    assert!(queries::user_credits(&conn, bob.id).unwrap().entries.is_empty());
}

#[test]
fn test_group_transaction_listing() {
    let mut conn = setup_test_db();
    let alice = create_test_user(&conn, "alice@example.com", "Alice");
    let bob = create_test_user(&conn, "bob@example.com", "Bob");
    let group = create_test_group_with(&mut conn, &[&alice, &bob]);
    let first = create_test_expense(&mut conn, alice.id, 100);
    let second = create_test_expense(&mut conn, bob.id, 200);

    let listed = queries::list_group_transactions(&conn, group.group_id).unwrap();
    let ids: Vec<i64> = listed.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![second.transaction_id, first.transaction_id], "newest first");
    assert_eq!(listed[0].user_name, "Bob");
    assert_eq!(listed[0].reference.as_deref(), Some("Groceries"));
}
