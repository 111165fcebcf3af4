//! Equal-split allocation of a group expense.

use serde::Serialize;

/// One debtor's portion of a group transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Share {
    pub user_id: i64,
    pub amount_cents: i64,
}

/// Split `amount_cents` equally between `debtor_ids`.
///
/// Every debtor gets `amount / n` cents and the leftover `amount % n` cents are
/// handed out one each to the lowest user ids, so the shares always sum to
/// exactly `amount_cents`. Returns an empty vec when there are no debtors or
/// the amount is not positive.
pub fn split_even(amount_cents: i64, debtor_ids: &[i64]) -> Vec<Share> {
    if debtor_ids.is_empty() || amount_cents <= 0 {
        return Vec::new();
    }

    let mut ids = debtor_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let count = ids.len() as i64;
    let base = amount_cents / count;
    let remainder = amount_cents % count;

    ids.into_iter()
        .enumerate()
        .map(|(i, user_id)| Share {
            user_id,
            amount_cents: base + i64::from((i as i64) < remainder),
        })
        .collect()
}

/// The nominal per-person amount shown to clients (floor of the even split).
pub fn per_person(amount_cents: i64, debtors: usize) -> i64 {
    if debtors == 0 {
        return 0;
    }
    amount_cents / debtors as i64
}
