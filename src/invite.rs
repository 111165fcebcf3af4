//! Group invite codes.
//!
//! A code is `GRP-` followed by the group id in upper-case base 36 and a
//! single base-36 checksum character, e.g. group 1 encodes as `GRP-1K`.
//! Codes let members share a group without handing out raw database ids;
//! they are not secret.

const PREFIX: &str = "GRP-";
const RADIX: u32 = 36;

fn checksum(group_id: i64) -> char {
    // (id * 7 + 13) mod 36, reduced first so large ids cannot overflow
    let value = ((group_id % 36) * 7 + 13) % 36;
    to_digit_char(value as u32)
}

fn to_digit_char(value: u32) -> char {
    std::char::from_digit(value, RADIX)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('0')
}

fn to_base36(mut n: i64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(to_digit_char((n % 36) as u32));
        n /= 36;
    }
    digits.iter().rev().collect()
}

/// Encode a group id as an invite code.
pub fn encode(group_id: i64) -> String {
    format!("{}{}{}", PREFIX, to_base36(group_id), checksum(group_id))
}

/// Decode an invite code back into a group id.
///
/// Returns `None` for anything that is not a well-formed code with a valid
/// checksum. The prefix is optional and case-insensitive; the checksum
/// character must be upper case, as produced by [`encode`].
pub fn decode(invite_code: &str) -> Option<i64> {
    let code = invite_code.trim();
    let code = match code.get(..PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(PREFIX) => &code[PREFIX.len()..],
        _ => code,
    };

    if code.len() < 2 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    let (digits, check) = code.split_at(code.len() - 1);
    let group_id = i64::from_str_radix(digits, RADIX).ok()?;
    if group_id <= 0 {
        return None;
    }

    let expected = checksum(group_id);
    if check.chars().next() != Some(expected) {
        return None;
    }

    Some(group_id)
}
