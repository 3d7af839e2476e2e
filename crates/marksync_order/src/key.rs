//! Order-key representation and midpoint generation.

use crate::error::{OrderError, OrderResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The ordered alphabet that order keys are drawn from.
pub const DIGITS: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

const DIGIT_BYTES: &[u8] = DIGITS.as_bytes();
const BASE: usize = DIGIT_BYTES.len();

/// A sibling order key.
///
/// Keys are non-empty base-36 strings compared lexicographically. A
/// canonical key never ends in the minimal digit `0`, which guarantees
/// that a strictly smaller key exists below any key (head inserts always
/// terminate).
///
/// `OrderKey` is a value type; the tree store owns where keys live, this
/// crate only computes them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderKey(String);

impl OrderKey {
    /// Parses and validates a key.
    pub fn parse(key: impl Into<String>) -> OrderResult<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(OrderError::InvalidKey {
                key,
                reason: "key must not be empty",
            });
        }
        if !key.bytes().all(|c| DIGIT_BYTES.contains(&c)) {
            return Err(OrderError::InvalidKey {
                key,
                reason: "key contains a character outside the base-36 alphabet",
            });
        }
        if key.ends_with('0') {
            return Err(OrderError::InvalidKey {
                key,
                reason: "key must not end in the minimal digit",
            });
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderKey {
    type Error = OrderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<OrderKey> for String {
    fn from(key: OrderKey) -> Self {
        key.0
    }
}

/// Generates a key strictly between two bounds.
///
/// `None` on the left means "insert at head" (before every existing key);
/// `None` on the right means "insert at tail" (after every existing key).
/// Both bounds `None` yields the initial key for an empty sibling set.
///
/// The result always satisfies `a < key < b` for the bounds that are
/// present. Repeated insertion at the same boundary extends key length
/// instead of running out of precision, so no neighbor is ever renumbered.
pub fn key_between(a: Option<&OrderKey>, b: Option<&OrderKey>) -> OrderResult<OrderKey> {
    if let (Some(lower), Some(upper)) = (a, b) {
        if lower >= upper {
            return Err(OrderError::BoundsOutOfOrder {
                lower: lower.as_str().to_string(),
                upper: upper.as_str().to_string(),
            });
        }
    }

    let lower = a.map(|k| k.as_str().as_bytes()).unwrap_or(b"");
    let upper = b.map(|k| k.as_str().as_bytes());
    let mid = midpoint(lower, upper);

    // Midpoint output over validated inputs is itself canonical.
    OrderKey::parse(String::from_utf8_lossy(&mid).into_owned())
}

/// Totally orders two siblings.
///
/// The primary order is the key; ties (two clients independently picking
/// the same midpoint) fall back to the node id, so the sibling order is
/// well-defined without coordination.
pub fn sibling_cmp(a_key: &OrderKey, a_id: &str, b_key: &OrderKey, b_id: &str) -> Ordering {
    a_key.cmp(b_key).then_with(|| a_id.cmp(b_id))
}

/// Returns a byte string strictly between `a` and `b`.
///
/// `a` may be empty (unbounded below); `b` of `None` is unbounded above.
/// Requires `a < b` when `b` is present, and neither ending in `0`.
fn midpoint(a: &[u8], b: Option<&[u8]>) -> Vec<u8> {
    if let Some(b) = b {
        // Shared prefix is kept verbatim; `a` is treated as padded with
        // the minimal digit beyond its end.
        let mut n = 0;
        while n < b.len() && a.get(n).copied().unwrap_or(b'0') == b[n] {
            n += 1;
        }
        if n > 0 {
            let rest_a: &[u8] = if n < a.len() { &a[n..] } else { &[] };
            let mut out = b[..n].to_vec();
            out.extend(midpoint(rest_a, Some(&b[n..])));
            return out;
        }
    }

    let digit_a = a.first().map(|&c| digit_value(c)).unwrap_or(0);
    let digit_b = b
        .and_then(|b| b.first())
        .map(|&c| digit_value(c))
        .unwrap_or(BASE);

    if digit_b - digit_a > 1 {
        // Room for a single digit between the two leading digits.
        let mid = (digit_a + digit_b + 1) / 2;
        vec![DIGIT_BYTES[mid]]
    } else if b.map_or(false, |b| b.len() > 1) {
        // Leading digits are consecutive and `b` continues: its first
        // digit alone sorts strictly between the bounds.
        b.map(|b| b[..1].to_vec()).unwrap_or_default()
    } else {
        // Keep the leading digit of `a` and recurse on its remainder,
        // which extends the key instead of renumbering anything.
        let rest_a: &[u8] = if a.is_empty() { &[] } else { &a[1..] };
        let mut out = vec![DIGIT_BYTES[digit_a]];
        out.extend(midpoint(rest_a, None));
        out
    }
}

const fn digit_value(c: u8) -> usize {
    match c {
        b'0'..=b'9' => (c - b'0') as usize,
        b'a'..=b'z' => (c - b'a') as usize + 10,
        _ => 0,
    }
}
