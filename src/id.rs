//! External order ids.
//!
//! Format: `zpay_{unix_millis}_{suffix}` where the suffix is lowercase hex.
//! Generated ids carry 12 hex chars (48 random bits) taken from a v4 UUID;
//! the millisecond prefix keeps ids roughly sortable for support lookups.
//! The `orders` primary key is the final uniqueness guarantee.

use chrono::Utc;
use uuid::Uuid;

pub const ORDER_ID_PREFIX: &str = "zpay_";

const GENERATED_SUFFIX_LEN: usize = 12;
const MAX_SUFFIX_LEN: usize = 32;

/// Generate a fresh order id.
pub fn new_order_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let random = Uuid::new_v4().as_simple().to_string();
    format!(
        "{}{}_{}",
        ORDER_ID_PREFIX,
        millis,
        &random[..GENERATED_SUFFIX_LEN]
    )
}

/// Cheap shape check used to reject garbage before it reaches the database.
///
/// Accepts `zpay_<digits>_<1..=32 hex chars>`.
pub fn is_valid_order_id(s: &str) -> bool {
    let Some(rest) = s.strip_prefix(ORDER_ID_PREFIX) else {
        return false;
    };
    let Some((millis, suffix)) = rest.split_once('_') else {
        return false;
    };

    !millis.is_empty()
        && millis.chars().all(|c| c.is_ascii_digit())
        && !suffix.is_empty()
        && suffix.len() <= MAX_SUFFIX_LEN
        && suffix.chars().all(|c| c.is_ascii_hexdigit())
}
