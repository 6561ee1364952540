//! Z-Pay parameter signing.
//!
//! The gateway authenticates both directions with the same construction:
//!
//! 1. drop `sign`, `sign_type` and every parameter whose value is empty
//! 2. sort the remaining keys lexicographically
//! 3. join as `key=value` pairs with `&` (raw values, no URL encoding)
//! 4. append the merchant key and take the lowercase hex MD5 digest
//!
//! Outgoing checkout redirects and incoming notifications must go through the
//! exact same function, otherwise the gateway rejects our requests or we
//! reject its callbacks.

use std::collections::BTreeMap;

use md5::{Digest, Md5};
use subtle::ConstantTimeEq;

/// Parameter carrying the digest itself.
pub const SIGN_PARAM: &str = "sign";
/// Parameter naming the digest algorithm.
pub const SIGN_TYPE_PARAM: &str = "sign_type";
/// The only algorithm Z-Pay supports.
pub const SIGN_TYPE_MD5: &str = "MD5";

fn is_signed_field(key: &str, value: &str) -> bool {
    key != SIGN_PARAM && key != SIGN_TYPE_PARAM && !value.is_empty()
}

/// Canonical `k=v&k=v` string the digest is computed over.
///
/// If a key appears more than once the last value wins.
pub fn canonical_string<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut sorted = BTreeMap::new();
    for (k, v) in params {
        sorted.insert(k.as_ref().to_string(), v.as_ref().to_string());
    }

    sorted
        .iter()
        .filter(|(k, v)| is_signed_field(k, v))
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Compute the signature for a parameter set.
pub fn sign<I, K, V>(params: I, key: &str) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut hasher = Md5::new();
    hasher.update(canonical_string(params).as_bytes());
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a received `sign` value against the parameters it claims to cover.
///
/// `params` may include `sign` and `sign_type`; both are ignored when the
/// digest is recomputed.
pub fn verify<I, K, V>(params: I, key: &str, provided: &str) -> bool
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let expected = sign(params, key);
    let expected_bytes = expected.as_bytes();
    let provided_bytes = provided.as_bytes();

    // Digest length is public (always 32 hex chars)
    if expected_bytes.len() != provided_bytes.len() {
        return false;
    }

    expected_bytes.ct_eq(provided_bytes).into()
}
