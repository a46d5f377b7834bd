//! Login audit constants and pure helpers.
//!
//! Shared by the persistence layer (which enforces the field caps and the
//! brute-force threshold) and the audit service.

use std::collections::{BTreeSet, HashMap};

/// Maximum stored length of `user_agent`, in characters.
pub const MAX_USER_AGENT_CHARS: usize = 500;

/// Maximum stored length of `failure_reason`, in characters.
pub const MAX_FAILURE_REASON_CHARS: usize = 200;

/// An IP address becomes suspicious with strictly more failures than this.
pub const SUSPICIOUS_FAILURE_THRESHOLD: usize = 5;

/// Default look-back window for login history.
pub const DEFAULT_HISTORY_DAYS: i64 = 30;

/// Default retention window for audit entries.
pub const DEFAULT_RETENTION_DAYS: i64 = 90;

/// Longest look-back accepted for history queries and the retention window.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Failure reasons written by the login flow.
pub mod failure_reasons {
    pub const UNKNOWN_USER: &str = "Unknown username";
    pub const INACTIVE_ACCOUNT: &str = "Account inactive";
    pub const INVALID_PASSWORD: &str = "Invalid password";
    pub const ROLE_NOT_FOUND: &str = "Role not found";
    pub const TOKEN_ISSUANCE_FAILED: &str = "Token issuance failed";
    pub const LOOKUP_FAILED: &str = "Account lookup failed";
}

/// Truncate `value` to at most `max_chars` characters.
///
/// Counts Unicode scalar values, so a multi-byte character is never split.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => value[..byte_idx].to_string(),
        None => value.to_string(),
    }
}

/// Return the IP addresses with more than `threshold` failed attempts among
/// `attempts`, given as `(ip_address, success)` pairs already restricted to
/// the window of interest.
pub fn suspicious_ips<'a, I>(attempts: I, threshold: usize) -> BTreeSet<&'a str>
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    let mut failures: HashMap<&'a str, usize> = HashMap::new();
    for (ip, success) in attempts {
        if !success {
            *failures.entry(ip).or_default() += 1;
        }
    }
    failures
        .into_iter()
        .filter(|(_, count)| *count > threshold)
        .map(|(ip, _)| ip)
        .collect()
}
