//! Recipient enumerator: the distinct set of addresses to notify.

use std::collections::BTreeMap;

use campus_common::types::User;

/// Collect every contactable email address, deduplicated.
///
/// Addresses are trimmed; users without an address, or with a blank one,
/// are skipped. Duplicates are detected case-insensitively, and the first
/// address seen is delivered exactly as stored. The result is ordered by the
/// lowercase form so dispatch order is stable.
pub fn collect_recipients(users: &[User]) -> Vec<String> {
    let mut unique: BTreeMap<String, &str> = BTreeMap::new();
    for email in users
        .iter()
        .filter_map(|user| user.email.as_deref())
        .map(str::trim)
        .filter(|email| !email.is_empty())
    {
        unique.entry(email.to_lowercase()).or_insert(email);
    }

    unique.into_values().map(str::to_string).collect()
}
