//! Address normalization and table-level cleanup.
//!
//! `normalize_email` canonicalizes one raw value; `dedupe_and_drop_blanks`
//! prepares a table for triage by removing rows that must never reach the
//! classifier (blank or duplicate addresses).

use std::collections::HashSet;

use crate::table::{Table, TableError};

/// Trim surrounding whitespace and strip interior whitespace characters.
///
/// Idempotent: applying it twice gives the same result as once.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().chars().filter(|c| !c.is_whitespace()).collect()
}

/// Split an address into local part and lowercased domain.
///
/// Splits on the rightmost `@`; quoted local parts containing `@` are not
/// given special treatment. Without any `@`, the whole input is the local
/// part and the domain is empty.
pub fn split_local_domain(email: &str) -> (&str, String) {
    match email.rsplit_once('@') {
        Some((local, domain)) => (local, domain.to_lowercase()),
        None => (email, String::new()),
    }
}

/// Normalize the email column, then drop blank and duplicate rows.
///
/// The first occurrence of a duplicate wins. Matching is exact on the
/// normalized value (case preserved); case-insensitive exclusion is the
/// suppression filter's job, not this one's.
pub fn dedupe_and_drop_blanks(table: &Table, email_col: &str) -> Result<Table, TableError> {
    let idx = table.column_index(email_col)?;
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Table::new(table.headers().to_vec());
    for row in table.rows() {
        let email = normalize_email(&row[idx]);
        if email.is_empty() || !seen.insert(email.clone()) {
            continue;
        }
        let mut row = row.clone();
        row[idx] = email;
        out.push_row(row)?;
    }
    Ok(out)
}
