//! Suppression list handling.
//!
//! An externally supplied list of addresses is canonicalized once into a
//! set; matching rows are split out before any validation runs.

use std::collections::HashSet;

use tracing::debug;

use crate::cleaning::normalize_email;
use crate::table::{Table, TableError};

/// Case-insensitive canonical form used for suppression matching.
pub fn canonical_for_match(email: &str) -> String {
    normalize_email(email).to_lowercase()
}

/// Build the set of canonical emails from a suppression table.
///
/// Missing column or empty table yields an empty set; blank values are
/// discarded.
pub fn to_suppression_set(table: &Table, email_col: &str) -> HashSet<String> {
    let Ok(idx) = table.column_index(email_col) else {
        return HashSet::new();
    };
    table
        .rows()
        .iter()
        .map(|row| canonical_for_match(&row[idx]))
        .filter(|email| !email.is_empty())
        .collect()
}

/// Split `table` into (suppressed, remaining) by canonical email membership.
///
/// Runs before normalization/dedup in the overall pipeline, so rows keep
/// their original cell values in both outputs.
pub fn partition_suppressed(
    table: &Table,
    email_col: &str,
    suppression_set: &HashSet<String>,
) -> Result<(Table, Table), TableError> {
    let idx = table.column_index(email_col)?;
    let mut suppressed = Table::new(table.headers().to_vec());
    let mut remaining = Table::new(table.headers().to_vec());
    for row in table.rows() {
        let target = if suppression_set.contains(&canonical_for_match(&row[idx])) {
            &mut suppressed
        } else {
            &mut remaining
        };
        target.push_row(row.clone())?;
    }
    if !suppressed.is_empty() {
        debug!(count = suppressed.len(), "rows suppressed");
    }
    Ok((suppressed, remaining))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(col: &str, values: &[&str]) -> Table {
        let mut t = Table::new(vec![col.to_string()]);
        for v in values {
            t.push_row(vec![v.to_string()]).unwrap();
        }
        t
    }

    #[test]
    fn set_is_canonicalized_and_blank_free() {
        let t = table("email", &["A@x.com ", "  ", "b@x.com"]);
        let s = to_suppression_set(&t, "email");
        assert!(s.contains("a@x.com"));
        assert!(s.contains("b@x.com"));
        assert!(!s.contains(""));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn missing_column_yields_empty_set() {
        let t = table("email", &["a@x.com"]);
        assert!(to_suppression_set(&t, "mail").is_empty());
    }

    #[test]
    fn partition_matches_case_insensitively() {
        let main = table("email", &["a@x.com", "b@x.com", "c@x.com"]);
        let supp = to_suppression_set(&table("email", &["B@X.COM"]), "email");

        let (suppressed, remaining) = partition_suppressed(&main, "email", &supp).unwrap();
        assert_eq!(suppressed.rows(), [vec!["b@x.com".to_string()]]);
        assert_eq!(remaining.len(), 2);
    }
}
