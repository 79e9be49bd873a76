//! Disposable-domain membership plus domain-list file loading.
//!
//! List files are plain text, one domain per line; blank lines and `#`
//! comments are skipped, entries are trimmed and lowercased on load.

use std::collections::HashSet;
use std::io::{self, BufRead, BufReader, Read};

/// Exact membership test against an already-lowercased domain set.
///
/// Empty domains are never disposable.
pub fn is_disposable(domain: &str, disposable_set: &HashSet<String>) -> bool {
    !domain.is_empty() && disposable_set.contains(domain)
}

fn clean_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    Some(line.to_lowercase())
}

/// Load an unordered domain set (disposable blocklist).
pub fn load_domain_set<R: Read>(reader: R) -> io::Result<HashSet<String>> {
    let mut set = HashSet::new();
    for line in BufReader::new(reader).lines() {
        if let Some(domain) = clean_line(&line?) {
            set.insert(domain);
        }
    }
    Ok(set)
}

/// Load an ordered domain list (common providers for typo suggestions).
///
/// Order is preserved; it decides ties during fuzzy matching.
pub fn load_domain_list<R: Read>(reader: R) -> io::Result<Vec<String>> {
    let mut list = Vec::new();
    for line in BufReader::new(reader).lines() {
        if let Some(domain) = clean_line(&line?) {
            list.push(domain);
        }
    }
    Ok(list)
}
