//! Domain typo detection and correction.
//!
//! A static table covers well-known provider misspellings; everything else
//! goes through a Levenshtein scan over the supplied common-domain list.

use phf::phf_map;
use textdistance::str::levenshtein;
use tracing::debug;

/// Explicit well-known misspellings mapped to the intended domain.
pub static COMMON_FIXES: phf::Map<&'static str, &'static str> = phf_map! {
    "gmal.com" => "gmail.com",
    "gmial.com" => "gmail.com",
    "gmaill.com" => "gmail.com",
    "yaho.com" => "yahoo.com",
    "hotnail.com" => "hotmail.com",
};

/// Suggest a likely correction for `domain`, or `None` if nothing is close.
///
/// The explicit fix table is consulted first and short-circuits the distance
/// scan. Otherwise the closest entry of `common_domains` wins, with strict
/// less-than comparison so the earliest entry in list order takes ties.
pub fn suggest_domain(
    domain: &str,
    common_domains: &[String],
    threshold: usize,
) -> Option<String> {
    if domain.is_empty() {
        return None;
    }
    if let Some(fixed) = COMMON_FIXES.get(domain) {
        return Some((*fixed).to_string());
    }

    let mut best: Option<(&str, usize)> = None;
    for candidate in common_domains {
        let dist = levenshtein(domain, candidate);
        if best.is_none_or(|(_, best_dist)| dist < best_dist) {
            best = Some((candidate, dist));
        }
    }

    match best {
        Some((candidate, dist)) if dist <= threshold => {
            debug!(domain, suggestion = candidate, dist, "domain suggestion");
            Some(candidate.to_string())
        }
        _ => None,
    }
}
