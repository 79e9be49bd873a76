//! RFC-style syntax validation for single addresses.
//!
//! The pipeline only needs the boolean verdict ([`is_rfc_valid`]);
//! [`validate_email`] keeps the individual findings for diagnostics.

mod domain;
mod local;
mod types;

pub use types::ValidationReport;

use domain::check_domain;
use local::is_local_ok;

/// Full syntax check, collecting every invalidating finding.
///
/// Never fails: malformed input yields a report with `ok = false`.
pub fn validate_email(email: &str) -> ValidationReport {
    let input = email.trim();
    let mut reasons = Vec::new();

    if input.len() > 254 {
        reasons.push(format!("total length {} > 254", input.len()));
    }

    // Rightmost '@' wins, consistent with the local/domain split used
    // throughout the pipeline.
    let Some((local, domain)) = input.rsplit_once('@') else {
        reasons.push("must contain '@'".to_string());
        return ValidationReport { ok: false, reasons };
    };

    if local.is_empty() || local.len() > 64 {
        reasons.push(format!("local part length {} invalid (1..=64)", local.len()));
    }
    if !is_local_ok(local) {
        reasons.push("invalid local part".to_string());
    }

    check_domain(domain, &mut reasons);

    ValidationReport {
        ok: reasons.is_empty(),
        reasons,
    }
}

/// Boolean facade over [`validate_email`].
pub fn is_rfc_valid(email: &str) -> bool {
    validate_email(email).ok
}
