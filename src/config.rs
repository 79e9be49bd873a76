//! Central tunables shared by the library and the CLI.
//!
//! Keeping these in one place keeps the CLI flags, docs, and pipeline
//! defaults in sync.

/// Maximum input CSV size in megabytes accepted by the CLI.
pub const MAX_FILE_MB: u64 = 20;

/// Default per-domain DNS MX query timeout in seconds.
pub const DNS_TIMEOUT_SECS: f64 = 2.0;

/// Lower bound for the MX timeout; shorter values get clamped up.
pub const DNS_TIMEOUT_MIN_SECS: f64 = 0.5;

/// Upper bound for the MX timeout; longer values get clamped down.
pub const DNS_TIMEOUT_MAX_SECS: f64 = 5.0;

/// Maximum edit distance for a domain typo suggestion.
pub const LEVENSHTEIN_MAX_DIST: usize = 2;
