#![forbid(unsafe_code)]
//! mailscrub_lib — cleaning & triage of tabular email lists.
//!
//! The pipeline takes rows with an email column, drops blanks/duplicates,
//! filters suppressed addresses, then classifies each remaining row as
//! valid, rejected (with reason codes), or suppressed.

pub mod cleaning;
pub mod config;
pub mod disposable;
pub mod insights;
pub mod mx;
pub mod pipeline;
pub mod suggest;
pub mod suppression;
pub mod table;
pub mod validator;

pub use cleaning::{dedupe_and_drop_blanks, normalize_email, split_local_domain};
pub use disposable::{is_disposable, load_domain_list, load_domain_set};
pub use insights::{
    ReasonStat, SummaryKpis, combine_for_insights, reasons_histogram, summary_kpis,
};
pub use mx::{MxProbe, MxStatus};
pub use pipeline::{
    Disposition, DomainData, PipelineError, Reason, RunOptions, RunOutcome, RunSummary, classify,
    run,
};
pub use suggest::{COMMON_FIXES, suggest_domain};
pub use suppression::{canonical_for_match, partition_suppressed, to_suppression_set};
pub use table::{Table, TableError};
pub use validator::{ValidationReport, is_rfc_valid, validate_email};

#[cfg(feature = "with-mx")]
pub use mx::{DnsProber, Error as MxError};
