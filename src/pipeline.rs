//! Triage pipeline: suppression split, dedup, per-record classification.
//!
//! [`run`] orchestrates a whole table; [`classify`] is the pure per-record
//! decision. Per-record problems never abort a run — they become reason
//! codes on the rejected rows. The only fatal conditions are detected
//! before any row is processed.

use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::info;

use crate::cleaning::{dedupe_and_drop_blanks, split_local_domain};
use crate::config;
use crate::disposable::is_disposable;
use crate::insights::round2;
use crate::mx::{MxProbe, MxStatus};
use crate::suggest::suggest_domain;
use crate::suppression::partition_suppressed;
use crate::table::{Table, TableError};
use crate::validator::is_rfc_valid;

/// Reason codes attached to rejected or suppressed rows.
///
/// Accumulation order on one record is fixed: syntax, disposable, then
/// MX-related.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    InvalidSyntax,
    DisposableDomain,
    NoMxRecord,
    MxUnknown,
    Suppressed,
}

impl Reason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidSyntax => "invalid_syntax",
            Self::DisposableDomain => "disposable_domain",
            Self::NoMxRecord => "no_mx_record",
            Self::MxUnknown => "mx_unknown",
            Self::Suppressed => "suppressed",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of triage for a single record.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Accepted; the email may carry an applied domain fix.
    Valid { email: String },
    /// Rejected with accumulated reasons and an optional suggested domain.
    Rejected {
        reasons: Vec<Reason>,
        suggested_domain: Option<String>,
    },
    /// Excluded by the suppression list before validation.
    Suppressed,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("email column '{0}' not found in input")]
    MissingColumn(String),
    #[error("MX checking enabled but no prober supplied")]
    MxProberMissing,
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Tunable policy for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Accept borderline rows (fixable, otherwise clean) instead of
    /// rejecting them with a suggestion.
    pub safe_mode: bool,
    pub mx_check: bool,
    /// Per-domain DNS timeout; probers clamp it to the configured bounds.
    pub mx_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            safe_mode: true,
            mx_check: false,
            mx_timeout: Duration::from_secs_f64(config::DNS_TIMEOUT_SECS),
        }
    }
}

/// Static domain inputs, injected by the host once per process.
#[derive(Debug, Clone, Default)]
pub struct DomainData {
    /// Disposable-provider blocklist, lowercased, membership only.
    pub disposable: HashSet<String>,
    /// Common legitimate domains in suggestion priority order.
    pub common_domains: Vec<String>,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Rows in the original input, before any dropping.
    pub total_rows: usize,
    /// Rows that reached triage after suppression and dedup/blank-drop.
    pub processed_rows: usize,
    pub valid_rows: usize,
    pub rejected_rows: usize,
    pub suppressed_rows: usize,
    /// Computed against `total_rows`, not the post-dedup count.
    pub valid_rate_pct: f64,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub valid: Table,
    pub rejected: Table,
    pub suppressed: Table,
    pub summary: RunSummary,
}

/// Classify one already-normalized address.
///
/// `prober` is only consulted when `opts.mx_check` is set and the domain is
/// non-empty; in every other case the MX status is treated as present.
pub fn classify(
    email: &str,
    data: &DomainData,
    opts: &RunOptions,
    mut prober: Option<&mut dyn MxProbe>,
) -> Disposition {
    let (local, domain) = split_local_domain(email);

    let rfc_ok = is_rfc_valid(email);
    let disposable = is_disposable(&domain, &data.disposable);
    let mx_status = match prober.as_deref_mut() {
        Some(p) if opts.mx_check && !domain.is_empty() => p.probe(&domain),
        _ => MxStatus::Present,
    };

    let fix = suggest_domain(&domain, &data.common_domains, config::LEVENSHTEIN_MAX_DIST);

    let mut reasons = Vec::new();
    if !rfc_ok {
        reasons.push(Reason::InvalidSyntax);
    }
    if disposable {
        reasons.push(Reason::DisposableDomain);
    }
    if opts.mx_check {
        match mx_status {
            MxStatus::Absent => reasons.push(Reason::NoMxRecord),
            MxStatus::Unknown => reasons.push(Reason::MxUnknown),
            MxStatus::Present => {}
        }
    }

    // Recoverable rather than broken: clean on every axis except for a
    // plausible domain typo.
    let borderline = rfc_ok
        && !disposable
        && (!opts.mx_check || mx_status == MxStatus::Present)
        && fix.is_some();

    // Under safe mode, borderline acceptance takes precedence over any
    // accumulated reasons.
    if reasons.is_empty() || (opts.safe_mode && borderline) {
        let email = match &fix {
            Some(fixed) if !disposable && !domain.is_empty() => format!("{local}@{fixed}"),
            _ => email.to_string(),
        };
        Disposition::Valid { email }
    } else {
        Disposition::Rejected {
            reasons,
            suggested_domain: fix,
        }
    }
}

fn join_reasons(reasons: &[Reason]) -> String {
    reasons
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(";")
}

/// Run the full pipeline over `input`.
///
/// Partitions are disjoint and exhaustive over the post-dedup rows, each
/// order-preserving relative to the input. Fatal conditions (missing email
/// column, MX checking without a prober) surface before any row is touched.
pub fn run(
    input: &Table,
    email_col: &str,
    data: &DomainData,
    opts: &RunOptions,
    mut prober: Option<&mut dyn MxProbe>,
    suppression_set: &HashSet<String>,
) -> Result<RunOutcome, PipelineError> {
    let started = Instant::now();
    let total_rows = input.len();

    let email_idx = input
        .column_index(email_col)
        .map_err(|_| PipelineError::MissingColumn(email_col.to_string()))?;
    if opts.mx_check && prober.is_none() {
        return Err(PipelineError::MxProberMissing);
    }

    let (suppressed_raw, working) = partition_suppressed(input, email_col, suppression_set)?;
    let suppressed = suppressed_raw.with_constant_column("reasons", Reason::Suppressed.as_str());

    let deduped = dedupe_and_drop_blanks(&working, email_col)?;
    let processed_rows = deduped.len();

    let mut valid = Table::new(input.headers().to_vec());
    let mut rejected_headers = input.headers().to_vec();
    rejected_headers.push("reasons".to_string());
    rejected_headers.push("suggested_domain".to_string());
    let mut rejected = Table::new(rejected_headers);

    for row in deduped.rows() {
        let email = &row[email_idx];
        // the `as` coercion re-narrows the trait object's lifetime so the
        // reborrow ends with each iteration
        let reborrowed = prober.as_deref_mut().map(|p| p as &mut dyn MxProbe);
        match classify(email, data, opts, reborrowed) {
            Disposition::Valid { email } => {
                let mut row = row.clone();
                row[email_idx] = email;
                valid.push_row(row)?;
            }
            Disposition::Rejected {
                reasons,
                suggested_domain,
            } => {
                let mut row = row.clone();
                row.push(join_reasons(&reasons));
                row.push(suggested_domain.unwrap_or_default());
                rejected.push_row(row)?;
            }
            // suppression already happened above; classify never returns this
            Disposition::Suppressed => {}
        }
    }

    let summary = RunSummary {
        total_rows,
        processed_rows,
        valid_rows: valid.len(),
        rejected_rows: rejected.len(),
        suppressed_rows: suppressed.len(),
        valid_rate_pct: if total_rows == 0 {
            0.0
        } else {
            round2(valid.len() as f64 / total_rows as f64 * 100.0)
        },
        duration: started.elapsed(),
    };
    info!(
        total = summary.total_rows,
        valid = summary.valid_rows,
        rejected = summary.rejected_rows,
        suppressed = summary.suppressed_rows,
        "pipeline run finished"
    );

    Ok(RunOutcome {
        valid,
        rejected,
        suppressed,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProbe(MxStatus);

    impl MxProbe for StaticProbe {
        fn probe(&mut self, _domain: &str) -> MxStatus {
            self.0
        }
    }

    struct CountingProbe {
        status: MxStatus,
        calls: usize,
    }

    impl MxProbe for CountingProbe {
        fn probe(&mut self, _domain: &str) -> MxStatus {
            self.calls += 1;
            self.status
        }
    }

    fn data() -> DomainData {
        DomainData {
            disposable: ["mailinator.com".to_string()].into(),
            common_domains: vec!["gmail.com".to_string()],
        }
    }

    fn table(values: &[&str]) -> Table {
        let mut t = Table::new(vec!["email".to_string(), "tag".to_string()]);
        for (i, v) in values.iter().enumerate() {
            t.push_row(vec![v.to_string(), format!("row{i}")]).unwrap();
        }
        t
    }

    fn emails(table: &Table) -> Vec<&str> {
        table.rows().iter().map(|r| r[0].as_str()).collect()
    }

    #[test]
    fn scenario_dedup_fix_and_reject() {
        let input = table(&[
            "user@gmial.com",
            "user@gmial.com",
            " ",
            "bad@",
            "x@mailinator.com",
        ]);
        let opts = RunOptions::default();
        let out = run(&input, "email", &data(), &opts, None, &HashSet::new()).unwrap();

        assert_eq!(emails(&out.valid), ["user@gmail.com"]);
        assert_eq!(emails(&out.rejected), ["bad@", "x@mailinator.com"]);
        let reasons_idx = out.rejected.column_index("reasons").unwrap();
        assert_eq!(out.rejected.rows()[0][reasons_idx], "invalid_syntax");
        assert_eq!(out.rejected.rows()[1][reasons_idx], "disposable_domain");
        // blank dropped before triage, duplicate collapsed
        assert_eq!(out.summary.total_rows, 5);
        assert_eq!(out.summary.processed_rows, 3);
        assert_eq!(out.summary.valid_rate_pct, 20.0);
    }

    #[test]
    fn scenario_suppression_happens_before_checks() {
        let input = table(&["a@x.com", "b@x.com"]);
        let supp: HashSet<String> = ["b@x.com".to_string()].into();
        let opts = RunOptions {
            mx_check: true,
            ..RunOptions::default()
        };
        // probe would reject everything with no_mx_record; the suppressed
        // row must not pick that reason up
        let mut probe = StaticProbe(MxStatus::Absent);
        let out = run(&input, "email", &data(), &opts, Some(&mut probe), &supp).unwrap();

        assert_eq!(emails(&out.suppressed), ["b@x.com"]);
        let reasons_idx = out.suppressed.column_index("reasons").unwrap();
        assert_eq!(out.suppressed.rows()[0][reasons_idx], "suppressed");
        assert_eq!(emails(&out.rejected), ["a@x.com"]);
    }

    #[test]
    fn one_prober_serves_every_row_in_a_run() {
        let input = table(&["a@gmial.com", "b@x.com", "c@y.com"]);
        let opts = RunOptions {
            mx_check: true,
            ..RunOptions::default()
        };
        let mut probe = CountingProbe {
            status: MxStatus::Present,
            calls: 0,
        };
        let out = run(
            &input,
            "email",
            &data(),
            &opts,
            Some(&mut probe),
            &HashSet::new(),
        )
        .unwrap();

        assert_eq!(probe.calls, 3);
        assert_eq!(emails(&out.valid), ["a@gmail.com", "b@x.com", "c@y.com"]);
        assert!(out.rejected.is_empty());
    }

    #[test]
    fn suppression_matches_case_insensitively() {
        let input = table(&["b@x.com"]);
        let supp: HashSet<String> = [crate::suppression::canonical_for_match("B@X.COM")].into();
        let out = run(
            &input,
            "email",
            &data(),
            &RunOptions::default(),
            None,
            &supp,
        )
        .unwrap();
        assert_eq!(out.suppressed.len(), 1);
        assert!(out.valid.is_empty());
        assert!(out.rejected.is_empty());
    }

    #[test]
    fn mx_timeout_rejects_with_exactly_mx_unknown() {
        let opts = RunOptions {
            safe_mode: false,
            mx_check: true,
            ..RunOptions::default()
        };
        let mut probe = StaticProbe(MxStatus::Unknown);
        // no fix available for example.com at distance <= 2 from gmail.com
        let disp = classify("user@example.com", &data(), &opts, Some(&mut probe));
        assert_eq!(
            disp,
            Disposition::Rejected {
                reasons: vec![Reason::MxUnknown],
                suggested_domain: None,
            }
        );
    }

    #[test]
    fn borderline_accept_wins_under_safe_mode() {
        let opts = RunOptions {
            safe_mode: true,
            mx_check: true,
            ..RunOptions::default()
        };
        let mut probe = StaticProbe(MxStatus::Present);
        let disp = classify("user@gmial.com", &data(), &opts, Some(&mut probe));
        assert_eq!(
            disp,
            Disposition::Valid {
                email: "user@gmail.com".to_string()
            }
        );
    }

    #[test]
    fn safe_mode_off_rejects_fixable_with_suggestion() {
        let opts = RunOptions {
            safe_mode: false,
            ..RunOptions::default()
        };
        let disp = classify("user@gmail.co", &data(), &opts, None);
        // borderline row: no hard reasons accumulate without MX checks,
        // so an otherwise-clean fixable address stays accepted even with
        // safe mode off (reasons is empty)
        assert_eq!(
            disp,
            Disposition::Valid {
                email: "user@gmail.com".to_string()
            }
        );
    }

    #[test]
    fn safe_mode_off_with_mx_absent_keeps_suggestion_on_reject() {
        let opts = RunOptions {
            safe_mode: false,
            mx_check: true,
            ..RunOptions::default()
        };
        let mut probe = StaticProbe(MxStatus::Absent);
        let disp = classify("user@gmail.co", &data(), &opts, Some(&mut probe));
        assert_eq!(
            disp,
            Disposition::Rejected {
                reasons: vec![Reason::NoMxRecord],
                suggested_domain: Some("gmail.com".to_string()),
            }
        );
    }

    #[test]
    fn disposable_domain_never_gets_fix_applied() {
        let mut data = data();
        data.common_domains.push("mailinator.com".to_string());
        let disp = classify("x@mailinator.com", &data, &RunOptions::default(), None);
        assert_eq!(
            disp,
            Disposition::Rejected {
                reasons: vec![Reason::DisposableDomain],
                suggested_domain: Some("mailinator.com".to_string()),
            }
        );
    }

    #[test]
    fn partitions_are_disjoint_and_exhaustive() {
        let input = table(&["a@x.com", "x@mailinator.com", "bad@", "s@x.com"]);
        let supp: HashSet<String> = ["s@x.com".to_string()].into();
        let out = run(
            &input,
            "email",
            &data(),
            &RunOptions::default(),
            None,
            &supp,
        )
        .unwrap();

        let mut all: Vec<&str> = emails(&out.valid);
        all.extend(emails(&out.rejected));
        all.extend(emails(&out.suppressed));
        all.sort_unstable();
        let mut expected = vec!["a@x.com", "x@mailinator.com", "bad@", "s@x.com"];
        expected.sort_unstable();
        assert_eq!(all, expected);
    }

    #[test]
    fn missing_email_column_is_fatal_before_processing() {
        let input = table(&["a@x.com"]);
        let err = run(
            &input,
            "mail",
            &data(),
            &RunOptions::default(),
            None,
            &HashSet::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(col) if col == "mail"));
    }

    #[test]
    fn mx_check_without_prober_is_fatal() {
        let input = table(&["a@x.com"]);
        let opts = RunOptions {
            mx_check: true,
            ..RunOptions::default()
        };
        let err = run(&input, "email", &data(), &opts, None, &HashSet::new()).unwrap_err();
        assert!(matches!(err, PipelineError::MxProberMissing));
    }

    #[test]
    fn empty_input_gives_zero_rate() {
        let input = table(&[]);
        let out = run(
            &input,
            "email",
            &data(),
            &RunOptions::default(),
            None,
            &HashSet::new(),
        )
        .unwrap();
        assert_eq!(out.summary.valid_rate_pct, 0.0);
        assert!(out.valid.is_empty() && out.rejected.is_empty() && out.suppressed.is_empty());
    }
}
