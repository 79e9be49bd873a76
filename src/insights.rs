//! Post-run summarization: reason histograms and KPI assembly.
//!
//! Pure read-only postprocessing of the pipeline outputs; nothing here can
//! fail, empty inputs just give empty results.

use std::collections::HashMap;
use std::time::Duration;

use crate::table::Table;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ReasonStat {
    pub reason: String,
    pub count: usize,
    pub percent: f64,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryKpis {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub rejected_rows: usize,
    pub suppressed_rows: Option<usize>,
    pub valid_rate_pct: f64,
    pub duration_s: Option<f64>,
}

pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Count individual reason tokens and their share of all occurrences.
///
/// The reason column holds semicolon-joined codes; blanks are ignored.
/// Sorted by count descending, stable, so ties keep first-encountered
/// order. Percent is over the total number of reason occurrences.
pub fn reasons_histogram(table: &Table, reason_col: &str) -> Vec<ReasonStat> {
    let Ok(idx) = table.column_index(reason_col) else {
        return Vec::new();
    };

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in table.rows() {
        for token in row[idx].split(';').map(str::trim).filter(|t| !t.is_empty()) {
            if let Some(count) = counts.get_mut(token) {
                *count += 1;
            } else {
                counts.insert(token.to_string(), 1);
                order.push(token.to_string());
            }
        }
    }

    let total: usize = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }

    let mut stats: Vec<ReasonStat> = order
        .into_iter()
        .map(|reason| {
            let count = counts.get(&reason).copied().unwrap_or(0);
            ReasonStat {
                percent: round2(count as f64 / total as f64 * 100.0),
                reason,
                count,
            }
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats
}

/// Merge the reason columns of rejected and suppressed outputs into one
/// single-column table for histogram consumption.
///
/// Tables lacking the reason column contribute nothing.
pub fn combine_for_insights(rejected: &Table, suppressed: &Table, reason_col: &str) -> Table {
    let mut out = Table::new(vec![reason_col.to_string()]);
    for table in [rejected, suppressed] {
        let Ok(idx) = table.column_index(reason_col) else {
            continue;
        };
        for row in table.rows() {
            // single-column pushes cannot be ragged
            let _ = out.push_row(vec![row[idx].clone()]);
        }
    }
    out
}

/// Assemble the standard run KPIs.
///
/// `total` of zero gives a 0.0 rate instead of dividing by zero. The rate is
/// computed against the original input total, not the post-dedup count.
pub fn summary_kpis(
    total: usize,
    valid: usize,
    rejected: usize,
    suppressed: Option<usize>,
    duration: Option<Duration>,
) -> SummaryKpis {
    let valid_rate_pct = if total == 0 {
        0.0
    } else {
        round2(valid as f64 / total as f64 * 100.0)
    };
    SummaryKpis {
        total_rows: total,
        valid_rows: valid,
        rejected_rows: rejected,
        suppressed_rows: suppressed,
        valid_rate_pct,
        duration_s: duration.map(|d| (d.as_secs_f64() * 1000.0).round() / 1000.0),
    }
}
