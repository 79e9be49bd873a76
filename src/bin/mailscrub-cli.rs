use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use mailscrub_lib::{
    DomainData, MxProbe, ReasonStat, RunOptions, Table, combine_for_insights, config,
    load_domain_list, load_domain_set, reasons_histogram, run, summary_kpis, to_suppression_set,
};

#[derive(Parser)]
#[command(
    name = "mailscrub-cli",
    about = "Clean and triage a CSV email list: valid / rejected / suppressed."
)]
struct Cli {
    /// input CSV file (UTF-8, header row required)
    input: PathBuf,

    /// name of the email column
    #[arg(long, default_value = "email")]
    email_col: String,

    /// optional suppression CSV; matching rows are excluded before validation
    #[arg(long)]
    suppression: Option<PathBuf>,

    /// email column of the suppression CSV
    #[arg(long, default_value = "email")]
    suppression_col: String,

    /// disposable-domain blocklist file
    #[arg(long, default_value = "data/disposable_domains.txt")]
    disposable: PathBuf,

    /// common-domain list for typo suggestions (order decides ties)
    #[arg(long, default_value = "data/common_domains.txt")]
    common: PathBuf,

    /// reject borderline fixable rows with a suggestion instead of accepting
    #[arg(long)]
    no_safe_mode: bool,

    /// verify recipient domains have DNS MX records
    #[arg(long)]
    mx_check: bool,

    /// per-domain DNS timeout in seconds (clamped 0.5-5.0)
    #[arg(long, default_value_t = config::DNS_TIMEOUT_SECS, value_parser = parse_timeout)]
    mx_timeout: f64,

    /// directory for result CSVs
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// summary format
    #[arg(long, value_enum, default_value = "human")]
    format: SummaryFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SummaryFormat {
    Human,
    Json,
}

/// Timeout flag must be a finite, non-negative number of seconds;
/// `Duration::from_secs_f64` panics on anything else.
fn parse_timeout(s: &str) -> Result<f64, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err("timeout must be a non-negative number of seconds".to_string());
    }
    Ok(secs)
}

fn read_table(path: &Path) -> Result<Table> {
    let file =
        File::open(path).with_context(|| format!("open CSV '{}'", path.display()))?;
    ensure_size_within_limit(file.metadata()?.len(), path)?;
    Table::from_csv_reader(file).with_context(|| format!("parse CSV '{}'", path.display()))
}

fn ensure_size_within_limit(bytes: u64, path: &Path) -> Result<()> {
    if bytes > config::MAX_FILE_MB * 1024 * 1024 {
        bail!(
            "'{}' is larger than {} MB; split the list before cleaning",
            path.display(),
            config::MAX_FILE_MB
        );
    }
    Ok(())
}

fn write_csv_atomically(dir: &Path, name: &str, table: &Table) -> Result<()> {
    let bytes = table.to_csv_bytes().context("encode CSV")?;
    let path = dir.join(name);
    write_all_atomically(&path, &bytes)
        .with_context(|| format!("write '{}'", path.display()))
}

fn write_all_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    use std::io::Write;
    let tmp = path.with_extension("csv.tmp");
    {
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn histogram_table(stats: &[ReasonStat]) -> Table {
    let mut t = Table::new(vec![
        "reason".to_string(),
        "count".to_string(),
        "percent".to_string(),
    ]);
    for s in stats {
        // widths always match the three headers above
        let _ = t.push_row(vec![
            s.reason.clone(),
            s.count.to_string(),
            format!("{:.2}", s.percent),
        ]);
    }
    t
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let input = read_table(&cli.input)?;

    let disposable_file = File::open(&cli.disposable)
        .with_context(|| format!("open blocklist '{}'", cli.disposable.display()))?;
    let common_file = File::open(&cli.common)
        .with_context(|| format!("open common domains '{}'", cli.common.display()))?;
    let data = DomainData {
        disposable: load_domain_set(disposable_file).context("read blocklist")?,
        common_domains: load_domain_list(common_file).context("read common domains")?,
    };

    let suppression_set: HashSet<String> = match &cli.suppression {
        Some(path) => {
            let table = read_table(path)?;
            to_suppression_set(&table, &cli.suppression_col)
        }
        None => HashSet::new(),
    };

    let opts = RunOptions {
        safe_mode: !cli.no_safe_mode,
        mx_check: cli.mx_check,
        mx_timeout: Duration::from_secs_f64(cli.mx_timeout),
    };

    #[cfg(not(feature = "with-mx"))]
    if cli.mx_check {
        bail!("--mx-check requires building with the 'with-mx' feature");
    }

    #[cfg(feature = "with-mx")]
    let mut prober = if cli.mx_check {
        Some(mailscrub_lib::DnsProber::new(opts.mx_timeout).context("init DNS prober")?)
    } else {
        None
    };
    #[cfg(feature = "with-mx")]
    let prober_ref: Option<&mut dyn MxProbe> =
        prober.as_mut().map(|p| p as &mut dyn MxProbe);
    #[cfg(not(feature = "with-mx"))]
    let prober_ref: Option<&mut dyn MxProbe> = None;

    let outcome = run(
        &input,
        &cli.email_col,
        &data,
        &opts,
        prober_ref,
        &suppression_set,
    )?;

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create '{}'", cli.out_dir.display()))?;
    if !outcome.valid.is_empty() {
        write_csv_atomically(&cli.out_dir, "cleaned_emails.csv", &outcome.valid)?;
    }
    if !outcome.rejected.is_empty() {
        write_csv_atomically(&cli.out_dir, "rejected_emails.csv", &outcome.rejected)?;
    }
    if !outcome.suppressed.is_empty() {
        write_csv_atomically(&cli.out_dir, "suppressed_emails.csv", &outcome.suppressed)?;
    }

    let excluded = combine_for_insights(&outcome.rejected, &outcome.suppressed, "reasons");
    let hist = reasons_histogram(&excluded, "reasons");
    if !hist.is_empty() {
        write_csv_atomically(&cli.out_dir, "rejection_insights.csv", &histogram_table(&hist))?;
    }

    let summary = &outcome.summary;
    let kpis = summary_kpis(
        summary.total_rows,
        summary.valid_rows,
        summary.rejected_rows,
        (summary.suppressed_rows > 0).then_some(summary.suppressed_rows),
        Some(summary.duration),
    );

    match cli.format {
        SummaryFormat::Human => {
            let suppressed = match kpis.suppressed_rows {
                Some(n) => format!(", {n} suppressed"),
                None => String::new(),
            };
            println!(
                "Processed {} rows in {:.3}s -> {} valid, {} rejected{} ({}% valid).",
                kpis.total_rows,
                kpis.duration_s.unwrap_or(0.0),
                kpis.valid_rows,
                kpis.rejected_rows,
                suppressed,
                kpis.valid_rate_pct,
            );
            for s in &hist {
                println!("  {:<20} {:>6}  {:>6.2}%", s.reason, s.count, s.percent);
            }
        }
        SummaryFormat::Json => println!("{}", serde_json::to_string_pretty(&kpis)?),
    }

    // exit codes: 0 all clean, 2 some rows rejected, 1 fatal
    if summary.rejected_rows > 0 {
        std::process::exit(2);
    }
    Ok(())
}
