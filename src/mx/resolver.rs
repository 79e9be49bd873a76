use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;
use trust_dns_resolver::{
    Resolver,
    error::{ResolveError, ResolveErrorKind},
};

use super::{Error, MxProbe, MxRecord, MxStatus};
use crate::config;

/// DNS-backed prober using the system resolver configuration.
///
/// Results are memoized per domain, so a domain that appears on many rows
/// is only resolved once per run.
pub struct DnsProber {
    inner: CachingProber<Resolver>,
}

impl DnsProber {
    /// Build a prober with a per-query timeout, clamped to the configured
    /// bounds and applied with a single attempt per query.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let (conf, mut opts) =
            trust_dns_resolver::system_conf::read_system_conf().map_err(Error::resolver_init)?;
        opts.timeout = clamp_timeout(timeout);
        opts.attempts = 1;
        let resolver = Resolver::new(conf, opts).map_err(Error::resolver_init)?;
        Ok(Self {
            inner: CachingProber::new(resolver),
        })
    }
}

impl MxProbe for DnsProber {
    fn probe(&mut self, domain: &str) -> MxStatus {
        self.inner.probe(domain)
    }
}

/// Memoizing wrapper around any [`LookupMx`] implementation.
pub(crate) struct CachingProber<R: LookupMx> {
    resolver: R,
    cache: HashMap<String, MxStatus>,
}

impl<R: LookupMx> CachingProber<R> {
    pub(crate) fn new(resolver: R) -> Self {
        Self {
            resolver,
            cache: HashMap::new(),
        }
    }

    pub(crate) fn probe(&mut self, domain: &str) -> MxStatus {
        if let Some(status) = self.cache.get(domain) {
            return *status;
        }
        let status = probe_with(&self.resolver, domain);
        debug!(domain, ?status, "MX probe");
        self.cache.insert(domain.to_string(), status);
        status
    }
}

pub(crate) fn clamp_timeout(timeout: Duration) -> Duration {
    timeout.clamp(
        Duration::from_secs_f64(config::DNS_TIMEOUT_MIN_SECS),
        Duration::from_secs_f64(config::DNS_TIMEOUT_MAX_SECS),
    )
}

/// Map one lookup to the tri-state status.
///
/// Empty domains, IDNA failures, NXDOMAIN, and server errors all count as
/// `Absent`; only a timeout yields `Unknown`.
pub(crate) fn probe_with<R>(resolver: &R, domain: &str) -> MxStatus
where
    R: LookupMx,
{
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return MxStatus::Absent;
    }
    let ascii = match idna::domain_to_ascii(trimmed) {
        Ok(ascii) => ascii,
        Err(_) => return MxStatus::Absent,
    };
    match resolver.lookup_mx(&ascii) {
        Ok(records) if records.is_empty() => MxStatus::Absent,
        Ok(_) => MxStatus::Present,
        Err(err) => status_from_error(&err),
    }
}

fn status_from_error(err: &ResolveError) -> MxStatus {
    match err.kind() {
        ResolveErrorKind::Timeout => MxStatus::Unknown,
        _ => MxStatus::Absent,
    }
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    exchange.trim_end_matches('.').to_ascii_lowercase()
}

pub(crate) trait LookupMx {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError>;
}

impl LookupMx for Resolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        let lookup = Resolver::mx_lookup(self, domain)?;
        let mut records = Vec::new();
        for mx in lookup.iter() {
            let exchange = normalize_exchange(mx.exchange().to_utf8());
            records.push(MxRecord::new(mx.preference(), exchange));
        }
        Ok(records)
    }
}

#[cfg(test)]
impl LookupMx for crate::mx::tests::StubResolver {
    fn lookup_mx(&self, domain: &str) -> Result<Vec<MxRecord>, ResolveError> {
        (self.on_lookup)(domain)
    }
}
