/// Outcome of a mail-exchange probe for one domain.
///
/// `Unknown` is reserved for timeouts: a transient network stall must never
/// be conflated with a definitive lack of MX records.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MxStatus {
    Present,
    Absent,
    Unknown,
}

/// Abstract lookup capability consumed by the triage pipeline.
///
/// Implementations may memoize per-domain results; `probe` takes `&mut self`
/// to allow that.
pub trait MxProbe {
    fn probe(&mut self, domain: &str) -> MxStatus;
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}
