//! Mail-exchange probing.
//!
//! The pipeline consumes the abstract [`MxProbe`] capability and its
//! tri-state [`MxStatus`]; the DNS-backed [`DnsProber`] lives behind the
//! `with-mx` feature so the core stays network-free.

mod types;

pub use types::{MxProbe, MxRecord, MxStatus};

#[cfg(feature = "with-mx")]
mod error;
#[cfg(feature = "with-mx")]
mod resolver;

#[cfg(feature = "with-mx")]
pub use error::MxError as Error;
#[cfg(feature = "with-mx")]
pub use resolver::DnsProber;
