//! Shared data-only types: errors, policies, and reports.

pub mod errors;
pub mod report;

pub use errors::{Error, Result};
pub use report::ExtractionReport;

/// Policy governing whether an atomic install may replace an existing
/// destination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Overwrite {
    /// Fail with [`Error::PathExists`] if the destination exists at install
    /// time. The check happens at install, not at staging creation, so there
    /// is no time-of-check/time-of-use gap.
    #[default]
    Forbid,
    /// Replace any pre-existing destination as part of the install.
    Replace,
}
