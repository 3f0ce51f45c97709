use std::path::PathBuf;

/// Outcome of a successful extraction: every path written under the
/// destination plus per-kind counts.
#[derive(Clone, Debug, Default)]
pub struct ExtractionReport {
    /// Paths materialized on disk, in archive order.
    pub written: Vec<PathBuf>,
    pub files: usize,
    pub dirs: usize,
    pub symlinks: usize,
}

impl ExtractionReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.files + self.dirs + self.symlinks
    }
}
