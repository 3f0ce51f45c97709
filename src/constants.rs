//! Shared crate-wide constants.
//!
//! Centralizes the staging-name conventions so the on-disk layout is
//! documented in one place. Staging entries are always hidden dot-siblings
//! of their destination, which keeps the final rename same-directory and
//! therefore same-filesystem.

/// Suffix for file staging names: `.<filename>_<random>.tmp`.
pub const STAGING_FILE_SUFFIX: &str = ".tmp";

/// Suffix for directory staging names: `.<dirname>_<random>_tmp`.
/// Directories avoid a dotted suffix so the name never looks like a file
/// extension to tooling that walks the tree.
pub const STAGING_DIR_SUFFIX: &str = "_tmp";

/// How many fresh random names to try when a staging name collides with an
/// existing entry before giving up.
pub const STAGING_NAME_TRIES: u32 = 100;

/// Length in hex characters of the random fragment inside staging names.
pub const STAGING_RANDOM_LEN: usize = 8;
