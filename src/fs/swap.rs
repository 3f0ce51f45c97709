//! Directory replace protocol.
//!
//! POSIX rename cannot atomically replace a non-empty directory, so the
//! replace is three steps: rename the existing destination aside to a
//! hidden sibling, rename the staged tree into place, then delete the aside
//! copy. The whole sequence lives behind [`replace_tree`] so a platform
//! with a true atomic directory swap could substitute one without touching
//! callers.

use std::path::Path;

use crate::constants::{STAGING_DIR_SUFFIX, STAGING_NAME_TRIES};
use crate::fs::staging::staging_sibling;
use crate::types::Result;

/// Install `staging` at `dest`, replacing whatever is there.
///
/// After the second rename the install is complete: a failure while deleting
/// the aside copy is reported through `log::warn!` and does not fail the
/// call, since the destination already holds the new tree.
///
/// # Errors
///
/// Returns an IO error if either rename fails; in that case the destination
/// still holds its prior tree (the first rename is undone when possible).
pub fn replace_tree(staging: &Path, dest: &Path) -> Result<()> {
    let aside = free_sibling(dest)?;
    std::fs::rename(dest, &aside)?;

    if let Err(e) = std::fs::rename(staging, dest) {
        // Put the prior tree back before surfacing the failure.
        let _ = std::fs::rename(&aside, dest);
        return Err(e.into());
    }

    if let Err(e) = std::fs::remove_dir_all(&aside) {
        log::warn!(
            "replaced {} but could not delete the displaced copy {}: {e}",
            dest.display(),
            aside.display()
        );
    }
    Ok(())
}

/// Pick a hidden sibling name for the displaced destination that is not
/// currently taken. The subsequent rename still wins any race because it
/// replaces whatever appears at the name.
fn free_sibling(dest: &Path) -> std::io::Result<std::path::PathBuf> {
    for _ in 0..STAGING_NAME_TRIES {
        let candidate = staging_sibling(dest, STAGING_DIR_SUFFIX);
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(std::io::Error::other(format!(
        "no usable aside name beside {}",
        dest.display()
    )))
}
