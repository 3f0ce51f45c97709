//! Staging-name generation.
//!
//! Staging entries are hidden dot-siblings of their destination:
//! `.<name>_<random>.tmp` for files and `.<name>_<random>_tmp` for
//! directories. Sharing the destination's parent directory guarantees the
//! terminal rename is a same-volume, metadata-only operation.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::constants::{STAGING_NAME_TRIES, STAGING_RANDOM_LEN};

/// Compute one candidate staging sibling for `dest` with the given suffix.
#[must_use]
pub fn staging_sibling(dest: &Path, suffix: &str) -> PathBuf {
    let name = dest
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("staging");
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut random = Uuid::new_v4().simple().to_string();
    random.truncate(STAGING_RANDOM_LEN);
    parent.join(format!(".{name}_{random}{suffix}"))
}

/// Create an exclusively-owned staging file beside `dest`, retrying with a
/// fresh random name whenever the candidate already exists.
pub fn create_staging_file(dest: &Path, suffix: &str) -> std::io::Result<(PathBuf, File)> {
    for _ in 0..STAGING_NAME_TRIES {
        let candidate = staging_sibling(dest, suffix);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(std::io::Error::other(format!(
        "no usable staging filename beside {}",
        dest.display()
    )))
}

/// Create an exclusively-owned staging directory beside `dest`, retrying on
/// name collision like [`create_staging_file`].
pub fn create_staging_dir(dest: &Path, suffix: &str) -> std::io::Result<PathBuf> {
    for _ in 0..STAGING_NAME_TRIES {
        let candidate = staging_sibling(dest, suffix);
        match std::fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(std::io::Error::other(format!(
        "no usable staging dirname beside {}",
        dest.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{STAGING_DIR_SUFFIX, STAGING_FILE_SUFFIX};

    #[test]
    fn staging_name_is_hidden_sibling() {
        let dest = Path::new("/some/parent/target.txt");
        let staged = staging_sibling(dest, STAGING_FILE_SUFFIX);
        assert_eq!(staged.parent(), dest.parent());
        let name = staged.file_name().and_then(|s| s.to_str()).unwrap();
        assert!(name.starts_with(".target.txt_"));
        assert!(name.ends_with(".tmp"));
    }

    #[test]
    fn staging_names_do_not_repeat() {
        let dest = Path::new("/some/parent/target");
        let a = staging_sibling(dest, STAGING_DIR_SUFFIX);
        let b = staging_sibling(dest, STAGING_DIR_SUFFIX);
        assert_ne!(a, b);
    }
}
