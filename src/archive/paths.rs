//! Lexical member-path handling for both sides of the archive layer:
//! containment-checked resolution at extraction time, and root/repath
//! mapping of stored names at creation time.
//!
//! Resolution never touches the filesystem. Checking containment by
//! resolving real paths would be meaningless for members that do not exist
//! yet and exploitable through symlinks for ones that do; the extractor
//! layers its own symlink checks on top of this.

use std::path::{Component, Path, PathBuf};

use crate::types::{Error, Result};

/// Resolve an archive member's stored path against the extraction root.
///
/// The stored path is treated as relative no matter how the archive encoded
/// it: leading separators and drive-style prefixes are stripped, `.`
/// segments collapse, and `..` pops within the member's own segments. A pop
/// past the member's first segment, or a path that normalizes to nothing,
/// is rejected.
///
/// # Errors
///
/// [`Error::UnsafePath`] carrying the offending stored path.
pub fn resolve_member_path(root: &Path, raw: &Path) -> Result<PathBuf> {
    let unsafe_member = || Error::UnsafePath {
        member: raw.to_path_buf(),
    };

    let mut rel = PathBuf::new();
    let mut depth = 0usize;
    for comp in raw.components() {
        match comp {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(unsafe_member());
                }
                depth -= 1;
                rel.pop();
            }
            Component::Normal(seg) => {
                depth += 1;
                rel.push(seg);
            }
        }
    }
    if rel.as_os_str().is_empty() {
        return Err(unsafe_member());
    }
    Ok(root.join(rel))
}

/// Resolve a stored path without the containment check, for callers that
/// explicitly allowed escaping members. `..` may climb above the root.
#[must_use]
pub fn resolve_member_path_lenient(root: &Path, raw: &Path) -> PathBuf {
    let mut out = root.to_path_buf();
    for comp in raw.components() {
        match comp {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(seg) => out.push(seg),
        }
    }
    out
}

/// Compute an archive member's stored name at creation time.
///
/// The first `repath` entry whose key is a whole-component prefix of the
/// input path (as given, or of its root-relative form) replaces that prefix
/// with its mapped value. Otherwise the name is the input path with `root`
/// stripped.
///
/// # Errors
///
/// [`Error::Archive`] when the input path is not under `root`.
pub fn member_name(path: &Path, root: &Path, repath: &[(PathBuf, PathBuf)]) -> Result<PathBuf> {
    let rel = path.strip_prefix(root).map_err(|_| {
        Error::archive(format!(
            "paths must be a subpath of the root: {} is not under {}",
            path.display(),
            root.display()
        ))
    })?;

    for (key, mapped) in repath {
        if let Ok(rest) = path.strip_prefix(key) {
            return Ok(join_nonempty(mapped, rest));
        }
        if let Ok(rest) = rel.strip_prefix(key) {
            return Ok(join_nonempty(mapped, rest));
        }
    }
    Ok(rel.to_path_buf())
}

fn join_nonempty(mapped: &Path, rest: &Path) -> PathBuf {
    if rest.as_os_str().is_empty() {
        mapped.to_path_buf()
    } else {
        mapped.join(rest)
    }
}

/// Longest common component-prefix of a set of absolute paths. Stripping
/// its parent makes stored names relative while keeping the shared leading
/// directory visible inside the archive.
#[must_use]
pub fn common_ancestor(paths: &[PathBuf]) -> Option<PathBuf> {
    let first = paths.first()?;
    let mut common: Vec<Component> = first.components().collect();
    for path in &paths[1..] {
        let shared = common
            .iter()
            .zip(path.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        common.truncate(shared);
    }
    if common.is_empty() {
        return None;
    }
    Some(common.iter().collect())
}
