//! Safety-checked archive extraction.
//!
//! Members are processed in a single forward pass over the archive stream.
//! Each member is resolved lexically against the destination root
//! ([`crate::archive::paths::resolve_member_path`]) before any byte is
//! written; the first unsafe member aborts the whole call unless the caller
//! opted into [`OnUnsafe::Allow`].
//!
//! Extraction is not transactional at the member level: members written
//! before an abort stay on disk. Callers that want all-or-nothing
//! extraction drive this through a [`crate::fs::DirStage`]:
//!
//! ```no_run
//! use std::path::Path;
//! use stagecraft::{with_dir_stage, extract, ExtractOptions, StageOptions};
//!
//! with_dir_stage(Path::new("/srv/app"), StageOptions::default(), |staging| {
//!     extract(Path::new("release.tar.gz"), staging, &ExtractOptions::default())
//! })?;
//! # Ok::<(), stagecraft::Error>(())
//! ```

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::archive::format::Format;
use crate::archive::paths::{resolve_member_path, resolve_member_path_lenient};
use crate::types::{Error, ExtractionReport, Result};

/// What to do with a member whose resolved path escapes the destination
/// root (or that is a symlink, which can redirect later members).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OnUnsafe {
    /// Abort the extraction with [`Error::UnsafePath`]. Default.
    #[default]
    Reject,
    /// Extract the member at its resolved path even when that escapes the
    /// destination, and materialize symlink members. Only for archives from
    /// a trusted source.
    Allow,
}

/// Options for [`extract`].
#[derive(Clone, Debug, Default)]
pub struct ExtractOptions {
    pub on_unsafe: OnUnsafe,
    /// Explicit format override instead of inferring from the filename.
    pub format: Option<Format>,
}

impl ExtractOptions {
    #[must_use]
    pub fn on_unsafe(mut self, policy: OnUnsafe) -> Self {
        self.on_unsafe = policy;
        self
    }

    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}

/// One member lifted out of the underlying codec, consumed immediately.
enum MemberKind {
    File,
    Directory,
    Symlink { target: PathBuf },
    Other,
}

/// Extract `file` into `destination`, creating it if missing.
///
/// # Errors
///
/// [`Error::NotSupported`] for unknown formats, [`Error::UnsafePath`] for
/// the first escaping member under [`OnUnsafe::Reject`], [`Error::Archive`]
/// for structural stream problems, and [`Error::Io`] for OS failures.
pub fn extract(file: &Path, destination: &Path, options: &ExtractOptions) -> Result<ExtractionReport> {
    let format = Format::for_file(file, options.format)?;
    std::fs::create_dir_all(destination)?;

    let mut report = ExtractionReport::default();
    match format {
        Format::Tar(codec) => {
            let reader = codec.decoder(File::open(file)?);
            let mut archive = tar::Archive::new(reader);
            for entry in archive.entries()? {
                let mut entry = entry?;
                let raw: PathBuf = entry.path()?.into_owned();
                let entry_type = entry.header().entry_type();
                let kind = if entry_type.is_dir() {
                    MemberKind::Directory
                } else if entry_type.is_symlink() {
                    let target = entry
                        .link_name()?
                        .map(|t| t.into_owned())
                        .ok_or_else(|| Error::archive("symlink member without target"))?;
                    MemberKind::Symlink { target }
                } else if entry_type.is_file() {
                    MemberKind::File
                } else {
                    MemberKind::Other
                };
                materialize(&raw, kind, &mut entry, destination, options, &mut report)?;
            }
        }
        Format::Zip => {
            let mut archive = zip::ZipArchive::new(File::open(file)?)?;
            for index in 0..archive.len() {
                let mut entry = archive.by_index(index)?;
                let raw = PathBuf::from(entry.name());
                let is_symlink = entry
                    .unix_mode()
                    .is_some_and(|mode| mode & 0o170_000 == 0o120_000);
                let kind = if entry.is_dir() {
                    MemberKind::Directory
                } else if is_symlink {
                    let mut target = String::new();
                    entry.read_to_string(&mut target)?;
                    MemberKind::Symlink {
                        target: PathBuf::from(target),
                    }
                } else {
                    MemberKind::File
                };
                materialize(&raw, kind, &mut entry, destination, options, &mut report)?;
            }
        }
    }
    Ok(report)
}

fn materialize(
    raw: &Path,
    kind: MemberKind,
    payload: &mut impl Read,
    destination: &Path,
    options: &ExtractOptions,
    report: &mut ExtractionReport,
) -> Result<()> {
    let resolved = match resolve_member_path(destination, raw) {
        Ok(path) => path,
        Err(e) => match options.on_unsafe {
            OnUnsafe::Reject => return Err(e),
            OnUnsafe::Allow => resolve_member_path_lenient(destination, raw),
        },
    };

    // A symlink may already sit on this member's path, either planted by an
    // earlier member or pre-existing at the destination, and a write through
    // it would land outside the root; containment is re-checked against the
    // live tree right before each write, not just at resolution time.
    if options.on_unsafe == OnUnsafe::Reject {
        reject_symlinks_on_path(destination, &resolved, raw)?;
    }

    match kind {
        MemberKind::Directory => {
            std::fs::create_dir_all(&resolved)?;
            report.dirs += 1;
        }
        MemberKind::File => {
            if let Some(parent) = resolved.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&resolved)?;
            std::io::copy(payload, &mut out)?;
            report.files += 1;
        }
        MemberKind::Symlink { target } => {
            if options.on_unsafe == OnUnsafe::Reject {
                return Err(Error::UnsafePath {
                    member: raw.to_path_buf(),
                });
            }
            if let Some(parent) = resolved.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let _ = std::fs::remove_file(&resolved);
            std::os::unix::fs::symlink(&target, &resolved)?;
            report.symlinks += 1;
        }
        // Hard links, fifos, devices: not materialized.
        MemberKind::Other => return Ok(()),
    }
    report.written.push(resolved);
    Ok(())
}

/// Fail when `resolved` itself, or any of its already-existing ancestors
/// strictly inside `destination`, is a symlink. The leaf matters as much as
/// the parents: `File::create` on a symlink follows it.
fn reject_symlinks_on_path(destination: &Path, resolved: &Path, raw: &Path) -> Result<()> {
    for ancestor in resolved.ancestors() {
        if !ancestor.starts_with(destination) || ancestor == destination {
            break;
        }
        match ancestor.symlink_metadata() {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(Error::UnsafePath {
                    member: raw.to_path_buf(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}
