//! Atomic file replace: stage content into a hidden sibling, flush it, then
//! install it at the destination with a single directory-entry rename.

use std::fs::File;
use std::io::{ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::constants::STAGING_FILE_SUFFIX;
use crate::fs::staging::create_staging_file;
use crate::fs::sync::{fsync_file, fsync_parent_dir};
use crate::fs::StageOptions;
use crate::types::{Error, Overwrite, Result};

/// Exclusively-owned staging file for an atomic replace of one destination.
///
/// Obtained from [`FileStage::begin`], written through its [`Write`] impl
/// (or [`FileStage::file_mut`]), and finished with [`FileStage::commit`].
/// Dropping the stage without a successful install unlinks the staging file
/// and leaves the destination untouched.
pub struct FileStage {
    dest: PathBuf,
    staging: PathBuf,
    file: Option<File>,
    options: StageOptions,
    installed: bool,
}

impl FileStage {
    /// Open a staging file beside `dest`.
    ///
    /// The destination's parent directory must already exist; with
    /// [`Overwrite::Forbid`] the existence of `dest` itself is only checked
    /// at install time to avoid a check-to-use gap.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the parent directory is missing, an IO error
    /// when `dest` is a directory or the staging file cannot be created.
    pub fn begin(dest: &Path, options: StageOptions) -> Result<Self> {
        let parent = nonempty_parent(dest);
        if !parent.is_dir() {
            return Err(Error::NotFound {
                path: parent.to_path_buf(),
            });
        }
        if dest.is_dir() {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("atomic file target must not be a directory: {}", dest.display()),
            )
            .into());
        }

        let (staging, file) = create_staging_file(dest, STAGING_FILE_SUFFIX)?;
        Ok(Self {
            dest: dest.to_path_buf(),
            staging,
            file: Some(file),
            options,
            installed: false,
        })
    }

    /// Path of the hidden staging file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.staging
    }

    /// Destination the stage will install to.
    #[must_use]
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Mutable handle to the staging file for callers that need more than
    /// the [`Write`] impl (e.g. seeking archive writers).
    pub fn file_mut(&mut self) -> &mut File {
        self.file.as_mut().expect("staging file open until commit")
    }

    /// Flush, fsync (unless `skip_sync`), and atomically install the staged
    /// content at the destination. Returns the destination path.
    ///
    /// # Errors
    ///
    /// [`Error::PathExists`] when overwrite is forbidden and the destination
    /// exists at install time; an IO error when the flush or rename fails.
    /// On any failure the staging file is removed and the destination keeps
    /// its prior state.
    pub fn commit(mut self) -> Result<PathBuf> {
        let mut file = self.file.take().expect("staging file open until commit");
        file.flush().map_err(Error::Io)?;
        if !self.options.skip_sync {
            fsync_file(&file)?;
        }
        drop(file);

        match self.options.overwrite {
            Overwrite::Replace => {
                std::fs::rename(&self.staging, &self.dest)?;
                self.installed = true;
            }
            Overwrite::Forbid => {
                // Hard-linking the staged file to the destination fails
                // atomically when the destination exists, so the existence
                // check and the install are one step.
                match std::fs::hard_link(&self.staging, &self.dest) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                        return Err(Error::PathExists {
                            path: self.dest.clone(),
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
                self.installed = true;
                if let Err(e) = std::fs::remove_file(&self.staging) {
                    log::warn!(
                        "failed to remove staging file {} after install: {e}",
                        self.staging.display()
                    );
                }
            }
        }

        if !self.options.skip_sync {
            fsync_parent_dir(&self.dest)?;
        }
        Ok(self.dest.clone())
    }
}

impl Write for FileStage {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.file_mut().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file_mut().flush()
    }
}

impl Seek for FileStage {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.file_mut().seek(pos)
    }
}

impl Drop for FileStage {
    fn drop(&mut self) {
        if !self.installed {
            // Discard path: surface nothing, the caller's error wins.
            let _ = std::fs::remove_file(&self.staging);
        }
    }
}

/// Scoped atomic file write: `populate` writes the staged content, a normal
/// return commits, and any error discards the staging file.
///
/// # Errors
///
/// Propagates errors from `populate`, [`FileStage::begin`], and
/// [`FileStage::commit`].
pub fn with_file_stage<T>(
    dest: &Path,
    options: StageOptions,
    populate: impl FnOnce(&mut FileStage) -> Result<T>,
) -> Result<T> {
    let mut stage = FileStage::begin(dest, options)?;
    let out = populate(&mut stage)?;
    stage.commit()?;
    Ok(out)
}

/// Atomically replace `dest` with `contents`.
///
/// # Errors
///
/// Same failure modes as [`with_file_stage`].
pub fn write_file_atomic(dest: &Path, contents: &[u8], options: StageOptions) -> Result<()> {
    with_file_stage(dest, options, |stage| {
        stage.write_all(contents)?;
        Ok(())
    })
}

pub(crate) fn nonempty_parent(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
