//! Atomic directory replace: stage an entire tree into a hidden sibling,
//! flush every member deepest-first, then install the tree at the
//! destination.

use std::path::{Path, PathBuf};

use crate::constants::STAGING_DIR_SUFFIX;
use crate::fs::atomic_file::nonempty_parent;
use crate::fs::staging::create_staging_dir;
use crate::fs::sync::{fsync_parent_dir, sync_tree};
use crate::fs::{swap, StageOptions};
use crate::types::{Error, Overwrite, Result};

/// Exclusively-owned staging directory for an atomic replace of one
/// destination tree.
///
/// The caller populates [`DirStage::path`] with ordinary filesystem
/// operations, then calls [`DirStage::commit`]. Dropping the stage without
/// a successful install removes the staging tree and leaves the destination
/// untouched.
pub struct DirStage {
    dest: PathBuf,
    staging: PathBuf,
    options: StageOptions,
    installed: bool,
}

impl DirStage {
    /// Create a staging directory beside `dest`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the destination's parent is missing,
    /// [`Error::PathExists`] when the destination is a regular file (a tree
    /// can never replace a file in place), an IO error when the staging
    /// directory cannot be created.
    pub fn begin(dest: &Path, options: StageOptions) -> Result<Self> {
        let parent = nonempty_parent(dest);
        if !parent.is_dir() {
            return Err(Error::NotFound {
                path: parent.to_path_buf(),
            });
        }
        if dest.is_file() {
            return Err(Error::PathExists {
                path: dest.to_path_buf(),
            });
        }

        let staging = create_staging_dir(dest, STAGING_DIR_SUFFIX)?;
        Ok(Self {
            dest: dest.to_path_buf(),
            staging,
            options,
            installed: false,
        })
    }

    /// Root of the staging tree; address all staged content relative to it.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.staging
    }

    /// Destination the stage will install to.
    #[must_use]
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Flush the staged tree (unless `skip_sync`) and install it at the
    /// destination. Returns the destination path.
    ///
    /// Flushing is deepest-first, so when a directory's entry table is
    /// flushed all of its children are already durable. Install is a single
    /// rename when the destination is absent; with [`Overwrite::Replace`]
    /// an existing destination goes through [`swap::replace_tree`].
    ///
    /// # Errors
    ///
    /// [`Error::PathExists`] when overwrite is forbidden and the destination
    /// exists at install time; an IO error when a flush or rename fails. On
    /// any failure the staging tree is removed and the destination keeps its
    /// prior contents.
    pub fn commit(mut self) -> Result<PathBuf> {
        if !self.options.skip_sync {
            sync_tree(&self.staging)?;
        }

        let dest_exists = self.dest.symlink_metadata().is_ok();
        if dest_exists {
            match self.options.overwrite {
                Overwrite::Forbid => {
                    return Err(Error::PathExists {
                        path: self.dest.clone(),
                    });
                }
                Overwrite::Replace => swap::replace_tree(&self.staging, &self.dest)?,
            }
        } else {
            std::fs::rename(&self.staging, &self.dest)?;
        }
        self.installed = true;

        if !self.options.skip_sync {
            fsync_parent_dir(&self.dest)?;
        }
        Ok(self.dest.clone())
    }
}

impl Drop for DirStage {
    fn drop(&mut self) {
        if !self.installed {
            // Discard path: surface nothing, the caller's error wins.
            let _ = std::fs::remove_dir_all(&self.staging);
        }
    }
}

/// Scoped atomic directory write: `populate` fills the staged tree, a
/// normal return commits, and any error removes the staging tree.
///
/// # Errors
///
/// Propagates errors from `populate`, [`DirStage::begin`], and
/// [`DirStage::commit`].
pub fn with_dir_stage<T>(
    dest: &Path,
    options: StageOptions,
    populate: impl FnOnce(&Path) -> Result<T>,
) -> Result<T> {
    let stage = DirStage::begin(dest, options)?;
    let out = populate(stage.path())?;
    stage.commit()?;
    Ok(out)
}
