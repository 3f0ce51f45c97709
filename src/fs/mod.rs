//! Filesystem mutation layer: durability primitives, staging-name
//! generation, and the atomic file/directory replace guards.

pub mod atomic_dir;
pub mod atomic_file;
pub mod staging;
pub mod swap;
pub mod sync;

pub use atomic_dir::{with_dir_stage, DirStage};
pub use atomic_file::{with_file_stage, write_file_atomic, FileStage};
pub use sync::{fsync_dir, fsync_file, fsync_parent_dir, sync_tree};

/// Knobs shared by [`FileStage`] and [`DirStage`].
#[derive(Clone, Copy, Debug, Default)]
pub struct StageOptions {
    pub overwrite: crate::types::Overwrite,
    /// Skip every fsync in the install protocol. Faster, but a crash shortly
    /// after the call can lose the rename or the staged bytes.
    pub skip_sync: bool,
}

impl StageOptions {
    #[must_use]
    pub fn overwrite(mut self, overwrite: crate::types::Overwrite) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn skip_sync(mut self, skip: bool) -> Self {
        self.skip_sync = skip;
        self
    }
}
