//! Durability primitives: flush a file's bytes or a directory's entry table
//! to stable storage.
//!
//! Directory fsync goes through a directory handle opened with
//! `O_DIRECTORY | O_NOFOLLOW` so a symlink planted at the path cannot
//! redirect the flush. Filesystems that reject fsync on directory handles
//! (EINVAL/ENOTSUP and friends) degrade to a no-op instead of failing the
//! whole install; callers that want no syncing at all use `skip_sync`.

use std::fs::File;
use std::path::Path;

use rustix::fd::OwnedFd;
use rustix::fs::{openat, Mode, OFlags, CWD};
use rustix::io::Errno;
use walkdir::WalkDir;

fn errno_to_io(e: Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(e.raw_os_error())
}

/// Open a directory with `O_DIRECTORY | O_NOFOLLOW`.
///
/// # Errors
///
/// Returns an IO error if the directory cannot be opened.
pub fn open_dir_nofollow(dir: &Path) -> std::io::Result<OwnedFd> {
    use std::os::unix::ffi::OsStrExt;
    let c = std::ffi::CString::new(dir.as_os_str().as_bytes())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "invalid path"))?;
    openat(
        CWD,
        c.as_c_str(),
        OFlags::RDONLY | OFlags::DIRECTORY | OFlags::CLOEXEC | OFlags::NOFOLLOW,
        Mode::empty(),
    )
    .map_err(errno_to_io)
}

/// Force a file's written bytes to stable storage.
///
/// # Errors
///
/// Returns an IO error on OS or storage failure; sync failures are fatal to
/// the surrounding install.
pub fn fsync_file(file: &File) -> std::io::Result<()> {
    file.sync_all()
}

/// Force a directory's entry table to stable storage, so a rename or unlink
/// performed inside it survives a crash.
///
/// # Errors
///
/// Returns an IO error on real storage failure. Errnos that mean "directory
/// fsync is not supported here" are swallowed.
pub fn fsync_dir(dir: &Path) -> std::io::Result<()> {
    let dirfd = open_dir_nofollow(dir)?;
    match rustix::fs::fsync(&dirfd) {
        Ok(()) => Ok(()),
        Err(e) if matches!(e, Errno::INVAL | Errno::NOTSUP | Errno::ROFS | Errno::BADF) => Ok(()),
        Err(e) => Err(errno_to_io(e)),
    }
}

/// [`fsync_dir`] on the parent of `path`; a no-op when `path` has no parent.
///
/// # Errors
///
/// Returns an IO error if the parent cannot be opened or fsynced.
pub fn fsync_parent_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fsync_dir(parent)?;
    }
    Ok(())
}

/// Flush every regular file and every directory under `root`, deepest first,
/// so each directory is flushed only after all of its children are durable.
/// `root` itself is flushed last. Symlinks are neither followed nor flushed.
///
/// # Errors
///
/// Returns an IO error if the walk or any flush fails.
pub fn sync_tree(root: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(root).follow_links(false).contents_first(true) {
        let entry = entry.map_err(std::io::Error::other)?;
        let ft = entry.file_type();
        if ft.is_file() {
            fsync_file(&File::open(entry.path())?)?;
        } else if ft.is_dir() {
            fsync_dir(entry.path())?;
        }
    }
    Ok(())
}
