//! Archive creation.
//!
//! Stored names come from the root/repath mapping in
//! [`crate::archive::paths`]; the archive file itself is written through a
//! [`crate::fs::FileStage`] so a failure mid-creation never leaves a
//! partial archive at the destination.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

use crate::archive::format::Format;
use crate::archive::paths::{common_ancestor, member_name};
use crate::fs::atomic_file::with_file_stage;
use crate::fs::StageOptions;
use crate::types::{Error, Overwrite, Result};

/// Options for [`create`].
#[derive(Clone, Debug, Default)]
pub struct CreateOptions {
    /// Strip this prefix from input paths to form stored names. Inputs not
    /// under it, or all inputs when it is unset, have the common leading
    /// directory of all inputs stripped instead, so stored names are
    /// relative but keep their shared top directory.
    pub root: Option<PathBuf>,
    /// Prefix rename table; a key matches either the absolute input path
    /// or its root-stripped form, and the first matching entry wins.
    pub repath: Vec<(PathBuf, PathBuf)>,
    /// Explicit format override instead of inferring from the filename.
    pub format: Option<Format>,
}

impl CreateOptions {
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    #[must_use]
    pub fn repath(mut self, from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        self.repath.push((from.into(), to.into()));
        self
    }

    #[must_use]
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}

/// Create an archive at `file` containing `paths`; directories recurse.
///
/// Input paths may be relative or absolute; stored names are always
/// relative. Inputs mapping to a stored name that was already taken are
/// skipped (first occurrence wins) so the archive never carries duplicate
/// entries.
///
/// # Errors
///
/// [`Error::NotSupported`] for unknown formats, [`Error::Archive`] when no
/// inputs were supplied, [`Error::NotFound`] for a missing input, and
/// [`Error::Io`] for OS failures.
pub fn create(file: &Path, paths: &[PathBuf], options: &CreateOptions) -> Result<()> {
    let format = Format::for_file(file, options.format)?;
    if paths.is_empty() {
        return Err(Error::archive("no paths to archive"));
    }

    let inputs: Vec<PathBuf> = paths
        .iter()
        .map(|p| std::path::absolute(p).map_err(Error::Io))
        .collect::<Result<_>>()?;

    let explicit_root = match &options.root {
        Some(root) => Some(std::path::absolute(root)?),
        None => None,
    };
    // Inputs not under the explicit root fall back to common-directory
    // stripping, so stored names are never absolute.
    let common_root = common_ancestor(&inputs)
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("/"))
        .to_path_buf();

    // Repath keys are matched both absolute and root-relative inside
    // `member_name`, so they must reach it as given, not resolved against
    // the process working directory.
    let members = collect_members(&inputs, explicit_root.as_deref(), &common_root, &options.repath)?;

    let staging = StageOptions::default()
        .overwrite(Overwrite::Replace)
        .skip_sync(true);
    with_file_stage(file, staging, |stage| match format {
        Format::Tar(codec) => {
            let mut builder = tar::Builder::new(codec.encoder(stage.file_mut()));
            for (src, name) in &members {
                if src.is_dir() {
                    builder.append_dir(name, src)?;
                } else {
                    builder.append_path_with_name(src, name)?;
                }
            }
            builder.into_inner()?.finish()?;
            Ok(())
        }
        Format::Zip => {
            let mut writer = zip::ZipWriter::new(stage.file_mut());
            let entry_options = SimpleFileOptions::default();
            for (src, name) in &members {
                let stored = name.to_string_lossy();
                if src.is_dir() {
                    writer.add_directory(stored, entry_options)?;
                } else {
                    writer.start_file(stored, entry_options)?;
                    std::io::copy(&mut File::open(src)?, &mut writer)?;
                }
            }
            writer.finish()?;
            Ok(())
        }
    })
}

/// Expand inputs (directories recurse) into `(source, stored name)` pairs,
/// dropping later inputs that collide on the stored name.
fn collect_members(
    inputs: &[PathBuf],
    explicit_root: Option<&Path>,
    common_root: &Path,
    repath: &[(PathBuf, PathBuf)],
) -> Result<Vec<(PathBuf, PathBuf)>> {
    let stored_name = |path: &Path| -> Result<PathBuf> {
        match explicit_root {
            Some(root) if path.starts_with(root) => member_name(path, root, repath),
            _ => member_name(path, common_root, repath),
        }
    };

    let mut members = Vec::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut push = |src: PathBuf, name: PathBuf, out: &mut Vec<(PathBuf, PathBuf)>| {
        if seen.insert(name.clone()) {
            out.push((src, name));
        }
    };

    for input in inputs {
        if input.symlink_metadata().is_err() {
            return Err(Error::NotFound {
                path: input.clone(),
            });
        }
        push(input.clone(), stored_name(input)?, &mut members);

        if input.is_dir() {
            for entry in WalkDir::new(input).min_depth(1).follow_links(false) {
                let entry = entry.map_err(std::io::Error::other)?;
                let src = entry.path().to_path_buf();
                let name = stored_name(&src)?;
                push(src, name, &mut members);
            }
        }
    }
    Ok(members)
}
