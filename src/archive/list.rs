//! Archive member listing.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::archive::format::Format;
use crate::types::Result;

/// Return the stored member names of an archive, in archive order.
///
/// # Errors
///
/// [`crate::Error::NotSupported`] for unknown formats, and IO/archive
/// errors while reading the stream.
pub fn list(file: &Path, format: Option<Format>) -> Result<Vec<PathBuf>> {
    let format = Format::for_file(file, format)?;

    let mut names = Vec::new();
    match format {
        Format::Tar(codec) => {
            let reader = codec.decoder(File::open(file)?);
            let mut archive = tar::Archive::new(reader);
            for entry in archive.entries()? {
                let entry = entry?;
                names.push(entry.path()?.into_owned());
            }
        }
        Format::Zip => {
            let mut archive = zip::ZipArchive::new(File::open(file)?)?;
            for index in 0..archive.len() {
                let entry = archive.by_index_raw(index)?;
                names.push(PathBuf::from(entry.name()));
            }
        }
    }
    Ok(names)
}
