//! Archive format tokens and codec wrappers.
//!
//! Format inference is purely extension-based: a filename matches the
//! longest known suffix run, so `backup.2024.tar.gz` and `data.tgz` both
//! infer tar+gzip. An explicit [`Format`] passed through the options
//! overrides the filename.

use std::io::{Read, Write};
use std::path::Path;

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use crate::types::{Error, Result};

/// Supported archive container formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Zip,
    Tar(TarCodec),
}

/// Compression codec for tar archives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TarCodec {
    None,
    Gzip,
    Bzip2,
    Xz,
}

/// Known extension → format table, longest suffixes first within each
/// family so suffix matching can scan in declaration order.
const EXTENSIONS: &[(&str, Format)] = &[
    (".tar.gz", Format::Tar(TarCodec::Gzip)),
    (".tar.bz2", Format::Tar(TarCodec::Bzip2)),
    (".tar.xz", Format::Tar(TarCodec::Xz)),
    (".tar", Format::Tar(TarCodec::None)),
    (".tgz", Format::Tar(TarCodec::Gzip)),
    (".taz", Format::Tar(TarCodec::Gzip)),
    (".tb2", Format::Tar(TarCodec::Bzip2)),
    (".tbz", Format::Tar(TarCodec::Bzip2)),
    (".tbz2", Format::Tar(TarCodec::Bzip2)),
    (".tz2", Format::Tar(TarCodec::Bzip2)),
    (".txz", Format::Tar(TarCodec::Xz)),
    (".zip", Format::Zip),
    (".egg", Format::Zip),
    (".jar", Format::Zip),
    (".docx", Format::Zip),
    (".odg", Format::Zip),
    (".odp", Format::Zip),
    (".ods", Format::Zip),
    (".odt", Format::Zip),
    (".pptx", Format::Zip),
    (".xlsx", Format::Zip),
];

impl Format {
    /// Infer a format from a file path by its longest known suffix.
    ///
    /// # Errors
    ///
    /// [`Error::NotSupported`] when no known suffix matches.
    pub fn infer(path: &Path) -> Result<Self> {
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        EXTENSIONS
            .iter()
            .filter(|(ext, _)| name.len() > ext.len() && name.ends_with(ext))
            .max_by_key(|(ext, _)| ext.len())
            .map(|(_, format)| *format)
            .ok_or_else(|| Error::NotSupported {
                ext: name
                    .find('.')
                    .map(|i| name[i..].to_string())
                    .unwrap_or_default(),
            })
    }

    /// An explicit override wins over filename inference.
    ///
    /// # Errors
    ///
    /// [`Error::NotSupported`] when nothing was given and no known suffix
    /// matches.
    pub fn for_file(path: &Path, explicit: Option<Format>) -> Result<Self> {
        match explicit {
            Some(format) => Ok(format),
            None => Self::infer(path),
        }
    }
}

impl TarCodec {
    /// Wrap a raw archive reader in this codec's decompressor.
    pub fn decoder<R: Read>(self, reader: R) -> Decoder<R> {
        match self {
            TarCodec::None => Decoder::Plain(reader),
            TarCodec::Gzip => Decoder::Gzip(Box::new(GzDecoder::new(reader))),
            TarCodec::Bzip2 => Decoder::Bzip2(Box::new(BzDecoder::new(reader))),
            TarCodec::Xz => Decoder::Xz(Box::new(XzDecoder::new(reader))),
        }
    }

    /// Wrap a raw archive writer in this codec's compressor.
    pub fn encoder<W: Write>(self, writer: W) -> Encoder<W> {
        match self {
            TarCodec::None => Encoder::Plain(writer),
            TarCodec::Gzip => {
                Encoder::Gzip(Box::new(GzEncoder::new(writer, flate2::Compression::default())))
            }
            TarCodec::Bzip2 => {
                Encoder::Bzip2(Box::new(BzEncoder::new(writer, bzip2::Compression::default())))
            }
            TarCodec::Xz => Encoder::Xz(Box::new(XzEncoder::new(writer, 6))),
        }
    }
}

/// Decompressing reader over a tar stream.
pub enum Decoder<R: Read> {
    Plain(R),
    Gzip(Box<GzDecoder<R>>),
    Bzip2(Box<BzDecoder<R>>),
    Xz(Box<XzDecoder<R>>),
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Decoder::Plain(r) => r.read(buf),
            Decoder::Gzip(r) => r.read(buf),
            Decoder::Bzip2(r) => r.read(buf),
            Decoder::Xz(r) => r.read(buf),
        }
    }
}

/// Compressing writer under a tar builder. [`Encoder::finish`] must run
/// after the builder is done so codec trailers reach the staging file.
pub enum Encoder<W: Write> {
    Plain(W),
    Gzip(Box<GzEncoder<W>>),
    Bzip2(Box<BzEncoder<W>>),
    Xz(Box<XzEncoder<W>>),
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Encoder::Plain(w) => w.write(buf),
            Encoder::Gzip(w) => w.write(buf),
            Encoder::Bzip2(w) => w.write(buf),
            Encoder::Xz(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Encoder::Plain(w) => w.flush(),
            Encoder::Gzip(w) => w.flush(),
            Encoder::Bzip2(w) => w.flush(),
            Encoder::Xz(w) => w.flush(),
        }
    }
}

impl<W: Write> Encoder<W> {
    /// Flush codec trailers and return the underlying writer.
    pub fn finish(self) -> std::io::Result<W> {
        match self {
            Encoder::Plain(w) => Ok(w),
            Encoder::Gzip(w) => w.finish(),
            Encoder::Bzip2(w) => w.finish(),
            Encoder::Xz(w) => w.finish(),
        }
    }
}
