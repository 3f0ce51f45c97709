#![forbid(unsafe_code)]
//! Stagecraft: crash-consistent file and directory replacement, plus
//! safety-checked archive extraction.
//!
//! Safety model highlights:
//! - All installs go through a hidden staging sibling of the destination and
//!   finish with a single same-directory rename, so readers observe either
//!   the prior state or the new state, never a partial write.
//! - Durability ordering: staged content is fsynced before the rename, and
//!   the destination's parent directory entry table is fsynced after it.
//! - Archive extraction resolves member paths lexically and rejects any
//!   member that would land outside the destination root (zip-slip).
//! - This crate forbids `unsafe` and uses `rustix` for directory fsync.

pub mod archive;
pub mod constants;
pub mod fs;
pub mod types;

pub use archive::{
    create, extract, list, CreateOptions, ExtractOptions, Format, OnUnsafe, TarCodec,
};
pub use fs::{
    with_dir_stage, with_file_stage, write_file_atomic, DirStage, FileStage, StageOptions,
};
pub use types::{Error, ExtractionReport, Overwrite, Result};
