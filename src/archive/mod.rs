//! Archive layer: format inference, member path resolution, safe
//! extraction, creation, and listing.

pub mod create;
pub mod extract;
pub mod format;
pub mod list;
pub mod paths;

pub use create::{create, CreateOptions};
pub use extract::{extract, ExtractOptions, OnUnsafe};
pub use format::{Format, TarCodec};
pub use list::list;
pub use paths::resolve_member_path;
