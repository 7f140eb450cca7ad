//! Note index: repository trait, JSON-file implementation, filesystem rescan

mod builder;
mod json;
mod repository;

pub use builder::{BuildError, BuildResult, IndexBuilder};
pub use json::{INDEX_FORMAT_VERSION, JsonIndex};
pub use repository::{
    IndexEntry, IndexError, IndexRepository, IndexResult, PREVIEW_CHARS, SearchField, SearchQuery,
    sort_by_recency,
};
