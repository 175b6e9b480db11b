//! Content loaders for reading rule content from files.
//!
//! Every loader parses one of the formats defined in [`crate::formats`].

pub mod choices;
pub mod config;
pub mod factory;
pub mod rules;
pub mod tables;

pub use choices::ChoicesLoader;
pub use config::ConfigLoader;
pub use factory::{Content, ContentFactory};
pub use rules::RuleModuleLoader;
pub use tables::TablesLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
