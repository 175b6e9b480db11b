//! Choice list loader.

use std::path::Path;

use rules_core::ChoiceRegistry;

use crate::loaders::{LoadResult, read_file};

/// Loader for choice lists from TOML files.
///
/// File format: one array of strings per category.
///
/// ```toml
/// races = ["Human", "Elf", "Dwarf"]
/// schools = ["Abjuration", "Conjuration"]
/// ```
pub struct ChoicesLoader;

impl ChoicesLoader {
    pub fn load(path: &Path) -> LoadResult<ChoiceRegistry> {
        let content = read_file(path)?;
        let choices: ChoiceRegistry = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse choices TOML {}: {}", path.display(), e))?;

        Ok(choices)
    }
}
