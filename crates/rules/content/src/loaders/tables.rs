//! Lookup table loader.

use std::path::Path;

use rules_core::Tables;

use crate::loaders::{LoadResult, read_file};

/// Loader for formula lookup tables from TOML files.
///
/// File format: one TOML table per lookup table; values may be numbers,
/// strings or booleans.
///
/// ```toml
/// [armorBonus]
/// None = 0
/// Leather = 2
/// "Chain Mail" = 5
/// ```
pub struct TablesLoader;

impl TablesLoader {
    pub fn load(path: &Path) -> LoadResult<Tables> {
        let content = read_file(path)?;
        let tables: Tables = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse tables TOML {}: {}", path.display(), e))?;

        Ok(tables)
    }
}
