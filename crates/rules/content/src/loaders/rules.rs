//! Rule module loader.

use std::path::{Path, PathBuf};

use crate::formats::RuleModule;
use crate::loaders::{LoadResult, read_file};

/// Loader for RON rule modules.
pub struct RuleModuleLoader;

impl RuleModuleLoader {
    /// Load one rule module from a RON file.
    pub fn load(path: &Path) -> LoadResult<RuleModule> {
        let content = read_file(path)?;
        let module: RuleModule = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse rule module RON {}: {}", path.display(), e))?;

        Ok(module)
    }

    /// Load every `*.ron` module in `dir`, ordered by file name.
    ///
    /// Rule registration order decides `=` precedence and fold order, so
    /// modules are named with a sortable prefix (`00-abilities.ron`,
    /// `10-combat.ron`, ...).
    pub fn load_dir(dir: &Path) -> LoadResult<Vec<(PathBuf, RuleModule)>> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| anyhow::anyhow!("Failed to read rules directory {}: {}", dir.display(), e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| anyhow::anyhow!("Failed to list {}: {}", dir.display(), e))?
                .path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "ron") {
                paths.push(path);
            }
        }
        paths.sort();

        paths
            .into_iter()
            .map(|path| {
                let module = Self::load(&path)?;
                tracing::debug!(
                    "Loaded rule module {} ({} targets, {} notes)",
                    path.display(),
                    module.rules.len(),
                    module.notes.len()
                );
                Ok((path, module))
            })
            .collect()
    }
}
