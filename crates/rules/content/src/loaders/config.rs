//! Content configuration loader.

use std::path::Path;

use crate::formats::ContentConfig;
use crate::loaders::{LoadResult, read_file};

/// Loader for content configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Missing keys fall back to their defaults, so an empty file is valid.
    pub fn load(path: &Path) -> LoadResult<ContentConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<ContentConfig> {
        let config: ContentConfig = toml::from_str(content)?;
        if config.engine.max_passes == 0 {
            anyhow::bail!("engine.max_passes must be at least 1");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules_core::EngineConfig;

    #[test]
    fn engine_section_is_optional() {
        let config = ConfigLoader::parse("name = \"HybridD20\"").unwrap();
        assert_eq!(config.name, "HybridD20");
        assert_eq!(config.engine, EngineConfig::default());

        let config = ConfigLoader::parse("[engine]\nmax_passes = 12").unwrap();
        assert_eq!(config.engine.max_passes, 12);
    }

    #[test]
    fn zero_passes_is_rejected() {
        assert!(ConfigLoader::parse("[engine]\nmax_passes = 0").is_err());
    }
}
