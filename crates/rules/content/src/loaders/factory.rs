//! Content factory for building rule sets from data files.

use std::path::{Path, PathBuf};

use rules_core::{ChoiceRegistry, Evaluator, RuleSet, RuleSetBuilder, Tables};

use crate::formats::{ContentConfig, RuleModule};
use crate::loaders::{ChoicesLoader, ConfigLoader, LoadResult, RuleModuleLoader, TablesLoader};

/// A loaded content directory.
#[derive(Debug, Clone)]
pub struct Content {
    pub config: ContentConfig,
    pub rules: RuleSet,
}

impl Content {
    /// Evaluator configured with this content's engine settings.
    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.rules).with_config(self.config.engine.clone())
    }
}

/// Content factory that loads one rule system from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml      (optional)
/// ├── choices.toml     (optional)
/// ├── tables.toml      (optional)
/// └── rules/
///     ├── 00-abilities.ron
///     └── 10-combat.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Load configuration from `config.toml`, or defaults when absent.
    pub fn load_config(&self) -> LoadResult<ContentConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            tracing::debug!("No {} found; using default configuration", path.display());
            return Ok(ContentConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load choice lists from `choices.toml`, or none when absent.
    pub fn load_choices(&self) -> LoadResult<ChoiceRegistry> {
        let path = self.data_dir.join("choices.toml");
        if !path.exists() {
            return Ok(ChoiceRegistry::default());
        }
        ChoicesLoader::load(&path)
    }

    /// Load lookup tables from `tables.toml`, or none when absent.
    pub fn load_tables(&self) -> LoadResult<Tables> {
        let path = self.data_dir.join("tables.toml");
        if !path.exists() {
            return Ok(Tables::default());
        }
        TablesLoader::load(&path)
    }

    /// Load every rule module under `rules/`, in file-name order.
    pub fn load_rule_modules(&self) -> LoadResult<Vec<(PathBuf, RuleModule)>> {
        RuleModuleLoader::load_dir(&self.data_dir.join("rules"))
    }

    /// Registers the whole directory on a fresh builder: tables, then
    /// choices, then each rule module.
    pub fn load_builder(&self) -> LoadResult<RuleSetBuilder> {
        let mut builder = RuleSetBuilder::new();

        for (name, entries) in self.load_tables()?.iter() {
            builder.define_table(name, entries.iter().map(|(key, value)| (key.as_str(), value.clone())));
        }
        let choices = self.load_choices()?;
        for category in choices.categories() {
            builder.define_choice(category, choices.get(category).iter().map(String::as_str));
        }
        for (_, module) in self.load_rule_modules()? {
            module.register(&mut builder);
        }

        Ok(builder)
    }

    /// Load and freeze the rule set.
    pub fn load_rule_set(&self) -> LoadResult<RuleSet> {
        let rules = self.load_builder()?.build();
        for issue in rules.issues() {
            tracing::warn!("{}: {}", self.data_dir.display(), issue);
        }
        Ok(rules)
    }

    /// Load configuration and rule set together.
    pub fn load(&self) -> LoadResult<Content> {
        Ok(Content {
            config: self.load_config()?,
            rules: self.load_rule_set()?,
        })
    }
}
