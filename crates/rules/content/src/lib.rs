//! Data-driven rule content and loaders.
//!
//! A content directory holds one rule system (an edition): engine settings,
//! choice lists, lookup tables and any number of RON rule modules. Loaders
//! turn the directory into a frozen [`rules_core::RuleSet`]:
//! - Engine configuration (`config.toml`)
//! - Choice lists (`choices.toml`)
//! - Lookup tables for formulas (`tables.toml`)
//! - Rule modules with rules, notes, choices and layout (`rules/*.ron`)
//!
//! Content is configuration, not logic: everything here is interpreted by
//! `rules-core`.

#[cfg(feature = "serde")]
pub mod formats;

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "serde")]
pub use formats::{
    ContentConfig, ContributionSpec, DescribedNoteSpec, RuleModule, RuleSpec, SourceSpec,
};

#[cfg(feature = "loaders")]
pub use loaders::{
    ChoicesLoader, ConfigLoader, Content, ContentFactory, RuleModuleLoader, TablesLoader,
};
