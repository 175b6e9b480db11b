//! Command implementations for the sheet tool
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod check;
mod choices;
mod eval;

pub use check::Check;
pub use choices::Choices;
pub use eval::Eval;

use std::path::Path;

use anyhow::{Context, Result};
use rules_content::{Content, ContentFactory};

use crate::config::SheetConfig;

/// Loads `dir`, applying the configured pass limit override.
fn load_content(dir: &Path, config: &SheetConfig) -> Result<Content> {
    let mut content = ContentFactory::new(dir)
        .load()
        .with_context(|| format!("Failed to load content from {}", dir.display()))?;

    if let Some(max_passes) = config.max_passes {
        content.config.engine.max_passes = max_passes;
    }
    tracing::debug!(
        "Loaded {} ({} rules, fingerprint {})",
        content.config.name,
        content.rules.rule_count(),
        content.rules.fingerprint_hex()
    );

    Ok(content)
}
