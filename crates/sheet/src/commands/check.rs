//! Validate a content directory.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;
use rules_core::RuleError;

use crate::config::SheetConfig;

/// Validate a content directory and print its fingerprint
#[derive(Parser)]
pub struct Check {
    /// Content directory (defaults to SHEET_CONTENT_DIR)
    #[arg(value_name = "DIR")]
    content: Option<PathBuf>,

    /// Print the evaluation order of every target
    #[arg(long)]
    order: bool,

    /// Fail when registration issues or cyclic targets are found
    #[arg(long)]
    strict: bool,
}

impl Check {
    pub fn execute(self, config: &SheetConfig) -> Result<()> {
        let dir = config.content_dir(self.content);
        let content = super::load_content(&dir, config)?;
        let rules = &content.rules;

        println!(
            "{} {} {}",
            style("Content:").bold().cyan(),
            content.config.name,
            content.config.version
        );
        println!("{} {}", style("Directory:").bold().cyan(), dir.display());
        println!("{} {}", style("Rules:").bold().cyan(), rules.rule_count());
        println!("{} {}", style("Targets:").bold().cyan(), rules.targets().count());
        println!("{} {}", style("Notes:").bold().cyan(), rules.notes().len());
        println!("{} {}", style("Fingerprint:").bold().cyan(), rules.fingerprint_hex());
        println!();

        if self.order {
            println!("{}", style("Evaluation order:").bold().yellow());
            for (position, target) in rules.evaluation_order().enumerate() {
                println!("  {:>4}  {}", position + 1, target);
            }
            println!();
        }

        if !rules.cyclic_targets().is_empty() {
            println!("{}", style("Cyclic targets:").bold().yellow());
            for target in rules.cyclic_targets() {
                println!("  {target}");
            }
            println!();
        }

        if rules.issues().is_empty() {
            println!("{}", style("No registration issues").green());
        } else {
            println!("{}", style("Registration issues:").bold().red());
            for issue in rules.issues() {
                println!("  [{}] {}", issue.error_code(), issue);
            }
        }

        if self.strict && (!rules.issues().is_empty() || !rules.cyclic_targets().is_empty()) {
            anyhow::bail!(
                "{} issue(s) and {} cyclic target(s) in {}",
                rules.issues().len(),
                rules.cyclic_targets().len(),
                dir.display()
            );
        }

        Ok(())
    }
}
