//! List choice values.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use console::style;

use crate::config::SheetConfig;

/// List choice categories or the values of one category
#[derive(Parser)]
pub struct Choices {
    /// Category to list (e.g., races); all categories when omitted
    #[arg(value_name = "CATEGORY")]
    category: Option<String>,

    /// Content directory (defaults to SHEET_CONTENT_DIR)
    #[arg(short, long, value_name = "DIR")]
    content: Option<PathBuf>,
}

impl Choices {
    pub fn execute(self, config: &SheetConfig) -> Result<()> {
        let dir = config.content_dir(self.content);
        let content = super::load_content(&dir, config)?;
        let rules = &content.rules;

        match self.category {
            Some(category) => {
                let values = rules.choices(&category);
                if values.is_empty() {
                    anyhow::bail!("Unknown choice category: {}", category);
                }
                for value in values {
                    println!("{value}");
                }
            }
            None => {
                for category in rules.categories() {
                    println!(
                        "{} ({})",
                        style(category).bold().yellow(),
                        rules.choices(category).len()
                    );
                }
            }
        }

        Ok(())
    }
}
