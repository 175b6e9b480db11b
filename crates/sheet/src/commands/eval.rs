//! Evaluate a character file against a content directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use rules_core::{AttributeMap, Evaluation, RenderedNote, RuleError};
use serde::Serialize;

use crate::config::SheetConfig;

/// Compute derived attributes and notes for a character file
#[derive(Parser)]
pub struct Eval {
    /// Character file: a JSON object of attribute name to value
    #[arg(value_name = "CHARACTER")]
    character: PathBuf,

    /// Content directory (defaults to SHEET_CONTENT_DIR)
    #[arg(short, long, value_name = "DIR")]
    content: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,

    /// Also list notes whose attribute did not resolve
    #[arg(long)]
    all_notes: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Attributes, active notes and problems
    Summary,
    /// Full JSON output
    Json,
}

/// JSON shape of `--format json`.
#[derive(Serialize)]
struct Report<'a> {
    attributes: &'a AttributeMap,
    notes: Vec<&'a RenderedNote>,
    diagnostics: Vec<String>,
    passes: usize,
    converged: bool,
}

impl Eval {
    pub fn execute(self, config: &SheetConfig) -> Result<()> {
        let dir = config.content_dir(self.content);
        let content = super::load_content(&dir, config)?;

        let text = std::fs::read_to_string(&self.character)
            .with_context(|| format!("Failed to read character file: {}", self.character.display()))?;
        let inputs: AttributeMap = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse character file: {}", self.character.display()))?;

        let eval = content.evaluator().evaluate(&inputs);
        if !eval.converged() {
            tracing::warn!("Evaluation did not settle after {} passes", eval.passes());
        }

        match self.format {
            OutputFormat::Summary => print_summary(&content.config.name, &inputs, &eval, self.all_notes),
            OutputFormat::Json => print_json(&eval, self.all_notes)?,
        }

        Ok(())
    }
}

fn print_summary(system: &str, inputs: &AttributeMap, eval: &Evaluation, all_notes: bool) {
    println!(
        "{} {} ({} passes)",
        style("System:").bold().cyan(),
        system,
        eval.passes()
    );
    println!();

    println!("{}", style("Attributes:").bold().yellow());
    for (name, value) in eval.attributes().iter() {
        let marker = if inputs.contains(name.as_str()) { " " } else { "*" };
        println!("  {marker} {name} = {value}");
    }
    println!();

    println!("{}", style("Notes:").bold().yellow());
    for note in eval.notes().iter().filter(|n| all_notes || n.active) {
        println!("  {note}");
    }

    let problems: Vec<_> = eval.problems().collect();
    if !problems.is_empty() {
        println!();
        println!("{}", style("Problems:").bold().red());
        for problem in problems {
            println!("  [{}] {}", problem.error_code(), problem);
        }
    }
}

fn print_json(eval: &Evaluation, all_notes: bool) -> Result<()> {
    let report = Report {
        attributes: eval.attributes(),
        notes: eval.notes().iter().filter(|n| all_notes || n.active).collect(),
        diagnostics: eval.diagnostics().iter().map(ToString::to_string).collect(),
        passes: eval.passes(),
        converged: eval.converged(),
    };
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize evaluation to JSON")?;
    println!("{}", json);
    Ok(())
}
