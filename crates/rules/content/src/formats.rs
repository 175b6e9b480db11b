//! On-disk content formats.
//!
//! A rule module is one RON file under `rules/`. Everything in it is
//! optional, so a module can carry only rules, only notes, or only layout.
//!
//! ```ron
//! #![enable(implicit_some)]
//! (
//!     rules: [
//!         (
//!             target: "armorClass",
//!             contributions: [
//!                 (op: "=", expr: "10"),
//!                 (source: Attr("armor"), op: "+", expr: "table('armorBonus', source)"),
//!             ],
//!         ),
//!     ],
//!     notes: ["armorClass:%V"],
//! )
//! ```

use std::collections::BTreeMap;

use rules_core::{
    EditorElement, EngineConfig, Family, Formula, Operator, RuleSetBuilder, SheetElement, Source,
};
use serde::{Deserialize, Serialize};

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Display name of the rule system, e.g. `HybridD20`.
    pub name: String,
    pub version: String,
    pub engine: EngineConfig,
}

/// One `rules/*.ron` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleModule {
    pub rules: Vec<RuleSpec>,
    /// `"attribute:template"` definitions.
    pub notes: Vec<String>,
    /// Formulas that `$name` inserts in described notes expand to.
    pub abbreviations: BTreeMap<String, String>,
    pub described_notes: Vec<DescribedNoteSpec>,
    pub choices: BTreeMap<String, Vec<String>>,
    pub sheet: Vec<SheetElement>,
    pub editor: Vec<EditorElement>,
    /// Sheet elements defined by earlier modules to drop.
    pub remove_sheet: Vec<String>,
}

/// All contributions a module makes to one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub target: String,
    pub contributions: Vec<ContributionSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionSpec {
    #[serde(default)]
    pub source: SourceSpec,
    pub op: Operator,
    /// Formula text; absent means the source value itself.
    #[serde(default)]
    pub expr: Option<String>,
}

/// Typed form of a rule source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceSpec {
    #[default]
    Always,
    Attr(String),
    Prefix(String),
    /// Regex over attribute names, without surrounding slashes.
    Pattern(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribedNoteSpec {
    pub attribute: String,
    /// Source that triggers the insert rules, in textual form.
    pub source: String,
    pub description: String,
}

impl RuleModule {
    /// Registers everything in the module on `builder`, in file order.
    ///
    /// Broken formulas and patterns are recorded as registration issues on
    /// the builder rather than failing the module.
    pub fn register(&self, builder: &mut RuleSetBuilder) {
        for spec in &self.rules {
            let target = spec.target.as_str();
            for contribution in &spec.contributions {
                let formula = Formula::from(contribution.expr.as_deref());
                let op = contribution.op;
                match &contribution.source {
                    SourceSpec::Always => builder.define_rule_with(target, Source::Always, op, formula),
                    SourceSpec::Attr(name) => {
                        builder.define_rule_with(target, Source::attribute(name), op, formula)
                    }
                    SourceSpec::Prefix(prefix) => builder.define_rule_with(
                        target,
                        Source::Family(Family::prefix(prefix.as_str())),
                        op,
                        formula,
                    ),
                    // The textual form lets the builder report a bad regex.
                    SourceSpec::Pattern(pattern) => {
                        builder.define_rule(target, [(format!("/{pattern}/"), op, formula)])
                    }
                };
            }
        }

        builder.define_notes(&self.notes);

        for (name, formula) in &self.abbreviations {
            builder.define_abbreviation(name.as_str(), formula.as_str());
        }
        for note in &self.described_notes {
            builder.define_described_note(note.attribute.as_str(), &note.source, &note.description);
        }

        for (category, values) in &self.choices {
            builder.define_choice(category.as_str(), values.iter().map(String::as_str));
        }

        for name in &self.remove_sheet {
            builder.remove_sheet_element(name);
        }
        for element in &self.sheet {
            builder.define_sheet_element(element.clone());
        }
        for element in &self.editor {
            builder.define_editor_element(element.clone());
        }
    }
}
