//! Registration phase: [`RuleSetBuilder`] accumulates rules, notes, choices,
//! tables and layout metadata, then [`RuleSetBuilder::build`] freezes them
//! into an immutable [`RuleSet`].

use std::collections::BTreeMap;

use crate::attribute::{AttrName, Value};
use crate::choice::ChoiceRegistry;
use crate::error::{ErrorSeverity, RuleError};
use crate::formula::{Formula, ParseError};
use crate::layout::{EditorElement, Layout, SheetElement};
use crate::note::{DescribedNote, Note, NoteError};
use crate::rule::{Operator, Rule, Source};
use crate::ruleset::{RuleSet, TargetRules};
use crate::table::Tables;

/// Something registered that will not behave as written.
///
/// Issues never stop registration: the offending rule is kept (and
/// contributes nothing) or the offending definition is skipped.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationIssue {
    #[error("rule #{rule} for {target}: formula {text:?} does not parse: {error}")]
    InvalidFormula {
        target: AttrName,
        rule: usize,
        text: String,
        error: ParseError,
    },

    #[error("rule for {target}: source {text:?} is unusable: {error}")]
    InvalidSource {
        target: AttrName,
        text: String,
        error: ParseError,
    },

    #[error(transparent)]
    InvalidNote(#[from] NoteError),
}

impl RuleError for RegistrationIssue {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidFormula { .. } => "REGISTRATION_INVALID_FORMULA",
            Self::InvalidSource { .. } => "REGISTRATION_INVALID_SOURCE",
            Self::InvalidNote(_) => "REGISTRATION_INVALID_NOTE",
        }
    }
}

/// Everything registered so far. Shared by the builder and the frozen set.
#[derive(Clone, Debug, Default)]
pub(crate) struct Registry {
    pub(crate) targets: Vec<TargetRules>,
    pub(crate) index: BTreeMap<AttrName, usize>,
    pub(crate) notes: Vec<Note>,
    pub(crate) choices: ChoiceRegistry,
    pub(crate) tables: Tables,
    pub(crate) layout: Layout,
    pub(crate) abbreviations: BTreeMap<String, String>,
    pub(crate) issues: Vec<RegistrationIssue>,
    pub(crate) rule_count: usize,
}

/// Mutable registration handle.
///
/// ```
/// use rules_core::{Operator, RuleSetBuilder};
///
/// let mut builder = RuleSetBuilder::new();
/// builder
///     .define_rule("strengthModifier", [("strength", Operator::Set, "floor((source - 10) / 2)")])
///     .define_rule("meleeAttack", [("strengthModifier", Operator::Add, "source")])
///     .define_note("meleeAttack:%V to hit");
/// let rules = builder.build();
/// assert_eq!(rules.rules_for("meleeAttack").len(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RuleSetBuilder {
    registry: Registry,
}

impl RuleSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_registry(registry: Registry) -> Self {
        Self { registry }
    }

    /// Appends one rule per `(source, operator, formula)` triple for
    /// `target`, in order. Calling this again for the same target appends
    /// further rules.
    ///
    /// Sources use the textual form described on [`Source`]. A source that
    /// cannot be parsed drops that triple and records an issue.
    pub fn define_rule<S, F>(
        &mut self,
        target: impl Into<AttrName>,
        triples: impl IntoIterator<Item = (S, Operator, F)>,
    ) -> &mut Self
    where
        S: AsRef<str>,
        F: Into<Formula>,
    {
        let target = target.into();
        for (source, operator, formula) in triples {
            match Source::parse(source.as_ref()) {
                Ok(parsed) => self.push_rule(target.clone(), parsed, operator, formula.into()),
                Err(error) => {
                    tracing::warn!(
                        "Skipping rule for {}: source {:?} is unusable: {}",
                        target,
                        source.as_ref(),
                        error
                    );
                    self.registry.issues.push(RegistrationIssue::InvalidSource {
                        target: target.clone(),
                        text: source.as_ref().to_owned(),
                        error,
                    });
                }
            }
        }
        self
    }

    /// Appends a single rule with an already-typed source.
    pub fn define_rule_with(
        &mut self,
        target: impl Into<AttrName>,
        source: Source,
        operator: Operator,
        formula: impl Into<Formula>,
    ) -> &mut Self {
        self.push_rule(target.into(), source, operator, formula.into());
        self
    }

    fn push_rule(&mut self, target: AttrName, source: Source, operator: Operator, formula: Formula) {
        let registry = &mut self.registry;
        let index = registry.rule_count;
        registry.rule_count += 1;

        if let Some(error) = formula.error() {
            tracing::warn!(
                "Rule #{} for {} has an unparseable formula {:?}: {}",
                index,
                target,
                formula.text(),
                error
            );
            registry.issues.push(RegistrationIssue::InvalidFormula {
                target: target.clone(),
                rule: index,
                text: formula.text().to_owned(),
                error: error.clone(),
            });
        }

        let slot = match registry.index.get(&target) {
            Some(&slot) => slot,
            None => {
                let slot = registry.targets.len();
                registry.targets.push(TargetRules::new(target.clone()));
                registry.index.insert(target.clone(), slot);
                slot
            }
        };
        registry.targets[slot].push(Rule::new(target, source, operator, formula, index));
    }

    /// Registers an `"attribute:template"` note. A later note for the same
    /// attribute replaces the earlier one.
    pub fn define_note(&mut self, definition: &str) -> &mut Self {
        match Note::parse(definition) {
            Ok(note) => self.insert_note(note),
            Err(error) => {
                tracing::warn!("Skipping note: {}", error);
                self.registry.issues.push(error.into());
            }
        }
        self
    }

    pub fn define_notes<D: AsRef<str>>(&mut self, definitions: impl IntoIterator<Item = D>) -> &mut Self {
        for definition in definitions {
            self.define_note(definition.as_ref());
        }
        self
    }

    fn insert_note(&mut self, note: Note) {
        let notes = &mut self.registry.notes;
        match notes.iter_mut().find(|n| n.attribute() == note.attribute()) {
            Some(existing) => *existing = note,
            None => notes.push(note),
        }
    }

    /// Names a formula that `$name` inserts in described notes expand to.
    pub fn define_abbreviation(&mut self, name: impl Into<String>, formula: impl Into<String>) -> &mut Self {
        self.registry.abbreviations.insert(name.into(), formula.into());
        self
    }

    /// Registers a note from a description with `$name` / `${formula}`
    /// inserts.
    ///
    /// Insert `N` becomes placeholder `%N` and a companion rule
    /// `attribute.N = formula` triggered by `source`, so the inserted values
    /// are computed like any other attribute. Inserts naming an
    /// abbreviation use the abbreviation's formula.
    pub fn define_described_note(
        &mut self,
        attribute: impl Into<AttrName>,
        source: &str,
        description: &str,
    ) -> &mut Self {
        let attribute = attribute.into();
        let described = DescribedNote::parse(description);

        if !described.inserts.is_empty() {
            let source = match Source::parse(source) {
                Ok(source) => source,
                Err(error) => {
                    tracing::warn!("Skipping described note {}: {}", attribute, error);
                    self.registry.issues.push(RegistrationIssue::InvalidSource {
                        target: attribute,
                        text: source.to_owned(),
                        error,
                    });
                    return self;
                }
            };
            for (n, insert) in described.inserts.iter().enumerate() {
                let formula = match self.registry.abbreviations.get(insert) {
                    Some(expanded) => Formula::new(expanded),
                    None => Formula::new(insert),
                };
                self.push_rule(attribute.companion(n + 1), source.clone(), Operator::Set, formula);
            }
        }

        self.insert_note(Note::new(attribute, &described.template));
        self
    }

    pub fn define_choice<V: Into<String>>(
        &mut self,
        category: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.registry.choices.define(category, values);
        self
    }

    pub fn define_table<K, V>(
        &mut self,
        name: impl Into<String>,
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.registry.tables.define(name, entries);
        self
    }

    pub fn define_sheet_element(&mut self, element: SheetElement) -> &mut Self {
        self.registry.layout.define_sheet_element(element);
        self
    }

    pub fn define_editor_element(&mut self, element: EditorElement) -> &mut Self {
        self.registry.layout.define_editor_element(element);
        self
    }

    pub fn remove_sheet_element(&mut self, name: &str) -> &mut Self {
        self.registry.layout.remove_sheet_element(name);
        self
    }

    pub fn remove_editor_element(&mut self, name: &str) -> &mut Self {
        self.registry.layout.remove_editor_element(name);
        self
    }

    /// Issues recorded so far.
    pub fn issues(&self) -> &[RegistrationIssue] {
        &self.registry.issues
    }

    pub fn rule_count(&self) -> usize {
        self.registry.rule_count
    }

    /// Freezes the registrations and plans the evaluation order.
    pub fn build(self) -> RuleSet {
        RuleSet::freeze(self.registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_registration_appends_in_order() {
        let mut builder = RuleSetBuilder::new();
        builder
            .define_rule("armorClass", [("", Operator::Set, "10")])
            .define_rule("armorClass", [("dexterityModifier", Operator::Add, "source")]);
        let rules = builder.build();

        let ops: Vec<_> = rules
            .rules_for("armorClass")
            .iter()
            .map(|r| (r.index(), r.operator()))
            .collect();
        assert_eq!(ops, vec![(0, Operator::Set), (1, Operator::Add)]);
    }

    #[test]
    fn bad_formula_is_kept_and_reported() {
        let mut builder = RuleSetBuilder::new();
        builder.define_rule("x", [("", Operator::Set, "1 +")]);
        assert_eq!(builder.rule_count(), 1);
        assert!(matches!(
            builder.issues(),
            [RegistrationIssue::InvalidFormula { rule: 0, .. }]
        ));
        assert_eq!(builder.issues()[0].error_code(), "REGISTRATION_INVALID_FORMULA");
    }

    #[test]
    fn bad_source_is_dropped_and_reported() {
        let mut builder = RuleSetBuilder::new();
        builder.define_rule("x", [("/[/", Operator::Add, "source"), ("y", Operator::Add, "source")]);
        assert_eq!(builder.rule_count(), 1);
        assert!(matches!(
            builder.issues(),
            [RegistrationIssue::InvalidSource { .. }]
        ));
    }

    #[test]
    fn later_note_replaces_earlier() {
        let mut builder = RuleSetBuilder::new();
        builder.define_notes(["a:first", "b:other", "a:second", "broken"]);
        let rules = builder.build();

        let notes: Vec<_> = rules.notes().iter().map(ToString::to_string).collect();
        assert_eq!(notes, vec!["a:second", "b:other"]);
        assert_eq!(rules.issues().len(), 1);
    }

    #[test]
    fn described_note_registers_companions() {
        let mut builder = RuleSetBuilder::new();
        builder
            .define_abbreviation("L", "source")
            .define_described_note(
                "spells.Cure Light Wounds(C1)",
                "casterLevels.C",
                "Heals 1d8+$L HP, up to ${min(source, 5)} targets",
            );
        let rules = builder.build();

        let note = rules.note("spells.Cure Light Wounds(C1)").unwrap();
        assert_eq!(note.template().text(), "Heals 1d8+%1 HP, up to %2 targets");

        let first = &rules.rules_for("spells.Cure Light Wounds(C1).1")[0];
        assert_eq!(first.formula().text(), "source");
        assert_eq!(first.source(), &Source::attribute("casterLevels.C"));
        let second = &rules.rules_for("spells.Cure Light Wounds(C1).2")[0];
        assert_eq!(second.formula().text(), "min(source, 5)");
    }
}
