//! The frozen, shareable rule set.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::attribute::{AttrName, AttributeMap};
use crate::builder::{RegistrationIssue, Registry, RuleSetBuilder};
use crate::choice::ChoiceRegistry;
use crate::engine::order::{self, Plan};
use crate::engine::{Evaluation, Evaluator};
use crate::layout::Layout;
use crate::note::Note;
use crate::rule::Rule;
use crate::table::Tables;

/// All rules for one target, in registration order.
#[derive(Clone, Debug)]
pub struct TargetRules {
    name: AttrName,
    rules: Vec<Rule>,
}

impl TargetRules {
    pub(crate) fn new(name: AttrName) -> Self {
        Self {
            name,
            rules: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn name(&self) -> &AttrName {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

#[derive(Debug)]
struct Frozen {
    registry: Registry,
    plan: Plan,
    cyclic: Vec<AttrName>,
    fingerprint: [u8; 32],
}

/// Immutable rules, notes, choices, tables and layout.
///
/// Cloning shares the underlying data. Evaluation never mutates a rule set,
/// so one set can serve any number of evaluations, from any thread.
#[derive(Clone, Debug)]
pub struct RuleSet {
    inner: Arc<Frozen>,
}

impl RuleSet {
    pub(crate) fn freeze(registry: Registry) -> Self {
        let plan = order::plan(&registry.targets, &registry.index);
        let cyclic: Vec<AttrName> = plan
            .cyclic
            .iter()
            .map(|&slot| registry.targets[slot].name().clone())
            .collect();
        if !cyclic.is_empty() {
            tracing::debug!("{} target(s) sit on dependency cycles: {:?}", cyclic.len(), cyclic);
        }
        let fingerprint = fingerprint(&registry);

        tracing::debug!(
            "Froze rule set: {} rules over {} targets, {} notes",
            registry.rule_count,
            registry.targets.len(),
            registry.notes.len()
        );

        Self {
            inner: Arc::new(Frozen {
                registry,
                plan,
                cyclic,
                fingerprint,
            }),
        }
    }

    /// Rules for `target` in registration order; empty when none exist.
    pub fn rules_for(&self, target: &str) -> &[Rule] {
        self.inner
            .registry
            .index
            .get(target)
            .map(|&slot| self.inner.registry.targets[slot].rules())
            .unwrap_or_default()
    }

    /// Every rule target, in order of first registration.
    pub fn targets(&self) -> impl Iterator<Item = &AttrName> {
        self.inner.registry.targets.iter().map(TargetRules::name)
    }

    /// Every rule target, in the order evaluation visits them.
    pub fn evaluation_order(&self) -> impl Iterator<Item = &AttrName> {
        self.planned().map(TargetRules::name)
    }

    pub(crate) fn planned(&self) -> impl Iterator<Item = &TargetRules> {
        let targets = &self.inner.registry.targets;
        self.inner.plan.order.iter().map(move |&slot| &targets[slot])
    }

    pub fn rule_count(&self) -> usize {
        self.inner.registry.rule_count
    }

    pub fn notes(&self) -> &[Note] {
        &self.inner.registry.notes
    }

    pub fn note(&self, attribute: &str) -> Option<&Note> {
        self.notes().iter().find(|n| n.attribute().as_str() == attribute)
    }

    /// Values registered for a choice category.
    pub fn choices(&self, category: &str) -> &[String] {
        self.inner.registry.choices.get(category)
    }

    pub fn choice_registry(&self) -> &ChoiceRegistry {
        &self.inner.registry.choices
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.inner.registry.choices.categories()
    }

    pub fn tables(&self) -> &Tables {
        &self.inner.registry.tables
    }

    pub fn layout(&self) -> &Layout {
        &self.inner.registry.layout
    }

    /// Problems found while registering.
    pub fn issues(&self) -> &[RegistrationIssue] {
        &self.inner.registry.issues
    }

    /// Targets on dependency cycles, in registration order.
    pub fn cyclic_targets(&self) -> &[AttrName] {
        &self.inner.cyclic
    }

    /// SHA-256 over the canonical text of everything that affects
    /// evaluation and rendering. Equal fingerprints mean equal output for
    /// equal inputs.
    pub fn fingerprint(&self) -> [u8; 32] {
        self.inner.fingerprint
    }

    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.inner.fingerprint)
    }

    /// Evaluates `inputs` with the default configuration.
    pub fn evaluate(&self, inputs: &AttributeMap) -> Evaluation {
        Evaluator::new(self).evaluate(inputs)
    }

    /// Resolved attributes for `inputs`, inputs included.
    pub fn apply_rules(&self, inputs: &AttributeMap) -> AttributeMap {
        self.evaluate(inputs).into_attributes()
    }

    /// A builder holding a copy of these registrations, for layering more
    /// rules on top.
    pub fn to_builder(&self) -> RuleSetBuilder {
        RuleSetBuilder::from_registry(self.inner.registry.clone())
    }
}

fn fingerprint(registry: &Registry) -> [u8; 32] {
    let mut hasher = Sha256::new();

    // Registration order is significant, so rules are hashed in index order.
    let mut rules: Vec<&Rule> = registry.targets.iter().flat_map(TargetRules::rules).collect();
    rules.sort_by_key(|rule| rule.index());
    for rule in rules {
        hasher.update(b"rule\0");
        hasher.update(rule.to_string().as_bytes());
        hasher.update(b"\n");
    }
    for note in &registry.notes {
        hasher.update(b"note\0");
        hasher.update(note.to_string().as_bytes());
        hasher.update(b"\n");
    }
    for (table, entries) in registry.tables.iter() {
        for (key, value) in entries {
            hasher.update(b"table\0");
            hasher.update(format!("{table}\0{key}\0{value:?}\n").as_bytes());
        }
    }

    hasher.finalize().into()
}
