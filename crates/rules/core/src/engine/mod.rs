//! Evaluation: inputs in, resolved attributes and rendered notes out.
//!
//! # Pass structure
//!
//! Every pass visits the targets in dependency order (see [`order`]) and
//! rebuilds each one from scratch against the live working map:
//!
//! 1. the caller's input value for the target, if any, is the base
//! 2. otherwise the first ready `=` rule that yields a value sets it
//! 3. every ready non-`=` rule then folds its value in, in registration
//!    order
//!
//! A rule is ready when its source is `Always`, when its source attribute
//! is present and not `false`, or, for a family source, once for each
//! present member. Nothing carries over between passes except the working
//! map itself, so accumulations are never counted twice.
//!
//! Passes repeat until one changes nothing. Acyclic rule sets settle after
//! a single productive pass; cycles either settle or hit
//! [`EngineConfig::max_passes`], in which case the still-changing
//! attributes are withdrawn and reported.

mod diagnostics;
pub(crate) mod order;

pub use diagnostics::Diagnostic;

use crate::attribute::{AttrName, AttributeMap, Value};
use crate::config::EngineConfig;
use crate::error::RuleError;
use crate::formula::Scope;
use crate::note::RenderedNote;
use crate::rule::{Operator, Rule, Source};
use crate::ruleset::{RuleSet, TargetRules};
use crate::table::Tables;

/// Stateless evaluator over a frozen [`RuleSet`].
#[derive(Clone, Debug)]
pub struct Evaluator<'r> {
    rules: &'r RuleSet,
    config: EngineConfig,
}

impl<'r> Evaluator<'r> {
    pub fn new(rules: &'r RuleSet) -> Self {
        Self {
            rules,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolves every derived attribute reachable from `inputs`, then
    /// renders all notes against the result.
    pub fn evaluate(&self, inputs: &AttributeMap) -> Evaluation {
        let max_passes = self.config.max_passes.max(1);
        let tables = self.rules.tables();
        let mut working = inputs.clone();
        let mut diagnostics = Vec::new();
        let mut changed: Vec<AttrName> = Vec::new();
        let mut passes = 0;
        let mut converged = false;

        while passes < max_passes {
            passes += 1;
            // Only the last pass's failures describe the final state.
            diagnostics.clear();
            changed.clear();

            for target in self.rules.planned() {
                let name = target.name();
                let resolved = resolve(
                    target,
                    inputs.get(name.as_str()),
                    &working,
                    tables,
                    &mut diagnostics,
                );
                if working.get(name.as_str()) == resolved.as_ref() {
                    continue;
                }
                match resolved {
                    Some(value) => working.insert(name.clone(), value),
                    None => working.remove(name.as_str()),
                };
                changed.push(name.clone());
            }

            if changed.is_empty() {
                converged = true;
                break;
            }
        }

        if !converged {
            tracing::warn!(
                "Rules did not settle after {} passes; withdrawing {:?}",
                passes,
                changed
            );
            for name in &changed {
                match inputs.get(name.as_str()) {
                    Some(value) => working.insert(name.clone(), value.clone()),
                    None => working.remove(name.as_str()),
                };
            }
            diagnostics.push(Diagnostic::NonConvergent {
                attributes: changed,
                passes,
            });
        }

        let notes: Vec<RenderedNote> = self
            .rules
            .notes()
            .iter()
            .map(|note| note.render(&working))
            .collect();

        tracing::debug!(
            "Evaluated {} inputs into {} attributes in {} passes ({} diagnostics)",
            inputs.len(),
            working.len(),
            passes,
            diagnostics.len()
        );

        Evaluation {
            attributes: working,
            notes,
            diagnostics,
            passes,
            converged,
        }
    }
}

/// Rebuilds one target's value for the current pass.
fn resolve(
    target: &TargetRules,
    input: Option<&Value>,
    working: &AttributeMap,
    tables: &Tables,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Value> {
    let mut acc = input.cloned();

    if acc.is_none() {
        acc = target
            .rules()
            .iter()
            .filter(|rule| rule.operator() == Operator::Set)
            .find_map(|rule| contributions(rule, working, tables, diagnostics).into_iter().next());
    }

    for rule in target.rules().iter().filter(|rule| rule.operator() != Operator::Set) {
        for value in contributions(rule, working, tables, diagnostics) {
            match rule.operator().combine(acc.as_ref(), value) {
                Ok(combined) => acc = Some(combined),
                Err(error) => {
                    tracing::trace!("Rule #{} for {}: {}", rule.index(), rule.target(), error);
                    diagnostics.push(Diagnostic::CombineFailed {
                        target: rule.target().clone(),
                        rule: rule.index(),
                        error,
                    });
                }
            }
        }
    }

    acc
}

/// Values a rule contributes this pass, one per ready binding.
fn contributions(
    rule: &Rule,
    working: &AttributeMap,
    tables: &Tables,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Value> {
    let scope = Scope::new(working, tables);
    let mut values = Vec::new();

    match rule.source() {
        Source::Always => fire(rule, scope, None, &mut values, diagnostics),
        Source::Attribute(name) => {
            if let Some(value) = working.get(name.as_str()).filter(|v| is_ready(v)) {
                fire(rule, scope.with_source(value), Some(name), &mut values, diagnostics);
            }
        }
        Source::Family(family) => {
            for (name, value) in working.matching(family) {
                if name != rule.target() && is_ready(value) {
                    fire(rule, scope.with_source(value), Some(name), &mut values, diagnostics);
                }
            }
        }
    }

    values
}

fn fire(
    rule: &Rule,
    scope: Scope<'_>,
    binding: Option<&AttrName>,
    values: &mut Vec<Value>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match rule.formula().evaluate(&scope) {
        Ok(Some(value)) => values.push(value),
        Ok(None) => {}
        Err(error) => {
            tracing::trace!(
                "Rule #{} for {} contributed nothing: {}",
                rule.index(),
                rule.target(),
                error
            );
            diagnostics.push(Diagnostic::RuleFailed {
                target: rule.target().clone(),
                rule: rule.index(),
                binding: binding.cloned(),
                error,
            });
        }
    }
}

/// Source values that trigger a rule. Zero counts; `false` does not.
fn is_ready(value: &Value) -> bool {
    !matches!(value, Value::Bool(false))
}

/// Result of one evaluation.
#[derive(Clone, Debug)]
pub struct Evaluation {
    attributes: AttributeMap,
    notes: Vec<RenderedNote>,
    diagnostics: Vec<Diagnostic>,
    passes: usize,
    converged: bool,
}

impl Evaluation {
    /// Inputs plus every resolved derived attribute.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn into_attributes(self) -> AttributeMap {
        self.attributes
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Every registered note, in registration order.
    pub fn notes(&self) -> &[RenderedNote] {
        &self.notes
    }

    /// Notes whose own attribute resolved.
    pub fn active_notes(&self) -> impl Iterator<Item = &RenderedNote> {
        self.notes.iter().filter(|note| note.active)
    }

    pub fn note(&self, attribute: &str) -> Option<&RenderedNote> {
        self.notes.iter().find(|note| note.attribute.as_str() == attribute)
    }

    /// Failures from the final pass, plus non-convergence if it happened.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics pointing at broken content rather than missing inputs.
    pub fn problems(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity().needs_attention())
    }

    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn converged(&self) -> bool {
        self.converged
    }
}
