//! Dependency-driven attribute rules for character-sheet generators.
//!
//! `rules-core` computes derived attributes from a character's inputs.
//! Content registers rules, notes, choices and lookup tables on a
//! [`RuleSetBuilder`]; [`RuleSetBuilder::build`] freezes them into a
//! [`RuleSet`], and an [`Evaluator`] resolves any number of attribute maps
//! against it. Evaluation is pure and deterministic: the same rule set and
//! inputs always produce the same [`Evaluation`].
pub mod attribute;
pub mod builder;
pub mod choice;
pub mod config;
pub mod engine;
pub mod error;
pub mod formula;
pub mod layout;
pub mod note;
pub mod rule;
pub mod ruleset;
pub mod table;
pub use attribute::{AttrName, AttributeMap, Value};
pub use builder::{RegistrationIssue, RuleSetBuilder};
pub use choice::ChoiceRegistry;
pub use config::EngineConfig;
pub use engine::{Diagnostic, Evaluation, Evaluator};
pub use error::{ErrorSeverity, RuleError};
pub use formula::{EvalError, Formula, ParseError, Scope};
pub use layout::{EditorElement, Layout, SheetElement};
pub use note::{DescribedNote, Note, NoteError, NoteTemplate, RenderedNote};
pub use rule::{CombineError, Family, Operator, Rule, Source};
pub use ruleset::{RuleSet, TargetRules};
pub use table::Tables;
