//! Common error infrastructure for rules-core.
//!
//! Module-specific errors (`ParseError`, `EvalError`, `Diagnostic`,
//! `RegistrationIssue`) live next to the code that produces them. This module
//! provides the classification they share.
//!
//! # Design Principles
//!
//! - **Local degradation**: nothing in the engine aborts an evaluation; errors
//!   are collected as diagnostics and the offending rule contributes nothing
//! - **Severity Classification**: errors are categorized so hosts can decide
//!   what to surface on a sheet and what to log

/// Severity level of an error, used for categorization and reporting.
///
/// - **Recoverable**: expected while a chain is incomplete; a rule simply did not apply
/// - **Validation**: the content itself is malformed (bad formula text, bad pattern)
/// - **Internal**: the rule set did not settle (cycle, pass limit)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// The rule could not contribute this time; other inputs may change that.
    ///
    /// Examples: referenced attribute not resolved, table has no such key
    Recoverable,

    /// Content error that will fail the same way on every evaluation.
    ///
    /// Examples: formula does not parse, operator applied to text
    Validation,

    /// The evaluation itself misbehaved.
    ///
    /// Examples: values still changing when the pass limit was reached
    Internal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error points at the rule content or the engine
    /// rather than at missing inputs.
    pub const fn needs_attention(&self) -> bool {
        matches!(self, Self::Validation | Self::Internal)
    }
}

impl core::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common trait for all rules-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on whether more input could fix it, not on impact
pub trait RuleError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Useful for grouping diagnostics and for tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
