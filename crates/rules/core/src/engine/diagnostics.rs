use crate::attribute::AttrName;
use crate::error::{ErrorSeverity, RuleError};
use crate::formula::EvalError;
use crate::rule::CombineError;

/// Something that went wrong during an evaluation without stopping it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Diagnostic {
    /// A formula failed; the rule contributed nothing for this binding.
    #[error("rule #{rule} for {target} failed{}: {error}", on_binding(.binding))]
    RuleFailed {
        target: AttrName,
        rule: usize,
        /// Source attribute the rule fired on, if any.
        binding: Option<AttrName>,
        error: EvalError,
    },

    /// A contribution could not be folded into the target.
    #[error("rule #{rule} for {target} could not be combined: {error}")]
    CombineFailed {
        target: AttrName,
        rule: usize,
        error: CombineError,
    },

    /// Values were still changing when the pass limit was hit; they were
    /// withdrawn from the result.
    #[error(
        "{} attribute(s) still changing after {passes} passes: {}",
        .attributes.len(),
        join(.attributes)
    )]
    NonConvergent {
        attributes: Vec<AttrName>,
        passes: usize,
    },
}

fn on_binding(binding: &Option<AttrName>) -> String {
    binding
        .as_ref()
        .map(|name| format!(" on {name}"))
        .unwrap_or_default()
}

fn join(names: &[AttrName]) -> String {
    names
        .iter()
        .map(AttrName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl Diagnostic {
    /// Target the diagnostic is about; `None` for evaluation-wide ones.
    pub fn target(&self) -> Option<&AttrName> {
        match self {
            Self::RuleFailed { target, .. } | Self::CombineFailed { target, .. } => Some(target),
            Self::NonConvergent { .. } => None,
        }
    }
}

impl RuleError for Diagnostic {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::RuleFailed { error, .. } => error.severity(),
            Self::CombineFailed { error, .. } => error.severity(),
            Self::NonConvergent { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::RuleFailed { error, .. } => error.error_code(),
            Self::CombineFailed { error, .. } => error.error_code(),
            Self::NonConvergent { .. } => "EVAL_NON_CONVERGENT",
        }
    }
}
