use crate::attribute::AttrName;
use crate::error::{ErrorSeverity, RuleError};

/// Formula text could not be turned into an expression.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("formula is empty")]
    Empty,

    #[error("formula is {len} bytes long (limit {max})")]
    TooLong { len: usize, max: usize },

    #[error("formula nests deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("malformed number {text:?} at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("expected {expected}, found {found} at offset {offset}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        offset: usize,
    },

    #[error("unknown function {name:?}")]
    UnknownFunction { name: String },

    #[error("{function}() takes {expected} argument(s), got {found}")]
    Arity {
        function: &'static str,
        expected: String,
        found: usize,
    },

    #[error("{function}() needs a string literal as argument {position}")]
    ExpectedLiteral {
        function: &'static str,
        position: usize,
    },

    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl RuleError for ParseError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "PARSE_EMPTY",
            Self::TooLong { .. } => "PARSE_TOO_LONG",
            Self::TooDeep { .. } => "PARSE_TOO_DEEP",
            Self::UnexpectedChar { .. } => "PARSE_UNEXPECTED_CHAR",
            Self::UnterminatedString { .. } => "PARSE_UNTERMINATED_STRING",
            Self::InvalidNumber { .. } => "PARSE_INVALID_NUMBER",
            Self::UnexpectedToken { .. } => "PARSE_UNEXPECTED_TOKEN",
            Self::UnknownFunction { .. } => "PARSE_UNKNOWN_FUNCTION",
            Self::Arity { .. } => "PARSE_ARITY",
            Self::ExpectedLiteral { .. } => "PARSE_EXPECTED_LITERAL",
            Self::InvalidPattern { .. } => "PARSE_INVALID_PATTERN",
        }
    }
}

/// Formula evaluation failed; the rule contributes nothing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("attribute {0} has no value")]
    UnresolvedAttribute(AttrName),

    #[error("formula reads `source` but the rule has no source attribute")]
    NoSource,

    #[error("operator {op} cannot be applied to {found}")]
    TypeMismatch { op: &'static str, found: &'static str },

    #[error("operator {op} received null")]
    NullOperand { op: &'static str },

    #[error("operator {op} produced a non-finite number")]
    NonFinite { op: &'static str },

    #[error("no table named {0:?}")]
    UnknownTable(String),

    #[error("table {table:?} has no entry {key:?}")]
    MissingTableEntry { table: String, key: String },

    #[error("formula did not parse: {0}")]
    Invalid(ParseError),
}

impl RuleError for EvalError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnresolvedAttribute(_) | Self::MissingTableEntry { .. } | Self::NullOperand { .. } => {
                ErrorSeverity::Recoverable
            }
            Self::NoSource
            | Self::TypeMismatch { .. }
            | Self::NonFinite { .. }
            | Self::UnknownTable(_)
            | Self::Invalid(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnresolvedAttribute(_) => "EVAL_UNRESOLVED_ATTRIBUTE",
            Self::NoSource => "EVAL_NO_SOURCE",
            Self::TypeMismatch { .. } => "EVAL_TYPE_MISMATCH",
            Self::NullOperand { .. } => "EVAL_NULL_OPERAND",
            Self::NonFinite { .. } => "EVAL_NON_FINITE",
            Self::UnknownTable(_) => "EVAL_UNKNOWN_TABLE",
            Self::MissingTableEntry { .. } => "EVAL_MISSING_TABLE_ENTRY",
            Self::Invalid(_) => "EVAL_INVALID_FORMULA",
        }
    }
}
