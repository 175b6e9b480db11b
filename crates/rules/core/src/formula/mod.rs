//! Formula system for rule expressions.
//!
//! A formula computes one rule's contribution. It is parsed once, when the
//! rule is registered, into a closed expression tree and interpreted against a
//! read-only [`Scope`]. There is no way for a formula to reach outside the
//! attributes and tables it is given.
//!
//! ## Examples
//!
//! ```text
//! floor((source - 10) / 2)                  ability modifier
//! source * (source + 1) + 3                 skill experience cost
//! source == 'None' ? null : matches(source, 'Heavy') ? 2 : 1
//! table('armorClassBonuses', source)        lookup table
//! attr('skills.HTH Combat') + strengthModifier
//! ```
//!
//! `null` means "this rule contributes nothing".

mod error;
pub mod evaluate;
mod lexer;
mod parser;

pub use error::{EvalError, ParseError};
pub use evaluate::Scope;

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::attribute::{AttrName, Value};

// ============================================================================
// Expression Tree
// ============================================================================

/// Parsed formula expression.
#[derive(Clone, Debug)]
pub enum Expr {
    /// Number, text or boolean literal.
    Literal(Value),

    /// Explicit "no contribution".
    Null,

    /// Value of the rule's matched source attribute.
    Source,

    /// Value of another attribute; fails while it is unresolved.
    Attr(AttrName),

    /// Whether an attribute currently has a value.
    Defined(AttrName),

    Unary(UnaryOp, Box<Expr>),

    Binary(BinaryOp, Box<Expr>, Box<Expr>),

    /// Short-circuiting `&&` / `||`.
    Logical(LogicalOp, Box<Expr>, Box<Expr>),

    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },

    /// Numeric builtin call.
    Call(Builtin, Vec<Expr>),

    /// Regex test against the display form of a value.
    Matches(Box<Expr>, Regex),

    /// Lookup in a table registered with the rule set.
    Table(String, Box<Expr>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub const fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Functions callable from formulas.
///
/// `attr`, `defined`, `matches` and `table` take a string literal argument
/// and are parsed into dedicated nodes; the rest are numeric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumString, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Builtin {
    Floor,
    Ceil,
    Round,
    Abs,
    Sqrt,
    Pow,
    Log,
    Min,
    Max,
    Attr,
    Defined,
    Matches,
    Table,
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Accepted argument count as `(min, max)`; `None` means unbounded.
    pub const fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Builtin::Floor
            | Builtin::Ceil
            | Builtin::Round
            | Builtin::Abs
            | Builtin::Sqrt
            | Builtin::Attr
            | Builtin::Defined => (1, Some(1)),
            Builtin::Pow | Builtin::Matches | Builtin::Table => (2, Some(2)),
            Builtin::Log => (1, Some(2)),
            Builtin::Min | Builtin::Max => (1, None),
        }
    }
}

impl Expr {
    /// Attribute names this expression reads, in first-use order.
    pub fn references(&self) -> Vec<AttrName> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names
    }

    fn collect_references(&self, names: &mut Vec<AttrName>) {
        match self {
            Expr::Attr(name) | Expr::Defined(name) => {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            Expr::Literal(_) | Expr::Null | Expr::Source => {}
            Expr::Unary(_, operand) => operand.collect_references(names),
            Expr::Binary(_, lhs, rhs) | Expr::Logical(_, lhs, rhs) => {
                lhs.collect_references(names);
                rhs.collect_references(names);
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                condition.collect_references(names);
                then.collect_references(names);
                otherwise.collect_references(names);
            }
            Expr::Call(_, args) => args.iter().for_each(|arg| arg.collect_references(names)),
            Expr::Matches(subject, _) => subject.collect_references(names),
            Expr::Table(_, key) => key.collect_references(names),
        }
    }
}

// ============================================================================
// Formula
// ============================================================================

/// A rule expression together with its source text.
///
/// Formulas that fail to parse are still constructible through
/// [`Formula::new`]; they keep the parse error and fail every evaluation,
/// so a broken content rule contributes nothing instead of breaking the
/// rule set.
#[derive(Clone)]
pub struct Formula {
    text: Arc<str>,
    compiled: Result<Arc<Expr>, ParseError>,
}

impl Formula {
    /// Source text of the identity formula.
    pub const SOURCE: &'static str = "source";

    /// Parses `text`, failing on any syntax or limit error.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let expr = parser::parse(text)?;
        Ok(Self {
            text: Arc::from(text),
            compiled: Ok(Arc::new(expr)),
        })
    }

    /// Parses `text`, keeping any error inside the formula.
    pub fn new(text: &str) -> Self {
        Self {
            text: Arc::from(text),
            compiled: parser::parse(text).map(Arc::new),
        }
    }

    /// The formula `source`: passes the source value through unchanged.
    pub fn source() -> Self {
        Self {
            text: Arc::from(Self::SOURCE),
            compiled: Ok(Arc::new(Expr::Source)),
        }
    }

    /// A formula that always yields `value`.
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        let text = match &value {
            Value::Text(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_string(),
        };
        Self {
            text: Arc::from(text),
            compiled: Ok(Arc::new(Expr::Literal(value))),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_valid(&self) -> bool {
        self.compiled.is_ok()
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.compiled.as_ref().err()
    }

    pub fn expr(&self) -> Option<&Expr> {
        self.compiled.as_deref().ok()
    }

    /// Attribute names the formula reads besides its source.
    pub fn references(&self) -> Vec<AttrName> {
        self.expr().map(Expr::references).unwrap_or_default()
    }

    /// Evaluates the formula. `Ok(None)` means the formula produced `null`.
    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<Option<Value>, EvalError> {
        match &self.compiled {
            Ok(expr) => evaluate::evaluate(expr, scope),
            Err(error) => Err(EvalError::Invalid(error.clone())),
        }
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Formula").field(&self.text).finish()
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Formula {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Formula {
    fn from(text: String) -> Self {
        Self::new(&text)
    }
}

impl From<Option<&str>> for Formula {
    /// `None` is the identity formula, matching content that leaves the
    /// expression empty.
    fn from(text: Option<&str>) -> Self {
        text.map_or_else(Self::source, Self::new)
    }
}

impl From<Value> for Formula {
    fn from(value: Value) -> Self {
        Self::constant(value)
    }
}

impl From<i32> for Formula {
    fn from(value: i32) -> Self {
        Self::constant(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_are_collected_once_in_order() {
        let formula = Formula::parse("a + attr('b c') * a + (defined('d') ? 1 : 0)").unwrap();
        let names: Vec<_> = formula.references().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, ["a", "b c", "d"]);
    }

    #[test]
    fn invalid_formula_keeps_text_and_error() {
        let formula = Formula::new("floor(");
        assert!(!formula.is_valid());
        assert_eq!(formula.text(), "floor(");
        assert!(formula.error().is_some());
        assert!(formula.references().is_empty());
    }

    #[test]
    fn constant_text_formula_round_trips_through_parser() {
        let formula = Formula::constant("it's");
        let reparsed = Formula::parse(formula.text()).unwrap();
        assert!(matches!(reparsed.expr(), Some(Expr::Literal(Value::Text(s))) if s == "it's"));
    }
}
