//! Formula evaluation logic.
//!
//! Evaluates an [`Expr`] against a [`Scope`]. The scope is the only thing a
//! formula can see: the rule's source value, the attributes resolved so far,
//! and the rule set's lookup tables.

use crate::attribute::{AttributeMap, Value};
use crate::formula::{BinaryOp, Builtin, EvalError, Expr, LogicalOp, UnaryOp};
use crate::table::Tables;

/// Read-only view a formula is evaluated against.
#[derive(Clone, Copy, Debug)]
pub struct Scope<'a> {
    source: Option<&'a Value>,
    attributes: &'a AttributeMap,
    tables: &'a Tables,
}

impl<'a> Scope<'a> {
    pub fn new(attributes: &'a AttributeMap, tables: &'a Tables) -> Self {
        Self {
            source: None,
            attributes,
            tables,
        }
    }

    /// Binds `source` for rules that fired on a source attribute.
    pub fn with_source(mut self, source: &'a Value) -> Self {
        self.source = Some(source);
        self
    }
}

// ============================================================================
// Expression Evaluation
// ============================================================================

/// Evaluate an expression to a value; `Ok(None)` is `null`.
///
/// ## Semantics
/// - `+` concatenates when either side is text, otherwise adds
/// - other arithmetic is numeric; booleans count as 1 and 0
/// - non-finite results (division by zero, `log(0)`) are errors
/// - `&&` / `||` short-circuit and produce booleans
/// - comparisons are numeric, or lexicographic when both sides are text
pub fn evaluate(expr: &Expr, scope: &Scope<'_>) -> Result<Option<Value>, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(Some(value.clone())),

        Expr::Null => Ok(None),

        Expr::Source => scope.source.cloned().map(Some).ok_or(EvalError::NoSource),

        Expr::Attr(name) => scope
            .attributes
            .get(name.as_str())
            .cloned()
            .map(Some)
            .ok_or_else(|| EvalError::UnresolvedAttribute(name.clone())),

        Expr::Defined(name) => Ok(Some(Value::Bool(scope.attributes.contains(name.as_str())))),

        Expr::Unary(op, operand) => {
            let value = evaluate(operand, scope)?;
            match op {
                UnaryOp::Not => Ok(Some(Value::Bool(!truthy(value.as_ref())))),
                UnaryOp::Negate => {
                    let n = number(value.as_ref(), "unary -")?;
                    Ok(Some(Value::Number(-n)))
                }
            }
        }

        Expr::Binary(op, lhs, rhs) => {
            let lhs = evaluate(lhs, scope)?;
            let rhs = evaluate(rhs, scope)?;
            binary(*op, lhs.as_ref(), rhs.as_ref()).map(Some)
        }

        Expr::Logical(op, lhs, rhs) => {
            let lhs = truthy(evaluate(lhs, scope)?.as_ref());
            let result = match op {
                LogicalOp::And => lhs && truthy(evaluate(rhs, scope)?.as_ref()),
                LogicalOp::Or => lhs || truthy(evaluate(rhs, scope)?.as_ref()),
            };
            Ok(Some(Value::Bool(result)))
        }

        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if truthy(evaluate(condition, scope)?.as_ref()) {
                evaluate(then, scope)
            } else {
                evaluate(otherwise, scope)
            }
        }

        Expr::Call(builtin, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(number(evaluate(arg, scope)?.as_ref(), builtin.name())?);
            }
            call(*builtin, &values).map(|n| Some(Value::Number(n)))
        }

        Expr::Matches(subject, regex) => {
            let subject = evaluate(subject, scope)?.ok_or(EvalError::NullOperand { op: "matches" })?;
            Ok(Some(Value::Bool(regex.is_match(&subject.to_string()))))
        }

        Expr::Table(table, key) => {
            let key = evaluate(key, scope)?
                .ok_or(EvalError::NullOperand { op: "table" })?
                .to_string();
            match scope.tables.lookup(table, &key) {
                None => Err(EvalError::UnknownTable(table.clone())),
                Some(None) => Err(EvalError::MissingTableEntry {
                    table: table.clone(),
                    key,
                }),
                Some(Some(value)) => Ok(Some(value.clone())),
            }
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn truthy(value: Option<&Value>) -> bool {
    value.is_some_and(Value::is_truthy)
}

fn number(value: Option<&Value>, op: &'static str) -> Result<f64, EvalError> {
    let value = value.ok_or(EvalError::NullOperand { op })?;
    value.as_number().ok_or(EvalError::TypeMismatch {
        op,
        found: value.type_name(),
    })
}

fn finite(n: f64, op: &'static str) -> Result<f64, EvalError> {
    if n.is_finite() {
        Ok(n)
    } else {
        Err(EvalError::NonFinite { op })
    }
}

fn binary(op: BinaryOp, lhs: Option<&Value>, rhs: Option<&Value>) -> Result<Value, EvalError> {
    let symbol = op.symbol();
    match op {
        BinaryOp::Eq => Ok(Value::Bool(loosely_equal(lhs, rhs))),
        BinaryOp::Ne => Ok(Value::Bool(!loosely_equal(lhs, rhs))),

        BinaryOp::Add => {
            let (l, r) = (
                lhs.ok_or(EvalError::NullOperand { op: symbol })?,
                rhs.ok_or(EvalError::NullOperand { op: symbol })?,
            );
            if matches!(l, Value::Text(_)) || matches!(r, Value::Text(_)) {
                return Ok(Value::Text(format!("{l}{r}")));
            }
            let sum = number(Some(l), symbol)? + number(Some(r), symbol)?;
            finite(sum, symbol).map(Value::Number)
        }

        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (l, r) = (number(lhs, symbol)?, number(rhs, symbol)?);
            let result = match op {
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => l / r,
                _ => l % r,
            };
            finite(result, symbol).map(Value::Number)
        }

        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(lhs, rhs, symbol)?;
            let holds = match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Bool(holds))
        }
    }
}

fn loosely_equal(lhs: Option<&Value>, rhs: Option<&Value>) -> bool {
    match (lhs, rhs) {
        (None, None) => true,
        (Some(Value::Text(l)), Some(Value::Text(r))) => l == r,
        (Some(Value::Text(_)), Some(_)) | (Some(_), Some(Value::Text(_))) => false,
        (Some(l), Some(r)) => l.as_number() == r.as_number(),
        _ => false,
    }
}

fn compare(
    lhs: Option<&Value>,
    rhs: Option<&Value>,
    op: &'static str,
) -> Result<std::cmp::Ordering, EvalError> {
    match (lhs, rhs) {
        (Some(Value::Text(l)), Some(Value::Text(r))) => Ok(l.cmp(r)),
        _ => {
            let (l, r) = (number(lhs, op)?, number(rhs, op)?);
            l.partial_cmp(&r).ok_or(EvalError::NonFinite { op })
        }
    }
}

fn call(builtin: Builtin, args: &[f64]) -> Result<f64, EvalError> {
    let op = builtin.name();
    let first = args.first().copied().unwrap_or(f64::NAN);
    let result = match builtin {
        Builtin::Floor => first.floor(),
        Builtin::Ceil => first.ceil(),
        // Half-way cases round up, as sheet formulas expect (-2.5 → -2).
        Builtin::Round => (first + 0.5).floor(),
        Builtin::Abs => first.abs(),
        Builtin::Sqrt => first.sqrt(),
        Builtin::Pow => first.powf(args.get(1).copied().unwrap_or(f64::NAN)),
        Builtin::Log => match args.get(1) {
            Some(base) => first.ln() / base.ln(),
            None => first.ln(),
        },
        Builtin::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
        Builtin::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        // Parsed into dedicated nodes; never reach a numeric call.
        Builtin::Attr | Builtin::Defined | Builtin::Matches | Builtin::Table => f64::NAN,
    };
    finite(result, op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Formula;

    fn eval_with(text: &str, source: Option<Value>, attributes: &AttributeMap) -> Result<Option<Value>, EvalError> {
        let mut tables = Tables::new();
        tables.define("armorClassBonuses", [("Leather", 2), ("Chain Mail", 5)]);
        let formula = Formula::parse(text).unwrap();
        let scope = Scope::new(attributes, &tables);
        match &source {
            Some(value) => formula.evaluate(&scope.with_source(value)),
            None => formula.evaluate(&scope),
        }
    }

    fn eval(text: &str, source: impl Into<Value>) -> Result<Option<Value>, EvalError> {
        eval_with(text, Some(source.into()), &AttributeMap::new())
    }

    #[test]
    fn ability_modifier_formula() {
        assert_eq!(eval("floor((source - 10) / 2)", 16), Ok(Some(Value::from(3))));
        assert_eq!(eval("floor((source - 10) / 2)", 7), Ok(Some(Value::from(-2))));
    }

    #[test]
    fn level_from_experience() {
        let level = eval("floor(log(source / 1000 + 1) / log(1.1))", 1100);
        assert_eq!(level, Ok(Some(Value::from(7))));
    }

    #[test]
    fn shield_bonus_with_null_branch() {
        let formula = "source == 'None' ? null : source == 'Tower' ? 4 : matches(source, 'Heavy') ? 2 : 1";
        assert_eq!(eval(formula, "None"), Ok(None));
        assert_eq!(eval(formula, "Tower"), Ok(Some(Value::from(4))));
        assert_eq!(eval(formula, "Heavy Steel"), Ok(Some(Value::from(2))));
        assert_eq!(eval(formula, "Buckler"), Ok(Some(Value::from(1))));
    }

    #[test]
    fn text_concatenation_and_comparison() {
        assert_eq!(eval("'+' + source + ' HP'", 5), Ok(Some(Value::from("+5 HP"))));
        assert_eq!(eval("source < 'b'", "a"), Ok(Some(Value::Bool(true))));
    }

    #[test]
    fn attributes_and_tables() {
        let attrs: AttributeMap = [("strengthModifier", 3)].into_iter().collect();
        assert_eq!(
            eval_with("strengthModifier + 1", None, &attrs),
            Ok(Some(Value::from(4)))
        );
        assert_eq!(
            eval_with("defined('dexterityModifier')", None, &attrs),
            Ok(Some(Value::Bool(false)))
        );
        assert_eq!(
            eval("table('armorClassBonuses', source)", "Chain Mail"),
            Ok(Some(Value::from(5)))
        );
    }

    #[test]
    fn failures_are_typed() {
        let empty = AttributeMap::new();
        assert_eq!(
            eval_with("dexterityModifier", None, &empty),
            Err(EvalError::UnresolvedAttribute("dexterityModifier".into()))
        );
        assert_eq!(eval_with("source", None, &empty), Err(EvalError::NoSource));
        assert_eq!(eval("1 / source", 0), Err(EvalError::NonFinite { op: "/" }));
        assert_eq!(
            eval("source * 2", "x"),
            Err(EvalError::TypeMismatch { op: "*", found: "text" })
        );
        assert_eq!(
            eval("table('armorClassBonuses', source)", "Plate"),
            Err(EvalError::MissingTableEntry {
                table: "armorClassBonuses".into(),
                key: "Plate".into()
            })
        );
        assert_eq!(
            eval("table('weapons', source)", "Club"),
            Err(EvalError::UnknownTable("weapons".into()))
        );
    }

    #[test]
    fn logic_short_circuits() {
        let empty = AttributeMap::new();
        // The right-hand side would fail if evaluated.
        assert_eq!(
            eval_with("false && missing", None, &empty),
            Ok(Some(Value::Bool(false)))
        );
        assert_eq!(
            eval_with("1 || missing", None, &empty),
            Ok(Some(Value::Bool(true)))
        );
    }

    #[test]
    fn variadic_min_max_and_rounding() {
        assert_eq!(eval("max(1, source, 3)", 7), Ok(Some(Value::from(7))));
        assert_eq!(eval("min(source, 3, 9)", 7), Ok(Some(Value::from(3))));
        assert_eq!(eval("round(source)", 2.5), Ok(Some(Value::from(3))));
        assert_eq!(eval("round(source)", -2.5), Ok(Some(Value::from(-2))));
    }
}
