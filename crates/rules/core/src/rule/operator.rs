use crate::attribute::Value;
use crate::error::{ErrorSeverity, RuleError};

/// How a rule's value combines with the target's accumulated value.
///
/// Each operator accepts both its bare and its assignment spelling
/// (`+` and `+=`), which is how rule content writes them.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub enum Operator {
    /// Default assignment: the first ready `=` rule sets the base.
    #[strum(to_string = "=")]
    Set,
    #[strum(to_string = "+", serialize = "+=")]
    Add,
    /// Highest value wins.
    #[strum(to_string = "^", serialize = "^=")]
    Max,
    /// Lowest value wins.
    #[strum(to_string = "v", serialize = "v=")]
    Min,
    #[strum(to_string = "*", serialize = "*=")]
    Multiply,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        self.into()
    }

    /// Folds `value` into the accumulator.
    ///
    /// An unset accumulator adopts the first contribution, which is the
    /// same as starting from the operator's identity (0 for `+`, -inf for
    /// `^`, +inf for `v`, 1 for `*`). Booleans count as 1 and 0 there, as
    /// they do in any later fold. `=` never replaces a set accumulator.
    pub fn combine(self, acc: Option<&Value>, value: Value) -> Result<Value, CombineError> {
        let Some(acc) = acc else {
            return match (self, value) {
                (Operator::Set, value) | (Operator::Add, value @ Value::Text(_)) => Ok(value),
                (_, value) => value
                    .as_number()
                    .map(Value::Number)
                    .ok_or_else(|| self.mismatch(&value)),
            };
        };

        match self {
            Operator::Set => Ok(acc.clone()),
            Operator::Add => match (acc, &value) {
                (Value::Text(left), right) => Ok(Value::Text(format!("{left}{right}"))),
                (left, Value::Text(right)) => Ok(Value::Text(format!("{left}{right}"))),
                _ => self.numeric(acc, &value, |a, b| a + b),
            },
            Operator::Max => self.numeric(acc, &value, f64::max),
            Operator::Min => self.numeric(acc, &value, f64::min),
            Operator::Multiply => self.numeric(acc, &value, |a, b| a * b),
        }
    }

    fn numeric(
        self,
        acc: &Value,
        value: &Value,
        apply: impl FnOnce(f64, f64) -> f64,
    ) -> Result<Value, CombineError> {
        let left = acc.as_number().ok_or_else(|| self.mismatch(acc))?;
        let right = value.as_number().ok_or_else(|| self.mismatch(value))?;
        let result = apply(left, right);
        if result.is_finite() {
            Ok(Value::Number(result))
        } else {
            Err(CombineError::NonFinite { operator: self })
        }
    }

    fn mismatch(self, found: &Value) -> CombineError {
        CombineError::TypeMismatch {
            operator: self,
            found: found.type_name(),
        }
    }
}

impl TryFrom<String> for Operator {
    type Error = strum::ParseError;

    fn try_from(symbol: String) -> Result<Self, Self::Error> {
        symbol.trim().parse()
    }
}

impl From<Operator> for String {
    fn from(operator: Operator) -> Self {
        operator.symbol().to_owned()
    }
}

/// A contribution could not be folded into its target.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CombineError {
    #[error("operator {operator} cannot combine {found} values")]
    TypeMismatch {
        operator: Operator,
        found: &'static str,
    },

    #[error("operator {operator} produced a non-finite number")]
    NonFinite { operator: Operator },
}

impl RuleError for CombineError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "COMBINE_TYPE_MISMATCH",
            Self::NonFinite { .. } => "COMBINE_NON_FINITE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_spellings() {
        assert_eq!("=".parse::<Operator>(), Ok(Operator::Set));
        assert_eq!("+".parse::<Operator>(), Ok(Operator::Add));
        assert_eq!("+=".parse::<Operator>(), Ok(Operator::Add));
        assert_eq!("^=".parse::<Operator>(), Ok(Operator::Max));
        assert_eq!("v".parse::<Operator>(), Ok(Operator::Min));
        assert_eq!("*".parse::<Operator>(), Ok(Operator::Multiply));
        assert!("-=".parse::<Operator>().is_err());
        assert_eq!(Operator::Max.to_string(), "^");
    }

    #[test]
    fn unset_accumulator_adopts_first_value() {
        for op in [Operator::Add, Operator::Max, Operator::Min, Operator::Multiply] {
            assert_eq!(op.combine(None, Value::from(7)), Ok(Value::from(7)));
        }
    }

    #[test]
    fn unset_accumulator_counts_booleans_as_numbers() {
        for op in [Operator::Add, Operator::Max, Operator::Min, Operator::Multiply] {
            assert_eq!(op.combine(None, Value::Bool(true)), Ok(Value::from(1)), "operator {op}");
            assert_eq!(op.combine(None, Value::Bool(false)), Ok(Value::from(0)), "operator {op}");
        }
        assert_eq!(Operator::Set.combine(None, Value::Bool(true)), Ok(Value::Bool(true)));
        assert_eq!(Operator::Add.combine(None, "Elven".into()), Ok("Elven".into()));
        assert!(Operator::Max.combine(None, "Elven".into()).is_err());
    }

    #[test]
    fn numeric_folds() {
        let five = Value::from(5);
        assert_eq!(Operator::Add.combine(Some(&five), 3.into()), Ok(8.into()));
        assert_eq!(Operator::Max.combine(Some(&five), 3.into()), Ok(5.into()));
        assert_eq!(Operator::Min.combine(Some(&five), 3.into()), Ok(3.into()));
        assert_eq!(Operator::Multiply.combine(Some(&five), 3.into()), Ok(15.into()));
        assert_eq!(Operator::Set.combine(Some(&five), 3.into()), Ok(5.into()));
    }

    #[test]
    fn add_concatenates_text() {
        let acc = Value::from("Common");
        assert_eq!(
            Operator::Add.combine(Some(&acc), "/Elven".into()),
            Ok("Common/Elven".into())
        );
        assert_eq!(
            Operator::Add.combine(Some(&Value::from(2)), " ranks".into()),
            Ok("2 ranks".into())
        );
    }

    #[test]
    fn max_rejects_text() {
        let err = Operator::Max
            .combine(Some(&Value::from(1)), "x".into())
            .unwrap_err();
        assert_eq!(
            err,
            CombineError::TypeMismatch {
                operator: Operator::Max,
                found: "text"
            }
        );
        assert_eq!(err.error_code(), "COMBINE_TYPE_MISMATCH");
    }
}
