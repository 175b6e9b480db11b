//! Rules: `(target, source, operator, formula)` tuples.

mod operator;
mod source;

pub use operator::{CombineError, Operator};
pub use source::{Family, Source};

use std::fmt;

use crate::attribute::AttrName;
use crate::formula::Formula;

/// One registered contribution to a target attribute.
#[derive(Clone, Debug)]
pub struct Rule {
    target: AttrName,
    source: Source,
    operator: Operator,
    formula: Formula,
    index: usize,
}

impl Rule {
    pub(crate) fn new(
        target: AttrName,
        source: Source,
        operator: Operator,
        formula: Formula,
        index: usize,
    ) -> Self {
        Self {
            target,
            source,
            operator,
            formula,
            index,
        }
    }

    pub fn target(&self) -> &AttrName {
        &self.target
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Global registration sequence number.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for Rule {
    /// Canonical one-line form, also used for fingerprinting.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <- [{}] {} {}",
            self.target, self.source, self.operator, self.formula
        )
    }
}
