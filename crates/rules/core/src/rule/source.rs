use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::attribute::AttrName;
use crate::formula::ParseError;

/// What a rule is triggered by.
///
/// Textual form, as written in rule content:
///
/// | text            | source                              |
/// |-----------------|-------------------------------------|
/// | `""`            | [`Source::Always`]                  |
/// | `"/^skills\./"` | [`Family::Pattern`] on the regex    |
/// | `"languages.*"` | [`Family::Prefix`] on `languages.`  |
/// | anything else   | [`Source::Attribute`]               |
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// Fires on every pass, with no source value bound.
    Always,
    /// Fires when the attribute is present and not `false`.
    Attribute(AttrName),
    /// Fires once per present attribute in the family.
    Family(Family),
}

impl Source {
    /// Parses the textual form. Only a malformed `/regex/` can fail.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Source::Always);
        }
        if let Some(pattern) = text
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
            .filter(|pattern| !pattern.is_empty())
        {
            return Family::pattern(pattern).map(Source::Family);
        }
        if let Some(prefix) = text.strip_suffix('*').filter(|prefix| !prefix.is_empty()) {
            return Ok(Source::Family(Family::Prefix(prefix.to_owned())));
        }
        Ok(Source::Attribute(AttrName::new(text)))
    }

    pub fn attribute(name: impl Into<AttrName>) -> Self {
        Source::Attribute(name.into())
    }

    /// Whether `name` can trigger this source.
    pub fn reads(&self, name: &str) -> bool {
        match self {
            Source::Always => false,
            Source::Attribute(attr) => attr.as_str() == name,
            Source::Family(family) => family.contains(name),
        }
    }
}

impl FromStr for Source {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Source::parse(text)
    }
}

impl From<AttrName> for Source {
    fn from(name: AttrName) -> Self {
        Source::Attribute(name)
    }
}

impl From<Family> for Source {
    fn from(family: Family) -> Self {
        Source::Family(family)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Always => Ok(()),
            Source::Attribute(name) => write!(f, "{name}"),
            Source::Family(family) => write!(f, "{family}"),
        }
    }
}

/// A set of attribute names sharing a naming convention.
#[derive(Clone, Debug)]
pub enum Family {
    /// Every name starting with the prefix, e.g. `languages.`.
    Prefix(String),
    /// Every name the regex matches.
    Pattern(Regex),
}

impl Family {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Family::Prefix(prefix.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, ParseError> {
        Regex::new(pattern)
            .map(Family::Pattern)
            .map_err(|e| ParseError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: e.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        match self {
            Family::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Family::Pattern(regex) => regex.is_match(name),
        }
    }
}

impl PartialEq for Family {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Family::Prefix(a), Family::Prefix(b)) => a == b,
            (Family::Pattern(a), Family::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for Family {}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Family::Prefix(prefix) => write!(f, "{prefix}*"),
            Family::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}
