//! Notes: text templates rendered from resolved attributes.
//!
//! A note definition reads `"attribute:template"`. In the template `%V`
//! stands for the attribute's own value and `%N` for the value of the
//! companion attribute `attribute.N`. Placeholders whose attribute did not
//! resolve render as empty text.

use std::fmt;

use crate::attribute::{AttrName, AttributeMap};
use crate::error::{ErrorSeverity, RuleError};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Value,
    Companion(usize),
}

/// A template split into literal text and placeholders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteTemplate {
    text: String,
    segments: Vec<Segment>,
}

impl NoteTemplate {
    /// Splits `text` into segments. A `%` not followed by `V` or a digit is
    /// kept as literal text, so parsing never fails.
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.char_indices().peekable();

        while let Some((_, ch)) = chars.next() {
            if ch != '%' {
                literal.push(ch);
                continue;
            }
            match chars.peek() {
                Some(&(_, 'V')) => {
                    chars.next();
                    flush(&mut literal, &mut segments);
                    segments.push(Segment::Value);
                }
                Some(&(start, digit)) if digit.is_ascii_digit() => {
                    let mut end = start;
                    while let Some(&(index, d)) = chars.peek() {
                        if !d.is_ascii_digit() {
                            break;
                        }
                        end = index + d.len_utf8();
                        chars.next();
                    }
                    match text[start..end].parse() {
                        Ok(n) => {
                            flush(&mut literal, &mut segments);
                            segments.push(Segment::Companion(n));
                        }
                        Err(_) => {
                            literal.push('%');
                            literal.push_str(&text[start..end]);
                        }
                    }
                }
                _ => literal.push('%'),
            }
        }
        flush(&mut literal, &mut segments);

        Self {
            text: text.to_owned(),
            segments,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitutes placeholders for `attribute` from `attributes`.
    pub fn render(&self, attribute: &AttrName, attributes: &AttributeMap) -> String {
        let mut out = String::with_capacity(self.text.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Value => {
                    if let Some(value) = attributes.get(attribute.as_str()) {
                        out.push_str(&value.to_string());
                    }
                }
                Segment::Companion(n) => {
                    if let Some(value) = attributes.get(attribute.companion(*n).as_str()) {
                        out.push_str(&value.to_string());
                    }
                }
            }
        }
        out
    }
}

fn flush(literal: &mut String, segments: &mut Vec<Segment>) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

/// A template bound to the attribute it describes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Note {
    attribute: AttrName,
    template: NoteTemplate,
}

impl Note {
    pub fn new(attribute: impl Into<AttrName>, template: &str) -> Self {
        Self {
            attribute: attribute.into(),
            template: NoteTemplate::parse(template),
        }
    }

    /// Parses an `"attribute:template"` definition. The attribute ends at
    /// the first `:`; the template may contain further colons.
    pub fn parse(definition: &str) -> Result<Self, NoteError> {
        let (attribute, template) = definition
            .split_once(':')
            .ok_or_else(|| NoteError::MissingSeparator(definition.to_owned()))?;
        let attribute = attribute.trim();
        if attribute.is_empty() {
            return Err(NoteError::EmptyAttribute(definition.to_owned()));
        }
        Ok(Self::new(attribute, template))
    }

    pub fn attribute(&self) -> &AttrName {
        &self.attribute
    }

    pub fn template(&self) -> &NoteTemplate {
        &self.template
    }

    pub fn render(&self, attributes: &AttributeMap) -> RenderedNote {
        RenderedNote {
            attribute: self.attribute.clone(),
            text: self.template.render(&self.attribute, attributes),
            active: attributes.contains(self.attribute.as_str()),
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.attribute, self.template.text())
    }
}

/// A note after substitution.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderedNote {
    pub attribute: AttrName,
    pub text: String,
    /// Whether the note's own attribute resolved.
    pub active: bool,
}

impl fmt::Display for RenderedNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.attribute, self.text)
    }
}

/// A description with `$` inserts, rewritten to a note template.
///
/// `$name` and `${formula}` inserts are replaced, in order, by `%1`, `%2`,
/// ...; the insert text is returned so the caller can register one
/// companion rule per placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescribedNote {
    pub template: String,
    pub inserts: Vec<String>,
}

impl DescribedNote {
    pub fn parse(description: &str) -> Self {
        let mut template = String::with_capacity(description.len());
        let mut inserts = Vec::new();
        let mut rest = description;

        while let Some(at) = rest.find('$') {
            template.push_str(&rest[..at]);
            let after = &rest[at + 1..];

            let insert = if let Some(braced) = after.strip_prefix('{') {
                braced
                    .find('}')
                    .filter(|&end| end > 0)
                    .map(|end| (&braced[..end], end + 2))
            } else {
                let end = after
                    .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                    .unwrap_or(after.len());
                (end > 0).then(|| (&after[..end], end))
            };

            match insert {
                Some((text, consumed)) => {
                    inserts.push(text.trim().to_owned());
                    template.push('%');
                    template.push_str(&inserts.len().to_string());
                    rest = &after[consumed..];
                }
                None => {
                    template.push('$');
                    rest = after;
                }
            }
        }
        template.push_str(rest);

        Self { template, inserts }
    }
}

/// A note definition could not be read.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NoteError {
    #[error("note {0:?} has no `attribute:` prefix")]
    MissingSeparator(String),

    #[error("note {0:?} names no attribute")]
    EmptyAttribute(String),
}

impl RuleError for NoteError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingSeparator(_) => "NOTE_MISSING_SEPARATOR",
            Self::EmptyAttribute(_) => "NOTE_EMPTY_ATTRIBUTE",
        }
    }
}
