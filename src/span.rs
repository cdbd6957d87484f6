/**
This module contains the `Span` value type: a typed, half-open interval of token indices.
*/
use crate::error::{Error, FormatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A span represents a named object over a token sequence. It contains a start (inclusive), an end
/// (exclusive) and a type, such as `PER`, `LOC` or an edit script. Two spans covering the same
/// interval with different types are different spans.
#[derive(Debug, Hash, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawSpan")]
pub struct Span {
    start: usize,
    end: usize,
    #[serde(rename = "type")]
    kind: String,
}

/// Unchecked mirror of `Span`, used so that deserialized spans go through `Span::new`.
#[derive(Deserialize)]
struct RawSpan {
    start: usize,
    end: usize,
    #[serde(rename = "type")]
    kind: String,
}

impl TryFrom<RawSpan> for Span {
    type Error = Error;
    fn try_from(value: RawSpan) -> Result<Self> {
        Span::new(value.start, value.end, value.kind)
    }
}

impl Span {
    /// Builds a span. Fails if `start >= end`.
    ///
    /// * `start`: Index of the first token of the span.
    /// * `end`: Index of the token following the last token of the span.
    /// * `kind`: Type of the span (ex: `"PER"`).
    pub fn new<S: Into<String>>(start: usize, end: usize, kind: S) -> Result<Self> {
        if start >= end {
            return Err(Error::InvalidSpan { start, end });
        }
        Ok(Span {
            start,
            end,
            kind: kind.into(),
        })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Type of the span.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Number of tokens covered by the span. Always strictly positive.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Spans are never empty. Provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns true if `index` is inside `[start, end)`.
    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    /// Returns true if `other` lies completely inside `self`.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns true if the two spans share at least one token.
    pub fn intersects(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if the spans intersect without one containing the other.
    pub fn crosses(&self, other: &Span) -> bool {
        self.intersects(other) && !self.contains_span(other) && !other.contains_span(self)
    }

    /// Joins the covered tokens with a single space.
    ///
    /// * `tokens`: The sequence the span indexes into.
    pub fn covered_text<S: AsRef<str>>(&self, tokens: &[S]) -> Result<String> {
        if self.end > tokens.len() {
            return Err(FormatError::SpanOutOfBounds {
                span: self.to_string(),
                len: tokens.len(),
            }
            .into());
        }
        let covered: Vec<&str> = tokens[self.start..self.end]
            .iter()
            .map(|t| t.as_ref())
            .collect();
        Ok(covered.join(" "))
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}..{}) {}", self.start, self.end, self.kind)
    }
}
