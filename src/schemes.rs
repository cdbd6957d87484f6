/**
This modules gives the tooling necessary to convert a sequence of per-token tags into a list of
spans, and back.
*/
use crate::error::{Error, FormatError, Result};
use crate::span::Span;
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt::Display;
use std::slice::Iter;
use std::str::FromStr;

/// Character separating the prefix from the type, as in `B-PER`.
pub const DELIMITER: char = '-';
/// The outside tag.
pub const OUTSIDE: &str = "O";

#[derive(Debug, PartialEq, Hash, Clone, Copy, Sequence, Eq)]
/// The prefixes a user can supply. All prefixes are a single ascii char.
pub(crate) enum UserPrefix {
    B,
    I,
    L,
    U,
    O,
}

impl FromStr for UserPrefix {
    type Err = FormatError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => UserPrefix::try_from(c),
            _ => Err(FormatError::UnknownPrefix(String::from(s))),
        }
    }
}

impl TryFrom<char> for UserPrefix {
    type Error = FormatError;
    fn try_from(value: char) -> std::result::Result<Self, Self::Error> {
        match value {
            'B' => Ok(Self::B),
            'I' => Ok(Self::I),
            'L' => Ok(Self::L),
            'U' => Ok(Self::U),
            'O' => Ok(Self::O),
            _ => Err(FormatError::UnknownPrefix(String::from(value))),
        }
    }
}

impl UserPrefix {
    fn as_str(&self) -> &'static str {
        match self {
            UserPrefix::B => "B",
            UserPrefix::I => "I",
            UserPrefix::L => "L",
            UserPrefix::U => "U",
            UserPrefix::O => "O",
        }
    }
}

impl Display for UserPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Sequence, Hash, Eq, PartialEq, Serialize, Deserialize)]
/// Enumeration of the supported tagging grammars. They indicate how a list of tags is chunked into
/// spans and how spans are written back as tags.
pub enum SchemeType {
    /// Begin, Inside, Outside.
    BIO,
    /// Begin, Inside, Last, Unit, Outside.
    BILOU,
}

impl Default for SchemeType {
    fn default() -> Self {
        Self::BIO
    }
}

impl Display for SchemeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Parses the codec name. Unknown names are a configuration error.
impl FromStr for SchemeType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bio" | "iob2" => Ok(SchemeType::BIO),
            "bilou" => Ok(SchemeType::BILOU),
            _ => Err(Error::configuration(format!(
                "Unknown sequence codec `{}`. Supported codecs: {:?}",
                s,
                all::<SchemeType>().collect::<Vec<_>>()
            ))),
        }
    }
}

/// A tag parsed into its prefix and type. The outside tag has no type.
#[derive(Debug, PartialEq, Clone, Copy)]
struct InnerTag<'a> {
    prefix: UserPrefix,
    kind: Option<&'a str>,
}

impl<'a> InnerTag<'a> {
    /// Parses `tag` and checks its prefix against the allowed prefixes of `scheme`.
    fn try_new(tag: &'a str, scheme: SchemeType) -> std::result::Result<Self, FormatError> {
        if tag == OUTSIDE {
            return Ok(InnerTag {
                prefix: UserPrefix::O,
                kind: None,
            });
        }
        let (prefix, kind) = match tag.split_once(DELIMITER) {
            Some((p, k)) => (
                p.parse::<UserPrefix>()
                    .map_err(|_| FormatError::UnknownPrefix(String::from(tag)))?,
                k,
            ),
            None => {
                return match tag.parse::<UserPrefix>() {
                    Ok(_) => Err(FormatError::MissingType(String::from(tag))),
                    Err(_) => Err(FormatError::UnknownPrefix(String::from(tag))),
                }
            }
        };
        if prefix == UserPrefix::O {
            return Err(FormatError::UnknownPrefix(String::from(tag)));
        }
        if kind.is_empty() {
            return Err(FormatError::MissingType(String::from(tag)));
        }
        if !scheme.allowed_prefixes().contains(&prefix) {
            return Err(FormatError::PrefixNotInScheme {
                tag: String::from(tag),
                scheme: scheme.to_string(),
            });
        }
        Ok(InnerTag {
            prefix,
            kind: Some(kind),
        })
    }
}

impl SchemeType {
    const BIO_ALLOWED_PREFIXES: [UserPrefix; 3] = [UserPrefix::B, UserPrefix::I, UserPrefix::O];
    const BILOU_ALLOWED_PREFIXES: [UserPrefix; 5] = [
        UserPrefix::B,
        UserPrefix::I,
        UserPrefix::L,
        UserPrefix::U,
        UserPrefix::O,
    ];

    fn allowed_prefixes(&self) -> &'static [UserPrefix] {
        match self {
            Self::BIO => &Self::BIO_ALLOWED_PREFIXES,
            Self::BILOU => &Self::BILOU_ALLOWED_PREFIXES,
        }
    }

    /// Tag given to a span covering exactly one token (`B-x` for BIO, `U-x` for BILOU).
    pub fn unit_tag(&self, kind: &str) -> String {
        match self {
            Self::BIO => format!("{}{}{}", UserPrefix::B, DELIMITER, kind),
            Self::BILOU => format!("{}{}{}", UserPrefix::U, DELIMITER, kind),
        }
    }

    /// Checks that `tag` is well formed and allowed by this scheme.
    pub fn validate_tag(&self, tag: &str) -> std::result::Result<(), FormatError> {
        InnerTag::try_new(tag, *self).map(|_| ())
    }

    /// Decodes `tags` into spans. Orphan continuation tags (an `I-x`/`L-x` without an open span
    /// of type `x`) are repaired: they start a new span of type `x`.
    ///
    /// * `tags`: One tag per token.
    pub fn decode<S: AsRef<str>>(&self, tags: &[S]) -> Result<Vec<Span>> {
        SpanDecoder::new(tags, *self, false).collect()
    }

    /// Decodes `tags` into spans and rejects orphan continuation tags with
    /// `FormatError::OrphanContinuation`. Under BILOU, a span opened by `B-x` must also be closed by
    /// `L-x`, otherwise decoding fails with `FormatError::UnterminatedSpan`.
    pub fn decode_strict<S: AsRef<str>>(&self, tags: &[S]) -> Result<Vec<Span>> {
        SpanDecoder::new(tags, *self, true).collect()
    }

    /// Encodes `spans` as one tag per token over a sequence of length `len`. Tokens not covered by
    /// any span receive the outside tag.
    ///
    /// * `spans`: Pairwise non-overlapping spans, in any order.
    /// * `len`: Length of the token sequence.
    pub fn encode(&self, spans: &[Span], len: usize) -> Result<Vec<String>> {
        let mut sorted: Vec<&Span> = spans.iter().collect();
        sorted.sort();
        let mut tags = vec![String::from(OUTSIDE); len];
        let mut last_end = 0;
        let mut last: Option<&Span> = None;
        for span in sorted {
            if span.end() > len {
                return Err(FormatError::SpanOutOfBounds {
                    span: span.to_string(),
                    len,
                }
                .into());
            }
            if let Some(prev) = last {
                if span.start() < last_end {
                    return Err(
                        FormatError::OverlappingSpans(prev.to_string(), span.to_string()).into(),
                    );
                }
            }
            self.write_span(span, &mut tags);
            last_end = span.end();
            last = Some(span);
        }
        Ok(tags)
    }

    fn write_span(&self, span: &Span, tags: &mut [String]) {
        let kind = span.kind();
        if span.len() == 1 {
            tags[span.start()] = self.unit_tag(kind);
            return;
        }
        let last_prefix = match self {
            Self::BIO => UserPrefix::I,
            Self::BILOU => UserPrefix::L,
        };
        for i in span.start()..span.end() {
            let prefix = if i == span.start() {
                UserPrefix::B
            } else if i + 1 == span.end() {
                last_prefix
            } else {
                UserPrefix::I
            };
            tags[i] = format!("{}{}{}", prefix, DELIMITER, kind);
        }
    }

    /// Re-tags a sequence written in this scheme into the `target` scheme.
    pub fn convert<S: AsRef<str>>(&self, tags: &[S], target: SchemeType) -> Result<Vec<String>> {
        let spans = self.decode(tags)?;
        target.encode(&spans, tags.len())
    }
}

/// This wrapper around the content iterator appends a single `"O"` at the end of its inner
/// iterator, so that the last open span is always closed.
struct OutsidePaddedIter<'a, S> {
    content: Iter<'a, S>,
    is_at_end: bool,
}

impl<'a, S: AsRef<str>> OutsidePaddedIter<'a, S> {
    fn new(seq: &'a [S]) -> Self {
        OutsidePaddedIter {
            content: seq.iter(),
            is_at_end: false,
        }
    }
}

impl<'a, S: AsRef<str>> Iterator for OutsidePaddedIter<'a, S> {
    type Item = &'a str;
    fn next(&mut self) -> Option<Self::Item> {
        match self.content.next() {
            Some(v) => Some(v.as_ref()),
            None if self.is_at_end => None,
            None => {
                self.is_at_end = true;
                Some(OUTSIDE)
            }
        }
    }
}

/// State machine iterating over a *single* tag sequence and returning its spans in order.
struct SpanDecoder<'a, S> {
    inner: OutsidePaddedIter<'a, S>,
    scheme: SchemeType,
    strict: bool,
    index: usize,
    /// Start and type of the currently open span, if any.
    open: Option<(usize, &'a str)>,
    /// A span produced by the same tag that closed the previous one (`U-x` after `B-x`, etc.).
    pending: Option<Span>,
}

impl<'a, S: AsRef<str>> SpanDecoder<'a, S> {
    fn new(tags: &'a [S], scheme: SchemeType, strict: bool) -> Self {
        SpanDecoder {
            inner: OutsidePaddedIter::new(tags),
            scheme,
            strict,
            index: 0,
            open: None,
            pending: None,
        }
    }

    /// Closes the open span (if any) right before `index`. In strict BILOU, only an `L-x` tag may
    /// close a span, which never goes through here.
    fn close(&mut self, index: usize) -> Result<Option<Span>> {
        match self.open.take() {
            Some((start, kind)) if self.strict && self.scheme == SchemeType::BILOU => {
                Err(FormatError::UnterminatedSpan {
                    kind: String::from(kind),
                    start,
                }
                .into())
            }
            Some((start, kind)) => Ok(Some(Span::new(start, index, kind)?)),
            None => Ok(None),
        }
    }

    fn orphan(&self, raw: &str, index: usize) -> Result<()> {
        if self.strict {
            return Err(FormatError::OrphanContinuation {
                tag: String::from(raw),
                index,
            }
            .into());
        }
        log::warn!("Orphan continuation tag `{}` at token {} starts a new span", raw, index);
        Ok(())
    }

    /// Consumes one tag. Returns the span to emit now and the span to emit right after it.
    fn step(&mut self, raw: &'a str, index: usize) -> Result<(Option<Span>, Option<Span>)> {
        let tag = InnerTag::try_new(raw, self.scheme)?;
        let kind = tag.kind.unwrap_or(OUTSIDE);
        match tag.prefix {
            UserPrefix::O => Ok((self.close(index)?, None)),
            UserPrefix::B => {
                let closed = self.close(index)?;
                self.open = Some((index, kind));
                Ok((closed, None))
            }
            UserPrefix::I => match self.open {
                Some((_, open_kind)) if open_kind == kind => Ok((None, None)),
                _ => {
                    self.orphan(raw, index)?;
                    let closed = self.close(index)?;
                    self.open = Some((index, kind));
                    Ok((closed, None))
                }
            },
            UserPrefix::L => match self.open {
                Some((start, open_kind)) if open_kind == kind => {
                    self.open = None;
                    Ok((Some(Span::new(start, index + 1, kind)?), None))
                }
                _ => {
                    self.orphan(raw, index)?;
                    let closed = self.close(index)?;
                    Ok((closed, Some(Span::new(index, index + 1, kind)?)))
                }
            },
            UserPrefix::U => {
                let closed = self.close(index)?;
                Ok((closed, Some(Span::new(index, index + 1, kind)?)))
            }
        }
    }
}

impl<'a, S: AsRef<str>> Iterator for SpanDecoder<'a, S> {
    type Item = Result<Span>;
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(span) = self.pending.take() {
            return Some(Ok(span));
        }
        loop {
            let raw = self.inner.next()?; // no more tags. We are done
            let index = self.index;
            self.index += 1;
            match self.step(raw, index) {
                Err(e) => return Some(Err(e)),
                Ok((Some(now), later)) => {
                    self.pending = later;
                    return Some(Ok(now));
                }
                Ok((None, Some(later))) => return Some(Ok(later)),
                Ok((None, None)) => continue,
            }
        }
    }
}
