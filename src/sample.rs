/**
This module contains the `Sample` type, a tokenized sentence with its reference spans, and the
`SampleStream` contract every corpus reader implements.
*/
use crate::error::{Error, FormatError, Result};
use crate::overlap::are_disjoint;
use crate::schemes::SchemeType;
use crate::span::Span;
use serde::{Deserialize, Serialize};

/// One tokenized sentence annotated with non-overlapping spans. A sample is immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSample")]
pub struct Sample {
    tokens: Vec<String>,
    spans: Vec<Span>,
    clear_adaptive_data: bool,
}

#[derive(Deserialize)]
struct RawSample {
    tokens: Vec<String>,
    spans: Vec<Span>,
    #[serde(default)]
    clear_adaptive_data: bool,
}

impl TryFrom<RawSample> for Sample {
    type Error = Error;
    fn try_from(value: RawSample) -> Result<Self> {
        Sample::new(value.tokens, value.spans, value.clear_adaptive_data)
    }
}

impl Sample {
    /// Builds a sample. The spans are sorted by start. Fails if a span exceeds the tokens or if
    /// two spans overlap.
    ///
    /// * `tokens`: The tokens of the sentence.
    /// * `spans`: Reference spans over `tokens`.
    /// * `clear_adaptive_data`: Whether the labeler must forget its document-level state before
    ///   labeling this sample.
    pub fn new(tokens: Vec<String>, mut spans: Vec<Span>, clear_adaptive_data: bool) -> Result<Self> {
        if let Some(span) = spans.iter().find(|s| s.end() > tokens.len()) {
            return Err(FormatError::SpanOutOfBounds {
                span: span.to_string(),
                len: tokens.len(),
            }
            .into());
        }
        spans.sort();
        if !are_disjoint(&spans) {
            let (a, b) = spans
                .windows(2)
                .find(|w| w[0].end() > w[1].start())
                .map(|w| (w[0].to_string(), w[1].to_string()))
                .unwrap_or_default();
            return Err(FormatError::OverlappingSpans(a, b).into());
        }
        Ok(Sample {
            tokens,
            spans,
            clear_adaptive_data,
        })
    }

    /// Builds a sample from one tag per token, decoded with `scheme`.
    pub fn from_tags<S: AsRef<str>>(
        tokens: Vec<String>,
        tags: &[S],
        scheme: SchemeType,
        clear_adaptive_data: bool,
    ) -> Result<Self> {
        if tokens.len() != tags.len() {
            return Err(FormatError::LengthMismatch {
                tokens: tokens.len(),
                tags: tags.len(),
            }
            .into());
        }
        let spans = scheme.decode(tags)?;
        Sample::new(tokens, spans, clear_adaptive_data)
    }

    /// Tags of the sample in `scheme`.
    pub fn tags(&self, scheme: SchemeType) -> Result<Vec<String>> {
        scheme.encode(&self.spans, self.tokens.len())
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Reference spans, sorted by start.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn clear_adaptive_data(&self) -> bool {
        self.clear_adaptive_data
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A resettable source of samples.
pub trait SampleStream {
    /// Returns the next sample or `None` at the end of the stream.
    fn read(&mut self) -> Result<Option<Sample>>;
    /// Rewinds the stream to its first sample.
    fn reset(&mut self) -> Result<()>;

    /// Reads every remaining sample.
    fn read_all(&mut self) -> Result<Vec<Sample>> {
        let mut samples = vec![];
        while let Some(sample) = self.read()? {
            samples.push(sample);
        }
        Ok(samples)
    }
}

/// In-memory sample stream.
#[derive(Debug, Clone, Default)]
pub struct VecSampleStream {
    samples: Vec<Sample>,
    position: usize,
}

impl VecSampleStream {
    pub fn new(samples: Vec<Sample>) -> Self {
        VecSampleStream {
            samples,
            position: 0,
        }
    }
}

impl From<Vec<Sample>> for VecSampleStream {
    fn from(value: Vec<Sample>) -> Self {
        Self::new(value)
    }
}

impl SampleStream for VecSampleStream {
    fn read(&mut self) -> Result<Option<Sample>> {
        let sample = self.samples.get(self.position).cloned();
        if sample.is_some() {
            self.position += 1;
        }
        Ok(sample)
    }

    fn reset(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }
}
