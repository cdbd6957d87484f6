/*!
Error types shared by the codecs, the corpus readers, the dictionary loaders and the evaluation
drivers.
*/
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Top level error. Parsing problems are wrapped in `Error::Format`, fatal setup problems in
/// `Error::Configuration` and everything touching the filesystem in `Error::Io`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A corpus line, tag or dictionary entry could not be parsed. `line` is the 1-based line
    /// number of the offending line when it is known.
    #[error("{}", display_format(.line, .source))]
    Format {
        line: Option<usize>,
        #[source]
        source: FormatError,
    },

    /// Fatal at startup: unknown codec name, invalid fold count, empty dictionary, etc.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// I/O failure, including failures while resetting a stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A span was built with `start >= end`.
    #[error("Invalid span: start ({start}) must be strictly smaller than end ({end})")]
    InvalidSpan { start: usize, end: usize },

    /// Returned by a training collaborator.
    #[error("Training failed: {0}")]
    Training(String),
}

fn display_format(line: &Option<usize>, source: &FormatError) -> String {
    match line {
        Some(l) => format!("Format error at line {}: {}", l, source),
        None => format!("Format error: {}", source),
    }
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create a training error.
    pub fn training(msg: impl Into<String>) -> Self {
        Error::Training(msg.into())
    }

    /// Attach a line number to a format error. Other variants are returned untouched.
    pub(crate) fn at_line(self, line_number: usize) -> Self {
        match self {
            Error::Format { line: None, source } => Error::Format {
                line: Some(line_number),
                source,
            },
            other => other,
        }
    }

    /// Returns true for errors a caller may skip over (malformed corpus units).
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format { .. })
    }
}

impl From<FormatError> for Error {
    fn from(value: FormatError) -> Self {
        Error::Format {
            line: None,
            source: value,
        }
    }
}

/// Local, recoverable parsing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Expected {expected} tab separated fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("The tag `{0}` has no type suffix")]
    MissingType(String),

    #[error("Could not parse the prefix of the tag `{0}`")]
    UnknownPrefix(String),

    #[error("The tag `{tag}` is not allowed by the {scheme} scheme")]
    PrefixNotInScheme { tag: String, scheme: String },

    #[error("Orphan continuation tag `{tag}` at token {index}")]
    OrphanContinuation { tag: String, index: usize },

    #[error("The span of type `{kind}` starting at token {start} is not closed by an `L-` tag")]
    UnterminatedSpan { kind: String, start: usize },

    #[error("The document marker must be followed by a blank line")]
    MissingBlankAfterDocStart,

    #[error("The spans {0} and {1} overlap")]
    OverlappingSpans(String, String),

    #[error("The span {span} exceeds the sequence length {len}")]
    SpanOutOfBounds { span: String, len: usize },

    #[error("Inconsistent lengths: {tokens} tokens but {tags} tags")]
    LengthMismatch { tokens: usize, tags: usize },

    #[error("Inconsistent corpora: {references} reference sequences but {predictions} predicted sequences")]
    SequenceCountMismatch { references: usize, predictions: usize },

    #[error("Sequence {sequence}: {references} reference tags but {predictions} predicted tags")]
    PredictionLengthMismatch {
        sequence: usize,
        references: usize,
        predictions: usize,
    },

    #[error("Could not parse the edit script `{0}`")]
    InvalidEditScript(String),
}
