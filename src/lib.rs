/*!
This library is a substrate for span-based sequence labeling. It converts per-token tag sequences
into typed token intervals (spans) and back, resolves overlapping predictions, finds dictionary
entries in token sequences and scores labelers with precision, recall and F1, for a single run or
with k-fold cross-validation.
# SCHEMES
The current schemes are supported:
* BIO (also known as IOB2): `B` begins a span, `I` continues the span of the same type and `O` is
    outside any span.
* BILOU: `L` is the last token of a multi-token span and `U` is a span made of a single token.

A continuation tag (`I-x` or `L-x`) that does not continue an open span of type `x` is an orphan.
By default orphans are repaired: they start a new span of type `x`. In strict mode they are
rejected.

# Terminology
* A span is a half-open interval `[start, end)` of token indices with a type, such as `PER` or
    `LOC`. Two spans over the same tokens with different types are different spans.
* A sample is a tokenized sentence with its reference spans and a flag telling the labeler to
    forget its document-level state.
* A labeler produces candidate spans for a token sequence. A trainer produces labelers.

# Logging
The crate logs through the `log` facade and never installs a logger.
*/

mod cache;
mod config;
mod cross_validation;
mod dictionary;
mod error;
mod evaluation;
pub mod formats;
mod metrics;
mod overlap;
mod reporter;
mod sample;
mod schemes;
mod span;

// The public api starts here
pub use span::Span;

pub use schemes::{SchemeType, DELIMITER, OUTSIDE};

pub use overlap::{are_disjoint, drop_overlapping_spans};

pub use dictionary::{Dictionary, DictionaryMatcher, LexiconEntry, MULTIWORD_SEPARATOR};

pub use sample::{Sample, SampleStream, VecSampleStream};

pub use formats::{
    ClearFeatures, CorpusReader, EditScript, EditScriptReader, FileLines, LineSource,
    PrefixedReader, StringLines, TabulatedReader,
};

pub use metrics::{ScoreAccumulator, TypeStats, UNDEFINED_F1};

pub use reporter::{Averages, Reporter, TypeReport, TOTAL};

pub use evaluation::{Evaluator, Labeler};

pub use cross_validation::{partition, CrossValidationResult, CrossValidator, Trainer};

pub use cache::ModelCache;

pub use config::{Config, ConfigBuilder, DEFAULT_FOLDS};

pub use error::{Error, FormatError, Result};

/// Scores predicted tag sequences against reference tag sequences. Both are decoded with the
/// scheme of `config` (strictly if `config.strict` is set) and compared span by span. Returns the
/// ranked report of the scores.
///
/// * `y_true`: Reference tags, one sequence per sentence.
/// * `y_pred`: Predicted tags, with the same shape as `y_true`.
/// * `config`: Scheme and strictness.
///
/// #Example
/// ```rust
/// use tagspan::{evaluate_tags, Config, SchemeType};
///
/// let y_true = vec![vec!["B-TEST", "B-NOTEST", "O", "B-TEST"]];
/// let y_pred = vec![vec!["O", "B-NOTEST", "B-OTHER", "B-TEST"]];
/// let config = Config::builder().scheme(SchemeType::BIO).strict(true).build().unwrap();
///
/// let reporter = evaluate_tags(&y_true, &y_pred, &config).unwrap();
/// let expected_report = "TOTAL: precision: 66.67%; recall: 66.67%; F1: 66.67%. [target: 3; tp: 2; fp: 1]
/// NOTEST: precision: 100.00%; recall: 100.00%; F1: 100.00%. [target: 1; tp: 1; fp: 0]
/// TEST: precision: 100.00%; recall: 50.00%; F1: 66.67%. [target: 2; tp: 1; fp: 0]
/// OTHER: precision: 0.00%; recall: 0.00%; F1: -100.00%. [target: 0; tp: 0; fp: 1]\n";
///
/// assert_eq!(expected_report, reporter.to_string());
/// ```
pub fn evaluate_tags<S: AsRef<str>>(
    y_true: &[Vec<S>],
    y_pred: &[Vec<S>],
    config: &Config,
) -> Result<Reporter> {
    if y_true.len() != y_pred.len() {
        return Err(FormatError::SequenceCountMismatch {
            references: y_true.len(),
            predictions: y_pred.len(),
        }
        .into());
    }
    let decode = |tags: &[S]| {
        if config.strict {
            config.scheme.decode_strict(tags)
        } else {
            config.scheme.decode(tags)
        }
    };
    let mut scores = ScoreAccumulator::new();
    for (sequence, (truth, prediction)) in y_true.iter().zip(y_pred.iter()).enumerate() {
        if truth.len() != prediction.len() {
            return Err(FormatError::PredictionLengthMismatch {
                sequence,
                references: truth.len(),
                predictions: prediction.len(),
            }
            .into());
        }
        let references = decode(truth.as_slice())?;
        let predictions = drop_overlapping_spans(decode(prediction.as_slice())?);
        scores.update(&references, &predictions);
    }
    Ok(Reporter::new(&scores))
}
