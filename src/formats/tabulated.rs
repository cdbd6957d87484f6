/**
Two column corpora, one `token \t label` line per token, as used for part-of-speech tagging. Every
label other than the outside tag is a single token span of that label.

Labels are taken as they are: a `B-PER` label yields a span of type `B-PER`. Corpora tagged with
BIO or BILOU prefixes are read with the prefixed reader instead.
*/
use super::{split_fields, CorpusReader, NumberedLine, SampleFormat};
use crate::config::Config;
use crate::error::Result;
use crate::sample::Sample;
use crate::schemes::OUTSIDE;

/// Reader of two column corpora.
pub type TabulatedReader<L> = CorpusReader<L, TabulatedFormat>;

#[derive(Debug, Clone, Copy, Default)]
pub struct TabulatedFormat;

impl SampleFormat for TabulatedFormat {
    fn parse(&self, lines: &[NumberedLine], clear_adaptive_data: bool, config: &Config) -> Result<Sample> {
        let mut tokens = Vec::with_capacity(lines.len());
        let mut tags = Vec::with_capacity(lines.len());
        for line in lines {
            let fields = split_fields(line, 2, Some(2))?;
            let label = fields[1].trim();
            tokens.push(String::from(fields[0]));
            tags.push(if label == OUTSIDE || label.is_empty() {
                String::from(OUTSIDE)
            } else {
                config.scheme.unit_tag(label)
            });
        }
        Sample::from_tags(tokens, &tags, config.scheme, clear_adaptive_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, FormatError};
    use crate::formats::StringLines;
    use crate::sample::SampleStream;
    use crate::schemes::SchemeType;
    use crate::span::Span;
    use rstest::rstest;

    #[rstest]
    #[case(SchemeType::BIO)]
    #[case(SchemeType::BILOU)]
    fn test_every_label_is_a_unit_span(#[case] scheme: SchemeType) {
        let content = "The\tDT\nold\tJJ\nman\tNN\n.\tO\n";
        let config = Config::builder().scheme(scheme).build().unwrap();
        let mut reader = TabulatedReader::new(StringLines::new(content), TabulatedFormat, config);
        let sample = reader.read().unwrap().unwrap();
        assert_eq!(
            sample.spans(),
            &[
                Span::new(0, 1, "DT").unwrap(),
                Span::new(1, 2, "JJ").unwrap(),
                Span::new(2, 3, "NN").unwrap()
            ]
        );
    }

    #[test]
    fn test_repeated_labels_stay_separate() {
        let content = "big\tJJ\nred\tJJ\n";
        let mut reader = TabulatedReader::new(StringLines::new(content), TabulatedFormat, Config::default());
        let sample = reader.read().unwrap().unwrap();
        assert_eq!(sample.spans().len(), 2);
    }

    #[test]
    fn test_prefixed_labels_are_kept_verbatim() {
        let content = "John\tB-PER\nSmith\tI-PER\n";
        let mut reader = TabulatedReader::new(StringLines::new(content), TabulatedFormat, Config::default());
        let sample = reader.read().unwrap().unwrap();
        assert_eq!(
            sample.spans(),
            &[Span::new(0, 1, "B-PER").unwrap(), Span::new(1, 2, "I-PER").unwrap()]
        );
    }

    #[test]
    fn test_three_columns_are_rejected() {
        let content = "The\tDT\textra\n";
        let mut reader = TabulatedReader::new(StringLines::new(content), TabulatedFormat, Config::default());
        let err = reader.read().unwrap_err();
        assert!(matches!(
            err,
            Error::Format {
                line: Some(1),
                source: FormatError::FieldCount { expected: 2, found: 3 }
            }
        ));
    }
}
