/**
Prefix-tagged corpora, one `token \t tag` line per token, the tag being written in the configured
scheme (ex: `B-PER`). Extra columns between the token and the tag, as in the CoNLL-2003 files,
are ignored.
*/
use super::{split_fields, CorpusReader, NumberedLine, SampleFormat};
use crate::config::Config;
use crate::error::{Error, FormatError, Result};
use crate::sample::Sample;

/// Reader of prefix-tagged corpora.
pub type PrefixedReader<L> = CorpusReader<L, PrefixedFormat>;

#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixedFormat;

impl SampleFormat for PrefixedFormat {
    fn parse(&self, lines: &[NumberedLine], clear_adaptive_data: bool, config: &Config) -> Result<Sample> {
        let mut tokens = Vec::with_capacity(lines.len());
        let mut tags = Vec::with_capacity(lines.len());
        for line in lines {
            let fields = split_fields(line, 2, None)?;
            let (token, tag) = (fields[0], fields[fields.len() - 1].trim());
            config
                .scheme
                .validate_tag(tag)
                .map_err(|e| Error::from(e).at_line(line.0))?;
            tokens.push(String::from(token));
            tags.push(tag);
        }
        let decoded = if config.strict {
            config.scheme.decode_strict(&tags)
        } else {
            config.scheme.decode(&tags)
        };
        let spans = decoded.map_err(|e| {
            let orphan_line = match &e {
                Error::Format {
                    source: FormatError::OrphanContinuation { index, .. },
                    ..
                } => lines.get(*index).map(|l| l.0),
                Error::Format {
                    source: FormatError::UnterminatedSpan { start, .. },
                    ..
                } => lines.get(*start).map(|l| l.0),
                _ => None,
            };
            match orphan_line {
                Some(n) => e.at_line(n),
                None => e,
            }
        })?;
        Sample::new(tokens, spans, clear_adaptive_data)
    }
}
