/**
Lemmatization corpora, one `token \t postag \t lemma` line per token. Each token is labeled with the
shortest edit script turning it into its lemma, so that lemmatization becomes a sequence labeling
task: every token is a single token span whose type is the script.

A script is written `[L]<strip>:<suffix>`. `L` lowercases the token first, then `strip` characters
are removed from its end and `suffix` is appended. For example `Running -> run` is `L4:` and
`mice -> mouse` is `3:ouse`.
*/
use super::{split_fields, CorpusReader, NumberedLine, SampleFormat};
use crate::config::Config;
use crate::error::{FormatError, Result};
use crate::sample::Sample;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Reader of lemmatization corpora.
pub type EditScriptReader<L> = CorpusReader<L, EditScriptFormat>;

const LOWERCASE: char = 'L';
const SUFFIX_SEPARATOR: char = ':';

/// Transformation of a token into its lemma.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EditScript {
    lowercase: bool,
    strip: usize,
    suffix: String,
}

fn common_prefix(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

impl EditScript {
    /// Shortest script turning `token` into `lemma`. Lowercasing is only used when it lengthens the
    /// prefix shared with the lemma.
    pub fn between(token: &str, lemma: &str) -> Self {
        let lowered = token.to_lowercase();
        let kept = common_prefix(token, lemma);
        let kept_lowered = common_prefix(&lowered, lemma);
        let (lowercase, source, prefix) = if kept_lowered > kept {
            (true, lowered.as_str(), kept_lowered)
        } else {
            (false, token, kept)
        };
        EditScript {
            lowercase,
            strip: source.chars().count() - prefix,
            suffix: lemma.chars().skip(prefix).collect(),
        }
    }

    /// Applies the script. Returns `None` if the token is shorter than the part to strip.
    pub fn apply(&self, token: &str) -> Option<String> {
        let source = if self.lowercase {
            token.to_lowercase()
        } else {
            String::from(token)
        };
        let len = source.chars().count();
        if self.strip > len {
            return None;
        }
        let mut lemma: String = source.chars().take(len - self.strip).collect();
        lemma.push_str(&self.suffix);
        Some(lemma)
    }
}

impl Display for EditScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.lowercase {
            write!(f, "{}", LOWERCASE)?;
        }
        write!(f, "{}{}{}", self.strip, SUFFIX_SEPARATOR, self.suffix)
    }
}

impl FromStr for EditScript {
    type Err = FormatError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (lowercase, rest) = match s.strip_prefix(LOWERCASE) {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let invalid = || FormatError::InvalidEditScript(String::from(s));
        let (strip, suffix) = rest.split_once(SUFFIX_SEPARATOR).ok_or_else(invalid)?;
        Ok(EditScript {
            lowercase,
            strip: strip.parse().map_err(|_| invalid())?,
            suffix: String::from(suffix),
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EditScriptFormat;

impl EditScriptFormat {
    /// Recovers the lemma of every token of a sample labeled with edit scripts. Tokens not covered
    /// by a span are their own lemma.
    pub fn lemmas(sample: &Sample) -> Result<Vec<String>> {
        let mut lemmas: Vec<String> = sample.tokens().to_vec();
        for span in sample.spans() {
            let script: EditScript = span.kind().parse()?;
            for i in span.start()..span.end() {
                lemmas[i] = script
                    .apply(&sample.tokens()[i])
                    .ok_or_else(|| FormatError::InvalidEditScript(script.to_string()))?;
            }
        }
        Ok(lemmas)
    }
}

impl SampleFormat for EditScriptFormat {
    fn parse(&self, lines: &[NumberedLine], clear_adaptive_data: bool, config: &Config) -> Result<Sample> {
        let mut tokens = Vec::with_capacity(lines.len());
        let mut tags = Vec::with_capacity(lines.len());
        for line in lines {
            let fields = split_fields(line, 3, Some(3))?;
            let (token, lemma) = (fields[0], fields[2].trim());
            tags.push(config.scheme.unit_tag(&EditScript::between(token, lemma).to_string()));
            tokens.push(String::from(token));
        }
        Sample::from_tags(tokens, &tags, config.scheme, clear_adaptive_data)
    }
}
