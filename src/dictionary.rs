/**
Greedy longest-match detection of multi-token dictionary entries.

Two file formats are supported. A gazetteer holds one `key \t type` entry per line, the key being
a whitespace separated token sequence. A multiword lexicon holds one
`surface \t lemma \t type \t ambiguity` entry per line, the tokens of the surface form being
separated by underscores or whitespace (ex: `New_York`). Blank lines and lines starting with `#`
are ignored.
*/
use crate::error::{Error, FormatError, Result};
use crate::evaluation::Labeler;
use crate::span::Span;
use ahash::AHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

/// Separator of the tokens of a lexicon surface form, and of merged multiword tokens.
pub const MULTIWORD_SEPARATOR: char = '_';
const COMMENT: char = '#';

/// What the dictionary knows about one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LexiconEntry {
    kind: String,
    lemma: Option<String>,
    ambiguous: bool,
}

impl LexiconEntry {
    /// A gazetteer entry: only a type.
    pub fn new<S: Into<String>>(kind: S) -> Self {
        LexiconEntry {
            kind: kind.into(),
            lemma: None,
            ambiguous: false,
        }
    }

    pub fn with_lemma<S: Into<String>>(kind: S, lemma: S, ambiguous: bool) -> Self {
        LexiconEntry {
            kind: kind.into(),
            lemma: Some(lemma.into()),
            ambiguous,
        }
    }

    /// Type of the spans produced by this entry.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn lemma(&self) -> Option<&str> {
        self.lemma.as_deref()
    }

    /// Whether the surface form can also be read as separate words.
    pub fn is_ambiguous(&self) -> bool {
        self.ambiguous
    }
}

/// Case-insensitive map from a token sequence to a `LexiconEntry`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    entries: AHashMap<String, LexiconEntry>,
    /// Number of tokens of the longest key.
    max_tokens: usize,
}

/// Lowercases the tokens and joins them with a single space.
fn normalize<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens.iter().map(|t| t.as_ref().to_lowercase()).join(" ")
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry keyed by `tokens`. An existing entry with the same key is replaced. Empty
    /// keys are ignored.
    pub fn insert<S: AsRef<str>>(&mut self, tokens: &[S], entry: LexiconEntry) {
        let tokens: Vec<&str> = tokens
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return;
        }
        self.max_tokens = self.max_tokens.max(tokens.len());
        self.entries.insert(normalize(&tokens), entry);
    }

    /// Looks up a token sequence, ignoring case.
    pub fn get<S: AsRef<str>>(&self, tokens: &[S]) -> Option<&LexiconEntry> {
        if tokens.len() > self.max_tokens {
            return None;
        }
        self.entries.get(&normalize(tokens))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Length in tokens of the longest key. Bounds the matching window.
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Reads a `key \t type` gazetteer. Fails with `Error::Configuration` if no entry was read.
    pub fn from_gazetteer<R: BufRead>(reader: R) -> Result<Self> {
        let mut dictionary = Dictionary::new();
        for_each_entry(reader, 2, |fields| {
            let key: Vec<&str> = fields[0].split_whitespace().collect();
            dictionary.insert(&key, LexiconEntry::new(fields[1].trim()));
        })?;
        dictionary.non_empty("gazetteer")
    }

    /// Reads a `surface \t lemma \t type \t ambiguity` lexicon. Fails with `Error::Configuration`
    /// if no entry was read.
    pub fn from_lexicon<R: BufRead>(reader: R) -> Result<Self> {
        let mut dictionary = Dictionary::new();
        for_each_entry(reader, 4, |fields| {
            let key: Vec<&str> = fields[0]
                .split(|c: char| c == MULTIWORD_SEPARATOR || c.is_whitespace())
                .collect();
            let entry = LexiconEntry::with_lemma(
                fields[2].trim(),
                fields[1].trim(),
                parse_ambiguity(fields[3]),
            );
            dictionary.insert(&key, entry);
        })?;
        dictionary.non_empty("lexicon")
    }

    /// Loads a gazetteer file. A missing file is an `Error::Io`.
    pub fn load_gazetteer<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        log::debug!("Loading gazetteer {}", path.as_ref().display());
        Self::from_gazetteer(BufReader::new(file))
    }

    /// Loads a lexicon file. A missing file is an `Error::Io`.
    pub fn load_lexicon<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        log::debug!("Loading lexicon {}", path.as_ref().display());
        Self::from_lexicon(BufReader::new(file))
    }

    fn non_empty(self, what: &str) -> Result<Self> {
        if self.is_empty() {
            return Err(Error::configuration(format!("The {} is empty", what)));
        }
        log::debug!("Loaded {} {} entries", self.len(), what);
        Ok(self)
    }
}

fn parse_ambiguity(flag: &str) -> bool {
    matches!(
        flag.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "ambiguous"
    )
}

/// Calls `insert` with the tab separated fields of every entry line of `reader`.
fn for_each_entry<R, F>(reader: R, expected: usize, mut insert: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(&[&str]),
{
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT) {
            continue;
        }
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
        if fields.len() != expected {
            return Err(Error::from(FormatError::FieldCount {
                expected,
                found: fields.len(),
            })
            .at_line(i + 1));
        }
        insert(&fields);
    }
    Ok(())
}

/// Finds dictionary entries in token sequences. For every start offset, scanned left to right,
/// the longest matching window wins, and scanning resumes right after it.
#[derive(Debug, Clone)]
pub struct DictionaryMatcher {
    dictionary: Arc<Dictionary>,
}

impl DictionaryMatcher {
    pub fn new<D: Into<Arc<Dictionary>>>(dictionary: D) -> Self {
        DictionaryMatcher {
            dictionary: dictionary.into(),
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Returns the matches of `tokens` with their entry, sorted by start and non-overlapping.
    pub fn find_entries<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<(Span, &LexiconEntry)> {
        let mut matches = vec![];
        let max_window = self.dictionary.max_tokens();
        let mut start = 0;
        while start < tokens.len() {
            let longest = (1..=max_window.min(tokens.len() - start))
                .filter_map(|w| {
                    self.dictionary
                        .get(&tokens[start..start + w])
                        .map(|entry| (w, entry))
                })
                .last();
            match longest {
                Some((width, entry)) => {
                    if let Ok(span) = Span::new(start, start + width, entry.kind()) {
                        matches.push((span, entry));
                    }
                    start += width;
                }
                None => start += 1,
            }
        }
        matches
    }

    /// Returns the spans of the dictionary entries found in `tokens`.
    pub fn find<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<Span> {
        self.find_entries(tokens)
            .into_iter()
            .map(|(span, _)| span)
            .collect()
    }

    /// Returns `tokens` where every match is merged into a single token, its words joined by
    /// `MULTIWORD_SEPARATOR`. The original casing is kept.
    pub fn merge_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<String> {
        let matches = self.find(tokens);
        let mut merged = Vec::with_capacity(tokens.len());
        let mut next = 0;
        for span in matches {
            merged.extend(tokens[next..span.start()].iter().map(|t| String::from(t.as_ref())));
            merged.push(
                tokens[span.start()..span.end()]
                    .iter()
                    .map(|t| t.as_ref())
                    .join(&MULTIWORD_SEPARATOR.to_string()),
            );
            next = span.end();
        }
        merged.extend(tokens[next..].iter().map(|t| String::from(t.as_ref())));
        merged
    }

    /// Returns the entry of the tokens covered by `span`, if they form a dictionary key.
    pub fn lookup_entry<S: AsRef<str>>(&self, tokens: &[S], span: &Span) -> Option<&LexiconEntry> {
        if span.end() > tokens.len() {
            return None;
        }
        self.dictionary.get(&tokens[span.start()..span.end()])
    }
}

impl Labeler for DictionaryMatcher {
    fn label(&self, tokens: &[String]) -> Vec<Span> {
        self.find(tokens)
    }

    /// A dictionary has no adaptive state.
    fn clear_adaptive_data(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn gazetteer(content: &str) -> Dictionary {
        Dictionary::from_gazetteer(Cursor::new(content)).unwrap()
    }

    #[test]
    fn test_new_york_is_big() {
        let matcher = DictionaryMatcher::new(gazetteer("new york\tLOC\n"));
        let actual = matcher.find(&tokens("New York is big"));
        assert_eq!(actual, vec![Span::new(0, 2, "LOC").unwrap()]);
    }

    #[test]
    fn test_overlapping_entries_keep_leftmost() {
        let matcher = DictionaryMatcher::new(gazetteer("new york\tLOC\nyork is\tMISC\n"));
        let actual = matcher.find(&tokens("New York is big"));
        assert_eq!(actual, vec![Span::new(0, 2, "LOC").unwrap()]);
    }

    #[test]
    fn test_longest_match_wins() {
        let content = "new\tADJ\nnew york\tLOC\nnew york city\tCITY\nbig\tADJ\n";
        let matcher = DictionaryMatcher::new(gazetteer(content));
        let actual = matcher.find(&tokens("new york city is big"));
        assert_eq!(
            actual,
            vec![
                Span::new(0, 3, "CITY").unwrap(),
                Span::new(4, 5, "ADJ").unwrap()
            ]
        );
    }

    #[test]
    fn test_longer_window_without_shorter_prefix() {
        let matcher = DictionaryMatcher::new(gazetteer("a b c\tX\n"));
        let actual = matcher.find(&tokens("a b c"));
        assert_eq!(actual, vec![Span::new(0, 3, "X").unwrap()]);
        assert!(matcher.find(&tokens("a b")).is_empty());
    }

    #[test]
    fn test_empty_dictionary_matches_nothing() {
        let matcher = DictionaryMatcher::new(Dictionary::new());
        assert!(matcher.find(&tokens("New York")).is_empty());
        let empty: Vec<String> = vec![];
        assert!(matcher.find(&empty).is_empty());
    }

    #[test]
    fn test_lexicon() {
        let content = "# surface\tlemma\ttype\tambiguity\nNew_York\tNew York\tNPROP\t0\n\nin_front_of\tin front of\tPREP\t1\n";
        let dictionary = Dictionary::from_lexicon(Cursor::new(content)).unwrap();
        assert_eq!(dictionary.len(), 2);
        assert_eq!(dictionary.max_tokens(), 3);
        let matcher = DictionaryMatcher::new(dictionary);
        let sentence = tokens("He stood in front of New York");
        let merged = matcher.merge_tokens(&sentence);
        assert_eq!(merged, vec!["He", "stood", "in_front_of", "New_York"]);
        let span = Span::new(2, 5, "PREP").unwrap();
        let entry = matcher.lookup_entry(&sentence, &span).unwrap();
        assert_eq!(entry.lemma(), Some("in front of"));
        assert!(entry.is_ambiguous());
        assert!(matcher.lookup_entry(&sentence, &Span::new(0, 1, "X").unwrap()).is_none());
    }

    #[test]
    fn test_lexicon_surface_with_spaces() {
        let content = "New York\tNew York\tLOC\t0\nSan_Jose  del\tSan Jose del\tLOC\t0\n";
        let dictionary = Dictionary::from_lexicon(Cursor::new(content)).unwrap();
        assert_eq!(dictionary.max_tokens(), 3);
        let matcher = DictionaryMatcher::new(dictionary);
        assert_eq!(
            matcher.find(&tokens("New York and San Jose del")),
            vec![Span::new(0, 2, "LOC").unwrap(), Span::new(3, 6, "LOC").unwrap()]
        );
    }

    #[rstest]
    #[case("new york LOC\n", 2, 1)]
    #[case("a\tb\tc\n", 2, 3)]
    fn test_gazetteer_field_count(#[case] content: &str, #[case] expected: usize, #[case] found: usize) {
        let err = Dictionary::from_gazetteer(Cursor::new(content)).unwrap_err();
        match err {
            Error::Format { line, source } => {
                assert_eq!(line, Some(1));
                assert_eq!(source, FormatError::FieldCount { expected, found });
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_empty_file_is_configuration_error() {
        let err = Dictionary::from_gazetteer(Cursor::new("# nothing\n\n")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Dictionary::load_gazetteer("/does/not/exist.tsv").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_matcher_is_a_labeler() {
        let matcher = DictionaryMatcher::new(gazetteer("john smith\tPER\n"));
        matcher.clear_adaptive_data();
        assert_eq!(
            matcher.label(&tokens("John Smith lives")),
            vec![Span::new(0, 2, "PER").unwrap()]
        );
    }
}
