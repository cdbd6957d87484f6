/**
Line oriented corpus readers. A sample is a block of non-blank lines terminated by a blank line or
by the end of the input. A line starting with the document marker must be followed by a blank
line, contributes no token and starts a new document.

Each format only has to turn a block of lines into a `Sample`; the block splitting, the document
markers, the clear flag and the skip-and-continue policy are shared by `CorpusReader`.
*/
pub mod edit_script;
pub mod prefixed;
pub mod tabulated;

use crate::config::Config;
use crate::error::{Error, FormatError, Result};
use crate::sample::{Sample, SampleStream};
use enum_iterator::{all, Sequence};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use edit_script::{EditScript, EditScriptFormat, EditScriptReader};
pub use prefixed::{PrefixedFormat, PrefixedReader};
pub use tabulated::{TabulatedFormat, TabulatedReader};

/// Document marker of the CoNLL corpora.
pub const DEFAULT_DOC_START: &str = "-DOCSTART-";
/// Separator of the fields of a line.
pub const FIELD_SEPARATOR: char = '\t';

/// A resettable source of text lines, without their line terminator.
pub trait LineSource {
    /// Returns the next line or `None` at the end of the input.
    fn next_line(&mut self) -> Result<Option<String>>;
    /// Rewinds the source to its first line.
    fn reset(&mut self) -> Result<()>;
}

/// In memory line source.
#[derive(Debug, Clone, Default)]
pub struct StringLines {
    lines: Vec<String>,
    position: usize,
}

impl StringLines {
    pub fn new<S: AsRef<str>>(content: S) -> Self {
        StringLines {
            lines: content.as_ref().lines().map(String::from).collect(),
            position: 0,
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for StringLines {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        StringLines {
            lines: iter.into_iter().map(|l| String::from(l.as_ref())).collect(),
            position: 0,
        }
    }
}

impl LineSource for StringLines {
    fn next_line(&mut self) -> Result<Option<String>> {
        let line = self.lines.get(self.position).cloned();
        if line.is_some() {
            self.position += 1;
        }
        Ok(line)
    }

    fn reset(&mut self) -> Result<()> {
        self.position = 0;
        Ok(())
    }
}

/// Line source reading a file. `reset` re-opens the file.
#[derive(Debug)]
pub struct FileLines {
    path: PathBuf,
    reader: BufReader<File>,
}

impl FileLines {
    /// Opens `path`. A missing file is an `Error::Io`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let reader = BufReader::new(File::open(&path)?);
        Ok(FileLines { path, reader })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSource for FileLines {
    fn next_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }

    fn reset(&mut self) -> Result<()> {
        log::debug!("Re-opening {}", self.path.display());
        self.reader = BufReader::new(File::open(&self.path)?);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Sequence, Hash, Eq, PartialEq, Serialize, Deserialize, Default)]
/// When a reader flags a sample with `clear_adaptive_data`.
pub enum ClearFeatures {
    /// Never.
    #[default]
    No,
    /// Every sample.
    Yes,
    /// Only the first sample of each document.
    DocStart,
}

impl ClearFeatures {
    fn as_str(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Yes => "yes",
            Self::DocStart => "docstart",
        }
    }

    /// Clear flag of a sample. `doc_start` is true for the first sample after a document marker.
    pub fn flag(&self, doc_start: bool) -> bool {
        match self {
            Self::No => false,
            Self::Yes => true,
            Self::DocStart => doc_start,
        }
    }
}

impl Display for ClearFeatures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClearFeatures {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        all::<ClearFeatures>()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::configuration(format!(
                    "Unknown clear features mode `{}`. Expected one of: no, yes, docstart",
                    s
                ))
            })
    }
}

/// A numbered line of a block. Line numbers start at 1.
pub type NumberedLine = (usize, String);

/// Splits `line` into its tab separated fields and checks their count.
///
/// * `line`: The numbered line.
/// * `min`: Minimum number of fields.
/// * `max`: Maximum number of fields, `None` for no upper bound.
pub(crate) fn split_fields(line: &NumberedLine, min: usize, max: Option<usize>) -> Result<Vec<&str>> {
    let fields: Vec<&str> = line.1.split(FIELD_SEPARATOR).collect();
    let too_many = max.map(|m| fields.len() > m).unwrap_or(false);
    if fields.len() < min || too_many {
        return Err(Error::from(FormatError::FieldCount {
            expected: max.unwrap_or(min),
            found: fields.len(),
        })
        .at_line(line.0));
    }
    Ok(fields)
}

/// Turns the lines of one sample into a `Sample`.
pub trait SampleFormat {
    /// Parses a non-empty block of lines.
    ///
    /// * `lines`: The numbered lines of the sample.
    /// * `clear_adaptive_data`: Clear flag of the sample.
    /// * `config`: Codec and strictness.
    fn parse(
        &self,
        lines: &[NumberedLine],
        clear_adaptive_data: bool,
        config: &Config,
    ) -> Result<Sample>;
}

/// Splits a line source into blocks of lines, handling the document markers.
#[derive(Debug)]
struct BlockReader<L> {
    source: L,
    line_number: usize,
    /// A line read ahead after a document marker that was not followed by a blank line.
    peeked: Option<NumberedLine>,
    /// True until the first block following a document marker was returned.
    doc_start: bool,
}

struct Block {
    lines: Vec<NumberedLine>,
    doc_start: bool,
}

impl<L: LineSource> BlockReader<L> {
    fn new(source: L) -> Self {
        BlockReader {
            source,
            line_number: 0,
            peeked: None,
            doc_start: false,
        }
    }

    fn next_numbered(&mut self) -> Result<Option<NumberedLine>> {
        if let Some(line) = self.peeked.take() {
            return Ok(Some(line));
        }
        let line = self.source.next_line()?;
        Ok(line.map(|l| {
            self.line_number += 1;
            (self.line_number, l)
        }))
    }

    /// Consumes the blank line following a document marker found at `marker_line`.
    fn consume_doc_start(&mut self, marker_line: usize) -> Result<()> {
        self.doc_start = true;
        match self.next_numbered()? {
            Some((_, line)) if line.trim().is_empty() => Ok(()),
            None => Ok(()),
            Some(line) => {
                self.peeked = Some(line);
                Err(Error::from(FormatError::MissingBlankAfterDocStart).at_line(marker_line))
            }
        }
    }

    fn next_block(&mut self, marker: &str) -> Result<Option<Block>> {
        // Every line starts with an empty marker.
        if marker.trim().is_empty() {
            return Err(Error::configuration("The document marker cannot be empty"));
        }
        let mut lines = vec![];
        while let Some(line) = self.next_numbered()? {
            if line.1.trim().is_empty() {
                if lines.is_empty() {
                    continue;
                }
                break;
            }
            if line.1.starts_with(marker) {
                if lines.is_empty() {
                    self.consume_doc_start(line.0)?;
                    continue;
                }
                // The marker ends the current sample and belongs to the next one.
                self.peeked = Some(line);
                break;
            }
            lines.push(line);
        }
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(Block {
            lines,
            doc_start: std::mem::take(&mut self.doc_start),
        }))
    }

    fn reset(&mut self) -> Result<()> {
        self.source.reset()?;
        self.line_number = 0;
        self.peeked = None;
        self.doc_start = false;
        Ok(())
    }
}

/// Reads samples of format `F` from a line source. Implements `SampleStream`.
#[derive(Debug)]
pub struct CorpusReader<L, F> {
    blocks: BlockReader<L>,
    format: F,
    config: Config,
}

impl<L: LineSource, F: SampleFormat> CorpusReader<L, F> {
    pub fn new(source: L, format: F, config: Config) -> Self {
        CorpusReader {
            blocks: BlockReader::new(source),
            format,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn read_sample(&mut self) -> Result<Option<Sample>> {
        let block = match self.blocks.next_block(&self.config.doc_start)? {
            Some(b) => b,
            None => return Ok(None),
        };
        let clear = self.config.clear_features.flag(block.doc_start);
        match self.format.parse(&block.lines, clear, &self.config) {
            Ok(sample) => Ok(Some(sample)),
            Err(e) => {
                // A skipped sample hands its document start over to the next one.
                self.blocks.doc_start |= block.doc_start;
                Err(e)
            }
        }
    }
}

impl<L: LineSource, F: SampleFormat> SampleStream for CorpusReader<L, F> {
    fn read(&mut self) -> Result<Option<Sample>> {
        loop {
            match self.read_sample() {
                Err(e) if e.is_format() && self.config.skip_malformed => {
                    log::warn!("Skipping malformed sample: {}", e);
                }
                other => return other,
            }
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.blocks.reset()
    }
}
