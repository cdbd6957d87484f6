/*
 * This modules contains the `Config` struct shared by the corpus readers and the cross-validation
 * driver, and the `ConfigBuilder` used to build it from user supplied names.
*/
use crate::error::{Error, Result};
use crate::formats::{ClearFeatures, DEFAULT_DOC_START};
use crate::schemes::SchemeType;
use either::Either;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Default number of cross-validation folds.
pub const DEFAULT_FOLDS: usize = 10;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
/// Options shared by the corpus readers and the cross-validation driver. Implements the default
/// trait. Deserialized configs are validated like the ones built by `ConfigBuilder`.
#[serde(try_from = "RawConfig")]
pub struct Config {
    /// Grammar of the per-token tags.
    pub scheme: SchemeType,
    /// When the readers flag a sample with `clear_adaptive_data`.
    pub clear_features: ClearFeatures,
    /// Prefix of the lines marking a document boundary.
    pub doc_start: String,
    /// Number of cross-validation folds. At least 2.
    pub folds: usize,
    /// Run the cross-validation folds on the rayon thread pool.
    pub parallel: bool,
    /// Skip malformed samples with a warning instead of failing the read.
    pub skip_malformed: bool,
    /// Reject orphan continuation tags instead of repairing them.
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheme: SchemeType::default(),
            clear_features: ClearFeatures::default(),
            doc_start: String::from(DEFAULT_DOC_START),
            folds: DEFAULT_FOLDS,
            parallel: false,
            skip_malformed: false,
            strict: false,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Fails with `Error::Configuration` on an empty document marker or less than 2 folds.
    pub fn validate(&self) -> Result<()> {
        if self.doc_start.trim().is_empty() {
            return Err(Error::configuration("The document marker cannot be empty"));
        }
        if self.folds < 2 {
            return Err(Error::configuration(format!(
                "Cross-validation needs at least 2 folds, got {}",
                self.folds
            )));
        }
        Ok(())
    }
}

/// Unvalidated shape of a serialized `Config`. Missing fields take their default value.
#[derive(Deserialize)]
#[serde(default)]
struct RawConfig {
    scheme: SchemeType,
    clear_features: ClearFeatures,
    doc_start: String,
    folds: usize,
    parallel: bool,
    skip_malformed: bool,
    strict: bool,
}

impl Default for RawConfig {
    fn default() -> Self {
        let config = Config::default();
        RawConfig {
            scheme: config.scheme,
            clear_features: config.clear_features,
            doc_start: config.doc_start,
            folds: config.folds,
            parallel: config.parallel,
            skip_malformed: config.skip_malformed,
            strict: config.strict,
        }
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = Error;
    fn try_from(value: RawConfig) -> Result<Self> {
        let config = Config {
            scheme: value.scheme,
            clear_features: value.clear_features,
            doc_start: value.doc_start,
            folds: value.folds,
            parallel: value.parallel,
            skip_malformed: value.skip_malformed,
            strict: value.strict,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = format!("Scheme: {}\n Clear features: {}\n Document marker: {}\n Folds: {}\n Using parallel folds: {}\n Skipping malformed samples: {}\n Strict decoding: {}", self.scheme, self.clear_features, self.doc_start, self.folds, self.parallel, self.skip_malformed, self.strict);
        write!(f, "{}", string)
    }
}

/// This builder can be used to build and customize a `Config` structure. Options given by name
/// are only resolved by `build`.
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    scheme: Either<String, SchemeType>,
    clear_features: Either<String, ClearFeatures>,
    doc_start: String,
    folds: usize,
    parallel: bool,
    skip_malformed: bool,
    strict: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let config = Config::default();
        Self {
            scheme: Either::Right(config.scheme),
            clear_features: Either::Right(config.clear_features),
            doc_start: config.doc_start,
            folds: config.folds,
            parallel: config.parallel,
            skip_malformed: config.skip_malformed,
            strict: config.strict,
        }
    }
    pub fn scheme(mut self, scheme: SchemeType) -> Self {
        self.scheme = Either::Right(scheme);
        self
    }
    /// Codec given by name (ex: `"bilou"`).
    pub fn scheme_name<S: Into<String>>(mut self, name: S) -> Self {
        self.scheme = Either::Left(name.into());
        self
    }
    pub fn clear_features(mut self, clear_features: ClearFeatures) -> Self {
        self.clear_features = Either::Right(clear_features);
        self
    }
    /// Clear features mode given by name: `"no"`, `"yes"` or `"docstart"`.
    pub fn clear_features_name<S: Into<String>>(mut self, name: S) -> Self {
        self.clear_features = Either::Left(name.into());
        self
    }
    pub fn doc_start<S: Into<String>>(mut self, marker: S) -> Self {
        self.doc_start = marker.into();
        self
    }
    pub fn folds(mut self, folds: usize) -> Self {
        self.folds = folds;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn skip_malformed(mut self, skip_malformed: bool) -> Self {
        self.skip_malformed = skip_malformed;
        self
    }
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
    /// Resolves the named options. Fails with `Error::Configuration` on an unknown name, an empty
    /// document marker or less than 2 folds.
    pub fn build(self) -> Result<Config> {
        let scheme = self.scheme.either(|name| name.parse::<SchemeType>(), Ok)?;
        let clear_features = match self.clear_features {
            Either::Left(name) => name.parse::<ClearFeatures>()?,
            Either::Right(c) => c,
        };
        let config = Config {
            scheme,
            clear_features,
            doc_start: self.doc_start,
            folds: self.folds,
            parallel: self.parallel,
            skip_malformed: self.skip_malformed,
            strict: self.strict,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_jsonlines::JsonLinesReader;
    use std::io::Cursor;

    #[test]
    fn test_default_builder_matches_default_config() {
        assert_eq!(ConfigBuilder::new().build().unwrap(), Config::default());
    }

    #[test]
    fn test_named_options() {
        let config = Config::builder()
            .scheme_name("BILOU")
            .clear_features_name("docstart")
            .folds(5)
            .parallel(true)
            .build()
            .unwrap();
        assert_eq!(config.scheme, SchemeType::BILOU);
        assert_eq!(config.clear_features, ClearFeatures::DocStart);
        assert_eq!(config.folds, 5);
        assert!(config.parallel);
    }

    #[test]
    fn test_invalid_options() {
        let unknown = Config::builder().scheme_name("bioes").build();
        assert!(matches!(unknown, Err(Error::Configuration(_))));
        let clear = Config::builder().clear_features_name("sometimes").build();
        assert!(matches!(clear, Err(Error::Configuration(_))));
        let folds = Config::builder().folds(1).build();
        assert!(matches!(folds, Err(Error::Configuration(_))));
        let marker = Config::builder().doc_start(" ").build();
        assert!(matches!(marker, Err(Error::Configuration(_))));
    }

    fn deserialize(json: &str) -> std::io::Result<Option<Config>> {
        JsonLinesReader::new(Cursor::new(json)).read::<Config>()
    }

    #[test]
    fn test_deserialized_config_is_validated() {
        let config = deserialize("{\"scheme\":\"BILOU\",\"folds\":3}\n").unwrap().unwrap();
        assert_eq!(config.scheme, SchemeType::BILOU);
        assert_eq!(config.folds, 3);
        assert_eq!(config.doc_start, DEFAULT_DOC_START);
        assert!(deserialize("{\"doc_start\":\"\"}\n").is_err());
        assert!(deserialize("{\"folds\":1}\n").is_err());
    }
}
