use anyhow::Context;
use clap::Parser;
use serde_jsonlines::json_lines;
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tagspan::{
    evaluate_tags, Config, CrossValidator, Dictionary, DictionaryMatcher, LexiconEntry, Sample,
    SchemeType,
};

/// Times the evaluation and cross-validation of a memorizing labeler over a JSON lines corpus of
/// samples (`{"tokens": [...], "spans": [{"start", "end", "type"}], "clear_adaptive_data"}`).
#[derive(Debug, Parser)]
struct Args {
    /// JSON lines corpus of samples.
    #[arg(short, long)]
    dataset: PathBuf,
    #[arg(short, long, default_value_t = 1)]
    n_samples: u32,
    #[arg(short, long, default_value_t = 10)]
    folds: usize,
    #[arg(short, long, default_value_t = false)]
    parallel: bool,
    /// Codec used to re-tag the corpus: bio or bilou.
    #[arg(short, long, default_value_t = String::from("bio"))]
    scheme: String,
}

fn memorize(samples: &[Sample]) -> tagspan::Result<DictionaryMatcher> {
    let mut dictionary = Dictionary::new();
    for sample in samples {
        for span in sample.spans() {
            dictionary.insert(
                &sample.tokens()[span.start()..span.end()],
                LexiconEntry::new(span.kind()),
            );
        }
    }
    Ok(DictionaryMatcher::new(dictionary))
}

fn load(path: &PathBuf) -> anyhow::Result<Vec<Sample>> {
    json_lines::<Sample, _>(path)
        .with_context(|| format!("Could not open {}", path.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Could not parse {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = Config::builder()
        .scheme_name(args.scheme.as_str())
        .folds(args.folds)
        .parallel(args.parallel)
        .build()?;
    let samples: Arc<[Sample]> = load(&args.dataset)?.into();
    log::info!("Loaded {} samples", samples.len());
    let n_samples = args.n_samples;
    let iter = Range {
        start: 0,
        end: n_samples,
    };
    let mut report_duration = Duration::ZERO;
    let mut cross_validation_duration = Duration::ZERO;
    let scheme: SchemeType = config.scheme;
    for _ in iter {
        let tags = samples
            .iter()
            .map(|s| s.tags(scheme))
            .collect::<tagspan::Result<Vec<_>>>()?;
        let now = Instant::now();
        {
            evaluate_tags(&tags, &tags, &config)?;
        }
        report_duration += now.elapsed();
        let now = Instant::now();
        {
            CrossValidator::new(&config).evaluate_samples(Arc::clone(&samples), &memorize)?;
        }
        cross_validation_duration += now.elapsed();
    }
    println!(
        "Report duration: {} and cross-validation duration: {} with {n_samples} samples",
        report_duration.as_secs_f64(),
        cross_validation_duration.as_secs_f64()
    );
    Ok(())
}
