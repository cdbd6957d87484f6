use criterion::{criterion_group, criterion_main, Criterion};
use pprof::criterion::{Output, PProfProfiler};
use serde_jsonlines::{json_lines, write_json_lines};
use std::path::{Path, PathBuf};
use tagspan::{
    drop_overlapping_spans, evaluate_tags, Config, CrossValidator, Dictionary, DictionaryMatcher,
    LexiconEntry, Result, Sample, SchemeType, Span,
};

const KINDS: [&str; 4] = ["PER", "LOC", "ORG", "MISC"];
const WORDS: [&str; 12] = [
    "john", "smith", "paris", "new", "york", "acme", "corp", "lives", "in", "the", "big", "city",
];

/// Small linear congruential generator, so that the corpus is the same for every run.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

fn synthetic_samples(n: usize) -> Vec<Sample> {
    let mut rng = Lcg(42);
    (0..n)
        .map(|_| {
            let len = 5 + rng.next(30);
            let tokens: Vec<String> = (0..len).map(|_| String::from(WORDS[rng.next(WORDS.len())])).collect();
            let mut spans = vec![];
            let mut i = 0;
            while i < len {
                let width = 1 + rng.next(3);
                if rng.next(3) == 0 && i + width <= len {
                    spans.push(Span::new(i, i + width, KINDS[rng.next(KINDS.len())]).unwrap());
                }
                i += width + rng.next(2);
            }
            Sample::new(tokens, spans, false).unwrap()
        })
        .collect()
}

/// Writes the synthetic corpus as JSON lines once and reads it back, as a real corpus would be.
fn load_samples<P: AsRef<Path>>(path: P, n: usize) -> Vec<Sample> {
    if !path.as_ref().exists() {
        write_json_lines(path.as_ref(), synthetic_samples(n)).unwrap();
    }
    json_lines::<Sample, P>(path)
        .unwrap()
        .map(|r| r.unwrap())
        .collect::<Vec<_>>()
}

fn corpus_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("tagspan-bench-{}.jsonl", name))
}

fn memorize(samples: &[Sample]) -> Result<DictionaryMatcher> {
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

fn benchmark_codecs(c: &mut Criterion) {
    let samples = load_samples(corpus_path("small"), 2_000);
    let bio: Vec<Vec<String>> = samples.iter().map(|s| s.tags(SchemeType::BIO).unwrap()).collect();
    c.bench_function("decode_bio", |b| {
        b.iter(|| {
            bio.iter()
                .map(|tags| SchemeType::BIO.decode(tags).unwrap().len())
                .sum::<usize>()
        })
    });
    c.bench_function("convert_bio_to_bilou", |b| {
        b.iter(|| {
            bio.iter()
                .map(|tags| SchemeType::BIO.convert(tags, SchemeType::BILOU).unwrap())
                .count()
        })
    });
}

fn benchmark_resolution_and_matching(c: &mut Criterion) {
    let samples = load_samples(corpus_path("small"), 2_000);
    let matcher = memorize(&samples).unwrap();
    c.bench_function("dictionary_find", |b| {
        b.iter(|| {
            samples
                .iter()
                .map(|s| matcher.find(s.tokens()).len())
                .sum::<usize>()
        })
    });
    let candidates: Vec<Vec<Span>> = samples
        .iter()
        .map(|s| {
            let mut spans = s.spans().to_vec();
            spans.extend(matcher.find(s.tokens()));
            spans
        })
        .collect();
    c.bench_function("drop_overlapping_spans", |b| {
        b.iter(|| {
            candidates
                .iter()
                .map(|spans| drop_overlapping_spans(spans.clone()).len())
                .sum::<usize>()
        })
    });
}

fn benchmark_evaluation(c: &mut Criterion) {
    let samples = load_samples(corpus_path("big"), 20_000);
    let y_true: Vec<Vec<String>> = samples.iter().map(|s| s.tags(SchemeType::BIO).unwrap()).collect();
    let y_pred: Vec<Vec<String>> = y_true.iter().rev().cloned().collect();
    let config = Config::default();
    c.bench_function("big_dataset_report", |b| {
        b.iter(|| evaluate_tags(&y_true, &y_true, &config).unwrap())
    });
    c.bench_function("big_dataset_report_mismatched", |b| {
        b.iter(|| {
            let aligned: Vec<Vec<String>> = y_true
                .iter()
                .zip(y_pred.iter())
                .map(|(t, p)| {
                    let mut p = p.clone();
                    p.resize(t.len(), String::from("O"));
                    p
                })
                .collect();
            evaluate_tags(&y_true, &aligned, &config).unwrap()
        })
    });
}

fn benchmark_cross_validation(c: &mut Criterion) {
    let samples: std::sync::Arc<[Sample]> = load_samples(corpus_path("small"), 2_000).into();
    for parallel in [false, true] {
        let config = Config::builder().folds(10).parallel(parallel).build().unwrap();
        let validator = CrossValidator::new(&config);
        let name = if parallel {
            "cross_validation_parallel"
        } else {
            "cross_validation_sequential"
        };
        c.bench_function(name, |b| {
            b.iter(|| {
                validator
                    .evaluate_samples(std::sync::Arc::clone(&samples), &memorize)
                    .unwrap()
            })
        });
    }
}

criterion_group!(
    name=span_pipeline_benches;
    config = Criterion::default().sample_size(50).with_profiler(PProfProfiler::new(3000, Output::Flamegraph(None)));
    targets = benchmark_codecs,
    benchmark_resolution_and_matching,
    benchmark_evaluation,
    benchmark_cross_validation
);
criterion_main!(span_pipeline_benches);
