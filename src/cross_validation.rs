/**
K-fold cross-validation. The samples are cut in `k` contiguous folds; every fold is evaluated by a
model trained on the `k - 1` other folds and the per-fold scores are merged.
*/
use crate::config::Config;
use crate::error::{Error, Result};
use crate::evaluation::{Evaluator, Labeler};
use crate::metrics::ScoreAccumulator;
use crate::reporter::Reporter;
use crate::sample::{Sample, SampleStream};
use rayon::prelude::*;
use std::ops::Range;
use std::sync::Arc;

/// Trains a labeler. The statistical model behind it is opaque.
pub trait Trainer {
    type Model: Labeler;
    /// Trains a model on `samples`.
    fn train(&self, samples: &[Sample]) -> Result<Self::Model>;
}

impl<F, M> Trainer for F
where
    F: Fn(&[Sample]) -> Result<M>,
    M: Labeler,
{
    type Model = M;
    fn train(&self, samples: &[Sample]) -> Result<M> {
        self(samples)
    }
}

/// Cuts `0..n` into `k` contiguous ranges. The first `n % k` ranges hold one more element than the
/// others. Fails with `Error::Configuration` if `k < 2` or if `n < k`, in which case some fold
/// would be empty.
///
/// * `n`: Number of samples.
/// * `k`: Number of folds.
pub fn partition(n: usize, k: usize) -> Result<Vec<Range<usize>>> {
    if k < 2 {
        return Err(Error::configuration(format!(
            "Cross-validation needs at least 2 folds, got {}",
            k
        )));
    }
    if n < k {
        return Err(Error::configuration(format!(
            "Cannot cut {} samples into {} non-empty folds",
            n, k
        )));
    }
    let (base, extra) = (n / k, n % k);
    let mut start = 0;
    let folds = (0..k)
        .map(|i| {
            let size = base + usize::from(i < extra);
            let fold = start..start + size;
            start += size;
            fold
        })
        .collect();
    Ok(folds)
}

/// Scores of a cross-validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidationResult {
    /// Sum of the scores of every fold.
    pub scores: ScoreAccumulator,
    /// Scores of each held-out fold, in fold order.
    pub folds: Vec<ScoreAccumulator>,
}

impl CrossValidationResult {
    pub fn reporter(&self) -> Reporter {
        Reporter::new(&self.scores)
    }

    /// F1 of each fold.
    pub fn fold_f1(&self) -> Vec<f64> {
        self.folds.iter().map(|f| f.f1()).collect()
    }
}

/// Runs k-fold cross-validation with the number of folds and the parallelism of a `Config`.
#[derive(Debug, Clone)]
pub struct CrossValidator {
    folds: usize,
    parallel: bool,
}

impl CrossValidator {
    pub fn new(config: &Config) -> Self {
        CrossValidator {
            folds: config.folds,
            parallel: config.parallel,
        }
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    /// Resets `stream`, reads all of its samples and cross-validates `trainer` on them. Any error
    /// (reset, read, training) aborts the whole run.
    ///
    /// * `stream`: The samples. Read from the start.
    /// * `trainer`: Trains one model per fold.
    pub fn evaluate<S, T>(&self, stream: &mut S, trainer: &T) -> Result<CrossValidationResult>
    where
        S: SampleStream + ?Sized,
        T: Trainer + Sync,
    {
        stream.reset()?;
        let samples: Arc<[Sample]> = stream.read_all()?.into();
        self.evaluate_samples(samples, trainer)
    }

    /// Cross-validates `trainer` on samples already in memory.
    pub fn evaluate_samples<T>(&self, samples: Arc<[Sample]>, trainer: &T) -> Result<CrossValidationResult>
    where
        T: Trainer + Sync,
    {
        let ranges = partition(samples.len(), self.folds)?;
        log::info!(
            "Cross-validating {} samples over {} folds",
            samples.len(),
            ranges.len()
        );
        let folds: Vec<ScoreAccumulator> = if self.parallel {
            ranges
                .par_iter()
                .enumerate()
                .map(|(i, range)| run_fold(&samples, range, i, trainer))
                .collect::<Result<Vec<_>>>()?
        } else {
            ranges
                .iter()
                .enumerate()
                .map(|(i, range)| run_fold(&samples, range, i, trainer))
                .collect::<Result<Vec<_>>>()?
        };
        let scores = folds.iter().fold(ScoreAccumulator::new(), |mut acc, f| {
            acc.merge(f);
            acc
        });
        Ok(CrossValidationResult { scores, folds })
    }
}

fn run_fold<T: Trainer>(
    samples: &[Sample],
    held_out: &Range<usize>,
    index: usize,
    trainer: &T,
) -> Result<ScoreAccumulator> {
    let training: Vec<Sample> = samples[..held_out.start]
        .iter()
        .chain(samples[held_out.end..].iter())
        .cloned()
        .collect();
    let model = trainer.train(&training)?;
    let mut evaluator = Evaluator::new(model);
    evaluator.evaluate_samples(&samples[held_out.clone()]);
    let scores = evaluator.into_scores();
    log::info!(
        "Fold {}: trained on {} samples, evaluated on {}, F1 {:.4}",
        index + 1,
        training.len(),
        held_out.len(),
        scores.f1()
    );
    Ok(scores)
}
