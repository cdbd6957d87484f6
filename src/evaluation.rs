/**
The labeling contract and the driver that scores a labeler against reference samples.
*/
use crate::error::Result;
use crate::metrics::ScoreAccumulator;
use crate::overlap::drop_overlapping_spans;
use crate::sample::{Sample, SampleStream};
use crate::span::Span;

/// A trained sequence labeler. The model internals are opaque: it only has to produce candidate
/// spans for a token sequence. Implementations may keep document-level adaptive state behind
/// interior mutability.
pub trait Labeler {
    /// Returns candidate spans over `tokens`. The spans may overlap.
    fn label(&self, tokens: &[String]) -> Vec<Span>;
    /// Forgets any document-level state. Called before a sample flagged with
    /// `clear_adaptive_data`.
    fn clear_adaptive_data(&self);
}

impl<L: Labeler + ?Sized> Labeler for &L {
    fn label(&self, tokens: &[String]) -> Vec<Span> {
        (**self).label(tokens)
    }
    fn clear_adaptive_data(&self) {
        (**self).clear_adaptive_data()
    }
}

impl<L: Labeler + ?Sized> Labeler for Box<L> {
    fn label(&self, tokens: &[String]) -> Vec<Span> {
        (**self).label(tokens)
    }
    fn clear_adaptive_data(&self) {
        (**self).clear_adaptive_data()
    }
}

/// Scores a labeler sample by sample. Predictions go through `drop_overlapping_spans` before being
/// compared with the references.
#[derive(Debug)]
pub struct Evaluator<L> {
    labeler: L,
    scores: ScoreAccumulator,
}

impl<L: Labeler> Evaluator<L> {
    pub fn new(labeler: L) -> Self {
        Evaluator {
            labeler,
            scores: ScoreAccumulator::default(),
        }
    }

    /// Labels a single sample, accumulates its counts and returns the resolved predictions.
    pub fn evaluate_sample(&mut self, sample: &Sample) -> Vec<Span> {
        if sample.clear_adaptive_data() {
            log::debug!("Clearing adaptive data");
            self.labeler.clear_adaptive_data();
        }
        let predicted = drop_overlapping_spans(self.labeler.label(sample.tokens()));
        self.scores.update(sample.spans(), &predicted);
        predicted
    }

    /// Evaluates every sample of a slice.
    pub fn evaluate_samples(&mut self, samples: &[Sample]) {
        for sample in samples {
            self.evaluate_sample(sample);
        }
    }

    /// Evaluates every remaining sample of `stream`.
    pub fn evaluate_stream<S: SampleStream + ?Sized>(&mut self, stream: &mut S) -> Result<()> {
        while let Some(sample) = stream.read()? {
            self.evaluate_sample(&sample);
        }
        Ok(())
    }

    pub fn scores(&self) -> &ScoreAccumulator {
        &self.scores
    }

    pub fn into_scores(self) -> ScoreAccumulator {
        self.scores
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sample::VecSampleStream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Tags every occurrence of the first token of each reference as a one token `PER`, with an
    /// extra overlapping span over the first two tokens.
    #[derive(Debug, Default)]
    pub(crate) struct FirstTokenLabeler {
        pub(crate) clears: AtomicUsize,
    }

    impl Labeler for FirstTokenLabeler {
        fn label(&self, tokens: &[String]) -> Vec<Span> {
            let mut spans = vec![];
            if !tokens.is_empty() {
                spans.push(Span::new(0, 1, "PER").unwrap());
            }
            if tokens.len() > 1 {
                spans.push(Span::new(0, 2, "PER").unwrap());
            }
            spans
        }
        fn clear_adaptive_data(&self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn sample(text: &str, spans: Vec<Span>, clear: bool) -> Sample {
        let tokens = text.split_whitespace().map(String::from).collect();
        Sample::new(tokens, spans, clear).unwrap()
    }

    #[test]
    fn test_evaluator_resolves_overlaps() {
        let mut evaluator = Evaluator::new(FirstTokenLabeler::default());
        let s = sample("John Smith lives", vec![Span::new(0, 2, "PER").unwrap()], false);
        let predicted = evaluator.evaluate_sample(&s);
        assert_eq!(predicted, vec![Span::new(0, 2, "PER").unwrap()]);
        let total = evaluator.scores().total();
        assert_eq!((total.true_positive, total.false_positive, total.target), (1, 0, 1));
    }

    #[test]
    fn test_evaluator_clears_adaptive_data() {
        let samples = vec![
            sample("a b", vec![], true),
            sample("c", vec![], false),
            sample("d", vec![], true),
        ];
        let mut stream = VecSampleStream::new(samples);
        let labeler = FirstTokenLabeler::default();
        let mut evaluator = Evaluator::new(&labeler);
        evaluator.evaluate_stream(&mut stream).unwrap();
        assert_eq!(labeler.clears.load(Ordering::SeqCst), 2);
        assert_eq!(evaluator.scores().total().false_positive, 3);
    }
}
