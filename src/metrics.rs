/**
Per-type and aggregate counters of true positives, false positives and targets, with the derived
precision, recall and F1 scores.
*/
use crate::span::Span;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Value of the F1 score when both precision and recall are zero.
pub const UNDEFINED_F1: f64 = -1.0;

/// Counters of a single span type, or of every type for the aggregate record.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeStats {
    pub true_positive: usize,
    pub false_positive: usize,
    /// Number of reference spans.
    pub target: usize,
}

impl TypeStats {
    /// `tp / (tp + fp)`, or 0 when nothing was predicted.
    pub fn precision(&self) -> f64 {
        let predicted = self.true_positive + self.false_positive;
        if predicted == 0 {
            0.0
        } else {
            self.true_positive as f64 / predicted as f64
        }
    }

    /// `tp / target`, or 0 without references.
    pub fn recall(&self) -> f64 {
        if self.target == 0 {
            0.0
        } else {
            self.true_positive as f64 / self.target as f64
        }
    }

    /// Harmonic mean of precision and recall. Returns `UNDEFINED_F1` when both are zero.
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            UNDEFINED_F1
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// F1 used to rank types: the undefined sentinel ranks like a zero.
    pub(crate) fn ranking_f1(&self) -> f64 {
        self.f1().max(0.0)
    }

    fn add(&mut self, other: &TypeStats) {
        self.true_positive += other.true_positive;
        self.false_positive += other.false_positive;
        self.target += other.target;
    }
}

/// Accumulates `TypeStats` per span type and over all types. Counters only grow.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreAccumulator {
    per_type: AHashMap<String, TypeStats>,
    total: TypeStats,
}

impl ScoreAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares the predictions of one sample against its references. A reference found among the
    /// predictions is a true positive, every reference counts toward the target and a prediction
    /// missing from the references is a false positive.
    ///
    /// * `references`: The gold spans of the sample.
    /// * `predictions`: The spans produced by the labeler.
    pub fn update(&mut self, references: &[Span], predictions: &[Span]) {
        let predicted: AHashSet<&Span> = predictions.iter().collect();
        let expected: AHashSet<&Span> = references.iter().collect();
        for reference in references {
            let stats = self.entry(reference.kind());
            stats.target += 1;
            if predicted.contains(reference) {
                stats.true_positive += 1;
                self.total.true_positive += 1;
            }
            self.total.target += 1;
        }
        for prediction in predictions {
            if !expected.contains(prediction) {
                self.entry(prediction.kind()).false_positive += 1;
                self.total.false_positive += 1;
            }
        }
    }

    fn entry(&mut self, kind: &str) -> &mut TypeStats {
        self.per_type.entry(String::from(kind)).or_default()
    }

    /// Adds the counters of `other` to `self`.
    pub fn merge(&mut self, other: &ScoreAccumulator) {
        for (kind, stats) in other.per_type.iter() {
            self.per_type.entry(kind.clone()).or_default().add(stats);
        }
        self.total.add(&other.total);
    }

    /// Aggregate counters over every type.
    pub fn total(&self) -> TypeStats {
        self.total
    }

    /// Counters of `kind`, if that type was ever seen.
    pub fn get(&self, kind: &str) -> Option<TypeStats> {
        self.per_type.get(kind).copied()
    }

    /// Iterates over the types seen so far, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeStats)> {
        self.per_type.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn precision(&self) -> f64 {
        self.total.precision()
    }

    pub fn recall(&self) -> f64 {
        self.total.recall()
    }

    pub fn f1(&self) -> f64 {
        self.total.f1()
    }

    /// Returns true if no reference and no prediction were ever counted.
    pub fn is_empty(&self) -> bool {
        self.total == TypeStats::default()
    }
}

impl Display for TypeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "precision: {:.2}%; recall: {:.2}%; F1: {:.2}%. [target: {}; tp: {}; fp: {}]",
            self.precision() * 100.0,
            self.recall() * 100.0,
            self.f1() * 100.0,
            self.target,
            self.true_positive,
            self.false_positive
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};

    pub(crate) trait CloseEnough {
        fn are_close(&self, other: &Self, eps: f64) -> bool;
    }

    impl CloseEnough for f64 {
        fn are_close(&self, other: &Self, eps: f64) -> bool {
            f64::abs(self - other) < eps
        }
    }

    fn span(start: usize, end: usize, kind: &str) -> Span {
        Span::new(start, end, kind).unwrap()
    }

    #[test]
    fn test_empty_accumulator() {
        let scores = ScoreAccumulator::new();
        assert!(scores.is_empty());
        assert_eq!(scores.precision(), 0.0);
        assert_eq!(scores.recall(), 0.0);
        assert_eq!(scores.f1(), UNDEFINED_F1);
    }

    #[test]
    fn test_perfect_predictions() {
        let mut scores = ScoreAccumulator::new();
        let references = vec![span(0, 2, "PER"), span(3, 4, "LOC")];
        scores.update(&references, &references);
        assert_eq!(scores.f1(), 1.0);
        assert_eq!(scores.get("PER").unwrap().f1(), 1.0);
    }

    #[test]
    fn test_type_mismatch_is_miss_and_false_positive() {
        let mut scores = ScoreAccumulator::new();
        scores.update(&[span(0, 2, "PER")], &[span(0, 2, "ORG")]);
        let per = scores.get("PER").unwrap();
        let org = scores.get("ORG").unwrap();
        assert_eq!((per.true_positive, per.false_positive, per.target), (0, 0, 1));
        assert_eq!((org.true_positive, org.false_positive, org.target), (0, 1, 0));
        assert_eq!(scores.total().target, 1);
        assert_eq!(scores.total().false_positive, 1);
        assert_eq!(scores.f1(), UNDEFINED_F1);
    }

    #[test]
    fn test_partial_scores() {
        let mut scores = ScoreAccumulator::new();
        scores.update(
            &[span(0, 1, "PER"), span(2, 3, "PER"), span(4, 5, "LOC")],
            &[span(0, 1, "PER"), span(4, 6, "LOC")],
        );
        assert!(scores.precision().are_close(&0.5, 1e-9));
        assert!(scores.recall().are_close(&(1.0 / 3.0), 1e-9));
        assert!(scores.f1().are_close(&0.4, 1e-9));
    }

    #[test]
    fn test_display() {
        let stats = TypeStats {
            true_positive: 1,
            false_positive: 1,
            target: 4,
        };
        assert_eq!(
            stats.to_string(),
            "precision: 50.00%; recall: 25.00%; F1: 33.33%. [target: 4; tp: 1; fp: 1]"
        );
    }

    #[derive(Debug, Clone)]
    struct Counts(Vec<(usize, usize, usize)>);

    impl Arbitrary for Counts {
        fn arbitrary(g: &mut Gen) -> Self {
            let n = usize::arbitrary(g) % 10;
            Counts(
                (0..n)
                    .map(|_| {
                        let target = usize::arbitrary(g) % 20;
                        let tp = if target == 0 { 0 } else { usize::arbitrary(g) % (target + 1) };
                        (tp, usize::arbitrary(g) % 20, target)
                    })
                    .collect(),
            )
        }
    }

    #[test]
    fn test_propertie_scores_are_bounded() {
        fn bounded(counts: Counts) -> TestResult {
            for (true_positive, false_positive, target) in counts.0 {
                let stats = TypeStats {
                    true_positive,
                    false_positive,
                    target,
                };
                let (p, r, f) = (stats.precision(), stats.recall(), stats.f1());
                if !(0.0..=1.0).contains(&p) || !(0.0..=1.0).contains(&r) {
                    return TestResult::failed();
                }
                if f != UNDEFINED_F1 && !(0.0..=1.0).contains(&f) {
                    return TestResult::failed();
                }
                if (f == UNDEFINED_F1) != (p + r == 0.0) {
                    return TestResult::failed();
                }
            }
            TestResult::passed()
        }
        let mut qc = QuickCheck::new().tests(1000);
        qc.quickcheck(bounded as fn(Counts) -> TestResult)
    }

    #[test]
    fn test_merge_adds_counters() {
        let mut a = ScoreAccumulator::new();
        a.update(&[span(0, 1, "PER")], &[span(0, 1, "PER")]);
        let mut b = ScoreAccumulator::new();
        b.update(&[span(0, 1, "LOC")], &[span(1, 2, "PER")]);
        let mut both = ScoreAccumulator::new();
        both.update(&[span(0, 1, "PER")], &[span(0, 1, "PER")]);
        both.update(&[span(0, 1, "LOC")], &[span(1, 2, "PER")]);
        a.merge(&b);
        assert_eq!(a, both);
        assert_eq!(a.total().target, 2);
        assert_eq!(a.get("PER").unwrap().false_positive, 1);
    }
}
