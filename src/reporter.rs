/**
Ranked, human readable report of a `ScoreAccumulator`, with macro and target-weighted averages.
*/
use crate::metrics::{ScoreAccumulator, TypeStats};
use itertools::Itertools;
use ndarray::Array1;
use ndarray_stats::SummaryStatisticsExt;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Label of the aggregate line.
pub const TOTAL: &str = "TOTAL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Scores of a single span type.
pub struct TypeReport {
    /// The type, such as "PER", "LOC", etc.
    pub kind: String,
    pub precision: f64,
    pub recall: f64,
    /// F1, or `UNDEFINED_F1` when precision and recall are both zero.
    pub f1: f64,
    pub stats: TypeStats,
}

impl TypeReport {
    fn new(kind: &str, stats: TypeStats) -> Self {
        TypeReport {
            kind: String::from(kind),
            precision: stats.precision(),
            recall: stats.recall(),
            f1: stats.f1(),
            stats,
        }
    }
}

impl Display for TypeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.stats)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Precision, recall and F1 averaged over the span types.
pub struct Averages {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Datastructure used to report the scores of an evaluation. Types are ranked by descending F1
/// (an undefined F1 ranks as zero), ties are broken by type name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reporter {
    total: TypeReport,
    types: Vec<TypeReport>,
    macro_average: Option<Averages>,
    weighted_average: Option<Averages>,
}

impl Reporter {
    pub fn new(scores: &ScoreAccumulator) -> Self {
        let types: Vec<TypeReport> = scores
            .iter()
            .sorted_by(|(ka, a), (kb, b)| {
                b.ranking_f1()
                    .total_cmp(&a.ranking_f1())
                    .then_with(|| ka.cmp(kb))
            })
            .map(|(k, s)| TypeReport::new(k, *s))
            .collect();
        let (macro_average, weighted_average) = averages(&types);
        Reporter {
            total: TypeReport::new(TOTAL, scores.total()),
            types,
            macro_average,
            weighted_average,
        }
    }

    /// The aggregate line.
    pub fn total(&self) -> &TypeReport {
        &self.total
    }

    /// Per type lines, ranked.
    pub fn types(&self) -> &[TypeReport] {
        &self.types
    }

    /// Unweighted mean over the types. `None` without any type.
    pub fn macro_average(&self) -> Option<Averages> {
        self.macro_average
    }

    /// Mean over the types weighted by their number of reference spans. `None` when no reference
    /// span was seen.
    pub fn weighted_average(&self) -> Option<Averages> {
        self.weighted_average
    }
}

impl From<&ScoreAccumulator> for Reporter {
    fn from(value: &ScoreAccumulator) -> Self {
        Reporter::new(value)
    }
}

fn averages(types: &[TypeReport]) -> (Option<Averages>, Option<Averages>) {
    if types.is_empty() {
        return (None, None);
    }
    let precision: Array1<f64> = types.iter().map(|t| t.precision).collect();
    let recall: Array1<f64> = types.iter().map(|t| t.recall).collect();
    let f1: Array1<f64> = types.iter().map(|t| t.stats.ranking_f1()).collect();
    let macro_average = match (precision.mean(), recall.mean(), f1.mean()) {
        (Some(precision), Some(recall), Some(f1)) => Some(Averages {
            precision,
            recall,
            f1,
        }),
        _ => None,
    };
    let weights: Array1<f64> = types.iter().map(|t| t.stats.target as f64).collect();
    let weighted_average = if weights.sum() == 0.0 {
        None
    } else {
        match (
            precision.weighted_mean(&weights),
            recall.weighted_mean(&weights),
            f1.weighted_mean(&weights),
        ) {
            (Ok(precision), Ok(recall), Ok(f1)) => Some(Averages {
                precision,
                recall,
                f1,
            }),
            _ => None,
        }
    };
    (macro_average, weighted_average)
}

impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.total)?;
        for t in self.types.iter() {
            writeln!(f, "{}", t)?
        }
        Ok(())
    }
}
