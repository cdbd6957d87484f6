/**
Resolution of overlapping span predictions.
*/
use crate::span::Span;
use std::cmp::Ordering;

/// Orders spans by start, then longer first, then by type so that the order is total.
fn resolution_order(a: &Span, b: &Span) -> Ordering {
    a.start()
        .cmp(&b.start())
        .then_with(|| b.len().cmp(&a.len()))
        .then_with(|| a.kind().cmp(b.kind()))
}

/// Keeps a maximal non-overlapping subset of `spans`. Spans are visited by ascending start and,
/// for equal starts, the longer span wins. A span is kept iff it starts at or after the end of the
/// last kept span. The result is sorted by start.
///
/// * `spans`: Candidate spans, possibly overlapping, in any order.
pub fn drop_overlapping_spans(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by(resolution_order);
    let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        let last_end = kept.last().map(|s| s.end()).unwrap_or(0);
        if kept.is_empty() || span.start() >= last_end {
            kept.push(span);
        } else {
            log::trace!("Dropping overlapping span {}", span);
        }
    }
    kept
}

/// Returns true if no two spans of `spans` share a token.
pub fn are_disjoint(spans: &[Span]) -> bool {
    let mut sorted: Vec<&Span> = spans.iter().collect();
    sorted.sort_by(|a, b| resolution_order(a, b));
    sorted.windows(2).all(|w| w[0].end() <= w[1].start())
}
