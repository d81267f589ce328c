//! Quality-decay cutoff.
//!
//! Walks a ranked result list and stops at the first document whose score
//! falls below both a fraction of the running average and a fraction of the
//! previous score. The first `min_results` documents are always kept.
//!
//! Scores are assumed to be in descending order, which is what the backends
//! return for relevance-sorted queries. The input is never re-sorted: on an
//! unsorted list the cutoff is computed as if it were sorted, and may stop
//! early or late.

use crate::builder::state::QualityFilter;
use crate::result::document::RawDocument;

/// Extra tolerance applied to the previous-score threshold.
const LAST_SCORE_SLACK: f64 = 1.1;

#[derive(Debug, Default)]
struct Decay {
    count: usize,
    score_acc: f64,
    last_score: f64,
}

impl Decay {
    fn admits(&self, score: f64, fall_off: f64) -> bool {
        // Nothing to compare against until some score is non-zero.
        if self.score_acc == 0.0 {
            return true;
        }
        let avg_score = self.score_acc / self.count as f64;
        let min_score = (fall_off * avg_score).min(fall_off * LAST_SCORE_SLACK * self.last_score);
        score > min_score
    }

    fn record(&mut self, score: f64) {
        self.count += 1;
        self.score_acc += score;
        self.last_score = score;
    }
}

/// Number of leading scores to keep.
pub fn quality_cutoff(scores: &[f64], fall_off: f64, min_results: usize) -> usize {
    let mut decay = Decay::default();
    for (kept, &score) in scores.iter().enumerate() {
        if kept >= min_results && !decay.admits(score, fall_off) {
            return kept;
        }
        decay.record(score);
    }
    scores.len()
}

/// Whether scores are non-increasing, the order the cutoff assumes.
pub fn is_descending(scores: &[f64]) -> bool {
    scores.windows(2).all(|pair| pair[0] >= pair[1])
}

/// Truncate documents with the given filter. Missing scores count as zero.
/// Without a filter the documents are returned unchanged.
pub fn apply(mut docs: Vec<RawDocument>, filter: Option<&QualityFilter>) -> Vec<RawDocument> {
    let Some(filter) = filter else {
        return docs;
    };
    let scores: Vec<f64> = docs.iter().map(|d| d.score.unwrap_or(0.0)).collect();
    if !is_descending(&scores) {
        tracing::debug!(
            target: "skewer::result",
            docs = scores.len(),
            "quality filter applied to scores that are not in descending order"
        );
    }
    let kept = quality_cutoff(&scores, filter.fall_off.get(), filter.min_results);
    docs.truncate(kept);
    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs(scores: &[Option<f64>]) -> Vec<RawDocument> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| RawDocument::default().with_id(i.to_string()).with_score(*s))
            .collect()
    }

    fn filter(fall_off: f64, min_results: usize) -> QualityFilter {
        QualityFilter {
            fall_off: fall_off.into(),
            min_results,
        }
    }

    #[test]
    fn test_decay_cutoff() {
        let scores = [10.0, 9.0, 8.0, 1.0, 1.0, 1.0];
        assert_eq!(quality_cutoff(&scores, 0.5, 2), 3);
    }

    #[test]
    fn test_all_zero_scores_kept() {
        let scores = [0.0; 6];
        assert_eq!(quality_cutoff(&scores, 0.5, 2), 6);
        assert_eq!(quality_cutoff(&scores, 0.5, 0), 6);
    }

    #[test]
    fn test_min_results_floor() {
        let scores = [10.0, 0.1, 0.01, 0.001];
        assert_eq!(quality_cutoff(&scores, 0.5, 3), 3);
        assert_eq!(quality_cutoff(&scores, 0.5, 1), 1);
        assert_eq!(quality_cutoff(&scores, 0.5, 10), 4);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(quality_cutoff(&[], 0.5, 2), 0);
    }

    #[test]
    fn test_leading_zeros_skip_comparison() {
        let scores = [0.0, 0.0, 5.0, 4.0, 0.5];
        assert_eq!(quality_cutoff(&scores, 0.5, 0), 4);
    }

    #[test]
    fn test_flat_scores_kept() {
        let scores = [3.0, 3.0, 3.0, 3.0];
        assert_eq!(quality_cutoff(&scores, 0.9, 1), 4);
    }

    #[test]
    fn test_unsorted_input_is_not_reordered() {
        // A late high score is never reached once a low one stops the scan.
        let scores = [10.0, 9.0, 1.0, 10.0];
        assert!(!is_descending(&scores));
        assert_eq!(quality_cutoff(&scores, 0.5, 2), 2);

        let kept = apply(docs(&[Some(10.0), Some(9.0), Some(1.0), Some(10.0)]), Some(&filter(0.5, 2)));
        let ids: Vec<_> = kept.iter().map(|d| d.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["0", "1"]);
    }

    #[test]
    fn test_apply_without_filter() {
        let input = docs(&[Some(10.0), Some(1.0)]);
        assert_eq!(apply(input.clone(), None), input);
    }

    #[test]
    fn test_apply_missing_scores_count_as_zero() {
        let input = docs(&[Some(10.0), Some(9.0), None, Some(8.0)]);
        let kept = apply(input, Some(&filter(0.5, 2)));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_invocations_share_nothing() {
        let f = filter(0.5, 2);
        let first = apply(docs(&[Some(10.0), Some(9.0), Some(8.0), Some(1.0)]), Some(&f));
        let second = apply(docs(&[Some(10.0), Some(9.0), Some(8.0), Some(1.0)]), Some(&f));
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
