// Probability vector -> top-K labelled predictions.

use crate::types::Prediction;
use std::cmp::Ordering;

/// Guesses at or below this confidence are never shown.
pub const CONFIDENCE_FLOOR: f32 = 0.001;

/// How many guesses the panel shows by default.
pub const DEFAULT_TOP_K: usize = 10;

/// Pair each probability with its label, sort descending (lower index wins
/// ties, NaN sorts last), keep `top_k`, then drop anything under the floor.
/// An empty result is a valid "nothing confident" answer.
pub fn rank(probabilities: &[f32], labels: &[String], top_k: usize) -> Vec<Prediction> {
    let mut indexed: Vec<(usize, f32)> = probabilities.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| by_confidence_desc(a.1, b.1).then(a.0.cmp(&b.0)));

    indexed
        .into_iter()
        .take(top_k)
        .filter(|&(_, p)| p > CONFIDENCE_FLOOR)
        .map(|(i, p)| Prediction {
            label: labels.get(i).cloned().unwrap_or_else(|| format!("Class {i}")),
            confidence: p,
        })
        .collect()
}

fn by_confidence_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn top_three_with_index_tie_break() {
        let probs = [0.05, 0.7, 0.2, 0.0005, 0.05];
        let ranked = rank(&probs, &labels(&["a", "b", "c", "d", "e"]), 3);
        let got: Vec<(&str, f32)> = ranked.iter().map(|p| (p.label.as_str(), p.confidence)).collect();
        assert_eq!(got, vec![("b", 0.7), ("c", 0.2), ("a", 0.05)]);
    }

    #[test]
    fn floor_applies_after_truncation() {
        let probs = [0.05, 0.7, 0.2, 0.0005, 0.05];
        let ranked = rank(&probs, &labels(&["a", "b", "c", "d", "e"]), 10);
        assert_eq!(ranked.len(), 4);
        assert!(ranked.iter().all(|p| p.label != "d"));
        assert_eq!(ranked[3].label, "e");
    }

    #[test]
    fn exactly_at_floor_is_dropped() {
        let ranked = rank(&[CONFIDENCE_FLOOR, 0.0], &labels(&["x", "y"]), 5);
        assert!(ranked.is_empty());
    }

    #[test]
    fn missing_labels_get_class_names() {
        let ranked = rank(&[0.1, 0.9], &labels(&["only"]), 2);
        assert_eq!(ranked[0].label, "Class 1");
        assert_eq!(ranked[1].label, "only");
    }

    #[test]
    fn nan_never_outranks_numbers() {
        let ranked = rank(&[f32::NAN, 0.4, 0.6], &labels(&["n", "a", "b"]), 2);
        assert_eq!(ranked.iter().map(|p| p.label.as_str()).collect::<Vec<_>>(), vec!["b", "a"]);
    }
}
