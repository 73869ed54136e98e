//! Access Predictor
//!
//! Records a rolling window of accesses and counts `from → to` transitions
//! between consecutive accesses. `predict_next` turns one row of counts into
//! probabilities.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use tracing::debug;

use crate::config::Config;

// == Predictor Config ==
#[derive(Debug, Clone)]
pub struct PredictorConfig {
    /// Length of the recent-access window
    pub max_sequence_len: usize,
    /// Minimum probability for a candidate to be returned
    pub threshold: f64,
    /// Maximum number of source keys with a transition row
    pub max_sources: usize,
    /// Maximum number of distinct targets tracked per source
    pub max_targets_per_source: usize,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            max_sequence_len: 5,
            threshold: 0.7,
            max_sources: 1024,
            max_targets_per_source: 64,
        }
    }
}

impl From<&Config> for PredictorConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_sequence_len: config.sequence_length,
            threshold: config.prefetch_threshold,
            ..Self::default()
        }
    }
}

// == Prediction ==
/// A candidate next access.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub key: String,
    pub probability: f64,
}

#[derive(Debug, Default)]
struct TransitionRow {
    targets: HashMap<String, u64>,
    total: u64,
    /// Predictor clock tick of the last update, used to retire stale rows
    last_updated: u64,
}

impl TransitionRow {
    /// Drops the least observed target (lowest count, then smallest key).
    fn drop_rarest(&mut self) {
        let rarest = self
            .targets
            .iter()
            .min_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
            .map(|(key, count)| (key.clone(), *count));

        if let Some((key, count)) = rarest {
            self.targets.remove(&key);
            self.total -= count;
        }
    }
}

// == Access Predictor ==
/// Order-1 Markov model over resource accesses.
///
/// The transition table is bounded: when a new source row would exceed
/// `max_sources` the least recently updated row is dropped, and when a row
/// would exceed `max_targets_per_source` its rarest target is dropped.
#[derive(Debug)]
pub struct AccessPredictor {
    sequence: VecDeque<String>,
    transitions: HashMap<String, TransitionRow>,
    config: PredictorConfig,
    clock: u64,
}

impl AccessPredictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self {
            sequence: VecDeque::with_capacity(config.max_sequence_len.max(1)),
            transitions: HashMap::new(),
            config,
            clock: 0,
        }
    }

    // == Record Access ==
    /// Adds an access to the window, counting the transition from the
    /// previous access if there is one.
    pub fn record_access(&mut self, key: &str) {
        if let Some(previous) = self.sequence.back().cloned() {
            self.add_transition(&previous, key);
        }

        self.sequence.push_back(key.to_string());
        while self.sequence.len() > self.config.max_sequence_len.max(1) {
            self.sequence.pop_front();
        }
    }

    fn add_transition(&mut self, from: &str, to: &str) {
        self.clock += 1;

        if !self.transitions.contains_key(from) && self.transitions.len() >= self.config.max_sources {
            self.retire_stalest_row();
        }

        let row = self.transitions.entry(from.to_string()).or_default();
        if !row.targets.contains_key(to) && row.targets.len() >= self.config.max_targets_per_source {
            row.drop_rarest();
        }

        *row.targets.entry(to.to_string()).or_insert(0) += 1;
        row.total += 1;
        row.last_updated = self.clock;
    }

    fn retire_stalest_row(&mut self) {
        let stalest = self
            .transitions
            .iter()
            .min_by_key(|(_, row)| row.last_updated)
            .map(|(key, _)| key.clone());

        if let Some(key) = stalest {
            debug!("Transition table full, dropping row for '{}'", key);
            self.transitions.remove(&key);
        }
    }

    // == Predict Next ==
    /// Candidates following `key` with probability at or above the threshold,
    /// most probable first. Unknown keys yield an empty list.
    pub fn predict_next(&self, key: &str) -> Vec<Prediction> {
        let Some(row) = self.transitions.get(key) else {
            return Vec::new();
        };
        if row.total == 0 {
            return Vec::new();
        }

        let mut predictions: Vec<Prediction> = row
            .targets
            .iter()
            .map(|(candidate, count)| Prediction {
                key: candidate.clone(),
                probability: *count as f64 / row.total as f64,
            })
            .filter(|p| p.probability >= self.config.threshold)
            .collect();

        predictions.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        predictions
    }

    /// The most recently recorded access.
    pub fn current(&self) -> Option<&str> {
        self.sequence.back().map(String::as_str)
    }

    /// Recent accesses, oldest first.
    pub fn sequence(&self) -> impl Iterator<Item = &str> {
        self.sequence.iter().map(String::as_str)
    }

    pub fn transition_count(&self, from: &str, to: &str) -> u64 {
        self.transitions
            .get(from)
            .and_then(|row| row.targets.get(to))
            .copied()
            .unwrap_or(0)
    }

    pub fn tracked_sources(&self) -> usize {
        self.transitions.len()
    }

    pub fn clear(&mut self) {
        self.sequence.clear();
        self.transitions.clear();
        self.clock = 0;
    }
}

impl Default for AccessPredictor {
    fn default() -> Self {
        Self::new(PredictorConfig::default())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn record(predictor: &mut AccessPredictor, keys: &[&str]) {
        for key in keys {
            predictor.record_access(key);
        }
    }

    #[test]
    fn test_threshold_filters_weak_transitions() {
        let mut predictor = AccessPredictor::default();
        for _ in 0..7 {
            record(&mut predictor, &["A", "B"]);
        }
        for _ in 0..3 {
            record(&mut predictor, &["A", "C"]);
        }

        let predictions = predictor.predict_next("A");

        assert_eq!(
            predictions,
            vec![Prediction { key: "B".to_string(), probability: 0.7 }]
        );
    }

    #[test]
    fn test_unknown_key_predicts_nothing() {
        let mut predictor = AccessPredictor::default();
        assert!(predictor.predict_next("A").is_empty());

        predictor.record_access("A");
        // One access, no transition yet
        assert!(predictor.predict_next("A").is_empty());
    }

    #[test]
    fn test_predictions_sorted_descending() {
        let mut predictor = AccessPredictor::new(PredictorConfig {
            threshold: 0.0,
            ..PredictorConfig::default()
        });
        record(&mut predictor, &["A", "B", "A", "C", "A", "C", "A", "C"]);

        let predictions = predictor.predict_next("A");
        let keys: Vec<&str> = predictions.iter().map(|p| p.key.as_str()).collect();

        assert_eq!(keys, vec!["C", "B"]);
        assert_eq!(predictions[0].probability, 0.75);
        assert_eq!(predictions[1].probability, 0.25);
    }

    #[test]
    fn test_transitions_follow_call_order() {
        let mut predictor = AccessPredictor::default();
        record(&mut predictor, &["A", "B", "C"]);

        assert_eq!(predictor.transition_count("A", "B"), 1);
        assert_eq!(predictor.transition_count("B", "C"), 1);
        assert_eq!(predictor.transition_count("A", "C"), 0);
        assert_eq!(predictor.current(), Some("C"));
    }

    #[test]
    fn test_sequence_is_trimmed_from_front() {
        let mut predictor = AccessPredictor::default();
        record(&mut predictor, &["1", "2", "3", "4", "5", "6", "7"]);

        let window: Vec<&str> = predictor.sequence().collect();
        assert_eq!(window, vec!["3", "4", "5", "6", "7"]);
        // Trimming the window keeps the learned transitions
        assert_eq!(predictor.transition_count("1", "2"), 1);
    }

    #[test]
    fn test_source_rows_are_bounded() {
        let mut predictor = AccessPredictor::new(PredictorConfig {
            max_sources: 2,
            ..PredictorConfig::default()
        });
        // Rows: a, b, then c forces out the stalest (a)
        record(&mut predictor, &["a", "x", "b", "y", "c", "z"]);

        assert!(predictor.tracked_sources() <= 2);
        assert_eq!(predictor.transition_count("a", "x"), 0);
        assert_eq!(predictor.transition_count("c", "z"), 1);
    }

    #[test]
    fn test_targets_per_source_are_bounded() {
        let mut predictor = AccessPredictor::new(PredictorConfig {
            max_targets_per_source: 2,
            threshold: 0.0,
            ..PredictorConfig::default()
        });
        record(&mut predictor, &["a", "x", "a", "x", "a", "y", "a", "z"]);

        // y was the rarest target when z arrived
        assert_eq!(predictor.transition_count("a", "x"), 2);
        assert_eq!(predictor.transition_count("a", "y"), 0);
        assert_eq!(predictor.transition_count("a", "z"), 1);

        let total: f64 = predictor.predict_next("a").iter().map(|p| p.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_clear() {
        let mut predictor = AccessPredictor::default();
        record(&mut predictor, &["a", "b"]);

        predictor.clear();

        assert_eq!(predictor.current(), None);
        assert_eq!(predictor.tracked_sources(), 0);
    }
}
