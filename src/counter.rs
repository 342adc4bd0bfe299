use crate::config::{ConfigError, CounterConfig};
use crate::masking::Preprocessor;
use crate::similarity::{best_match, BestMatch};
use crate::telemetry::{AssignDebug, DebugSink};
use crate::tree::{Entry, Tree};
use ahash::AHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_COUNTER_ID: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// First original string that opened the group.
    pub representative: String,
    pub masked: String,
    pub count: u64,
}

/// What happened to a single [`Counter::assign`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Rejected,
    Merged,
    NewGroup,
}

/// Weighted near-duplicate counter.
///
/// Not synchronized: run one counter per thread and combine them with
/// [`Counter::merge`] or [`Counter::merge_counts`].
#[derive(Debug)]
pub struct Counter {
    id: usize,
    tree: Tree,
    counts: AHashMap<String, u64>,
    preprocessor: Preprocessor,
    score_threshold: f64,
    debug: Option<DebugSink>,
}

impl Counter {
    pub fn new(config: &CounterConfig) -> Result<Self, ConfigError> {
        let preprocessor = Preprocessor::from_config(config)?;
        Self::with_preprocessor(config, preprocessor)
    }

    /// Uses `preprocessor` instead of compiling `config.ignore` / `config.reject`.
    pub fn with_preprocessor(config: &CounterConfig, preprocessor: Preprocessor) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            id: NEXT_COUNTER_ID.fetch_add(1, Ordering::Relaxed),
            tree: Tree::new(config.step, config.split),
            counts: AHashMap::new(),
            preprocessor,
            score_threshold: config.score_threshold,
            debug: None,
        })
    }

    pub fn with_debug(mut self, sink: DebugSink) -> Self {
        self.debug = Some(sink);
        self
    }

    /// Detaches the debug sink so its receiver can observe the end of the stream.
    pub fn take_debug(&mut self) -> Option<DebugSink> {
        self.debug.take()
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn assign(&mut self, input: &str) -> Outcome {
        self.weighted_assign(input, 1)
    }

    /// Adds `weight` to the group `input` belongs to, opening a new group when
    /// no existing one scores strictly above the threshold.
    ///
    /// An identical masked form (score 1.0) always merges, including when the
    /// threshold is 1.0. That threshold therefore means "exact matches only"
    /// rather than "never merge".
    pub fn weighted_assign(&mut self, input: &str, weight: u64) -> Outcome {
        let masked = self.preprocessor.mask(input);
        if self.preprocessor.reject(&masked) {
            tracing::debug!(counter = self.id, input, "input rejected");
            self.report(input, &masked, true, None, false);
            return Outcome::Rejected;
        }

        let node = self.tree.descend(&masked);
        let best = best_match(&self.tree, node, &masked);
        // A perfect score is the same masked text, so it always merges
        let accepted = best.is_some_and(|b| b.score > self.score_threshold || b.score == 1.0);
        self.report(input, &masked, false, best, accepted);

        if let (true, Some(b)) = (accepted, best) {
            let key = &self.tree.entry(b.entry).masked;
            match self.counts.get_mut(key) {
                Some(c) => *c += weight,
                None => {
                    self.counts.insert(key.clone(), weight);
                }
            }
            return Outcome::Merged;
        }

        tracing::debug!(counter = self.id, input, groups = self.tree.len() + 1, "new group");
        *self.counts.entry(masked.clone()).or_insert(0) += weight;
        self.tree.insert(node, Entry::new(input, masked));
        Outcome::NewGroup
    }

    /// Weighted-assigns every `(original, weight)` pair, e.g. another shard's counts.
    pub fn merge_counts<I, S>(&mut self, counts: I)
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        for (original, weight) in counts {
            self.weighted_assign(original.as_ref(), weight);
        }
    }

    pub fn merge(&mut self, other: &Counter) {
        self.merge_counts(other.counts());
    }

    /// Group weights keyed by each group's representative original string.
    pub fn counts(&self) -> HashMap<String, u64> {
        self.tree
            .entries()
            .iter()
            .map(|e| (e.original.clone(), self.count_of(&e.masked)))
            .collect()
    }

    /// Groups sorted by count descending, then representative ascending.
    pub fn groups(&self) -> Vec<Group> {
        self.tree
            .entries()
            .iter()
            .map(|e| Group {
                representative: e.original.clone(),
                masked: e.masked.clone(),
                count: self.count_of(&e.masked),
            })
            .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.representative.cmp(&b.representative)))
            .collect()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Sum of all recorded weights.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    fn count_of(&self, masked: &str) -> u64 {
        self.counts.get(masked).copied().unwrap_or(0)
    }

    fn report(&mut self, input: &str, masked: &str, rejected: bool, best: Option<BestMatch>, accepted: bool) {
        let Some(sink) = self.debug.as_mut() else { return };
        let entry = best.map(|b| self.tree.entry(b.entry));
        sink.emit(AssignDebug {
            counter_id: self.id,
            input: input.to_string(),
            masked_input: masked.to_string(),
            rejected,
            best_match: entry.map(|e| e.original.clone()),
            best_match_masked: entry.map(|e| e.masked.clone()),
            best_match_score: best.map_or(0.0, |b| b.score),
            best_match_accepted: accepted,
        });
    }
}
