use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_STEP: usize = 10;
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.70;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("chunk width must be at least 1, got {0}")]
    InvalidStep(usize),
    #[error("score threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),
    #[error("leaf limit must be at least 1")]
    InvalidLeafLimit,
    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// When a node pushes its pending entries down into children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Every entry long enough to carry a chunk at the node is routed on insertion.
    #[default]
    Immediate,
    /// Pending entries accumulate until the node holds more than `leaf_limit` of them.
    Overflow { leaf_limit: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    pub step: usize,
    pub score_threshold: f64,
    pub split: SplitPolicy,
    /// Removal patterns, applied in order.
    pub ignore: Vec<String>,
    /// Rejection patterns, evaluated against the masked form.
    pub reject: Vec<String>,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            split: SplitPolicy::default(),
            ignore: Vec::new(),
            reject: Vec::new(),
        }
    }
}

impl CounterConfig {
    pub fn new(step: usize, score_threshold: f64) -> Self {
        Self { step, score_threshold, ..Default::default() }
    }

    pub fn with_ignore<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_reject<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reject.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_split(mut self, split: SplitPolicy) -> Self {
        self.split = split;
        self
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Range checks only; patterns are compiled by the preprocessor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step < 1 {
            return Err(ConfigError::InvalidStep(self.step));
        }
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(ConfigError::InvalidThreshold(self.score_threshold));
        }
        if let SplitPolicy::Overflow { leaf_limit: 0 } = self.split {
            return Err(ConfigError::InvalidLeafLimit);
        }
        Ok(())
    }
}
