use crate::config::{ConfigError, CounterConfig};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    // ISO8601/RFC3339 with optional fractional seconds and timezone
    // 2025-08-07T06:41:18Z, 2025-08-07T06:41:18.123456+01:00, 2025-08-07 06:41:18.999
    Regex::new(r"\b\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d{1,9})?(?:Z|[+-](?:\d{2}(?::?\d{2})?|\d{4}))?").unwrap()
});

static RE_UUID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b").unwrap()
});

static RE_IPV6: Lazy<Regex> = Lazy::new(|| {
    // Full form only, no shorthand
    Regex::new(r"\b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b").unwrap()
});

static RE_IPV4: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b").unwrap()
});

static RE_EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

static RE_HEX: Lazy<Regex> = Lazy::new(|| {
    // Long hex sequences length >= 16
    Regex::new(r"\b[0-9a-fA-F]{16,}\b").unwrap()
});

static RE_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-?\d+(?:\.\d+)?").unwrap()
});

/// Turns raw input into its masked form and decides whether it is dropped.
///
/// Removal patterns run left to right, each one seeing the output of the
/// previous; every match is replaced with the empty string. Rejection
/// patterns are checked against the masked text only.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    removals: Vec<Regex>,
    rejections: Vec<Regex>,
}

impl Preprocessor {
    pub fn new(removals: Vec<Regex>, rejections: Vec<Regex>) -> Self {
        Self { removals, rejections }
    }

    pub fn from_config(config: &CounterConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            removals: compile_all(&config.ignore)?,
            rejections: compile_all(&config.reject)?,
        })
    }

    /// Strips the volatile parts of typical log lines: timestamps, ids,
    /// addresses and numbers.
    pub fn log_defaults() -> Self {
        // Order matters: timestamps and addresses before bare numbers
        let removals = [&RE_TIMESTAMP, &RE_UUID, &RE_IPV6, &RE_IPV4, &RE_EMAIL, &RE_HEX, &RE_NUMBER]
            .into_iter()
            .map(|re| Regex::clone(re))
            .collect();
        Self { removals, rejections: Vec::new() }
    }

    /// Runs this preprocessor's patterns first, then `next`'s.
    pub fn chain(mut self, next: Preprocessor) -> Self {
        self.removals.extend(next.removals);
        self.rejections.extend(next.rejections);
        self
    }

    pub fn mask(&self, input: &str) -> String {
        let mut out = input.to_string();
        for re in &self.removals {
            out = re.replace_all(&out, "").into_owned();
        }
        out
    }

    pub fn reject(&self, masked: &str) -> bool {
        self.rejections.iter().any(|re| re.is_match(masked))
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|source| ConfigError::Pattern { pattern: p.clone(), source })
        })
        .collect()
}
