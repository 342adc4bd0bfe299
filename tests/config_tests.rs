use nearcount::{ConfigError, Counter, CounterConfig, SplitPolicy};

#[test]
fn zero_step_is_rejected() {
    let err = Counter::new(&CounterConfig::new(0, 0.7)).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidStep(0)));
}

#[test]
fn threshold_outside_unit_interval_is_rejected() {
    for t in [-0.1, 1.5, f64::NAN] {
        let err = Counter::new(&CounterConfig::new(2, t)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThreshold(_)), "threshold {t}");
    }
}

#[test]
fn threshold_bounds_are_valid() {
    assert!(Counter::new(&CounterConfig::new(1, 0.0)).is_ok());
    assert!(Counter::new(&CounterConfig::new(1, 1.0)).is_ok());
}

#[test]
fn zero_leaf_limit_is_rejected() {
    let config = CounterConfig::new(2, 0.7).with_split(SplitPolicy::Overflow { leaf_limit: 0 });
    assert!(matches!(config.validate(), Err(ConfigError::InvalidLeafLimit)));
}

#[test]
fn json_config_fills_defaults() {
    let config = CounterConfig::from_json(r#"{"step": 4, "ignore": ["\\d+"]}"#).unwrap();
    assert_eq!(config.step, 4);
    assert_eq!(config.score_threshold, 0.70);
    assert_eq!(config.split, SplitPolicy::Immediate);
    assert_eq!(config.ignore, vec![r"\d+".to_string()]);
    assert!(config.reject.is_empty());
}

#[test]
fn json_config_reads_overflow_split() {
    let config = CounterConfig::from_json(
        r#"{"score_threshold": 0.8, "split": {"overflow": {"leaf_limit": 3}}, "reject": ["^#"]}"#,
    )
    .unwrap();
    assert_eq!(config.split, SplitPolicy::Overflow { leaf_limit: 3 });
    assert_eq!(config.score_threshold, 0.8);
    assert!(config.validate().is_ok());
}
