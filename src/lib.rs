pub mod config;
pub mod masking;
pub mod tree;
pub mod similarity;
pub mod counter;
pub mod telemetry;
pub mod shard;

pub use config::{ConfigError, CounterConfig, SplitPolicy};
pub use counter::{Counter, Group, Outcome};
pub use masking::Preprocessor;
