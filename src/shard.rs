use crate::config::{ConfigError, CounterConfig};
use crate::counter::Counter;
use crate::masking::Preprocessor;
use crate::telemetry::DebugSink;
use rayon::prelude::*;

/// Counts `inputs` across `shards` independent counters in parallel, then
/// folds their results into one counter.
///
/// Shards are contiguous slices, so each keeps the input order. The merge
/// runs sequentially in shard order. When a sink is given every counter,
/// the merging one included, reports to a clone of it.
pub fn count_sharded<S>(
    inputs: &[S],
    config: &CounterConfig,
    preprocessor: &Preprocessor,
    shards: usize,
    sink: Option<&DebugSink>,
) -> Result<Counter, ConfigError>
where
    S: AsRef<str> + Sync,
{
    let make = || -> Result<Counter, ConfigError> {
        let counter = Counter::with_preprocessor(config, preprocessor.clone())?;
        Ok(match sink {
            Some(s) => counter.with_debug(s.clone()),
            None => counter,
        })
    };

    let mut merged = make()?;
    if inputs.is_empty() {
        return Ok(merged);
    }
    let shard_len = inputs.len().div_ceil(shards.max(1));

    let partials: Vec<Counter> = inputs
        .par_chunks(shard_len)
        .map(|chunk| -> Result<Counter, ConfigError> {
            let mut c = make()?;
            for s in chunk {
                c.assign(s.as_ref());
            }
            tracing::debug!(counter = c.id(), lines = chunk.len(), groups = c.len(), "shard counted");
            Ok(c)
        })
        .collect::<Result<_, _>>()?;

    for partial in &partials {
        merged.merge(partial);
    }
    Ok(merged)
}
