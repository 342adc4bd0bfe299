//! Optional per-assignment debug records, delivered over a bounded channel.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignDebug {
    pub counter_id: usize,
    pub input: String,
    pub masked_input: String,
    pub rejected: bool,
    pub best_match: Option<String>,
    pub best_match_masked: Option<String>,
    pub best_match_score: f64,
    pub best_match_accepted: bool,
}

/// What [`DebugSink::emit`] does when the channel is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FullPolicy {
    #[default]
    Drop,
    Block,
}

#[derive(Debug, Clone)]
pub struct DebugSink {
    tx: Sender<AssignDebug>,
    policy: FullPolicy,
    dropped: u64,
}

pub fn debug_channel(capacity: usize, policy: FullPolicy) -> (DebugSink, Receiver<AssignDebug>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (DebugSink { tx, policy, dropped: 0 }, rx)
}

impl DebugSink {
    /// Never fails; a disconnected receiver or a full channel under
    /// [`FullPolicy::Drop`] loses the record.
    pub fn emit(&mut self, record: AssignDebug) {
        match self.policy {
            FullPolicy::Drop => match self.tx.try_send(record) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.dropped += 1;
                    tracing::trace!(dropped = self.dropped, "debug channel full, record dropped");
                }
                Err(TrySendError::Disconnected(_)) => self.dropped += 1,
            },
            FullPolicy::Block => {
                if self.tx.send(record).is_err() {
                    self.dropped += 1;
                }
            }
        }
    }

    /// Records this sink handle failed to deliver.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
