use std::sync::mpsc;

use serde::{Deserialize, Serialize};

/// Progress record sent by `Network::train_with_progress` each time the
/// dataset index wraps around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// Number of completed epochs, starting at 1.
    pub epoch: usize,
    pub max_epoch: usize,
    /// Error of the last sample of the epoch, not an epoch mean.
    pub training_error: f64,
}

/// Where per-epoch progress goes. `report` returns `false` once the
/// receiving side is gone.
pub trait ProgressSink {
    fn report(&self, stats: EpochStats) -> bool;
}

impl ProgressSink for mpsc::Sender<EpochStats> {
    fn report(&self, stats: EpochStats) -> bool {
        self.send(stats).is_ok()
    }
}

/// Blocks the training loop while the bounded channel is full.
impl ProgressSink for mpsc::SyncSender<EpochStats> {
    fn report(&self, stats: EpochStats) -> bool {
        self.send(stats).is_ok()
    }
}
