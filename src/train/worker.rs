use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::{
    data::logic::Dataset,
    error::Result,
    network::network::{Network, StopHandle, TrainSummary},
    train::epoch_stats::{EpochStats, ProgressSink},
};

/// Single-shot completion message sent by the worker when `train` returns.
#[derive(Debug)]
pub struct TrainingReport {
    /// The trained network, handed back for inference.
    pub network: Network,
    /// `Err(NetError::TrainingAborted)` when the run was cancelled; the
    /// network's outputs are then unconverged.
    pub outcome: Result<TrainSummary>,
    /// Wall-clock duration of the `train` call in milliseconds.
    pub elapsed_ms: u64,
}

/// Controller side of a background training run.
///
/// Dropping the handle without waiting leaves the worker running to
/// completion; call `stop` first to end it early.
pub struct TrainingHandle {
    stop: StopHandle,
    done_rx: mpsc::Receiver<TrainingReport>,
    thread: JoinHandle<()>,
}

impl TrainingHandle {
    /// Requests cancellation; the worker exits after at most one more example.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Blocks until the worker reports. Returns `None` only if the worker
    /// panicked before sending.
    pub fn wait(self) -> Option<TrainingReport> {
        let report = self.done_rx.recv().ok();
        let _ = self.thread.join();
        report
    }

    /// Waits up to `timeout` for the completion message.
    pub fn wait_timeout(&self, timeout: Duration) -> std::result::Result<TrainingReport, RecvTimeoutError> {
        self.done_rx.recv_timeout(timeout)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

/// Moves `network` onto a worker thread and trains it on `dataset`.
pub fn spawn_training(network: Network, dataset: Dataset) -> TrainingHandle {
    spawn_training_with_progress(network, dataset, None)
}

/// As `spawn_training`, also forwarding one `EpochStats` per epoch to
/// `progress_tx`.
pub fn spawn_training_with_progress(
    mut network: Network,
    dataset: Dataset,
    progress_tx: Option<mpsc::Sender<EpochStats>>,
) -> TrainingHandle {
    let stop = network.stop_handle();
    let (done_tx, done_rx) = mpsc::channel();

    let thread = thread::spawn(move || {
        debug!(rows = dataset.len(), "training worker started");
        let started = Instant::now();

        let sink = progress_tx.as_ref().map(|tx| tx as &dyn ProgressSink);
        let outcome = network.train_with_progress(&dataset.inputs, &dataset.expected, sink);
        let elapsed_ms = whole_millis(started.elapsed());

        // The controller may have stopped listening; nothing left to do then.
        let _ = done_tx.send(TrainingReport { network, outcome, elapsed_ms });
    });

    TrainingHandle { stop, done_rx, thread }
}

/// Saturates instead of wrapping for durations beyond `u64::MAX` ms.
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
