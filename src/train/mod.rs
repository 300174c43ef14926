pub mod epoch_stats;
pub mod worker;

pub use epoch_stats::EpochStats;
pub use worker::{spawn_training, spawn_training_with_progress, TrainingHandle, TrainingReport};
