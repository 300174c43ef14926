pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod data;
pub mod train;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::{Layer, LayerRole};
pub use network::network::{Network, StopHandle, StopReason, TrainSummary};
pub use network::params::NetworkParams;
pub use data::logic::{Dataset, LogicGate};
pub use train::epoch_stats::EpochStats;
pub use train::worker::{spawn_training, TrainingHandle, TrainingReport};
pub use error::NetError;
