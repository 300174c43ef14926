pub mod network;
pub mod params;

pub use network::{Network, StopHandle, StopReason, TrainSummary};
pub use params::NetworkParams;
