pub mod logic;
pub mod noise;

pub use logic::{Dataset, LogicGate, LOGIC_INPUTS};
pub use noise::perturb;
