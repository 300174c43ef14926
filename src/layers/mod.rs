pub mod dense;

pub use dense::{DeltaSource, Layer, LayerInput, LayerRole};
