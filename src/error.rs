use thiserror::Error;

use crate::layers::dense::LayerRole;

/// Fatal conditions raised by the matrix, layer and network operations.
///
/// None of these are retried internally: a shape mismatch means the topology
/// or the data is malformed, and an aborted run leaves the network with
/// partial, unconverged weights.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetError {
    /// Two operands (or an operand and a layer) have incompatible shapes.
    /// Shapes are reported as `(rows, cols)`.
    #[error("{op}: dimension mismatch (expected {expected:?}, got {actual:?})")]
    DimensionMismatch {
        op: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// A layer was handed a source it cannot consume, e.g. a raw feature
    /// vector fed to the hidden layer.
    #[error("{op} is not valid for the {role} layer")]
    InvalidSource { op: &'static str, role: LayerRole },

    /// Training was cancelled before it converged or hit the epoch limit.
    #[error("training aborted at epoch {epoch}")]
    TrainingAborted { epoch: usize },
}

pub type Result<T> = std::result::Result<T, NetError>;
