use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    activation::activation::ActivationFunction,
    error::{NetError, Result},
    math::matrix::Matrix,
};

/// Position of a layer in the fixed input → hidden → output topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerRole {
    Input,
    Hidden,
    Output,
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LayerRole::Input => "input",
            LayerRole::Hidden => "hidden",
            LayerRole::Output => "output",
        };
        f.write_str(name)
    }
}

/// What a layer computes its outputs from.
#[derive(Debug, Clone, Copy)]
pub enum LayerInput<'a> {
    /// Raw feature vector; only the input layer accepts it.
    Raw(&'a [f64]),
    /// Outputs of the layer directly before this one.
    Previous(&'a Layer),
}

/// What a layer computes its deltas from.
#[derive(Debug, Clone, Copy)]
pub enum DeltaSource<'a> {
    /// Expected values for the current sample; only the output layer accepts it.
    Target(&'a [f64]),
    /// The layer directly after this one, whose deltas are already computed.
    Next(&'a Layer),
}

/// Weights feeding into a layer from the previous one, plus the state needed
/// to update them.
#[derive(Debug, Clone)]
struct Incoming {
    // (prev_size + prev_bias) × size
    weights: Matrix,
    // last applied delta-weight per cell, scaled by momentum on the next update
    previous_deltas: Matrix,
    activation: ActivationFunction,
}

#[derive(Debug, Clone)]
pub struct Layer {
    role: LayerRole,
    size: usize,
    has_bias: bool,
    outputs: Matrix,
    deltas: Matrix,
    incoming: Option<Incoming>,
}

impl Layer {
    /// Pass-through layer that only holds the raw features (and a bias cell).
    pub fn input(size: usize, has_bias: bool) -> Layer {
        Layer::with_incoming(LayerRole::Input, size, has_bias, None)
    }

    /// Fully connected layer fed by `prev`, with weights drawn uniformly from
    /// `[-1, 1)`.
    pub fn connected<R: Rng + ?Sized>(
        role: LayerRole,
        size: usize,
        has_bias: bool,
        prev: &Layer,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        let fan_in = prev.outputs.cols();
        let mut weights = Matrix::zeros(fan_in, size);
        weights.initialize(rng);

        let incoming = Incoming {
            weights,
            previous_deltas: Matrix::zeros(fan_in, size),
            activation,
        };
        Layer::with_incoming(role, size, has_bias, Some(incoming))
    }

    fn with_incoming(role: LayerRole, size: usize, has_bias: bool, incoming: Option<Incoming>) -> Layer {
        let width = size + usize::from(has_bias);
        let mut outputs = Matrix::zeros(1, width);
        if has_bias {
            outputs.set(0, size, 1.0);
        }

        Layer {
            role,
            size,
            has_bias,
            outputs,
            deltas: Matrix::zeros(1, width),
            incoming,
        }
    }

    pub fn role(&self) -> LayerRole {
        self.role
    }

    /// Number of neurons, not counting the bias unit.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn has_bias(&self) -> bool {
        self.has_bias
    }

    /// Full output row, including the trailing bias cell when present.
    pub fn outputs(&self) -> &[f64] {
        self.outputs.row_slice(0).unwrap_or(&[])
    }

    /// Neuron outputs without the bias cell.
    pub fn neuron_outputs(&self) -> &[f64] {
        &self.outputs()[..self.size]
    }

    pub fn deltas(&self) -> &[f64] {
        self.deltas.row_slice(0).unwrap_or(&[])
    }

    pub fn weights(&self) -> Option<&Matrix> {
        self.incoming.as_ref().map(|incoming| &incoming.weights)
    }

    pub fn activation(&self) -> Option<ActivationFunction> {
        self.incoming.as_ref().map(|incoming| incoming.activation)
    }

    /// Replaces the incoming weights and clears the momentum cache.
    pub fn set_weights(&mut self, weights: Matrix) -> Result<()> {
        let role = self.role;
        let incoming = self.incoming.as_mut().ok_or(NetError::InvalidSource {
            op: "set_weights",
            role,
        })?;
        if weights.shape() != incoming.weights.shape() {
            return Err(NetError::DimensionMismatch {
                op: "set_weights",
                expected: incoming.weights.shape(),
                actual: weights.shape(),
            });
        }

        incoming.previous_deltas = Matrix::zeros(weights.rows(), weights.cols());
        incoming.weights = weights;
        Ok(())
    }

    /// Input layer: copies the raw features verbatim.
    /// Other layers: `output[j] = activate(Σ_i prev.output[i] * weight[i][j])`.
    /// The bias cell stays pinned at 1 either way.
    pub fn compute_outputs(&mut self, source: LayerInput<'_>) -> Result<()> {
        match source {
            LayerInput::Raw(input) => {
                if self.role != LayerRole::Input {
                    return Err(self.invalid("compute_outputs(raw)"));
                }
                if input.len() != self.size {
                    return Err(NetError::DimensionMismatch {
                        op: "compute_outputs",
                        expected: (1, self.size),
                        actual: (1, input.len()),
                    });
                }
                self.outputs.load_row(input)
            }
            LayerInput::Previous(prev) => {
                let incoming = self
                    .incoming
                    .as_ref()
                    .ok_or(NetError::InvalidSource { op: "compute_outputs(previous)", role: self.role })?;

                let sums = prev.outputs.times(&incoming.weights)?;
                for j in 0..self.size {
                    let activated = incoming.activation.activate(sums.get(0, j));
                    self.outputs.set(0, j, activated);
                }
                Ok(())
            }
        }
    }

    /// Output layer: `delta[k] = (expected[k] - output[k]) * f'(output[k])`.
    /// Hidden layer: `delta[j] = (Σ_k next.weight[j][k] * next.delta[k]) * f'(output[j])`.
    pub fn compute_layer_deltas(&mut self, source: DeltaSource<'_>) -> Result<()> {
        let activation = self
            .activation()
            .ok_or(NetError::InvalidSource { op: "compute_layer_deltas", role: self.role })?;

        match source {
            DeltaSource::Target(expected) => {
                if self.role != LayerRole::Output {
                    return Err(self.invalid("compute_layer_deltas(target)"));
                }
                self.check_target("compute_layer_deltas", expected)?;

                for (k, &target) in expected.iter().enumerate() {
                    let output = self.outputs.get(0, k);
                    self.deltas.set(0, k, (target - output) * activation.derivative(output));
                }
                Ok(())
            }
            DeltaSource::Next(next) => {
                if self.role != LayerRole::Hidden {
                    return Err(self.invalid("compute_layer_deltas(next)"));
                }
                let next_weights = next
                    .weights()
                    .ok_or(NetError::InvalidSource { op: "compute_layer_deltas(next)", role: next.role })?;
                if next_weights.rows() != self.outputs.cols() {
                    return Err(NetError::DimensionMismatch {
                        op: "compute_layer_deltas",
                        expected: (self.outputs.cols(), next_weights.cols()),
                        actual: next_weights.shape(),
                    });
                }

                let next_deltas = next.deltas();
                for j in 0..self.size {
                    let sum: f64 = (0..next_weights.cols())
                        .map(|k| next_weights.get(j, k) * next_deltas[k])
                        .sum();
                    let output = self.outputs.get(0, j);
                    self.deltas.set(0, j, sum * activation.derivative(output));
                }
                Ok(())
            }
        }
    }

    /// Online update with momentum for every weight feeding into this layer:
    ///
    /// `Δw = lr * prev.output[j] * delta[k]`, `w += Δw + momentum * Δw_prev`,
    /// then `Δw_prev = Δw`.
    pub fn update_weights(&mut self, prev: &Layer, learning_rate: f64, momentum: f64) -> Result<()> {
        let role = self.role;
        let incoming = self
            .incoming
            .as_mut()
            .ok_or(NetError::InvalidSource { op: "update_weights", role })?;

        let prev_outputs = prev.outputs();
        if prev_outputs.len() != incoming.weights.rows() {
            return Err(NetError::DimensionMismatch {
                op: "update_weights",
                expected: (1, incoming.weights.rows()),
                actual: (1, prev_outputs.len()),
            });
        }

        for k in 0..self.size {
            let delta = self.deltas.get(0, k);
            for (j, &prev_output) in prev_outputs.iter().enumerate() {
                let delta_weight = learning_rate * prev_output * delta;
                let carried = momentum * incoming.previous_deltas.get(j, k);
                let weight = incoming.weights.get(j, k);

                incoming.weights.set(j, k, weight + delta_weight + carried);
                incoming.previous_deltas.set(j, k, delta_weight);
            }
        }
        Ok(())
    }

    /// `0.5 * Σ_k (expected[k] - output[k])²` for the sample currently held in
    /// the outputs.
    pub fn compute_training_error(&self, expected: &[f64]) -> Result<f64> {
        self.check_target("compute_training_error", expected)?;

        let sum: f64 = expected
            .iter()
            .zip(self.neuron_outputs())
            .map(|(target, output)| (target - output).powi(2))
            .sum();
        Ok(sum / 2.0)
    }

    fn check_target(&self, op: &'static str, expected: &[f64]) -> Result<()> {
        if expected.len() != self.size {
            return Err(NetError::DimensionMismatch {
                op,
                expected: (1, self.size),
                actual: (1, expected.len()),
            });
        }
        Ok(())
    }

    fn invalid(&self, op: &'static str) -> NetError {
        NetError::InvalidSource { op, role: self.role }
    }
}
