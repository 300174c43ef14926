use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::{
    activation::activation::ActivationFunction,
    error::{NetError, Result},
    layers::dense::{DeltaSource, Layer, LayerInput, LayerRole},
    math::matrix::Matrix,
    network::params::NetworkParams,
    train::epoch_stats::{EpochStats, ProgressSink},
};

const INPUT: usize = 0;
const HIDDEN: usize = 1;
const OUTPUT: usize = 2;

/// Cloneable handle that cancels a running `train` from another thread.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Idempotent; the training loop notices it before its next example.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The latest single-sample error reached the threshold.
    Converged,
    /// The epoch limit was reached first.
    MaxEpoch,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainSummary {
    pub reason: StopReason,
    pub epoch: usize,
    pub training_error: f64,
}

/// Fixed input → hidden → output network trained by online backpropagation
/// with momentum.
///
/// The input and hidden layers carry a bias unit; the output layer does not.
#[derive(Debug)]
pub struct Network {
    layers: [Layer; 3],
    learning_rate: f64,
    momentum: f64,
    global_error: f64,
    max_epoch: usize,
    epoch: usize,
    training_error: f64,
    stop_flag: Arc<AtomicBool>,
}

impl Network {
    /// Builds the network with sigmoid hidden/output layers. Weights come from
    /// `params.seed` when set, otherwise from OS entropy.
    pub fn new(params: &NetworkParams) -> Network {
        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Network::with_rng(params, &mut rng)
    }

    pub fn with_rng<R: Rng + ?Sized>(params: &NetworkParams, rng: &mut R) -> Network {
        let input = Layer::input(params.input_size, true);
        let hidden = Layer::connected(
            LayerRole::Hidden,
            params.hidden_size,
            true,
            &input,
            ActivationFunction::Sigmoid,
            rng,
        );
        let output = Layer::connected(
            LayerRole::Output,
            params.output_size,
            false,
            &hidden,
            ActivationFunction::Sigmoid,
            rng,
        );

        debug!(
            input = params.input_size,
            hidden = params.hidden_size,
            output = params.output_size,
            learning_rate = params.learning_rate,
            momentum = params.momentum,
            global_error = params.global_error,
            max_epoch = params.max_epoch,
            seeded = params.seed.is_some(),
            "network constructed"
        );

        Network {
            layers: [input, hidden, output],
            learning_rate: params.learning_rate,
            momentum: params.momentum,
            global_error: params.global_error,
            max_epoch: params.max_epoch,
            epoch: 0,
            training_error: 1.0,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn layer(&self, role: LayerRole) -> &Layer {
        &self.layers[Self::index_of(role)]
    }

    /// Overwrites the weights feeding into the hidden or output layer.
    pub fn set_weights(&mut self, role: LayerRole, weights: Matrix) -> Result<()> {
        self.layers[Self::index_of(role)].set_weights(weights)
    }

    /// Runs the layers strictly input → hidden → output; the prediction is
    /// then available from `output_results`.
    pub fn feed_forward(&mut self, input: &[f64]) -> Result<()> {
        self.layers[INPUT].compute_outputs(LayerInput::Raw(input))?;

        for i in 1..self.layers.len() {
            let (before, after) = self.layers.split_at_mut(i);
            after[0].compute_outputs(LayerInput::Previous(&before[i - 1]))?;
        }
        Ok(())
    }

    /// `feed_forward` followed by a copy of the output layer's values.
    pub fn predict(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.feed_forward(input)?;
        Ok(self.output_results().to_vec())
    }

    pub fn output_results(&self) -> &[f64] {
        self.layers[OUTPUT].neuron_outputs()
    }

    /// Completed epochs of the current (or last) `train` call.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Error of the most recently trained sample.
    pub fn training_error(&self) -> f64 {
        self.training_error
    }

    pub fn stop_training(&self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop_flag))
    }

    /// Blocking online training; see `train_with_progress`.
    pub fn train(&mut self, inputs: &[Vec<f64>], expected: &[Vec<f64>]) -> Result<TrainSummary> {
        self.train_with_progress(inputs, expected, None)
    }

    /// Cycles through the dataset one example at a time, updating the weights
    /// after every example, until one of:
    ///
    /// - the error of the example just trained is `<= global_error`,
    /// - `max_epoch` epochs have completed,
    /// - the stop flag is set (`NetError::TrainingAborted`).
    ///
    /// When `progress` is given, one `EpochStats` is reported per completed
    /// epoch; a dropped receiver aborts the run like the stop flag does.
    pub fn train_with_progress(
        &mut self,
        inputs: &[Vec<f64>],
        expected: &[Vec<f64>],
        progress: Option<&dyn ProgressSink>,
    ) -> Result<TrainSummary> {
        self.check_dataset(inputs, expected)?;

        self.epoch = 0;
        let mut index = 0;
        let mut disconnected = false;

        loop {
            if disconnected || self.stop_flag.load(Ordering::Relaxed) {
                warn!(epoch = self.epoch, error = self.training_error, "training aborted");
                return Err(NetError::TrainingAborted { epoch: self.epoch });
            }
            if self.epoch >= self.max_epoch {
                return Ok(self.finish(StopReason::MaxEpoch));
            }

            self.feed_forward(&inputs[index])?;
            self.back_propagation(&expected[index])?;

            index = (index + 1) % inputs.len();
            if index == 0 {
                self.epoch += 1;
                trace!(epoch = self.epoch, error = self.training_error, "epoch complete");

                if let Some(sink) = progress {
                    let stats = EpochStats {
                        epoch: self.epoch,
                        max_epoch: self.max_epoch,
                        training_error: self.training_error,
                    };
                    disconnected = !sink.report(stats);
                }
            }

            if self.training_error <= self.global_error {
                return Ok(self.finish(StopReason::Converged));
            }
        }
    }

    /// Walks output → hidden, updating each layer's incoming weights as soon
    /// as its deltas are known. The hidden deltas therefore see the output
    /// weights of this step, not the previous one.
    fn back_propagation(&mut self, expected: &[f64]) -> Result<()> {
        for i in (HIDDEN..=OUTPUT).rev() {
            let (head, tail) = self.layers.split_at_mut(i + 1);
            let (before, current) = head.split_at_mut(i);
            let layer = &mut current[0];

            let source = match tail.first() {
                Some(next) => DeltaSource::Next(next),
                None => DeltaSource::Target(expected),
            };
            layer.compute_layer_deltas(source)?;
            layer.update_weights(&before[i - 1], self.learning_rate, self.momentum)?;
        }

        self.training_error = self.layers[OUTPUT].compute_training_error(expected)?;
        Ok(())
    }

    fn check_dataset(&self, inputs: &[Vec<f64>], expected: &[Vec<f64>]) -> Result<()> {
        let input_width = self.layers[INPUT].size();
        let output_width = self.layers[OUTPUT].size();

        if inputs.is_empty() || inputs.len() != expected.len() {
            return Err(NetError::DimensionMismatch {
                op: "train",
                expected: (inputs.len().max(1), output_width),
                actual: (expected.len(), output_width),
            });
        }
        for (input, target) in inputs.iter().zip(expected) {
            if input.len() != input_width {
                return Err(NetError::DimensionMismatch {
                    op: "train",
                    expected: (1, input_width),
                    actual: (1, input.len()),
                });
            }
            if target.len() != output_width {
                return Err(NetError::DimensionMismatch {
                    op: "train",
                    expected: (1, output_width),
                    actual: (1, target.len()),
                });
            }
        }
        Ok(())
    }

    fn finish(&self, reason: StopReason) -> TrainSummary {
        info!(?reason, epoch = self.epoch, error = self.training_error, "training finished");
        TrainSummary {
            reason,
            epoch: self.epoch,
            training_error: self.training_error,
        }
    }

    fn index_of(role: LayerRole) -> usize {
        match role {
            LayerRole::Input => INPUT,
            LayerRole::Hidden => HIDDEN,
            LayerRole::Output => OUTPUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::logic::LogicGate;
    use std::sync::mpsc;

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    fn fixed_network(params: &NetworkParams) -> Network {
        let mut net = Network::new(params);
        net.set_weights(
            LayerRole::Hidden,
            Matrix::from_data(vec![vec![0.5, -0.4], vec![0.3, 0.9], vec![-0.2, 0.1]]).unwrap(),
        )
        .unwrap();
        net.set_weights(
            LayerRole::Output,
            Matrix::from_data(vec![vec![1.5], vec![-2.0], vec![0.25]]).unwrap(),
        )
        .unwrap();
        net
    }

    #[test]
    fn topology_is_fixed() {
        let net = Network::new(&NetworkParams { hidden_size: 4, ..Default::default() });

        assert!(net.layer(LayerRole::Input).weights().is_none());
        assert!(net.layer(LayerRole::Input).has_bias());
        assert!(net.layer(LayerRole::Hidden).has_bias());
        assert!(!net.layer(LayerRole::Output).has_bias());
        assert_eq!(net.layer(LayerRole::Hidden).weights().unwrap().shape(), (3, 4));
        assert_eq!(net.layer(LayerRole::Output).weights().unwrap().shape(), (5, 1));
    }

    #[test]
    fn seeded_construction_is_reproducible() {
        let params = NetworkParams { seed: Some(11), ..Default::default() };
        let a = Network::new(&params);
        let b = Network::new(&params);

        for role in [LayerRole::Hidden, LayerRole::Output] {
            let (wa, wb) = (a.layer(role).weights().unwrap(), b.layer(role).weights().unwrap());
            assert!(wa.equals(wb).unwrap());
        }
    }

    #[test]
    fn feed_forward_with_fixed_weights() {
        let mut net = fixed_network(&NetworkParams::default());

        net.feed_forward(&[1.0, 1.0]).unwrap();

        let h0 = sigmoid(0.5 + 0.3 - 0.2);
        let h1 = sigmoid(-0.4 + 0.9 + 0.1);
        let o = sigmoid(1.5 * h0 - 2.0 * h1 + 0.25);
        let out = net.output_results();
        assert_eq!(out.len(), 1);
        assert!((out[0] - o).abs() < 1e-12);
    }

    #[test]
    fn feed_forward_rejects_wrong_input_width() {
        let mut net = Network::new(&NetworkParams::default());
        assert!(matches!(
            net.feed_forward(&[1.0, 0.0, 1.0]),
            Err(NetError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn hidden_deltas_use_freshly_updated_output_weights() {
        let params = NetworkParams::default();
        let mut net = fixed_network(&params);

        net.feed_forward(&[1.0, 0.0]).unwrap();
        let hidden_out = net.layer(LayerRole::Hidden).outputs().to_vec();
        net.back_propagation(&[1.0]).unwrap();

        let out_delta = net.layer(LayerRole::Output).deltas()[0];
        let updated = net.layer(LayerRole::Output).weights().unwrap();
        let old = [1.5, -2.0, 0.25];
        for (j, &w) in old.iter().enumerate() {
            let step = params.learning_rate * hidden_out[j] * out_delta;
            assert!((updated.get(j, 0) - (w + step)).abs() < 1e-12);
        }

        let hidden_deltas = net.layer(LayerRole::Hidden).deltas();
        for j in 0..2 {
            let slope = hidden_out[j] * (1.0 - hidden_out[j]);
            let expected = updated.get(j, 0) * out_delta * slope;
            let stale = old[j] * out_delta * slope;
            assert!((hidden_deltas[j] - expected).abs() < 1e-12);
            assert!((hidden_deltas[j] - stale).abs() > 1e-6);
        }

        // hidden weights moved by the deltas just computed
        let hidden_weights = net.layer(LayerRole::Hidden).weights().unwrap();
        let step = params.learning_rate * 1.0 * hidden_deltas[0];
        assert!((hidden_weights.get(0, 0) - (0.5 + step)).abs() < 1e-12);
    }

    #[test]
    fn unreachable_threshold_runs_exactly_max_epoch() {
        let params = NetworkParams { global_error: 0.0, max_epoch: 50, seed: Some(3), ..Default::default() };
        let data = LogicGate::Xor.dataset();
        let mut net = Network::new(&params);

        let summary = net.train(&data.inputs, &data.expected).unwrap();

        assert_eq!(summary.reason, StopReason::MaxEpoch);
        assert_eq!(summary.epoch, 50);
        assert_eq!(net.epoch(), 50);
    }

    #[test]
    fn zero_max_epoch_trains_nothing() {
        let params = NetworkParams { max_epoch: 0, ..Default::default() };
        let data = LogicGate::And.dataset();
        let mut net = fixed_network(&params);
        let before = net.layer(LayerRole::Output).weights().unwrap().clone();

        let summary = net.train(&data.inputs, &data.expected).unwrap();

        assert_eq!(summary.epoch, 0);
        assert!(before.equals(net.layer(LayerRole::Output).weights().unwrap()).unwrap());
    }

    #[test]
    fn generous_threshold_stops_on_first_sample() {
        let params = NetworkParams { global_error: 1.0, ..Default::default() };
        let data = LogicGate::Or.dataset();
        let mut net = Network::new(&params);

        let summary = net.train(&data.inputs, &data.expected).unwrap();

        assert_eq!(summary.reason, StopReason::Converged);
        assert_eq!(summary.epoch, 0);
    }

    #[test]
    fn stop_before_train_aborts_immediately() {
        let data = LogicGate::Xor.dataset();
        let mut net = Network::new(&NetworkParams::default());

        net.stop_training();
        net.stop_training();

        assert_eq!(
            net.train(&data.inputs, &data.expected),
            Err(NetError::TrainingAborted { epoch: 0 })
        );
        assert!(net.stop_handle().is_stopped());
    }

    #[test]
    fn malformed_dataset_is_rejected() {
        let mut net = Network::new(&NetworkParams::default());

        assert!(net.train(&[], &[]).is_err());
        assert!(net.train(&[vec![0.0, 1.0]], &[vec![1.0], vec![0.0]]).is_err());
        assert!(net.train(&[vec![0.0]], &[vec![1.0]]).is_err());
        assert!(net.train(&[vec![0.0, 1.0]], &[vec![1.0, 0.0]]).is_err());
    }

    #[test]
    fn progress_reports_every_epoch() {
        let params = NetworkParams { global_error: 0.0, max_epoch: 5, seed: Some(1), ..Default::default() };
        let data = LogicGate::Xor.dataset();
        let mut net = Network::new(&params);
        let (tx, rx) = mpsc::channel();

        net.train_with_progress(&data.inputs, &data.expected, Some(&tx)).unwrap();
        drop(tx);

        let epochs: Vec<usize> = rx.iter().map(|s| s.epoch).collect();
        assert_eq!(epochs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn dropped_progress_receiver_aborts() {
        let params = NetworkParams { global_error: 0.0, max_epoch: 100, ..Default::default() };
        let data = LogicGate::Xor.dataset();
        let mut net = Network::new(&params);
        let (tx, rx) = mpsc::channel();
        drop(rx);

        let result = net.train_with_progress(&data.inputs, &data.expected, Some(&tx));
        assert_eq!(result, Err(NetError::TrainingAborted { epoch: 1 }));
    }
}
