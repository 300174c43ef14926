use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use logic_nn::{data::noise::perturb, spawn_training, Dataset, LogicGate, NetError, Network, NetworkParams};

/// Trains a 3-layer backpropagation network on a 2-input logic gate and
/// prints its predictions.
#[derive(Parser, Debug)]
#[command(name = "logic-nn", version)]
struct Cli {
    /// logic gate to learn: xor, and, or
    #[arg(short, long, default_value_t = LogicGate::Xor, value_parser = clap::value_parser!(LogicGate))]
    gate: LogicGate,

    /// JSON file with network parameters; flags below override its values
    #[arg(short, long)]
    config: Option<String>,

    /// number of hidden neurons
    #[arg(long)]
    hidden: Option<usize>,

    /// learning rate
    #[arg(long)]
    learning_rate: Option<f64>,

    /// momentum coefficient applied to the previous weight change
    #[arg(long)]
    momentum: Option<f64>,

    /// stop once the latest sample error is at or below this value
    #[arg(long)]
    global_error: Option<f64>,

    /// maximum number of epochs
    #[arg(long)]
    max_epoch: Option<usize>,

    /// seed for weight initialisation
    #[arg(long)]
    seed: Option<u64>,

    /// relative noise applied to inputs for the noisy test pass, 0 disables it
    #[arg(long, default_value_t = 0.2)]
    noise: f64,

    /// cancel training after this many milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// level of logging details (into stdout)
    #[arg(short, long, default_value_t = Level::INFO)]
    log_level: Level,
}

impl Cli {
    fn params(&self) -> Result<NetworkParams> {
        let mut params = match &self.config {
            Some(path) => NetworkParams::load_json(path).with_context(|| format!("failed to load config {path}"))?,
            None => NetworkParams::default(),
        };

        if let Some(hidden) = self.hidden {
            params.hidden_size = hidden;
        }
        if let Some(learning_rate) = self.learning_rate {
            params.learning_rate = learning_rate;
        }
        if let Some(momentum) = self.momentum {
            params.momentum = momentum;
        }
        if let Some(global_error) = self.global_error {
            params.global_error = global_error;
        }
        if let Some(max_epoch) = self.max_epoch {
            params.max_epoch = max_epoch;
        }
        if self.seed.is_some() {
            params.seed = self.seed;
        }
        Ok(params)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(cli.log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let dataset = cli.gate.dataset();
    let params = cli.params()?.sized_for(&dataset);
    info!(
        gate = %cli.gate,
        hidden = params.hidden_size,
        learning_rate = params.learning_rate,
        momentum = params.momentum,
        global_error = params.global_error,
        max_epoch = params.max_epoch,
        "start training"
    );

    let handle = spawn_training(Network::new(&params), dataset.clone());
    let report = match cli.time_limit_ms {
        Some(limit_ms) => match handle.wait_timeout(Duration::from_millis(limit_ms)) {
            Ok(report) => report,
            Err(_) => {
                warn!(limit_ms, "time limit reached, stopping training");
                handle.stop();
                handle.wait().context("training worker exited without reporting")?
            }
        },
        None => handle.wait().context("training worker exited without reporting")?,
    };

    let mut network = report.network;
    match report.outcome {
        Ok(summary) => println!(
            "Training finished: timelapse= {} millis, epoch= {}, error= {:.8} ({:?})",
            report.elapsed_ms, summary.epoch, summary.training_error, summary.reason
        ),
        Err(NetError::TrainingAborted { epoch }) => println!(
            "Training stopped: timelapse= {} millis, epoch= {} (results are unconverged)",
            report.elapsed_ms, epoch
        ),
        Err(e) => return Err(e.into()),
    }

    println!("Test results:");
    print_results(&mut network, &dataset, &dataset.inputs)?;

    if cli.noise > 0.0 {
        let mut rng = rand::thread_rng();
        let noisy: Vec<Vec<f64>> = dataset
            .inputs
            .iter()
            .map(|input| perturb(input, cli.noise, &mut rng))
            .collect();

        println!("Test with noise:");
        print_results(&mut network, &dataset, &noisy)?;
    }

    Ok(())
}

fn print_results(network: &mut Network, dataset: &Dataset, inputs: &[Vec<f64>]) -> Result<()> {
    for (input, expected) in inputs.iter().zip(&dataset.expected) {
        let outputs = network.predict(input)?;

        let shown_inputs: Vec<String> = input.iter().map(|x| format!("{x:.4}")).collect();
        let shown_expected: Vec<String> = expected.iter().map(|y| format!("{y:.1}")).collect();
        let shown_outputs: Vec<String> = outputs.iter().map(|y| format!("{y:.10}")).collect();

        println!(
            "{}  ({}) -> {}",
            shown_inputs.join("  "),
            shown_expected.join(" "),
            shown_outputs.join(" ")
        );
    }
    Ok(())
}
