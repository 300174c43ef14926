use serde::{Deserialize, Serialize};

use crate::data::logic::Dataset;

/// Construction parameters for a `Network`: layer widths plus the training
/// hyper-parameters.
///
/// Can be saved to / loaded from JSON. Fields missing from the file keep
/// their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
    pub learning_rate: f64,
    pub momentum: f64,
    /// Training stops once the latest single-sample error is at or below this.
    pub global_error: f64,
    pub max_epoch: usize,
    /// Seed for weight initialisation; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for NetworkParams {
    fn default() -> Self {
        NetworkParams {
            input_size: 2,
            hidden_size: 2,
            output_size: 1,
            learning_rate: 0.25,
            momentum: 0.9,
            global_error: 1e-5,
            max_epoch: 10_000,
            seed: None,
        }
    }
}

impl NetworkParams {
    /// Takes the input and output widths from `dataset`.
    pub fn sized_for(mut self, dataset: &Dataset) -> Self {
        self.input_size = dataset.input_width();
        self.output_size = dataset.output_width();
        self
    }

    /// Serializes the parameters to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes parameters from a JSON file.
    pub fn load_json(path: &str) -> std::io::Result<NetworkParams> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}
