use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::network::{LayeredNet, ManualNet, Model};
use crate::optim::{Adam, Optimizer, Sgd};

/// Which of the two numerically equivalent network implementations to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    Layered,
    Manual,
}

/// Weight initialization scheme. Biases always start at zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scheme")]
pub enum WeightInit {
    /// Truncated normal with a fixed standard deviation (default 1.0).
    TruncatedNormal { std_dev: f64 },
    /// Truncated normal at the Glorot scale sqrt(2 / (n_in + n_out)).
    Glorot,
}

impl WeightInit {
    /// Standard deviation for a layer of the given fan-in/fan-out.
    pub fn std_dev(&self, n_in: usize, n_out: usize) -> f64 {
        match self {
            WeightInit::TruncatedNormal { std_dev } => *std_dev,
            WeightInit::Glorot => (2.0 / (n_in + n_out) as f64).sqrt(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

/// A fully serializable description of one fit: data file, architecture,
/// initialization, optimizer and training schedule.
///
/// `FitConfig` can be saved to / loaded from JSON independently of any
/// trained weights, so a run configuration can be stored before the fit
/// starts. The binaries have no command-line interface — the console runner
/// uses `FitConfig::default()`, the studio edits a config through its form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitConfig {
    /// Whitespace-delimited input file: 5 header lines, then x / value / sigma columns.
    pub data_file: String,
    pub variant: ModelVariant,
    pub hidden_units: usize,
    pub activation: ActivationFunction,
    pub init: WeightInit,
    pub optimizer: OptimizerKind,
    pub learning_rate: f64,
    pub epochs: usize,
    /// Progress is reported every this many epochs.
    pub report_every: usize,
    /// Number of points assigned to the training subset; the rest are test.
    pub train_points: usize,
    /// Seeds the split shuffle, the weight draw and the noise draw, in that order.
    pub seed: u64,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            data_file: "data/gluon_q2_10.dat".to_owned(),
            variant: ModelVariant::Layered,
            hidden_units: 25,
            activation: ActivationFunction::Sigmoid,
            init: WeightInit::TruncatedNormal { std_dev: 1.0 },
            optimizer: OptimizerKind::Adam,
            learning_rate: 0.001,
            epochs: 20000,
            report_every: 1000,
            train_points: 800,
            seed: 42,
        }
    }
}

impl FitConfig {
    /// Builds the configured model variant, drawing weights from `rng`.
    /// One input feature, one output: x → xg(x).
    pub fn build_model(&self, rng: &mut StdRng) -> Box<dyn Model + Send> {
        let std_dev = self.init.std_dev(1, self.hidden_units);
        match self.variant {
            ModelVariant::Layered => Box::new(LayeredNet::new(
                1, self.hidden_units, 1, self.activation, std_dev, rng,
            )),
            ModelVariant::Manual => Box::new(ManualNet::new(
                1, self.hidden_units, 1, self.activation, std_dev, rng,
            )),
        }
    }

    /// Builds the configured optimizer with fresh state.
    pub fn build_optimizer(&self) -> Box<dyn Optimizer + Send> {
        match self.optimizer {
            OptimizerKind::Adam => Box::new(Adam::new(self.learning_rate)),
            OptimizerKind::Sgd => Box::new(Sgd::new(self.learning_rate)),
        }
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a `FitConfig` from a JSON file.
    pub fn load_json(path: &str) -> std::io::Result<FitConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glorot_scale_matches_fan_in_fan_out() {
        let init = WeightInit::Glorot;
        let expected = (2.0_f64 / (1.0 + 25.0)).sqrt();
        assert!((init.std_dev(1, 25) - expected).abs() < 1e-12);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = FitConfig {
            variant: ModelVariant::Manual,
            init: WeightInit::Glorot,
            optimizer: OptimizerKind::Sgd,
            ..FitConfig::default()
        };
        let path = std::env::temp_dir().join("parton_nn_config_roundtrip.json");
        config.save_json(path.to_str().unwrap()).unwrap();
        let loaded = FitConfig::load_json(path.to_str().unwrap()).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.variant, ModelVariant::Manual);
        assert_eq!(loaded.optimizer, OptimizerKind::Sgd);
        assert_eq!(loaded.epochs, config.epochs);
    }
}
