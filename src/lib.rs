pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod data;
pub mod plot;
pub mod pipeline;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Dense;
pub use network::{FitConfig, LayeredNet, ManualNet, Model, ModelVariant, OptimizerKind, WeightInit};
pub use loss::chi2::Chi2Loss;
pub use optim::{Adam, Optimizer, Sgd};
pub use train::{evaluate_chi2, train_loop, EpochStats, TrainConfig};
pub use data::{DataError, Dataset, FitSet, Sample, StandardScaler};
pub use pipeline::{run_fit, FitOutcome};
