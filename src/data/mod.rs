pub mod dataset;
pub mod scaler;
pub mod noise;

pub use dataset::{DataError, Dataset, FitSet, Sample};
pub use scaler::StandardScaler;
