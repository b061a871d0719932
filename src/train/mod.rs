pub mod trainer;
pub mod epoch_stats;
pub mod train_config;

pub use trainer::{evaluate_chi2, train_loop};
pub use epoch_stats::EpochStats;
pub use train_config::TrainConfig;
