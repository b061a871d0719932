use serde::{Serialize, Deserialize};

/// Periodic training statistics emitted by `train_loop`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the loop
/// sends one `EpochStats` at every reporting interval. Receivers (e.g. the
/// studio SSE handler) use this to drive the live chi-squared chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number of this report.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Training chi-squared divided by the number of training points.
    pub train_chi2_per_point: f64,
    /// Test chi-squared per point, computed without gradient accumulation
    /// and never used for parameter updates.
    pub test_chi2_per_point: f64,
    /// Wall-clock duration of this reporting interval in milliseconds.
    pub elapsed_ms: u64,
}
