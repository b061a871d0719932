use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};
use crate::train::epoch_stats::EpochStats;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`       — total number of full-batch passes
/// - `report_every` — console/channel reporting interval in epochs
/// - `progress_tx`  — optional channel sender; one `EpochStats` is sent per
///                    reporting interval.  If the receiver is dropped the
///                    loop terminates early (clean shutdown).
/// - `stop_flag`    — optional atomic flag; when set to `true` from another
///                    thread the loop terminates after the current epoch.
pub struct TrainConfig {
    pub epochs: usize,
    pub report_every: usize,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` with no progress channel and no stop flag.
    pub fn new(epochs: usize, report_every: usize) -> Self {
        TrainConfig {
            epochs,
            report_every,
            progress_tx: None,
            stop_flag: None,
        }
    }
}
