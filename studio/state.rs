use std::sync::{Arc, Mutex, atomic::AtomicBool, mpsc};
use parton_nn::{EpochStats, FitConfig};

// ---------------------------------------------------------------------------
// Training status
// ---------------------------------------------------------------------------

pub enum TrainingStatus {
    /// No fit has been started yet.
    Idle,
    /// A fit is running in a background thread.
    Running {
        stop_flag: Arc<AtomicBool>,
        epoch_rx: Arc<Mutex<mpsc::Receiver<EpochStats>>>,
        total_epochs: usize,
    },
    /// The fit completed (naturally or via Stop) and the plot is available.
    /// `was_stopped` is true when the user clicked Stop before all epochs finished.
    Done {
        train_chi2_per_point: f64,
        test_chi2_per_point: f64,
        elapsed_total_ms: u64,
        was_stopped: bool,
    },
    /// The fit failed with an error (e.g. an unreadable data file).
    Failed {
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Flash messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum FlashKind { Success, Error }

#[derive(Debug, Clone)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub text: String,
}

impl FlashMessage {
    pub fn success(text: impl Into<String>) -> Self {
        FlashMessage { kind: FlashKind::Success, text: text.into() }
    }
    pub fn error(text: impl Into<String>) -> Self {
        FlashMessage { kind: FlashKind::Error, text: text.into() }
    }
}

// ---------------------------------------------------------------------------
// Main state struct
// ---------------------------------------------------------------------------

pub struct StudioState {
    /// Fit configuration edited through the form.
    pub config: FitConfig,
    /// Current fit lifecycle state.
    pub training: TrainingStatus,
    /// History of all progress reports from the most recent run.
    pub epoch_history: Vec<EpochStats>,
    /// Rendered fit plot (available after a run completes).
    pub plot_svg: Option<String>,
    /// One-shot flash message for the next page render.
    pub flash: Option<FlashMessage>,
}

impl StudioState {
    pub fn new() -> Self {
        StudioState {
            config: FitConfig::default(),
            training: TrainingStatus::Idle,
            epoch_history: Vec::new(),
            plot_svg: None,
            flash: None,
        }
    }

    pub fn training_running(&self) -> bool {
        matches!(self.training, TrainingStatus::Running { .. })
    }

    /// Takes and returns the current flash message, clearing it.
    pub fn take_flash(&mut self) -> Option<FlashMessage> {
        self.flash.take()
    }
}

/// Shared state type — an `Arc<Mutex<StudioState>>` passed to every handler.
pub type SharedState = Arc<Mutex<StudioState>>;
