//! Retraining job lifecycle types.
//!
//! The status machine is `Idle -> Starting -> Running -> Completed | Failed`.
//! A new run may begin from `Idle`, `Completed` or `Failed`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    #[default]
    Idle,
    Starting,
    Running,
    Completed,
    Failed,
}

impl TrainingStatus {
    /// Whether a new run may be started from this status.
    pub fn can_start(self) -> bool {
        matches!(self, Self::Idle | Self::Completed | Self::Failed)
    }

    /// `Starting` or `Running`.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

// ---------------------------------------------------------------------------
// Hyperparameters
// ---------------------------------------------------------------------------

pub const DEFAULT_LEARNING_RATE: f64 = 0.00001;
pub const DEFAULT_NUM_EPOCHS: u32 = 5;
pub const DEFAULT_BATCH_SIZE: u32 = 1;

/// Body of `POST /retrain`. Range checks belong to the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub learning_rate: f64,
    pub num_epochs: u32,
    pub batch_size: u32,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            num_epochs: DEFAULT_NUM_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Polled progress of the current run.
///
/// `current_epoch` and `progress_percent` never move backwards within a
/// run; `current_loss` follows whatever the server reports.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TrainingProgress {
    pub current_epoch: u32,
    pub total_epochs: u32,
    pub current_loss: Option<f64>,
    pub progress_percent: f64,
}

impl TrainingProgress {
    /// Initial progress for a run of `total_epochs`.
    pub fn for_run(total_epochs: u32) -> Self {
        Self {
            total_epochs,
            ..Self::default()
        }
    }

    /// Fold one polled snapshot into the progress.
    pub fn merge(&mut self, epoch: Option<u32>, loss: Option<f64>, progress: Option<f64>) {
        if let Some(epoch) = epoch {
            self.current_epoch = self.current_epoch.max(epoch);
        }
        if loss.is_some() {
            self.current_loss = loss;
        }
        if let Some(progress) = progress {
            let clamped = progress.clamp(0.0, 100.0);
            if clamped > self.progress_percent {
                self.progress_percent = clamped;
            }
        }
    }

    /// Mark the run as finished.
    pub fn complete(&mut self) {
        self.progress_percent = 100.0;
        if self.total_epochs > 0 {
            self.current_epoch = self.current_epoch.max(self.total_epochs);
        }
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Exponential notation with five fractional digits, e.g. `1.00000e-5`.
pub fn format_learning_rate(rate: f64) -> String {
    let formatted = format!("{rate:.5e}");
    match formatted.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => formatted,
    }
}

/// Loss with four decimals, or `N/A` before the first report.
pub fn format_loss(loss: Option<f64>) -> String {
    loss.map(|l| format!("{l:.4}"))
        .unwrap_or_else(|| "N/A".to_string())
}
