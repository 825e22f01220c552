// User-visible status line: download progress and run-dependency countdown.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

/// Receives the current stage of a load as a short status line.
pub trait StatusSink: Send + Sync {
    fn set_status(&self, text: &str);
}

impl<F> StatusSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn set_status(&self, text: &str) {
        self(text)
    }
}

/// Discards status updates.
pub struct NullStatus;

impl StatusSink for NullStatus {
    fn set_status(&self, _text: &str) {}
}

/// Writes status updates to the log.
pub struct LogStatus;

impl StatusSink for LogStatus {
    fn set_status(&self, text: &str) {
        info!("status: {}", text);
    }
}

const SIZE_UNITS: [&str; 4] = ["B", "kB", "MB", "GB"];

/// `1536` -> `1.5 kB`. Two decimals at most, trailing zeros dropped.
pub fn human_file_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < SIZE_UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

pub fn download_status(loaded: u64, total: u64) -> String {
    if loaded == 0 {
        "Downloading...".to_string()
    } else {
        format!(
            "Downloading... ({}/{})",
            human_file_size(loaded),
            human_file_size(total)
        )
    }
}

#[derive(Default)]
struct MonitorState {
    total: usize,
    remaining: usize,
}

/// Turns the host's pending run-dependency count into "Preparing... (n/total)".
pub struct DependencyMonitor {
    status: Arc<dyn StatusSink>,
    state: Mutex<MonitorState>,
}

impl DependencyMonitor {
    pub fn new(status: Arc<dyn StatusSink>) -> Self {
        Self {
            status,
            state: Mutex::new(MonitorState::default()),
        }
    }

    /// Called with the number of dependencies still pending after each change.
    pub fn observe(&self, left: usize) {
        let text = {
            let mut state = self.state.lock();
            let text = if left < state.remaining {
                Some(format!(
                    "Preparing... ({}/{})",
                    state.total.saturating_sub(left),
                    state.total
                ))
            } else {
                state.total += left - state.remaining;
                None
            };
            state.remaining = left;
            text
        };
        if let Some(text) = text {
            self.status.set_status(&text);
        }
    }

    /// `(done, total)` so far.
    pub fn progress(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.total - state.remaining, state.total)
    }
}
