use std::fmt;
use std::time::{Duration, Instant};

/// A stopwatch that tracks elapsed time, can be paused/resumed, and accumulates
/// time across runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stopwatch {
    started_at: Option<Instant>,
    elapsed: Duration,
}

impl Stopwatch {
    /// Start or resume the stopwatch
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.elapsed += started.elapsed();
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Total elapsed time, including the current run
    pub fn elapsed(&self) -> Duration {
        let current = self.started_at.map(|s| s.elapsed()).unwrap_or_default();
        self.elapsed + current
    }
}

impl fmt::Display for Stopwatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_elapsed_time(self.elapsed()))
    }
}

/// Formats elapsed time compactly:
/// - Less than 1 minute: "01s", "02s", etc.
/// - Less than 1 hour: "1:01m", "1:59m", etc.
/// - 1 hour or more: "1:01h", "2:30h", etc.
pub fn format_elapsed_time(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    if total_seconds < 60 {
        format!("{total_seconds:02}s")
    } else if total_seconds < 3600 {
        format!("{}:{:02}m", total_seconds / 60, total_seconds % 60)
    } else {
        format!("{}:{:02}h", total_seconds / 3600, (total_seconds % 3600) / 60)
    }
}
