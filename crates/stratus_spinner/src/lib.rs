use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Result, anyhow};
use colored::Colorize;
use crossbeam_channel::{RecvTimeoutError, Sender};
use stratus_domain::ConsoleWriter;
use tracing::debug;

mod stopwatch;

pub use stopwatch::*;

const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
const TICKS: &[&str; 10] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

struct Running {
    stop: Sender<()>,
    handle: JoinHandle<()>,
}

/// Writes a status line (`<tick> <message> <elapsed>`) at a fixed interval
/// from a background thread while a long operation runs.
///
/// Lines go through the given [`ConsoleWriter`], so a paused sink holds them
/// back like any other output. Elapsed time accumulates across start/stop
/// cycles until [`reset`](Self::reset).
pub struct StatusReporter<P: ConsoleWriter + 'static> {
    printer: Arc<P>,
    interval: Duration,
    stopwatch: Stopwatch,
    running: Option<Running>,
}

impl<P: ConsoleWriter + 'static> StatusReporter<P> {
    pub fn new(printer: Arc<P>) -> Self {
        Self { printer, interval: DEFAULT_INTERVAL, stopwatch: Stopwatch::default(), running: None }
    }

    /// Sets the time between status lines.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Starts reporting `message`, replacing any report already running.
    pub fn start(&mut self, message: &str) -> Result<()> {
        self.stop(None)?;
        self.stopwatch.start();

        let (stop, stopped) = crossbeam_channel::bounded::<()>(1);
        let printer = self.printer.clone();
        let interval = self.interval;
        let stopwatch = self.stopwatch;
        let message = message.to_string();

        let handle = thread::Builder::new()
            .name("stratus-status".to_string())
            .spawn(move || {
                for tick in TICKS.iter().cycle() {
                    let line = format!(
                        "{} {} {}",
                        tick.green(),
                        message.green().bold(),
                        stopwatch.to_string().white().dimmed()
                    );
                    if let Err(err) = printer.write_line(&line) {
                        debug!(error = %err, "Status line dropped");
                    }
                    match stopped.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })?;

        self.running = Some(Running { stop, handle });
        Ok(())
    }

    /// Stops the running report, if any, then prints `message`.
    pub fn stop(&mut self, message: Option<String>) -> Result<()> {
        if let Some(running) = self.running.take() {
            let _ = running.stop.send(());
            running
                .handle
                .join()
                .map_err(|_| anyhow!("Status reporter thread panicked"))?;
            self.stopwatch.stop();
        }

        if let Some(message) = message {
            self.printer.write_line(&message)?;
            self.printer.flush()?;
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.running.is_some()
    }

    /// Total time spent reporting since creation or the last reset.
    pub fn elapsed(&self) -> Duration {
        self.stopwatch.elapsed()
    }

    /// Resets the elapsed time to zero.
    /// Call this when starting a completely unrelated operation.
    pub fn reset(&mut self) {
        self.stopwatch.reset();
    }
}

impl<P: ConsoleWriter + 'static> Drop for StatusReporter<P> {
    fn drop(&mut self) {
        let _ = self.stop(None);
        let _ = self.printer.flush();
    }
}
