use std::io::Write;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use stratus_console::{PausableSink, SinkMakeWriter};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Log lines are written through `sink`, so
/// they are held back while a prompt is waiting for an answer.
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_tracing<W: Write + Send + 'static>(sink: Arc<PausableSink<W>>, level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(SinkMakeWriter::new(sink))
        .try_init()
        .map_err(|err| anyhow!(err))
}
