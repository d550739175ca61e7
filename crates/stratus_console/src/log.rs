//! Routes `tracing` output through a [`PausableSink`], so log lines emitted
//! during a prompt are held back like any other output.

use std::io::{self, Write};
use std::sync::Arc;

use crate::PausableSink;

/// [`MakeWriter`](tracing_subscriber::fmt::MakeWriter) that writes each log
/// event to a [`PausableSink`] as a single write.
pub struct SinkMakeWriter<W> {
    sink: Arc<PausableSink<W>>,
}

impl<W> Clone for SinkMakeWriter<W> {
    fn clone(&self) -> Self {
        Self { sink: self.sink.clone() }
    }
}

impl<W> SinkMakeWriter<W> {
    pub fn new(sink: Arc<PausableSink<W>>) -> Self {
        Self { sink }
    }
}

impl<'a, W: Write + 'static> tracing_subscriber::fmt::MakeWriter<'a> for SinkMakeWriter<W> {
    type Writer = SinkLogWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        SinkLogWriter { sink: self.sink.clone(), buf: Vec::with_capacity(256) }
    }
}

/// Per-event writer. Collects the formatted event and appends it to the sink
/// on [`Drop`].
pub struct SinkLogWriter<W: Write> {
    sink: Arc<PausableSink<W>>,
    buf: Vec<u8>,
}

impl<W: Write> Write for SinkLogWriter<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Write> Drop for SinkLogWriter<W> {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }

        if self.sink.write(&self.buf).is_err() {
            // Held output is full or the terminal is gone. Stderr keeps the
            // event visible, out of order.
            let mut stderr = io::stderr();
            let _ = stderr.write_all(&self.buf);
            let _ = stderr.flush();
        }
    }
}
