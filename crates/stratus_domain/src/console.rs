use std::io;

/// Default upper bound on bytes a paused console holds back.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Trait for synchronized output writing.
/// Implementors must ensure thread-safe writes; a single call to `write` is
/// never split by a concurrent writer.
pub trait ConsoleWriter: Send + Sync {
    /// Writes bytes to the output.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;
    /// Flushes the output.
    fn flush(&self) -> io::Result<()>;

    /// Writes a full line, appending the trailing newline in the same write.
    fn write_line(&self, line: &str) -> io::Result<()> {
        let line = format!("{line}\n");
        let written = self.write(line.as_bytes())?;
        if written < line.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "console accepted a partial line",
            ));
        }
        Ok(())
    }
}

impl<T: ConsoleWriter + ?Sized> ConsoleWriter for std::sync::Arc<T> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }
}
