//! Output sink that can hold writes back while a prompt is in progress.

use std::io::{self, Stdout, Write};
use std::sync::{Mutex, MutexGuard};

use stratus_domain::{ConsoleWriter, DEFAULT_BUFFER_CAPACITY};
use tracing::debug;

use crate::Error;

/// The two states of a [`PausableSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SinkState {
    /// Writes go straight to the underlying writer.
    Live,
    /// Writes are appended to the in-memory buffer.
    Paused,
}

#[derive(Debug, Clone, Copy)]
enum Transition {
    Pause,
    Resume,
}

#[derive(Debug)]
struct Inner<W> {
    state: SinkState,
    buffer: Vec<u8>,
    underlying: W,
}

impl<W: Write> Inner<W> {
    /// Applies a state transition. Resuming a paused sink flushes the buffer
    /// to the underlying writer and returns the number of bytes flushed.
    ///
    /// The buffer is emptied before it is written, so a failed flush loses
    /// the held bytes rather than replaying them on the next resume.
    fn apply(&mut self, transition: Transition) -> io::Result<usize> {
        match (self.state, transition) {
            (_, Transition::Pause) => {
                self.state = SinkState::Paused;
                Ok(0)
            }
            (SinkState::Live, Transition::Resume) => Ok(0),
            (SinkState::Paused, Transition::Resume) => {
                self.state = SinkState::Live;
                let pending = std::mem::take(&mut self.buffer);
                if pending.is_empty() {
                    return Ok(0);
                }
                self.underlying.write_all(&pending)?;
                self.underlying.flush()?;
                Ok(pending.len())
            }
        }
    }

    fn write(&mut self, buf: &[u8], capacity: usize) -> io::Result<usize> {
        match self.state {
            SinkState::Live => self.underlying.write(buf),
            SinkState::Paused => {
                let buffered = self.buffer.len();
                if buffered.saturating_add(buf.len()) > capacity
                    || self.buffer.try_reserve(buf.len()).is_err()
                {
                    return Err(io::Error::new(
                        io::ErrorKind::StorageFull,
                        Error::BufferFull { capacity, buffered, incoming: buf.len() },
                    ));
                }
                self.buffer.extend_from_slice(buf);
                Ok(buf.len())
            }
        }
    }
}

/// Thread-safe output sink with a LIVE and a PAUSED state.
///
/// While live, writes pass straight through to the wrapped writer. While
/// paused, writes are appended to a bounded in-memory buffer; [`resume`]
/// flushes that buffer in the order the writes were accepted.
///
/// One lock guards the state, the buffer and the wrapped writer, so no write
/// can slip between the state change and the flush. Nothing that logs through
/// `tracing` runs while the lock is held, which keeps it safe to route log
/// output into the sink itself.
///
/// [`resume`]: PausableSink::resume
#[derive(Debug)]
pub struct PausableSink<W = Stdout> {
    inner: Mutex<Inner<W>>,
    capacity: usize,
}

impl Default for PausableSink<Stdout> {
    fn default() -> Self {
        Self::new(io::stdout())
    }
}

impl<W> PausableSink<W> {
    /// Creates a live sink around `underlying` with [`DEFAULT_BUFFER_CAPACITY`].
    pub fn new(underlying: W) -> Self {
        Self::with_capacity(underlying, DEFAULT_BUFFER_CAPACITY)
    }

    /// Creates a live sink that holds at most `capacity` bytes while paused.
    pub fn with_capacity(underlying: W, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner { state: SinkState::Live, buffer: Vec::new(), underlying }),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<W>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn state(&self) -> SinkState {
        self.lock().state
    }

    pub fn is_paused(&self) -> bool {
        self.state() == SinkState::Paused
    }

    /// Bytes currently held back.
    pub fn buffered_len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Runs `f` with exclusive access to the wrapped writer, bypassing the
    /// buffer regardless of state. No other write can interleave with it.
    pub fn with_underlying<T>(&self, f: impl FnOnce(&mut W) -> T) -> T {
        f(&mut self.lock().underlying)
    }

    /// Consumes the sink, returning the wrapped writer together with any
    /// bytes still held back by a pause that was never resumed.
    pub fn into_parts(self) -> (W, Vec<u8>) {
        let inner = self.inner.into_inner().unwrap_or_else(|e| e.into_inner());
        (inner.underlying, inner.buffer)
    }
}

impl<W: Write> PausableSink<W> {
    /// Applies `transition` under the lock and returns the state it started
    /// from. Logging happens only after the lock is released.
    fn transition(&self, transition: Transition) -> (SinkState, io::Result<usize>) {
        let mut inner = self.lock();
        let before = inner.state;
        (before, inner.apply(transition))
    }

    /// Switches to PAUSED. Pausing an already paused sink changes nothing.
    pub fn pause(&self) {
        // Pausing never touches the writer, so it cannot fail.
        let (before, _) = self.transition(Transition::Pause);
        if before == SinkState::Live {
            debug!(state = %SinkState::Paused, "Output held");
        }
    }

    /// Switches to LIVE and flushes everything buffered since the pause.
    ///
    /// Returns the number of bytes flushed; zero when the sink was already
    /// live. On a write error the buffer is still cleared.
    pub fn resume(&self) -> io::Result<usize> {
        let (before, result) = self.transition(Transition::Resume);
        if before == SinkState::Paused {
            match &result {
                Ok(flushed) => debug!(state = %SinkState::Live, flushed, "Output released"),
                Err(err) => debug!(state = %SinkState::Live, error = %err, "Held output lost"),
            }
        }
        result
    }

    /// Pauses the sink until the returned guard is resumed or dropped.
    pub fn hold(&self) -> PauseGuard<'_, W> {
        self.pause();
        PauseGuard { sink: self, released: false }
    }

    /// Writes `buf` according to the current state. See [`SinkState`].
    ///
    /// A paused write is all-or-nothing: if it does not fit within the
    /// capacity it fails with [`io::ErrorKind::StorageFull`] carrying
    /// [`Error::BufferFull`], and nothing is buffered.
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf, self.capacity)
    }

    /// Flushes the wrapped writer when live. Buffered bytes stay buffered
    /// until [`resume`](Self::resume).
    pub fn flush(&self) -> io::Result<()> {
        let mut inner = self.lock();
        match inner.state {
            SinkState::Live => inner.underlying.flush(),
            SinkState::Paused => Ok(()),
        }
    }
}

impl<W: Write + Send> ConsoleWriter for PausableSink<W> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        PausableSink::write(self, buf)
    }

    fn flush(&self) -> io::Result<()> {
        PausableSink::flush(self)
    }
}

impl<W: Write> Write for &PausableSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        PausableSink::write(*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        PausableSink::flush(*self)
    }
}

/// RAII pause on a [`PausableSink`].
///
/// Dropping the guard resumes the sink and discards any flush error; call
/// [`PauseGuard::resume`] to observe it.
#[must_use = "dropping the guard resumes the sink immediately"]
pub struct PauseGuard<'a, W: Write> {
    sink: &'a PausableSink<W>,
    released: bool,
}

impl<W: Write> PauseGuard<'_, W> {
    pub fn resume(mut self) -> io::Result<usize> {
        self.released = true;
        self.sink.resume()
    }
}

impl<W: Write> Drop for PauseGuard<'_, W> {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.sink.resume();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;

    /// Writer whose contents stay observable after it is moved into a sink.
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Writer that rejects everything.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn fixture() -> (PausableSink<SharedBuffer>, SharedBuffer) {
        let out = SharedBuffer::default();
        (PausableSink::new(out.clone()), out)
    }

    #[test]
    fn test_pause_then_resume_scenario() {
        let (sink, out) = fixture();

        sink.write(b"a").unwrap();
        assert_eq!(out.contents(), "a");

        sink.pause();
        sink.write(b"b").unwrap();
        assert_eq!(out.contents(), "a");
        assert_eq!(sink.buffered_len(), 1);

        sink.write(b"c").unwrap();
        assert_eq!(sink.buffered_len(), 2);

        let actual = sink.resume().unwrap();
        assert_eq!(actual, 2);
        assert_eq!(out.contents(), "abc");
        assert_eq!(sink.buffered_len(), 0);
        assert_eq!(sink.state(), SinkState::Live);
    }

    #[test]
    fn test_pause_is_idempotent() {
        let (sink, _out) = fixture();

        sink.pause();
        sink.write(b"held").unwrap();
        sink.pause();

        assert!(sink.is_paused());
        assert_eq!(sink.state(), SinkState::Paused);
        assert_eq!(sink.buffered_len(), 4);
    }

    #[test]
    fn test_new_sink_is_live_with_default_capacity() {
        let (sink, _out) = fixture();

        assert!(!sink.is_paused());
        assert_eq!(sink.capacity(), DEFAULT_BUFFER_CAPACITY);
        assert_eq!(PausableSink::with_capacity(Vec::<u8>::new(), 16).capacity(), 16);
    }

    #[test]
    fn test_into_parts_returns_unflushed_bytes() {
        let sink = PausableSink::new(Vec::<u8>::new());
        sink.write(b"shown ").unwrap();
        sink.pause();
        sink.write(b"held").unwrap();

        let (underlying, leftover) = sink.into_parts();

        assert_eq!(underlying, b"shown ".to_vec());
        assert_eq!(leftover, b"held".to_vec());
    }

    #[test]
    fn test_resume_on_live_sink_flushes_nothing() {
        let (sink, out) = fixture();

        let actual = sink.resume().unwrap();

        assert_eq!(actual, 0);
        assert_eq!(out.contents(), "");
        assert_eq!(sink.state(), SinkState::Live);
    }

    #[test]
    fn test_live_write_error_is_propagated() {
        let sink = PausableSink::new(BrokenPipe);

        let actual = sink.write(b"x").unwrap_err().kind();
        let expected = io::ErrorKind::BrokenPipe;
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_failed_resume_still_clears_buffer() {
        let sink = PausableSink::new(BrokenPipe);
        sink.pause();
        sink.write(b"lost").unwrap();

        let actual = sink.resume().unwrap_err().kind();

        assert_eq!(actual, io::ErrorKind::BrokenPipe);
        assert_eq!(sink.buffered_len(), 0);
        assert_eq!(sink.state(), SinkState::Live);
    }

    #[test]
    fn test_paused_write_beyond_capacity_is_rejected() {
        let out = SharedBuffer::default();
        let sink = PausableSink::with_capacity(out.clone(), 4);
        sink.pause();
        sink.write(b"abc").unwrap();

        let err = sink.write(b"de").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::StorageFull);
        assert!(matches!(
            Error::from_io(&err),
            Some(Error::BufferFull { capacity: 4, buffered: 3, incoming: 2 })
        ));
        // The rejected write leaves no partial bytes behind.
        sink.write(b"d").unwrap();
        sink.resume().unwrap();
        assert_eq!(out.contents(), "abcd");
    }

    #[test]
    fn test_capacity_does_not_limit_live_writes() {
        let out = SharedBuffer::default();
        let sink = PausableSink::with_capacity(out.clone(), 1);

        sink.write(b"longer than capacity").unwrap();

        assert_eq!(out.contents(), "longer than capacity");
    }

    #[test]
    fn test_with_underlying_bypasses_buffer() {
        let (sink, out) = fixture();
        sink.pause();
        sink.write(b"held ").unwrap();

        sink.with_underlying(|w| w.write_all(b"direct ")).unwrap();
        sink.resume().unwrap();

        assert_eq!(out.contents(), "direct held ");
    }

    #[test]
    fn test_guard_resumes_on_drop() {
        let (sink, out) = fixture();
        {
            let _guard = sink.hold();
            sink.write(b"inside").unwrap();
            assert_eq!(out.contents(), "");
        }

        assert_eq!(sink.state(), SinkState::Live);
        assert_eq!(out.contents(), "inside");
    }

    #[test]
    fn test_guard_resume_reports_flushed_bytes() {
        let (sink, _out) = fixture();
        let guard = sink.hold();
        sink.write(b"12345").unwrap();

        let actual = guard.resume().unwrap();

        assert_eq!(actual, 5);
    }

    #[test]
    fn test_io_write_through_reference() {
        let (sink, out) = fixture();

        write!(&sink, "{}-{}", "a", 1).unwrap();

        assert_eq!(out.contents(), "a-1");
    }

    #[test]
    fn test_paused_writes_flush_in_submission_order() {
        let (sink, out) = fixture();
        let sink = Arc::new(sink);
        sink.pause();

        let handles: Vec<_> = (0..4)
            .map(|id| {
                let sink = sink.clone();
                thread::spawn(move || {
                    for n in 0..50 {
                        sink.write(format!("[{id}:{n}]").as_bytes()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        sink.resume().unwrap();

        let actual = out.contents();
        // Every write lands whole, and each writer's writes keep their order.
        for id in 0..4 {
            let positions: Vec<usize> = (0..50)
                .map(|n| actual.find(&format!("[{id}:{n}]")).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
        assert_eq!(actual.matches('[').count(), 200);
    }

    #[test]
    fn test_concurrent_live_writes_dont_interleave() {
        let (sink, out) = fixture();
        let sink = Arc::new(sink);
        let s1 = sink.clone();
        let s2 = sink.clone();

        let h1 = thread::spawn(move || s1.write(b"AAAABBBB").unwrap());
        let h2 = thread::spawn(move || s2.write(b"XXXXZZZZ").unwrap());
        h1.join().unwrap();
        h2.join().unwrap();

        let actual = out.contents();
        let valid_orderings = ["AAAABBBBXXXXZZZZ", "XXXXZZZZAAAABBBB"];
        assert!(
            valid_orderings.contains(&actual.as_str()),
            "Output was interleaved: {actual:?}"
        );
    }
}
