//! Prompting that holds back concurrent output until the answer is in.

use std::io::{self, BufRead, Stdout, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use stratus_domain::PromptEcho;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{Error, PausableSink, Result};

/// How often a waiting prompt checks for cancellation and its deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// What the reader thread produced for one request.
enum Event {
    Line(String),
    Eof,
    Failed(io::Error),
}

/// Outcome of one read that the prompt loop has to handle itself.
enum Read {
    Line(String),
    Failed(io::Error),
}

/// How an answer line was interpreted.
enum Reply<T> {
    Accept(T),
    Reprompt,
}

/// Reads input one line per request on a dedicated thread, so a waiting
/// prompt can still observe cancellation and timeouts.
///
/// Nothing is read ahead: the thread only reads after a request. A request
/// that outlives a timed-out prompt stays outstanding, and its line answers
/// the next prompt.
struct LineReader {
    requests: Sender<()>,
    lines: Receiver<Event>,
    pending: bool,
}

impl LineReader {
    fn spawn<R: BufRead + Send + 'static>(mut input: R) -> io::Result<Self> {
        let (requests, request_rx) = crossbeam_channel::unbounded::<()>();
        let (line_tx, lines) = crossbeam_channel::unbounded();

        thread::Builder::new()
            .name("stratus-input".to_string())
            .spawn(move || {
                for () in request_rx.iter() {
                    let mut line = String::new();
                    let event = match input.read_line(&mut line) {
                        Ok(0) => Event::Eof,
                        Ok(_) => Event::Line(line),
                        Err(err) => Event::Failed(err),
                    };
                    if line_tx.send(event).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self { requests, lines, pending: false })
    }

    fn next(
        &mut self,
        deadline: Option<(Instant, Duration)>,
        cancel: &CancellationToken,
    ) -> Result<Read> {
        if !self.pending {
            self.requests.send(()).map_err(|_| Error::InputClosed)?;
            self.pending = true;
        }

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let wait = match deadline {
                Some((at, timeout)) => {
                    let left = at.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return Err(Error::TimedOut(timeout));
                    }
                    left.min(POLL_INTERVAL)
                }
                None => POLL_INTERVAL,
            };

            match self.lines.recv_timeout(wait) {
                Ok(event) => {
                    self.pending = false;
                    return match event {
                        Event::Line(line) => Ok(Read::Line(line)),
                        Event::Failed(err) => Ok(Read::Failed(err)),
                        Event::Eof => Err(Error::InputClosed),
                    };
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Err(Error::InputClosed),
            }
        }
    }
}

/// Serializes prompt/answer cycles against one [`PausableSink`].
///
/// For the whole of a cycle the sink is paused: output from other threads
/// queues up behind the prompt instead of landing in the middle of it, and is
/// flushed in its original order once the answer has been read. Concurrent
/// calls on the same scanner run one after another.
///
/// By default a prompt waits for an answer indefinitely. A timeout and a
/// cancellation token can bound the wait.
///
/// Each scanner owns its input through a dedicated reader thread; use one
/// scanner per input source. Dropping a scanner whose last prompt timed out or
/// was cancelled does not interrupt that read: the thread stays blocked until
/// the input yields a line or ends, then exits.
pub struct Scanner<W: Write = Stdout> {
    sink: Arc<PausableSink<W>>,
    reader: Mutex<LineReader>,
    timeout: Option<Duration>,
    cancel: CancellationToken,
    echo: PromptEcho,
}

impl<W: Write> Scanner<W> {
    /// Creates a scanner reading answers from `input`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Spawn`] if the input reader thread cannot be started.
    pub fn new<R: BufRead + Send + 'static>(input: R, sink: Arc<PausableSink<W>>) -> Result<Self> {
        let reader = LineReader::spawn(input).map_err(Error::Spawn)?;
        Ok(Self {
            sink,
            reader: Mutex::new(reader),
            timeout: None,
            cancel: CancellationToken::new(),
            echo: PromptEcho::default(),
        })
    }

    /// Gives up on a prompt that has not been answered within `timeout`.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Abandons waiting prompts once `token` is cancelled.
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn echo(mut self, echo: PromptEcho) -> Self {
        self.echo = echo;
        self
    }

    pub fn sink(&self) -> &Arc<PausableSink<W>> {
        &self.sink
    }

    /// Shows `prompt` and returns the first whitespace-delimited word of the
    /// first non-blank answer line.
    ///
    /// Blank lines show the prompt again. Lines that cannot be read (invalid
    /// UTF-8, interrupted reads) are skipped silently.
    ///
    /// # Errors
    ///
    /// - [`Error::InputClosed`] when input ends before an answer.
    /// - [`Error::TimedOut`] when a timeout is configured and expires.
    /// - [`Error::Cancelled`] when the cancellation token fires.
    pub fn scan(&self, prompt: &str) -> Result<String> {
        self.cycle(prompt, |line| match first_token(line) {
            Some(token) => Reply::Accept(token),
            None => Reply::Reprompt,
        })
    }

    /// Asks a yes/no question. Accepts `y`, `yes`, `n` and `no` in any case;
    /// a blank line picks `default` when there is one. Anything else shows the
    /// prompt again.
    ///
    /// # Errors
    ///
    /// Same as [`Scanner::scan`].
    pub fn confirm(&self, prompt: &str, default: Option<bool>) -> Result<bool> {
        self.cycle(prompt, |line| parse_confirmation(line, default))
    }

    fn cycle<T>(&self, prompt: &str, mut interpret: impl FnMut(&str) -> Reply<T>) -> Result<T> {
        let mut reader = self.reader.lock().unwrap_or_else(|e| e.into_inner());
        // A timeout too large to represent as an instant never expires.
        let deadline = self
            .timeout
            .and_then(|timeout| Some((Instant::now().checked_add(timeout)?, timeout)));

        let pause = self.sink.hold();
        self.emit(prompt);

        loop {
            let line = match reader.next(deadline, &self.cancel)? {
                Read::Line(line) => line,
                Read::Failed(err) => {
                    debug!(error = %err, "Skipping unreadable input");
                    continue;
                }
            };

            match interpret(&line) {
                Reply::Accept(value) => {
                    if let Err(err) = pause.resume() {
                        warn!(error = %err, "Failed to flush output held during prompt");
                    }
                    return Ok(value);
                }
                Reply::Reprompt => self.emit(prompt),
            }
        }
    }

    fn emit(&self, prompt: &str) {
        let result = match self.echo {
            PromptEcho::Buffered => self.sink.write(prompt.as_bytes()).map(|_| ()),
            PromptEcho::Direct => self.sink.with_underlying(|out| {
                out.write_all(prompt.as_bytes())?;
                out.flush()
            }),
        };
        if let Err(err) = result {
            warn!(error = %err, echo = %self.echo, "Failed to write prompt");
        }
    }
}

fn first_token(line: &str) -> Option<String> {
    line.split_whitespace().next().map(str::to_owned)
}

fn parse_confirmation(line: &str, default: Option<bool>) -> Reply<bool> {
    let Some(token) = first_token(line) else {
        return default.map_or(Reply::Reprompt, Reply::Accept);
    };
    match token.to_ascii_lowercase().as_str() {
        "y" | "yes" => Reply::Accept(true),
        "n" | "no" => Reply::Accept(false),
        _ => Reply::Reprompt,
    }
}
