use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "Output buffer full: {buffered} of {capacity} bytes held, cannot accept {incoming} more"
    )]
    BufferFull {
        capacity: usize,
        buffered: usize,
        incoming: usize,
    },

    #[error("Prompt cancelled")]
    Cancelled,

    #[error("No answer within {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("Input closed before an answer was read")]
    InputClosed,

    #[error("Failed to start input reader: {0}")]
    Spawn(#[source] std::io::Error),
}

impl Error {
    /// Recovers a [`Error::BufferFull`] carried inside an `io::Error`
    /// returned by [`crate::PausableSink`].
    pub fn from_io(err: &std::io::Error) -> Option<&Self> {
        err.get_ref().and_then(|inner| inner.downcast_ref::<Self>())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
