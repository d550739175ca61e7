//! Coordinated terminal I/O.
//!
//! [`PausableSink`] is an output sink that can hold back writes while paused.
//! [`Scanner`] pauses it for the duration of a prompt so background output
//! never lands in the middle of a question the operator is answering.

mod error;
mod input;
mod log;
mod scanner;
mod sink;

pub use error::*;
pub use input::*;
pub use log::*;
pub use scanner::*;
pub use sink::*;
