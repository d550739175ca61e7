use serde::{Deserialize, Serialize};

/// Where a prompt's text goes while its answer is being read.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PromptEcho {
    /// The prompt is queued in the paused sink with all other output and
    /// appears, in order, once the answer has been read.
    #[default]
    Buffered,
    /// The prompt is written straight to the underlying writer; background
    /// output is still held back until the answer arrives.
    Direct,
}
