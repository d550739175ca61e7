use std::time::Duration;

use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use stratus_domain::{DEFAULT_BUFFER_CAPACITY, PromptEcho};

use crate::{Error, Result};

/// Root configuration for the `stratus` CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Setters)]
#[serde(default)]
#[setters(into)]
pub struct StratusConfig {
    pub prompt: PromptConfig,
    pub log: LogConfig,
}

impl StratusConfig {
    pub(crate) fn validate(self) -> Result<Self> {
        if self.prompt.buffer_capacity == 0 {
            return Err(Error::Invalid(
                "prompt.buffer_capacity must be greater than zero".to_string(),
            ));
        }
        if self.prompt.timeout_secs == Some(0) {
            return Err(Error::Invalid(
                "prompt.timeout_secs must be greater than zero when set".to_string(),
            ));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Setters)]
#[serde(default)]
#[setters(into)]
pub struct PromptConfig {
    /// Seconds to wait for an answer. Waits indefinitely when unset.
    pub timeout_secs: Option<u64>,
    pub echo: PromptEcho,
    /// Bytes of background output that may queue up during a prompt.
    pub buffer_capacity: usize,
}

impl PromptConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            echo: PromptEcho::default(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Setters)]
#[serde(default)]
#[setters(into)]
pub struct LogConfig {
    /// `EnvFilter` directive, e.g. `warn` or `stratus_console=debug`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "warn".to_string() }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_prompt_timeout_from_seconds() {
        let fixture = PromptConfig::default().timeout_secs(Some(30u64));
        let actual = fixture.timeout();
        let expected = Some(Duration::from_secs(30));
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_default_waits_indefinitely() {
        let actual = StratusConfig::default().prompt.timeout();
        let expected = None;
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let fixture =
            StratusConfig::default().prompt(PromptConfig::default().buffer_capacity(0usize));
        let actual = fixture.validate();
        assert!(matches!(actual, Err(Error::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let fixture = StratusConfig::default().prompt(PromptConfig::default().timeout_secs(Some(0u64)));
        let actual = fixture.validate();
        assert!(matches!(actual, Err(Error::Invalid(_))));
    }
}
