use anyhow::Result;

/// Collects answers from the operator before commands act on them.
#[async_trait::async_trait]
pub trait UserInput: Send + Sync {
    /// Asks a free-text question and returns the first word of the answer.
    async fn ask(&self, question: &str) -> Result<String>;

    /// Asks a yes/no question. `default` is used when the operator just
    /// presses enter.
    async fn confirm(&self, question: &str, default: Option<bool>) -> Result<bool>;
}
