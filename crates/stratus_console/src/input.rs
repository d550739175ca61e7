use std::io::{Stdout, Write};
use std::sync::Arc;

use anyhow::Result;
use stratus_domain::UserInput;

use crate::Scanner;

/// [`UserInput`] backed by a [`Scanner`]. Blocking reads run on tokio's
/// blocking pool.
pub struct ConsoleInput<W: Write = Stdout> {
    scanner: Arc<Scanner<W>>,
}

impl<W: Write> Clone for ConsoleInput<W> {
    fn clone(&self) -> Self {
        Self { scanner: self.scanner.clone() }
    }
}

impl<W: Write + Send + 'static> ConsoleInput<W> {
    pub fn new(scanner: Arc<Scanner<W>>) -> Self {
        Self { scanner }
    }

    async fn prompt<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Scanner<W>) -> crate::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let scanner = self.scanner.clone();
        Ok(tokio::task::spawn_blocking(move || f(&scanner)).await??)
    }
}

#[async_trait::async_trait]
impl<W: Write + Send + 'static> UserInput for ConsoleInput<W> {
    async fn ask(&self, question: &str) -> Result<String> {
        let question = question.to_string();
        self.prompt(move |scanner| scanner.scan(&question)).await
    }

    async fn confirm(&self, question: &str, default: Option<bool>) -> Result<bool> {
        let question = question.to_string();
        self.prompt(move |scanner| scanner.confirm(&question, default))
            .await
    }
}
