use std::io::{self, BufReader, IsTerminal, Stdout};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use stratus_config::{ConfigReader, StratusConfig};
use stratus_console::{ConsoleInput, PausableSink, Scanner};
use stratus_domain::{ConsoleWriter, UserInput};
use stratus_spinner::StatusReporter;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::{Cli, Command};
use crate::init_tracing;

/// Wires the shared stdout sink, the prompt scanner and logging together.
pub struct App {
    sink: Arc<PausableSink<Stdout>>,
    input: ConsoleInput<Stdout>,
    cancel: CancellationToken,
}

impl App {
    pub fn init(cli: &Cli) -> Result<Self> {
        let reader = match &cli.config {
            Some(path) => ConfigReader::new().path(path),
            None => ConfigReader::new(),
        };
        let config = cli.apply(reader.read().context("Failed to load configuration")?);

        colored::control::set_override(io::stdout().is_terminal());

        let sink = Arc::new(PausableSink::with_capacity(
            io::stdout(),
            config.prompt.buffer_capacity,
        ));
        init_tracing(sink.clone(), &config.log.level)?;

        Self::with_config(sink, &config)
    }

    fn with_config(sink: Arc<PausableSink<Stdout>>, config: &StratusConfig) -> Result<Self> {
        let cancel = CancellationToken::new();
        let scanner = Scanner::new(BufReader::new(io::stdin()), sink.clone())?
            .timeout(config.prompt.timeout())
            .echo(config.prompt.echo)
            .cancellation(cancel.clone());

        debug!(
            timeout = ?config.prompt.timeout(),
            echo = %config.prompt.echo,
            capacity = sink.capacity(),
            "Console ready"
        );

        Ok(Self { sink, input: ConsoleInput::new(Arc::new(scanner)), cancel })
    }

    pub async fn run(self, command: Command) -> Result<ExitCode> {
        self.cancel_on_interrupt();

        let code = match command {
            Command::Ask { question } => {
                let answer = self.input.ask(&question).await?;
                self.sink.write_line(&answer)?;
                ExitCode::SUCCESS
            }
            Command::Confirm { question, default } => {
                let confirmed = self.input.confirm(&question, default.map(Into::into)).await?;
                self.sink.write_line(if confirmed { "yes" } else { "no" })?;
                exit_code(confirmed)
            }
            Command::Demo { interval_ms, task, question } => {
                self.demo(Duration::from_millis(interval_ms), &task, &question).await?
            }
        };

        ConsoleWriter::flush(&*self.sink)?;
        Ok(code)
    }

    async fn demo(&self, interval: Duration, task: &str, question: &str) -> Result<ExitCode> {
        let mut reporter = StatusReporter::new(self.sink.clone()).interval(interval);
        reporter.start(task)?;
        info!(task, "Background work started");

        let answer = self.input.confirm(question, Some(true)).await;
        let summary = match &answer {
            Ok(true) => format!("{task} confirmed after {}", reporter_elapsed(&reporter)),
            Ok(false) => format!("{task} declined after {}", reporter_elapsed(&reporter)),
            Err(_) => format!("{task} abandoned"),
        };
        reporter.stop(Some(summary))?;

        Ok(exit_code(answer?))
    }

    fn cancel_on_interrupt(&self) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, abandoning prompt");
                cancel.cancel();
            }
        });
    }
}

fn reporter_elapsed<P: ConsoleWriter + 'static>(reporter: &StatusReporter<P>) -> String {
    stratus_spinner::format_elapsed_time(reporter.elapsed())
}

fn exit_code(confirmed: bool) -> ExitCode {
    if confirmed { ExitCode::SUCCESS } else { ExitCode::from(1) }
}
