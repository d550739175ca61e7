use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use stratus_config::StratusConfig;
use stratus_domain::PromptEcho;

#[derive(Parser, Debug)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Path to a TOML configuration file.
    ///
    /// Defaults to `stratus/stratus.toml` under the user config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Seconds to wait for an answer before giving up.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Where prompt text goes while the answer is being read.
    ///
    /// `buffered` (the default) holds the prompt back with all other output,
    /// so it only appears after the answer has been typed. Use `direct` on an
    /// interactive terminal to see the question before answering.
    #[arg(long, global = true, value_enum)]
    pub echo: Option<EchoArg>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Applies command line overrides on top of the loaded configuration.
    pub fn apply(&self, mut config: StratusConfig) -> StratusConfig {
        if let Some(timeout) = self.timeout {
            config.prompt.timeout_secs = Some(timeout);
        }
        if let Some(echo) = self.echo {
            config.prompt.echo = echo.into();
        }
        config
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask a question and print the first word of the answer.
    Ask {
        question: String,
    },

    /// Ask a yes/no question. Exits with status 1 on "no".
    Confirm {
        question: String,

        /// Answer used when the line is left blank.
        #[arg(long, value_enum)]
        default: Option<Answer>,
    },

    /// Run a background status reporter while asking a question, to show
    /// that status output never splits the prompt.
    Demo {
        /// Milliseconds between status lines.
        #[arg(long, default_value_t = 250)]
        interval_ms: u64,

        /// Label for the background task.
        #[arg(long, default_value = "Deploying")]
        task: String,

        #[arg(default_value = "Continue? [Y/n] ")]
        question: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoArg {
    /// Show the prompt together with held output once answered.
    Buffered,
    /// Show the prompt immediately; other output is still held.
    Direct,
}

impl From<EchoArg> for PromptEcho {
    fn from(value: EchoArg) -> Self {
        match value {
            EchoArg::Buffered => PromptEcho::Buffered,
            EchoArg::Direct => PromptEcho::Direct,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl From<Answer> for bool {
    fn from(value: Answer) -> Self {
        value == Answer::Yes
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_confirm_with_default() {
        let fixture = Cli::parse_from(["stratus", "confirm", "Deploy?", "--default", "no"]);
        let actual = fixture.command;
        let expected = Command::Confirm {
            question: "Deploy?".to_string(),
            default: Some(Answer::No),
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_demo_defaults() {
        let fixture = Cli::parse_from(["stratus", "demo"]);
        let actual = fixture.command;
        let expected = Command::Demo {
            interval_ms: 250,
            task: "Deploying".to_string(),
            question: "Continue? [Y/n] ".to_string(),
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_global_overrides_apply_to_config() {
        let fixture =
            Cli::parse_from(["stratus", "ask", "Region?", "--timeout", "30", "--echo", "direct"]);

        let actual = fixture.apply(StratusConfig::default());

        assert_eq!(actual.prompt.timeout_secs, Some(30));
        assert_eq!(actual.prompt.echo, PromptEcho::Direct);
    }

    #[test]
    fn test_echo_help_explains_buffered_prompt() {
        let mut command = Cli::command();
        let help = command.render_long_help().to_string();

        assert!(help.contains("only appears after the answer has been typed"), "{help}");
        assert!(help.contains("Show the prompt immediately"), "{help}");
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let fixture = Cli::parse_from(["stratus", "ask", "Region?"]);
        let config = StratusConfig::default();

        let actual = fixture.apply(config.clone());

        assert_eq!(actual, config);
    }
}
