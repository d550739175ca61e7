use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use tracing::debug;

use crate::{Error, Result, StratusConfig};

const ENV_PREFIX: &str = "STRATUS";
const CONFIG_FILE: &str = "stratus.toml";

/// Loads [`StratusConfig`] from defaults, an optional TOML file and
/// `STRATUS_*` environment variables, in increasing order of precedence.
///
/// Nested keys use `__` in variable names:
/// `STRATUS_PROMPT__TIMEOUT_SECS=30` sets `prompt.timeout_secs`.
#[derive(Debug, Default)]
pub struct ConfigReader {
    path: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl ConfigReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads an explicit file instead of the default location. The file must
    /// exist.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Replaces the process environment as the variable source.
    pub fn env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Default config file location, `<config dir>/stratus/stratus.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stratus").join(CONFIG_FILE))
    }

    pub fn read(self) -> Result<StratusConfig> {
        if self.env.is_none() {
            // A missing .env is the common case.
            let _ = dotenvy::dotenv();
        }

        let mut builder = Config::builder();

        match &self.path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::NotFound(path.clone()));
                }
                builder = builder.add_source(toml_file(path).required(true));
            }
            None => {
                if let Some(path) = Self::default_path() {
                    debug!(path = %path.display(), "Looking for config file");
                    builder = builder.add_source(toml_file(&path).required(false));
                }
            }
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(self.env);

        let config: StratusConfig = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()
    }
}

fn toml_file(path: &Path) -> File<config::FileSourceFile, FileFormat> {
    File::from(path).format(FileFormat::Toml)
}
