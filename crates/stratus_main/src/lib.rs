mod app;
mod cli;
mod logging;

pub use app::App;
pub use cli::{Cli, Command};
pub use logging::init_tracing;
