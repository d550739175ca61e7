mod console;
mod echo;
mod input;

pub use console::*;
pub use echo::*;
pub use input::*;
