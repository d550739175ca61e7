mod error;
mod reader;
mod stratus;

pub use error::*;
pub use reader::*;
pub use stratus::*;
