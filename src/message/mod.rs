mod command;
mod types;

pub use command::*;
pub use types::*;
