pub mod commands;
pub mod count;
pub mod resources;
pub mod validate;

pub use commands::{Cli, Commands};
