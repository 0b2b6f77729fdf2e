mod args;
mod commands;
mod context;
mod handlers;

pub use args::{Cli, Commands, SortArg};
pub use commands::run;
