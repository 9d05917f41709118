// Command-line interface
// Argument definitions and the handlers behind each subcommand

mod args;
mod commands;

pub use args::{BatchArgs, Cli, Command, RunArgs, RunOverrides};
pub use commands::execute;
