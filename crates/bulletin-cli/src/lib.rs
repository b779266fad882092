//! Command line front end for the bulletin builder.

pub mod cli_args;

pub use cli_args::{BuildArgs, Cli, Command, ConfigCommand, OutlineArgs, ParamsArgs};
