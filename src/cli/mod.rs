//! Command-line interface module.

mod args;
pub mod common;
pub mod convert;
pub mod watch;

pub use args::{Cli, Commands, CommonArgs, ConvertArgs, WatchArgs};
