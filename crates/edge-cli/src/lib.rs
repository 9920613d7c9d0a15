//! Edge Watch CLI Library
//!
//! Configuration loading, argument parsing and the event watch loop behind
//! the `edge-watch` binary.

pub mod cli;
pub mod config;
pub mod error;
pub mod watch;

pub use cli::Cli;
pub use config::WatchConfig;
pub use error::{CliError, Result};
