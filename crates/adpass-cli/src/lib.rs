//! The `adpass` binary's building blocks: configuration, bind credentials,
//! log files and the run orchestration around the account pipeline.

pub mod config;
pub mod credentials;
pub mod logfile;
pub mod run;

pub use config::{Cli, ConfigError, Settings};
pub use run::{Recipients, RunError, RunSummary, Runner};
