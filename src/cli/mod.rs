//! CLI module
//!
//! Command-line interface for iterating entities.
//!
//! # Commands
//!
//! - `fetch` - Stream every record of an entity to stdout
//! - `plan` - Show which pages each lane requests per round
//! - `validate` - Check a configuration file

mod commands;
mod runner;

pub use commands::{Cli, Commands, FetchArgs, OutputFormat};
pub use runner::Runner;
