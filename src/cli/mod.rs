//! CLI module for examdex
//!
//! Provides command-line interface for:
//! - query: One-shot federated query (request JSON on stdin)
//! - explain: Per-partition execution report for a query
//! - get: One question by `_id`, searched in every partition
//! - partitions: Discovered partitions and their shapes
//! - syllabus: Syllabus hierarchy, optionally below a prefix with its
//!   question count
//! - paper: Paper-code metadata

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, DataArgs};
pub use commands::{run, run_command, QueryRequest};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};
