//! examdex CLI entry point
//!
//! Parses arguments, dispatches to the CLI module, and exits non-zero on
//! failure. The JSON error response has already been written to stdout;
//! the plain message goes to stderr.

use examdex::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
