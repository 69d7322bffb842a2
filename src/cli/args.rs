//! CLI argument definitions using clap
//!
//! Commands:
//! - examdex query --data <dir> [--config <path>]
//! - examdex explain --data <dir> [--config <path>] [--text]
//! - examdex get <id> --data <dir> [--config <path>]
//! - examdex partitions --data <dir> [--config <path>]
//! - examdex syllabus --data <dir> [--prefix <number>]
//! - examdex paper <code>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// examdex - federated exam-question queries over collection exports
#[derive(Parser, Debug)]
#[command(name = "examdex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where the collections and engine configuration come from
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Directory of `<collection>.json` exports
    #[arg(long, default_value = "./data")]
    pub data: PathBuf,

    /// Path to engine configuration file (defaults apply when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one federated query read from stdin
    Query {
        #[command(flatten)]
        source: DataArgs,
    },

    /// Plan and run a query from stdin, reporting each partition
    Explain {
        #[command(flatten)]
        source: DataArgs,

        /// Print the plain-text rendering instead of JSON
        #[arg(long)]
        text: bool,
    },

    /// Find a question by `_id` in every partition
    Get {
        /// The question `_id`
        id: String,

        #[command(flatten)]
        source: DataArgs,
    },

    /// List discovered partitions
    Partitions {
        #[command(flatten)]
        source: DataArgs,
    },

    /// Print the syllabus hierarchy; with --prefix, also count its questions
    Syllabus {
        #[command(flatten)]
        source: DataArgs,

        /// Only the topic with this number and its descendants
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Parse a paper code such as 0610_s20_qp_32
    Paper {
        /// The paper code
        code: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let cli = Cli::try_parse_from(["examdex", "query", "--data", "/tmp/d"]).unwrap();
        match cli.command {
            Command::Query { source } => {
                assert_eq!(source.data, PathBuf::from("/tmp/d"));
                assert!(source.config.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_syllabus_prefix() {
        let cli =
            Cli::try_parse_from(["examdex", "syllabus", "--prefix", "2.1", "--config", "c.json"])
                .unwrap();
        match cli.command {
            Command::Syllabus { source, prefix } => {
                assert_eq!(prefix.as_deref(), Some("2.1"));
                assert_eq!(source.data, PathBuf::from("./data"));
                assert_eq!(source.config, Some(PathBuf::from("c.json")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_get() {
        let cli = Cli::try_parse_from(["examdex", "get", "65f0c0ffee", "--data", "bank"]).unwrap();
        match cli.command {
            Command::Get { id, source } => {
                assert_eq!(id, "65f0c0ffee");
                assert_eq!(source.data, PathBuf::from("bank"));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from(["examdex", "get"]).is_err());
    }

    #[test]
    fn test_parse_paper() {
        let cli = Cli::try_parse_from(["examdex", "paper", "0610_s20_qp_32"]).unwrap();
        assert!(matches!(cli.command, Command::Paper { code } if code == "0610_s20_qp_32"));
    }
}
