//! CLI-specific error types
//!
//! Every CLI error is reported as `{"status":"error","code":...}` on stdout
//! and ends the process with a non-zero status.

use std::fmt;
use std::io;

use crate::engine::ConfigError;
use crate::executor::{ExecutorError, ExecutorErrorCode};
use crate::paper::PaperCodeError;
use crate::store::LoadError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Collection export directory could not be loaded
    LoadFailed,
    /// Request JSON did not describe a query
    InvalidRequest,
    /// Paper code did not parse
    InvalidPaperCode,
    /// Query execution error
    Query(ExecutorErrorCode),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "EXAMDEX_CLI_CONFIG_ERROR",
            Self::IoError => "EXAMDEX_CLI_IO_ERROR",
            Self::LoadFailed => "EXAMDEX_CLI_LOAD_FAILED",
            Self::InvalidRequest => "EXAMDEX_CLI_INVALID_REQUEST",
            Self::InvalidPaperCode => "EXAMDEX_CLI_INVALID_PAPER_CODE",
            Self::Query(code) => code.code(),
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Invalid request
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidRequest, msg)
    }

    /// Get the error code
    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<LoadError> for CliError {
    fn from(e: LoadError) -> Self {
        Self::new(CliErrorCode::LoadFailed, e.to_string())
    }
}

impl From<PaperCodeError> for CliError {
    fn from(e: PaperCodeError) -> Self {
        Self::new(CliErrorCode::InvalidPaperCode, e.to_string())
    }
}

impl From<ExecutorError> for CliError {
    fn from(e: ExecutorError) -> Self {
        Self::new(CliErrorCode::Query(e.code()), e.message())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
