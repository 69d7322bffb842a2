//! Executor error types
//!
//! Error codes:
//! - EXAMDEX_PARTITION_UNAVAILABLE (ERROR)
//! - EXAMDEX_PARTITION_TIMEOUT (ERROR)
//! - EXAMDEX_QUERY_CANCELLED (INFO)
//!
//! Partition errors reach the caller only under the fail-fast policy; the
//! degrade policy absorbs them into the result.

use std::fmt;
use std::time::Duration;

/// Severity levels for executor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller-initiated stop, not a fault
    Info,
    /// Query failed but the engine is healthy
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Executor error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorErrorCode {
    /// A partition call returned an error
    PartitionUnavailable,
    /// A partition call exceeded its timeout
    PartitionTimeout,
    /// The caller cancelled the query
    QueryCancelled,
}

impl ExecutorErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutorErrorCode::PartitionUnavailable => "EXAMDEX_PARTITION_UNAVAILABLE",
            ExecutorErrorCode::PartitionTimeout => "EXAMDEX_PARTITION_TIMEOUT",
            ExecutorErrorCode::QueryCancelled => "EXAMDEX_QUERY_CANCELLED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            ExecutorErrorCode::QueryCancelled => Severity::Info,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ExecutorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Executor error type with full context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorError {
    /// Error code
    code: ExecutorErrorCode,
    /// Human-readable message
    message: String,
    /// Partition the error came from, if any
    partition: Option<String>,
}

impl ExecutorError {
    /// Create a partition-unavailable error
    pub fn partition_unavailable(partition: impl Into<String>, reason: impl Into<String>) -> Self {
        let partition = partition.into();
        Self {
            code: ExecutorErrorCode::PartitionUnavailable,
            message: format!("partition '{}' unavailable: {}", partition, reason.into()),
            partition: Some(partition),
        }
    }

    /// Create a partition-timeout error
    pub fn partition_timeout(partition: impl Into<String>, timeout: Duration) -> Self {
        let partition = partition.into();
        Self {
            code: ExecutorErrorCode::PartitionTimeout,
            message: format!(
                "partition '{}' did not answer within {}ms",
                partition,
                timeout.as_millis()
            ),
            partition: Some(partition),
        }
    }

    /// Create a cancellation error
    pub fn cancelled() -> Self {
        Self {
            code: ExecutorErrorCode::QueryCancelled,
            message: "query cancelled by caller".to_string(),
            partition: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutorErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the failing partition, if any
    pub fn partition(&self) -> Option<&str> {
        self.partition.as_deref()
    }

    /// Returns whether this error came from a partition call
    pub fn is_partition_failure(&self) -> bool {
        matches!(
            self.code,
            ExecutorErrorCode::PartitionUnavailable | ExecutorErrorCode::PartitionTimeout
        )
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )
    }
}

impl std::error::Error for ExecutorError {}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;
