//! Federated query execution
//!
//! The merger consumes a [`FederatedPlan`](crate::planner::FederatedPlan)
//! and produces one page plus the global total.
//!
//! # Guarantees
//!
//! - No record is fetched twice and none is skipped twice
//! - `total` is the sum of the eligible partitions' counts, whatever the page
//! - `items.len() == min(limit, total - (page - 1) * limit)` when that is
//!   non-negative, otherwise 0
//! - Items follow partition order, then each partition's sort order

mod errors;
mod merger;
mod result;

pub use errors::{ExecutorError, ExecutorErrorCode, ExecutorResult, Severity};
pub use merger::{FailurePolicy, MergeSettings, ResultMerger};
pub use result::{FederatedItem, PartitionOutcome, PartitionReport, QueryResult};
