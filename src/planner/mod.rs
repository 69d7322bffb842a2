//! Federated query planner
//!
//! The planner turns a logical filter and page request into a
//! deterministic, per-partition plan.
//!
//! # Design Principles
//!
//! - Deterministic: same partitions and request, same plan
//! - Total: malformed pages are clamped, never rejected
//! - Partition-major: candidates are ordered by partition name and the
//!   global ordering concatenates their local orderings

mod ast;
mod explain;
mod planner;

pub use ast::{
    LogicalFilter, NormalizedPage, PageBounds, PageRequest, SortDirection, SortSpec,
    RELEVANCE_FIELD,
};
pub use explain::{CandidateExplain, ExcludedExplain, ExplainPlan};
pub use planner::{
    Exclusion, ExclusionReason, FederatedPlan, FederatedPlanner, FetchWindow, PartitionPlan,
};
