//! Result types for federated query execution

use serde::Serialize;

use crate::partition::SchemaTag;
use crate::planner::{FetchWindow, NormalizedPage};
use crate::schema::QuestionRecord;

/// One record in the page, with the partition it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FederatedItem {
    pub partition: String,
    pub schema_tag: SchemaTag,
    pub record: QuestionRecord,
}

impl FederatedItem {
    /// `(partition, _id)`, unique across the federation
    pub fn identity(&self) -> (&str, &str) {
        (&self.partition, self.record.id())
    }
}

/// What happened to one candidate partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionOutcome {
    /// Items fetched into the page
    Fetched,
    /// Every match lies before the page
    Skipped,
    /// Page already full; counted only
    CountOnly,
    /// Count failed; contributed nothing
    CountFailed,
    /// Find failed; count retracted from the total
    FindFailed,
}

/// Per-partition execution record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionReport {
    pub partition: String,
    pub schema_tag: SchemaTag,
    /// Matches counted toward the total (0 after a failure)
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<FetchWindow>,
    pub fetched: u64,
    pub outcome: PartitionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of a federated query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// The page, in partition-major order
    pub items: Vec<FederatedItem>,
    /// Matches across all eligible partitions, independent of the page
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub partitions: Vec<PartitionReport>,
}

impl QueryResult {
    /// Result for a plan with no eligible partitions
    pub fn empty(page: &NormalizedPage) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: page.page,
            limit: page.limit,
            partitions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(self.limit.max(1))
    }

    /// True when any partition failed and was degraded
    pub fn is_degraded(&self) -> bool {
        self.partitions.iter().any(|r| {
            matches!(
                r.outcome,
                PartitionOutcome::CountFailed | PartitionOutcome::FindFailed
            )
        })
    }
}
