//! Federated query planner
//!
//! Turns a logical filter and page request into an ordered list of
//! per-partition plans. Candidates are ordered by partition name, which
//! fixes the partition-major global ordering the merger pages through.
//!
//! Eligibility, in order:
//! 1. Schema tag is in the filter's tag set (when non-empty)
//! 2. Paper is in the filter's paper set (when non-empty); shared
//!    partitions stay eligible with a local `paper` clause instead
//! 3. The dispatcher has a shape for the tag

use serde::Serialize;

use super::ast::{LogicalFilter, NormalizedPage, PageBounds, PageRequest};
use crate::observability::{log_event_with_fields, trace_event, Event};
use crate::partition::Partition;
use crate::schema::{QuestionShape, SchemaDispatcher};
use crate::store::Predicate;
use crate::syllabus::PrefixSet;

/// Window the merger fetches from one partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FetchWindow {
    pub skip: u64,
    pub limit: u64,
}

/// One candidate partition and the predicate it is queried with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    pub partition: Partition,
    pub local_filter: Predicate,
}

/// Why a partition was left out of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Tag not in the filter's tag set
    SchemaTagFiltered,
    /// Paper not in the filter's paper set
    PaperFiltered,
    /// No shape registered for the tag
    UnmappedShape,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::SchemaTagFiltered => "schema_tag_filtered",
            ExclusionReason::PaperFiltered => "paper_filtered",
            ExclusionReason::UnmappedShape => "unmapped_shape",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Exclusion {
    pub partition: String,
    pub reason: ExclusionReason,
}

/// Immutable federated plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedPlan {
    pub page: NormalizedPage,
    /// True when the request's page or limit was clamped
    pub clamped: bool,
    /// Candidates in partition-major order
    pub partitions: Vec<PartitionPlan>,
    /// Excluded partitions, by name
    pub excluded: Vec<Exclusion>,
}

impl FederatedPlan {
    pub fn global_skip(&self) -> u64 {
        self.page.global_skip()
    }

    /// True when no partition is eligible
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

/// Federated query planner
pub struct FederatedPlanner<'a> {
    dispatcher: &'a SchemaDispatcher,
    bounds: &'a PageBounds,
}

impl<'a> FederatedPlanner<'a> {
    pub fn new(dispatcher: &'a SchemaDispatcher, bounds: &'a PageBounds) -> Self {
        Self { dispatcher, bounds }
    }

    /// Plans a query. Never fails: malformed pages are clamped and an
    /// empty candidate list is a valid plan.
    pub fn plan(
        &self,
        filter: &LogicalFilter,
        page: &PageRequest,
        partitions: &[Partition],
    ) -> FederatedPlan {
        let (normalized, clamped) = page.normalize(self.bounds);
        if clamped {
            let page_str = normalized.page.to_string();
            let limit_str = normalized.limit.to_string();
            trace_event(
                Event::PageClamped,
                &[("limit", &limit_str), ("page", &page_str)],
            );
        }

        let mut ordered: Vec<&Partition> = partitions.iter().collect();
        ordered.sort_by(|a, b| a.name.cmp(&b.name));
        ordered.dedup_by(|a, b| a.name == b.name);

        let prefixes = PrefixSet::new(&filter.syllabus_prefixes);
        let mut candidates = Vec::new();
        let mut excluded = Vec::new();

        for partition in ordered {
            match self.eligibility(filter, partition) {
                Err(reason) => excluded.push(Exclusion {
                    partition: partition.name.clone(),
                    reason,
                }),
                Ok((shape, needs_paper_clause)) => {
                    let local_filter =
                        local_filter(filter, &prefixes, shape, needs_paper_clause);
                    candidates.push(PartitionPlan {
                        partition: partition.clone(),
                        local_filter,
                    });
                }
            }
        }

        FederatedPlan {
            page: normalized,
            clamped,
            partitions: candidates,
            excluded,
        }
    }

    /// Plans a lookup of one `_id` across every partition with a registered
    /// shape. A blank id plans nothing.
    pub fn plan_lookup(&self, id: &str, partitions: &[Partition]) -> Vec<PartitionPlan> {
        let id = id.trim();
        if id.is_empty() {
            return Vec::new();
        }

        let mut ordered: Vec<&Partition> = partitions.iter().collect();
        ordered.sort_by(|a, b| a.name.cmp(&b.name));
        ordered.dedup_by(|a, b| a.name == b.name);

        let unrestricted = LogicalFilter::new();
        ordered
            .into_iter()
            .filter(|partition| self.eligibility(&unrestricted, partition).is_ok())
            .map(|partition| PartitionPlan {
                partition: partition.clone(),
                local_filter: Predicate::all().with_ids([id]),
            })
            .collect()
    }

    /// The partition's shape and whether it needs a local paper clause
    fn eligibility(
        &self,
        filter: &LogicalFilter,
        partition: &Partition,
    ) -> Result<(&'a dyn QuestionShape, bool), ExclusionReason> {
        if !filter.schema_tags.is_empty() && !filter.schema_tags.contains(&partition.schema_tag) {
            return Err(ExclusionReason::SchemaTagFiltered);
        }

        let needs_paper_clause = if filter.paper_names.is_empty()
            || partition.belongs_to(&filter.paper_names)
        {
            false
        } else if partition.is_shared() {
            true
        } else {
            return Err(ExclusionReason::PaperFiltered);
        };

        match self.dispatcher.shape(partition.schema_tag) {
            Some(shape) => Ok((shape, needs_paper_clause)),
            None => {
                log_event_with_fields(
                    Event::PartitionExcluded,
                    &[
                        ("partition", &partition.name),
                        ("reason", ExclusionReason::UnmappedShape.as_str()),
                        ("schema_tag", partition.schema_tag.as_str()),
                    ],
                );
                Err(ExclusionReason::UnmappedShape)
            }
        }
    }
}

fn local_filter(
    filter: &LogicalFilter,
    prefixes: &PrefixSet,
    shape: &dyn QuestionShape,
    needs_paper_clause: bool,
) -> Predicate {
    let mut predicate = Predicate::all();
    if needs_paper_clause {
        predicate = predicate.with_papers(filter.paper_names.iter().cloned());
    }
    if !prefixes.is_empty() {
        predicate = predicate.with_syllabus(shape.syllabus_fields(), prefixes.clone());
    }
    if let Some(text) = filter.text_query() {
        predicate = predicate.with_text(shape.text_fields(), text);
    }
    predicate
}
