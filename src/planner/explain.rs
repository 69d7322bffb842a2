//! Explain output
//!
//! Renders a federated plan, and optionally how it executed, as a
//! deterministic document (JSON via serde, text via `Display`).

use std::fmt;

use serde::Serialize;

use super::planner::{ExclusionReason, FederatedPlan, FetchWindow};
use crate::executor::{PartitionOutcome, QueryResult};
use crate::partition::SchemaTag;
use crate::store::Predicate;

/// One candidate partition in the explain output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateExplain {
    pub partition: String,
    pub schema_tag: SchemaTag,
    pub predicates: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<FetchWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PartitionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedExplain {
    pub partition: String,
    pub reason: ExclusionReason,
}

/// Explain plan output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplainPlan {
    pub page: u64,
    pub limit: u64,
    /// `field direction`
    pub sort: String,
    pub global_skip: u64,
    pub clamped: bool,
    pub candidates: Vec<CandidateExplain>,
    pub excluded: Vec<ExcludedExplain>,
    /// Set once the plan has executed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl ExplainPlan {
    /// Creates an explain plan from a federated plan
    pub fn from_plan(plan: &FederatedPlan) -> Self {
        let candidates = plan
            .partitions
            .iter()
            .map(|p| CandidateExplain {
                partition: p.partition.name.clone(),
                schema_tag: p.partition.schema_tag,
                predicates: describe(&p.local_filter),
                count: None,
                window: None,
                fetched: None,
                outcome: None,
                error: None,
            })
            .collect();
        let excluded = plan
            .excluded
            .iter()
            .map(|e| ExcludedExplain {
                partition: e.partition.clone(),
                reason: e.reason,
            })
            .collect();

        Self {
            page: plan.page.page,
            limit: plan.page.limit,
            sort: format!(
                "{} {}",
                plan.page.sort.field,
                plan.page.sort.direction.as_str()
            ),
            global_skip: plan.global_skip(),
            clamped: plan.clamped,
            candidates,
            excluded,
            total: None,
        }
    }

    /// Attaches per-partition execution reports
    pub fn with_execution(mut self, result: &QueryResult) -> Self {
        for report in &result.partitions {
            if let Some(candidate) = self
                .candidates
                .iter_mut()
                .find(|c| c.partition == report.partition)
            {
                candidate.count = Some(report.count);
                candidate.window = report.window;
                candidate.fetched = Some(report.fetched);
                candidate.outcome = Some(report.outcome);
                candidate.error = report.error.clone();
            }
        }
        self.total = Some(result.total);
        self
    }
}

/// Human-readable clauses of a partition predicate
fn describe(predicate: &Predicate) -> Vec<String> {
    let mut clauses = Vec::new();
    if let Some(ids) = &predicate.ids {
        clauses.push(format!("_id in [{}]", ids.join(", ")));
    }
    if let Some(papers) = &predicate.papers {
        clauses.push(format!("paper in [{}]", papers.join(", ")));
    }
    if let Some(syllabus) = &predicate.syllabus {
        let prefixes: Vec<&str> = syllabus.prefixes.iter().collect();
        clauses.push(format!(
            "{} under [{}]",
            syllabus.fields.join(" | "),
            prefixes.join(", ")
        ));
    }
    if let Some(text) = &predicate.text {
        clauses.push(format!("{} ~ {:?}", text.fields.join(" | "), text.query));
    }
    clauses
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;
        writeln!(f, "Page: {} (limit {})", self.page, self.limit)?;
        if self.clamped {
            writeln!(f, "Page request clamped")?;
        }
        writeln!(f, "Sort: {}", self.sort)?;
        writeln!(f, "Global Skip: {}", self.global_skip)?;
        if let Some(total) = self.total {
            writeln!(f, "Total: {}", total)?;
        }

        writeln!(f, "Candidates:")?;
        for candidate in &self.candidates {
            writeln!(f, "  - {} [{}]", candidate.partition, candidate.schema_tag)?;
            for predicate in &candidate.predicates {
                writeln!(f, "      where {}", predicate)?;
            }
            if let Some(count) = candidate.count {
                writeln!(f, "      count: {}", count)?;
            }
            if let Some(window) = candidate.window {
                writeln!(f, "      window: skip {} limit {}", window.skip, window.limit)?;
            }
            if let Some(error) = &candidate.error {
                writeln!(f, "      error: {}", error)?;
            }
        }

        if !self.excluded.is_empty() {
            writeln!(f, "Excluded:")?;
            for excluded in &self.excluded {
                writeln!(f, "  - {} ({})", excluded.partition, excluded.reason.as_str())?;
            }
        }

        Ok(())
    }
}
