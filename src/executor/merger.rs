//! Result merger
//!
//! Walks the planned partitions in order, keeping a running global skip and
//! remaining page capacity:
//!
//! 1. Count every candidate (concurrently, results consumed in order)
//! 2. Add each count to the total
//! 3. Page full: count only
//! 4. Skip not yet consumed by this partition: subtract its count
//! 5. Otherwise fetch `[skip, skip + remaining)` and reset the skip
//!
//! Finds run one at a time because each window depends on every earlier
//! partition's count and fetch.

use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::error::Elapsed;

use super::errors::{ExecutorError, ExecutorResult};
use super::result::{FederatedItem, PartitionOutcome, PartitionReport, QueryResult};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::partition::Partition;
use crate::planner::{FederatedPlan, FetchWindow, PartitionPlan, SortSpec};
use crate::schema::{PartitionHandle, QuestionRecord, SchemaDispatcher};
use crate::store::{PartitionStore, StoreResult};

const ID_FIELD: &str = "_id";

/// What a failing partition does to the query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Drop the partition from the result and keep going
    #[default]
    Degrade,
    /// Return the partition error
    FailFast,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Degrade => "degrade",
            FailurePolicy::FailFast => "fail_fast",
        }
    }
}

/// Execution limits for one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSettings {
    /// Bound on every partition call
    pub partition_timeout: Duration,
    /// Counts in flight at once
    pub max_concurrency: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            partition_timeout: Duration::from_millis(5000),
            max_concurrency: 8,
            failure_policy: FailurePolicy::Degrade,
        }
    }
}

/// Executes federated plans against a store
pub struct ResultMerger<'a, S> {
    store: &'a S,
    dispatcher: &'a SchemaDispatcher,
    settings: MergeSettings,
    metrics: &'a MetricsRegistry,
}

impl<'a, S: PartitionStore> ResultMerger<'a, S> {
    pub fn new(
        store: &'a S,
        dispatcher: &'a SchemaDispatcher,
        settings: MergeSettings,
        metrics: &'a MetricsRegistry,
    ) -> Self {
        Self {
            store,
            dispatcher,
            settings,
            metrics,
        }
    }

    /// Executes `plan`. Under [`FailurePolicy::Degrade`] this only fails if
    /// the caller's future is dropped.
    pub async fn execute(&self, plan: &FederatedPlan) -> ExecutorResult<QueryResult> {
        let page = &plan.page;
        if plan.is_empty() {
            return Ok(QueryResult::empty(page));
        }

        let counts: Vec<ExecutorResult<u64>> = stream::iter(&plan.partitions)
            .map(|candidate| self.count_partition(candidate))
            .buffered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        let mut global_skip = page.global_skip();
        let mut remaining = page.limit;
        let mut total: u64 = 0;
        let mut items = Vec::new();
        let mut reports = Vec::with_capacity(plan.partitions.len());

        for (candidate, counted) in plan.partitions.iter().zip(counts) {
            let partition = &candidate.partition;
            let mut report = PartitionReport {
                partition: partition.name.clone(),
                schema_tag: partition.schema_tag,
                count: 0,
                window: None,
                fetched: 0,
                outcome: PartitionOutcome::CountOnly,
                error: None,
            };

            let count = match counted {
                Ok(count) => count,
                Err(err) => {
                    self.absorb(err, &mut report, PartitionOutcome::CountFailed)?;
                    reports.push(report);
                    continue;
                }
            };
            report.count = count;
            total = total.saturating_add(count);

            if remaining == 0 {
                report.outcome = PartitionOutcome::CountOnly;
            } else if global_skip >= count {
                global_skip -= count;
                report.outcome = PartitionOutcome::Skipped;
            } else {
                let window = FetchWindow {
                    skip: global_skip,
                    limit: remaining,
                };
                report.window = Some(window);

                match self.find_partition(candidate, &page.sort, window).await {
                    Ok(mut records) => {
                        // A store returning more than asked must not overfill the page.
                        records.truncate(usize::try_from(remaining).unwrap_or(usize::MAX));
                        let fetched = records.len() as u64;
                        remaining -= fetched;
                        global_skip = 0;
                        report.fetched = fetched;
                        report.outcome = PartitionOutcome::Fetched;
                        items.extend(records.into_iter().map(|record| FederatedItem {
                            partition: partition.name.clone(),
                            schema_tag: partition.schema_tag,
                            record,
                        }));
                    }
                    Err(err) => {
                        total -= count;
                        report.count = 0;
                        self.absorb(err, &mut report, PartitionOutcome::FindFailed)?;
                    }
                }
            }
            reports.push(report);
        }

        Ok(QueryResult {
            items,
            total,
            page: page.page,
            limit: page.limit,
            partitions: reports,
        })
    }

    /// Fetches the first matching record from every candidate, concurrently,
    /// returning hits in candidate order. Candidates normally carry an `_id`
    /// clause. A failing partition is skipped under [`FailurePolicy::Degrade`].
    pub async fn lookup(&self, candidates: &[PartitionPlan]) -> ExecutorResult<Vec<FederatedItem>> {
        let sort = SortSpec::asc(ID_FIELD);
        let window = FetchWindow { skip: 0, limit: 1 };
        let found: Vec<ExecutorResult<Vec<QuestionRecord>>> = stream::iter(candidates)
            .map(|candidate| self.find_partition(candidate, &sort, window))
            .buffered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        let mut items = Vec::new();
        for (candidate, outcome) in candidates.iter().zip(found) {
            match outcome {
                Ok(records) => {
                    let partition = &candidate.partition;
                    items.extend(records.into_iter().map(|record| FederatedItem {
                        partition: partition.name.clone(),
                        schema_tag: partition.schema_tag,
                        record,
                    }));
                }
                Err(err) if self.settings.failure_policy == FailurePolicy::FailFast => {
                    return Err(err)
                }
                // Already logged and metered by `settle`.
                Err(_) => {}
            }
        }
        Ok(items)
    }

    async fn count_partition(&self, candidate: &PartitionPlan) -> ExecutorResult<u64> {
        let handle = self.bind(&candidate.partition)?;
        let outcome = tokio::time::timeout(
            self.settings.partition_timeout,
            handle.count(&candidate.local_filter),
        )
        .await;
        let count = self.settle(&candidate.partition, "count", outcome)?;
        self.metrics.increment_partitions_counted();
        Ok(count)
    }

    async fn find_partition(
        &self,
        candidate: &PartitionPlan,
        sort: &SortSpec,
        window: FetchWindow,
    ) -> ExecutorResult<Vec<QuestionRecord>> {
        let handle = self.bind(&candidate.partition)?;
        let outcome = tokio::time::timeout(
            self.settings.partition_timeout,
            handle.find(&candidate.local_filter, sort, window.skip, window.limit),
        )
        .await;
        let records = self.settle(&candidate.partition, "find", outcome)?;
        self.metrics.increment_partitions_fetched();
        Ok(records)
    }

    fn bind<'p>(&'p self, partition: &'p Partition) -> ExecutorResult<PartitionHandle<'p, S>> {
        self.dispatcher
            .bind(self.store, partition)
            .ok_or_else(|| {
                ExecutorError::partition_unavailable(&partition.name, "no shape registered for tag")
            })
    }

    /// Converts a timed store call into the executor's error space, logging
    /// and metering failures.
    fn settle<T>(
        &self,
        partition: &Partition,
        operation: &str,
        outcome: Result<StoreResult<T>, Elapsed>,
    ) -> ExecutorResult<T> {
        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => {
                self.metrics.increment_partition_failures();
                let reason = err.to_string();
                log_event_with_fields(
                    Event::PartitionUnavailable,
                    &[
                        ("operation", operation),
                        ("partition", &partition.name),
                        ("reason", &reason),
                    ],
                );
                Err(ExecutorError::partition_unavailable(&partition.name, reason))
            }
            Err(_) => {
                self.metrics.increment_partition_timeouts();
                let timeout_ms = self.settings.partition_timeout.as_millis().to_string();
                log_event_with_fields(
                    Event::PartitionTimeout,
                    &[
                        ("operation", operation),
                        ("partition", &partition.name),
                        ("timeout_ms", &timeout_ms),
                    ],
                );
                Err(ExecutorError::partition_timeout(
                    &partition.name,
                    self.settings.partition_timeout,
                ))
            }
        }
    }

    /// Applies the failure policy to a partition error
    fn absorb(
        &self,
        err: ExecutorError,
        report: &mut PartitionReport,
        outcome: PartitionOutcome,
    ) -> ExecutorResult<()> {
        match self.settings.failure_policy {
            FailurePolicy::FailFast => Err(err),
            FailurePolicy::Degrade => {
                report.outcome = outcome;
                report.error = Some(err.message().to_string());
                Ok(())
            }
        }
    }
}
