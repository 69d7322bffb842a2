//! Federated engine facade
//!
//! Owns the partition registry, the schema dispatcher, configuration and
//! metrics. Each query lists partitions, plans, then merges.

use std::future::Future;
use std::sync::Arc;

use super::config::EngineConfig;
use crate::executor::{ExecutorError, ExecutorResult, FederatedItem, QueryResult, ResultMerger};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry, MetricsSnapshot, Timer};
use crate::partition::{Partition, PartitionRegistry};
use crate::planner::{
    ExplainPlan, FederatedPlan, FederatedPlanner, LogicalFilter, PageBounds, PageRequest,
};
use crate::schema::SchemaDispatcher;
use crate::store::PartitionStore;

/// Federated query engine over one partition store
pub struct FederatedEngine<S> {
    store: Arc<S>,
    registry: PartitionRegistry<S>,
    dispatcher: SchemaDispatcher,
    bounds: PageBounds,
    config: EngineConfig,
    metrics: Arc<MetricsRegistry>,
}

impl<S: PartitionStore> FederatedEngine<S> {
    /// Creates an engine with every built-in shape registered
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        let registry =
            PartitionRegistry::new(Arc::clone(&store), config.registry_ttl(), Arc::clone(&metrics))
                .with_reserved(config.reserved_collections.iter().cloned())
                .with_list_timeout(config.partition_timeout());
        Self {
            store,
            registry,
            dispatcher: SchemaDispatcher::default(),
            bounds: config.page_bounds(),
            config,
            metrics,
        }
    }

    /// Replaces the shape dispatcher
    pub fn with_dispatcher(mut self, dispatcher: SchemaDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Runs a federated query
    pub async fn query(
        &self,
        filter: &LogicalFilter,
        page: &PageRequest,
    ) -> ExecutorResult<QueryResult> {
        self.run(filter, page).await.map(|(_, result)| result)
    }

    /// Runs a federated query that stops when `cancel` resolves. In-flight
    /// partition calls are dropped and no partial result is returned.
    pub async fn query_with_cancel<C>(
        &self,
        filter: &LogicalFilter,
        page: &PageRequest,
        cancel: C,
    ) -> ExecutorResult<QueryResult>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                self.metrics.increment_queries_cancelled();
                log_event_with_fields(Event::QueryCancelled, &[]);
                Err(ExecutorError::cancelled())
            }
            result = self.query(filter, page) => result,
        }
    }

    /// Plans and executes a query, returning the plan annotated with each
    /// partition's count, window and outcome
    pub async fn explain(
        &self,
        filter: &LogicalFilter,
        page: &PageRequest,
    ) -> ExecutorResult<ExplainPlan> {
        let (plan, result) = self.run(filter, page).await?;
        Ok(ExplainPlan::from_plan(&plan).with_execution(&result))
    }

    /// Looks up records by `_id` across every partition and shape. At most
    /// one record per partition; hits come back in partition order.
    pub async fn get_by_id(&self, id: &str) -> ExecutorResult<Vec<FederatedItem>> {
        let timer = Timer::new();
        let partitions = self.registry.list().await;
        let plans =
            FederatedPlanner::new(&self.dispatcher, &self.bounds).plan_lookup(id, &partitions);

        let merger = ResultMerger::new(
            self.store.as_ref(),
            &self.dispatcher,
            self.config.merge_settings(),
            &self.metrics,
        );
        let outcome = merger.lookup(&plans).await;
        match &outcome {
            Ok(items) => {
                self.metrics.increment_queries_executed();
                log_event_with_fields(
                    Event::RecordLookup,
                    &[
                        ("candidates", &plans.len().to_string()),
                        ("duration_ms", &timer.elapsed_ms_field()),
                        ("found", &items.len().to_string()),
                        ("id", id.trim()),
                    ],
                );
            }
            Err(err) => {
                self.metrics.increment_queries_failed();
                log_event_with_fields(
                    Event::QueryFailed,
                    &[
                        ("code", err.code().code()),
                        ("duration_ms", &timer.elapsed_ms_field()),
                        ("partition", err.partition().unwrap_or("")),
                    ],
                );
            }
        }
        outcome
    }

    /// Number of questions tagged with `prefix` or a topic below it, in the
    /// question itself or any nested part
    pub async fn count_topic(&self, prefix: &str) -> ExecutorResult<u64> {
        let filter = LogicalFilter::new().with_syllabus_prefix(prefix);
        let (_, result) = self.run(&filter, &PageRequest::new(1, 1)).await?;
        Ok(result.total)
    }

    /// Plans without executing
    pub async fn plan(&self, filter: &LogicalFilter, page: &PageRequest) -> FederatedPlan {
        let partitions = self.registry.list().await;
        FederatedPlanner::new(&self.dispatcher, &self.bounds).plan(filter, page, &partitions)
    }

    /// Current partitions, ordered by name
    pub async fn partitions(&self) -> Arc<Vec<Partition>> {
        self.registry.list().await
    }

    /// Re-discovers partitions immediately
    pub async fn refresh(&self) -> Arc<Vec<Partition>> {
        self.registry.refresh().await
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    async fn run(
        &self,
        filter: &LogicalFilter,
        page: &PageRequest,
    ) -> ExecutorResult<(FederatedPlan, QueryResult)> {
        let timer = Timer::new();
        let requested_page = page.page.to_string();
        let requested_limit = page.limit.to_string();
        log_event_with_fields(
            Event::QueryReceived,
            &[
                ("limit", &requested_limit),
                ("page", &requested_page),
                ("papers", &filter.paper_names.len().to_string()),
                ("syllabus_prefixes", &filter.syllabus_prefixes.len().to_string()),
                ("text", if filter.text_query().is_some() { "yes" } else { "no" }),
            ],
        );

        let plan = self.plan(filter, page).await;
        log_event_with_fields(
            Event::QueryPlanned,
            &[
                ("candidates", &plan.partitions.len().to_string()),
                ("excluded", &plan.excluded.len().to_string()),
                ("global_skip", &plan.global_skip().to_string()),
            ],
        );

        let merger = ResultMerger::new(
            self.store.as_ref(),
            &self.dispatcher,
            self.config.merge_settings(),
            &self.metrics,
        );
        match merger.execute(&plan).await {
            Ok(result) => {
                self.metrics.increment_queries_executed();
                log_event_with_fields(
                    Event::QueryExecuted,
                    &[
                        ("degraded", if result.is_degraded() { "yes" } else { "no" }),
                        ("duration_ms", &timer.elapsed_ms_field()),
                        ("returned", &result.len().to_string()),
                        ("total", &result.total.to_string()),
                    ],
                );
                Ok((plan, result))
            }
            Err(err) => {
                self.metrics.increment_queries_failed();
                log_event_with_fields(
                    Event::QueryFailed,
                    &[
                        ("code", err.code().code()),
                        ("duration_ms", &timer.elapsed_ms_field()),
                        ("partition", err.partition().unwrap_or("")),
                    ],
                );
                Err(err)
            }
        }
    }
}
