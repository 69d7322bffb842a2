//! examdex - federated exam-question queries
//!
//! Questions live in many partitions, one per paper and question shape.
//! The engine discovers those partitions, plans one local filter per
//! partition, and merges a single paginated, partition-major result.

pub mod cli;
pub mod engine;
pub mod executor;
pub mod observability;
pub mod paper;
pub mod partition;
pub mod planner;
pub mod schema;
pub mod store;
pub mod syllabus;

pub use engine::{EngineConfig, FederatedEngine};
pub use executor::{ExecutorError, FailurePolicy, QueryResult};
pub use planner::{LogicalFilter, PageRequest, SortDirection};
pub use store::{MemoryStore, PartitionStore};
