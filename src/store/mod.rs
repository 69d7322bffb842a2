//! Partition stores
//!
//! A partition is one named collection of question documents. The engine
//! reaches partitions only through [`PartitionStore`]; [`MemoryStore`] is
//! the bundled implementation, fed by [`load_dir`] from a directory of JSON
//! collection exports.

mod errors;
mod loader;
mod memory;
pub mod predicate;

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::planner::SortSpec;

pub use errors::{LoadError, LoadResult, StoreError, StoreResult};
pub use loader::{load_dir, LoadedData};
pub use memory::MemoryStore;
pub use predicate::{Predicate, SyllabusClause, TextClause};

/// A partition as enumerated by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionDescriptor {
    pub name: String,
    /// Explicit shape hint, preferred over the name suffix when recognized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_hint: Option<String>,
}

impl PartitionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.schema_hint = Some(hint.into());
        self
    }
}

/// Access to partitioned document collections.
///
/// Every call is independent; the engine wraps each one in its own timeout
/// and may run several `count` calls at once.
pub trait PartitionStore: Send + Sync {
    /// Enumerates every partition currently present
    fn list_partitions(
        &self,
    ) -> impl Future<Output = StoreResult<Vec<PartitionDescriptor>>> + Send;

    /// Number of documents in `partition` matching `predicate`
    fn count(
        &self,
        partition: &str,
        predicate: &Predicate,
    ) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Matching documents ordered by `sort`, then by `_id`, windowed by
    /// `skip`/`limit`
    fn find(
        &self,
        partition: &str,
        predicate: &Predicate,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> impl Future<Output = StoreResult<Vec<Value>>> + Send;
}

/// Reads a document's `_id`, accepting plain strings, numbers and
/// `{"$oid": "..."}` wrappers.
pub fn document_id(document: &Value) -> Option<String> {
    match document.get("_id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map.get("$oid").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}
