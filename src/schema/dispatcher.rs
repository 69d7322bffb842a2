//! Schema dispatch
//!
//! Maps a partition's tag to its [`QuestionShape`] and binds the shape to a
//! store so callers can count and fetch typed records without knowing the
//! shape.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::record::QuestionRecord;
use super::shapes::{
    FullQuestionShape, MultipleChoiceShape, QuestionShape, SubQuestionShape, SubSubQuestionShape,
};
use crate::partition::{Partition, SchemaTag};
use crate::planner::SortSpec;
use crate::store::{PartitionStore, Predicate, StoreError, StoreResult};

/// Registered shapes by tag
#[derive(Clone)]
pub struct SchemaDispatcher {
    shapes: BTreeMap<SchemaTag, Arc<dyn QuestionShape>>,
}

impl Default for SchemaDispatcher {
    /// All four built-in shapes
    fn default() -> Self {
        Self::empty()
            .with_shape(Arc::new(FullQuestionShape))
            .with_shape(Arc::new(SubQuestionShape))
            .with_shape(Arc::new(SubSubQuestionShape))
            .with_shape(Arc::new(MultipleChoiceShape))
    }
}

impl std::fmt::Debug for SchemaDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaDispatcher")
            .field("tags", &self.tags())
            .finish()
    }
}

impl SchemaDispatcher {
    /// A dispatcher with no shapes; every partition is unmapped
    pub fn empty() -> Self {
        Self {
            shapes: BTreeMap::new(),
        }
    }

    /// Registers `shape`, replacing any shape already bound to its tag
    pub fn with_shape(mut self, shape: Arc<dyn QuestionShape>) -> Self {
        self.shapes.insert(shape.tag(), shape);
        self
    }

    pub fn shape(&self, tag: SchemaTag) -> Option<&dyn QuestionShape> {
        self.shapes.get(&tag).map(|s| s.as_ref())
    }

    pub fn supports(&self, tag: SchemaTag) -> bool {
        self.shapes.contains_key(&tag)
    }

    pub fn tags(&self) -> Vec<SchemaTag> {
        self.shapes.keys().copied().collect()
    }

    /// Binds the shape for `partition` to `store`. `None` when the tag is
    /// unmapped.
    pub fn bind<'a, S: PartitionStore>(
        &'a self,
        store: &'a S,
        partition: &'a Partition,
    ) -> Option<PartitionHandle<'a, S>> {
        let shape = self.shape(partition.schema_tag)?;
        Some(PartitionHandle {
            store,
            partition,
            shape,
        })
    }
}

/// A shape bound to one partition of one store
pub struct PartitionHandle<'a, S> {
    store: &'a S,
    partition: &'a Partition,
    shape: &'a dyn QuestionShape,
}

impl<'a, S: PartitionStore> PartitionHandle<'a, S> {
    pub fn partition(&self) -> &Partition {
        self.partition
    }

    pub fn shape(&self) -> &dyn QuestionShape {
        self.shape
    }

    pub async fn count(&self, predicate: &Predicate) -> StoreResult<u64> {
        self.store.count(&self.partition.name, predicate).await
    }

    /// Fetches and decodes a window. One undecodable document fails the call.
    pub async fn find(
        &self,
        predicate: &Predicate,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<QuestionRecord>> {
        let documents = self
            .store
            .find(&self.partition.name, predicate, sort, skip, limit)
            .await?;
        documents
            .into_iter()
            .map(|doc| {
                self.shape.decode(doc).map_err(|e| StoreError::Decode {
                    partition: self.partition.name.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}
