//! In-memory partition store
//!
//! Collections live behind a `RwLock` so they can be replaced while the
//! engine is serving. Evaluation follows the store contract: clause
//! semantics from [`Predicate`], order by the sort field then `_id`.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard};

use serde_json::Value;
use uuid::Uuid;

use super::predicate::{strings_at, tokenize, values_at, Predicate};
use super::{document_id, PartitionDescriptor, PartitionStore, StoreError, StoreResult};
use crate::planner::{SortDirection, SortSpec, RELEVANCE_FIELD};
use crate::syllabus::compare_numbers;

/// Document field holding the paper name in shared partitions
pub const PAPER_FIELD: &str = "paper";

#[derive(Debug, Default)]
struct MemoryCollection {
    schema_hint: Option<String>,
    documents: Vec<Value>,
}

/// Partition store holding every collection in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, MemoryCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `(name, documents)` pairs
    pub fn from_collections<I, S>(collections: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let store = Self::new();
        for (name, documents) in collections {
            store.insert_collection(name, documents)?;
        }
        Ok(store)
    }

    /// Inserts or replaces a collection. Documents without an `_id` are
    /// given a random UUID.
    pub fn insert_collection(
        &self,
        name: impl Into<String>,
        documents: Vec<Value>,
    ) -> StoreResult<()> {
        let documents = documents.into_iter().map(ensure_id).collect();
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Internal("collection lock poisoned".into()))?;
        let entry = collections.entry(name.into()).or_default();
        entry.documents = documents;
        Ok(())
    }

    /// Attaches an explicit shape hint to an existing collection
    pub fn set_schema_hint(&self, name: &str, hint: impl Into<String>) -> StoreResult<()> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Internal("collection lock poisoned".into()))?;
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| StoreError::UnknownPartition(name.to_string()))?;
        collection.schema_hint = Some(hint.into());
        Ok(())
    }

    /// Removes a collection, returning whether it existed
    pub fn drop_collection(&self, name: &str) -> StoreResult<bool> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::Internal("collection lock poisoned".into()))?;
        Ok(collections.remove(name).is_some())
    }

    /// Total number of documents across collections
    pub fn document_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.values().map(|c| c.documents.len()).sum())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, BTreeMap<String, MemoryCollection>>> {
        self.collections
            .read()
            .map_err(|_| StoreError::Internal("collection lock poisoned".into()))
    }

    fn matching<'a>(
        collections: &'a BTreeMap<String, MemoryCollection>,
        partition: &str,
        predicate: &Predicate,
    ) -> StoreResult<Vec<(u64, &'a Value)>> {
        let collection = collections
            .get(partition)
            .ok_or_else(|| StoreError::UnknownPartition(partition.to_string()))?;
        Ok(collection
            .documents
            .iter()
            .filter_map(|doc| evaluate(predicate, doc).map(|score| (score, doc)))
            .collect())
    }
}

impl PartitionStore for MemoryStore {
    async fn list_partitions(&self) -> StoreResult<Vec<PartitionDescriptor>> {
        Ok(self
            .read()?
            .iter()
            .map(|(name, collection)| PartitionDescriptor {
                name: name.clone(),
                schema_hint: collection.schema_hint.clone(),
            })
            .collect())
    }

    async fn count(&self, partition: &str, predicate: &Predicate) -> StoreResult<u64> {
        let collections = self.read()?;
        let matched = Self::matching(&collections, partition, predicate)?;
        Ok(matched.len() as u64)
    }

    async fn find(
        &self,
        partition: &str,
        predicate: &Predicate,
        sort: &SortSpec,
        skip: u64,
        limit: u64,
    ) -> StoreResult<Vec<Value>> {
        let collections = self.read()?;
        let mut matched = Self::matching(&collections, partition, predicate)?;
        matched.sort_by(|a, b| compare_scored(sort, a, b));

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(_, doc)| doc.clone())
            .collect())
    }
}

fn ensure_id(mut document: Value) -> Value {
    if let Value::Object(map) = &mut document {
        if !map.contains_key("_id") {
            map.insert("_id".into(), Value::String(Uuid::new_v4().to_string()));
        }
    }
    document
}

/// Returns the relevance score when `document` satisfies every clause.
/// Without a text clause the score is 0.
fn evaluate(predicate: &Predicate, document: &Value) -> Option<u64> {
    if let Some(ids) = &predicate.ids {
        let id = document_id(document)?;
        if !ids.iter().any(|candidate| *candidate == id) {
            return None;
        }
    }

    if let Some(papers) = &predicate.papers {
        let paper = document.get(PAPER_FIELD).and_then(Value::as_str)?;
        if !papers.iter().any(|p| p == paper) {
            return None;
        }
    }

    if let Some(clause) = &predicate.syllabus {
        let hit = clause
            .fields
            .iter()
            .flat_map(|field| strings_at(document, field))
            .any(|number| clause.prefixes.matches_any(number.trim()));
        if !hit {
            return None;
        }
    }

    match &predicate.text {
        None => Some(0),
        Some(clause) => {
            // A query with no searchable words restricts nothing, like blank text.
            let terms = clause.terms();
            if terms.is_empty() {
                return Some(0);
            }
            let words: BTreeSet<String> = clause
                .fields
                .iter()
                .flat_map(|field| strings_at(document, field))
                .flat_map(tokenize)
                .collect();
            let score = terms
                .iter()
                .filter(|term| words.contains(*term))
                .count() as u64;
            (score > 0).then_some(score)
        }
    }
}

fn compare_scored(sort: &SortSpec, a: &(u64, &Value), b: &(u64, &Value)) -> Ordering {
    let primary = if sort.field == RELEVANCE_FIELD {
        a.0.cmp(&b.0)
    } else {
        compare_values(
            values_at(a.1, &sort.field).first().copied(),
            values_at(b.1, &sort.field).first().copied(),
        )
    };
    let primary = match sort.direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then_with(|| document_id(a.1).cmp(&document_id(b.1)))
}

/// Missing values first, then booleans, numbers, strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => compare_numbers(x, y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syllabus::PrefixSet;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::from_collections([(
            "0610_s20_qp_32_sq",
            vec![
                json!({"_id": "q3", "number": 3, "text": "Describe osmosis in plant cells",
                       "syllabus": {"number": "3.2"}}),
                json!({"_id": "q1", "number": 1, "text": "Enzyme activity and temperature",
                       "syllabus": {"number": "2.1"},
                       "subquestions": [{"syllabus": {"number": "5.1"}}]}),
                json!({"_id": "q2", "number": 2, "text": "Enzyme structure",
                       "syllabus": {"number": "2.10"}}),
            ],
        )])
        .unwrap()
    }

    #[tokio::test]
    async fn test_count_and_find_sorted() {
        let store = store();
        let all = Predicate::all();
        assert_eq!(store.count("0610_s20_qp_32_sq", &all).await.unwrap(), 3);

        let docs = store
            .find("0610_s20_qp_32_sq", &all, &SortSpec::asc("number"), 1, 5)
            .await
            .unwrap();
        let ids: Vec<_> = docs.iter().filter_map(document_id).collect();
        assert_eq!(ids, vec!["q2", "q3"]);

        let docs = store
            .find("0610_s20_qp_32_sq", &all, &SortSpec::desc("number"), 0, 1)
            .await
            .unwrap();
        assert_eq!(document_id(&docs[0]).unwrap(), "q3");
    }

    #[tokio::test]
    async fn test_syllabus_clause_over_nested_fields() {
        let store = store();
        let predicate = Predicate::all().with_syllabus(
            &["syllabus.number", "subquestions.syllabus.number"],
            PrefixSet::new(["5"]),
        );
        assert_eq!(store.count("0610_s20_qp_32_sq", &predicate).await.unwrap(), 1);

        let predicate = Predicate::all().with_syllabus(&["syllabus.number"], PrefixSet::new(["2.1"]));
        let docs = store
            .find("0610_s20_qp_32_sq", &predicate, &SortSpec::asc("number"), 0, 10)
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(document_id(&docs[0]).unwrap(), "q1");
    }

    #[tokio::test]
    async fn test_id_clause() {
        let store = store();
        let predicate = Predicate::all().with_ids(["q3", "missing"]);
        let docs = store
            .find("0610_s20_qp_32_sq", &predicate, &SortSpec::asc("_id"), 0, 10)
            .await
            .unwrap();
        let ids: Vec<_> = docs.iter().filter_map(document_id).collect();
        assert_eq!(ids, vec!["q3"]);
    }

    #[tokio::test]
    async fn test_punctuation_only_text_restricts_nothing() {
        let store = store();
        let predicate = Predicate::all().with_text(&["text"], "?!");
        assert_eq!(store.count("0610_s20_qp_32_sq", &predicate).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_text_relevance_order() {
        let store = store();
        let predicate = Predicate::all().with_text(&["text"], "enzyme temperature");
        let docs = store
            .find(
                "0610_s20_qp_32_sq",
                &predicate,
                &SortSpec::desc(RELEVANCE_FIELD),
                0,
                10,
            )
            .await
            .unwrap();
        let ids: Vec<_> = docs.iter().filter_map(document_id).collect();
        assert_eq!(ids, vec!["q1", "q2"]);
    }

    #[tokio::test]
    async fn test_paper_clause() {
        let store = MemoryStore::from_collections([(
            "questions",
            vec![
                json!({"_id": "a", "paper": "0610_s20_qp_32"}),
                json!({"_id": "b", "paper": "0610_w21_qp_22"}),
                json!({"_id": "c"}),
            ],
        )])
        .unwrap();
        let predicate = Predicate::all().with_papers(["0610_w21_qp_22"]);
        assert_eq!(store.count("questions", &predicate).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_partition() {
        let store = MemoryStore::new();
        let err = store.count("nope", &Predicate::all()).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownPartition(name) if name == "nope"));
    }

    #[tokio::test]
    async fn test_missing_ids_assigned_and_hints_listed() {
        let store = MemoryStore::from_collections([("p", vec![json!({"number": 1})])]).unwrap();
        store.set_schema_hint("p", "mcq").unwrap();

        let docs = store
            .find("p", &Predicate::all(), &SortSpec::asc("number"), 0, 1)
            .await
            .unwrap();
        assert!(Uuid::parse_str(&document_id(&docs[0]).unwrap()).is_ok());

        let listed = store.list_partitions().await.unwrap();
        assert_eq!(listed, vec![PartitionDescriptor::new("p").with_hint("mcq")]);
        assert!(store.drop_collection("p").unwrap());
        assert!(store.list_partitions().await.unwrap().is_empty());
    }
}
