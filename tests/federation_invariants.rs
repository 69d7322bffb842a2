//! Federation Invariant Tests
//!
//! End-to-end tests of the federated engine over an in-memory store:
//! - Partition-major paging across partitions
//! - Page-size law and no double-serving across consecutive pages
//! - Total is independent of the page
//! - Empty filter matches everything
//! - Syllabus prefixes, paper filters and text queries

use std::collections::BTreeSet;
use std::sync::Arc;

use examdex::engine::{EngineConfig, FederatedEngine};
use examdex::partition::SchemaTag;
use examdex::planner::{LogicalFilter, PageRequest, SortDirection};
use examdex::store::MemoryStore;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn subquestions(prefix: &str, n: u32) -> Vec<Value> {
    (1..=n)
        .map(|i| {
            json!({
                "_id": format!("{}-{}", prefix, i),
                "number": i.to_string(),
                "text": format!("part {} of {}", i, prefix),
                "marks": i,
            })
        })
        .collect()
}

/// Partitions A (5 records), B (0) and C (7), all sub-question shaped
fn scenario_engine() -> FederatedEngine<MemoryStore> {
    let store = MemoryStore::from_collections([
        ("a_subq", subquestions("a", 5)),
        ("b_subq", subquestions("b", 0)),
        ("c_subq", subquestions("c", 7)),
    ])
    .unwrap();
    FederatedEngine::new(Arc::new(store), EngineConfig::default())
}

fn ids(result: &examdex::QueryResult) -> Vec<String> {
    result
        .items
        .iter()
        .map(|item| item.record.id().to_string())
        .collect()
}

fn bank_engine() -> FederatedEngine<MemoryStore> {
    let store = MemoryStore::from_collections([
        (
            "0610_s20_qp_32",
            vec![
                json!({
                    "_id": "fq1",
                    "number": 1,
                    "text": "Plant cells",
                    "syllabus": {"number": "2.1"},
                    "subquestions": [
                        {"number": "a", "text": "Describe osmosis", "syllabus": {"number": "3.2"}}
                    ]
                }),
                json!({"_id": "fq2", "number": 2, "text": "Enzymes", "syllabus": {"number": "5.1"}}),
            ],
        ),
        (
            "0610_s20_qp_12_mcq",
            vec![
                json!({"_id": "m1", "number": 1, "text": "Which organelle?", "options": ["nucleus", "ribosome"], "syllabus": {"number": "2.10"}}),
                json!({"_id": "m2", "number": 2, "text": "Osmosis occurs in", "options": ["roots"], "syllabus": {"number": "3.2.1"}}),
            ],
        ),
        (
            "0610_w21_qp_22_mcq",
            vec![json!({"_id": "w1", "number": 1, "text": "Cell membrane", "syllabus": {"number": "2.1.3"}})],
        ),
        (
            "syllabus",
            vec![json!({"number": "2.1", "title": "Cell structure"})],
        ),
    ])
    .unwrap();
    FederatedEngine::new(Arc::new(store), EngineConfig::default())
}

// =============================================================================
// Paging Tests
// =============================================================================

/// Page 1 takes all of A then the head of C; B contributes nothing.
#[tokio::test]
async fn test_first_page_is_partition_major() {
    let engine = scenario_engine();

    let result = engine
        .query(&LogicalFilter::new(), &PageRequest::new(1, 10))
        .await
        .unwrap();

    assert_eq!(result.total, 12);
    assert_eq!(
        ids(&result),
        vec!["a-1", "a-2", "a-3", "a-4", "a-5", "c-1", "c-2", "c-3", "c-4", "c-5"]
    );
    assert_eq!(result.total_pages(), 2);
}

/// Page 2 skips through A and B and serves the tail of C.
#[tokio::test]
async fn test_second_page_skips_into_later_partition() {
    let engine = scenario_engine();

    let result = engine
        .query(&LogicalFilter::new(), &PageRequest::new(2, 10))
        .await
        .unwrap();

    assert_eq!(result.total, 12);
    assert_eq!(ids(&result), vec!["c-6", "c-7"]);
    assert!(!result.is_degraded());
}

/// Each page holds min(limit, max(0, total - skip)) records.
#[tokio::test]
async fn test_page_size_law() {
    let engine = scenario_engine();

    for limit in 1..=13i64 {
        for page in 1..=14i64 {
            let result = engine
                .query(&LogicalFilter::new(), &PageRequest::new(page, limit))
                .await
                .unwrap();
            let skip = ((page - 1) * limit) as u64;
            let expected = (limit as u64).min(result.total.saturating_sub(skip));
            assert_eq!(
                result.len() as u64,
                expected,
                "page {} limit {}",
                page,
                limit
            );
        }
    }
}

/// Walking every page serves each record exactly once, in the same order
/// as one large page.
#[tokio::test]
async fn test_no_double_serving_across_pages() {
    let engine = scenario_engine();
    let everything = engine
        .query(&LogicalFilter::new(), &PageRequest::new(1, 100))
        .await
        .unwrap();

    let mut walked = Vec::new();
    let mut page = 1;
    loop {
        let result = engine
            .query(&LogicalFilter::new(), &PageRequest::new(page, 3))
            .await
            .unwrap();
        if result.is_empty() {
            break;
        }
        walked.extend(ids(&result));
        page += 1;
    }

    let unique: BTreeSet<&String> = walked.iter().collect();
    assert_eq!(unique.len(), walked.len());
    assert_eq!(walked, ids(&everything));
    assert_eq!(walked.len(), 12);
}

/// The total does not depend on which page was asked for.
#[tokio::test]
async fn test_total_is_page_independent() {
    let engine = scenario_engine();

    let mut totals = BTreeSet::new();
    for (page, limit) in [(1, 1), (3, 4), (50, 10), (1, 100)] {
        let result = engine
            .query(&LogicalFilter::new(), &PageRequest::new(page, limit))
            .await
            .unwrap();
        totals.insert(result.total);
    }
    assert_eq!(totals, BTreeSet::from([12]));
}

/// Out-of-range requests are clamped rather than rejected.
#[tokio::test]
async fn test_page_request_is_clamped() {
    let engine = scenario_engine();

    let result = engine
        .query(&LogicalFilter::new(), &PageRequest::new(-3, 10_000))
        .await
        .unwrap();

    assert_eq!(result.page, 1);
    assert_eq!(result.limit, 100);
    assert_eq!(result.len(), 12);
}

/// Descending sort reverses order within each partition only.
#[tokio::test]
async fn test_sort_applies_within_partition() {
    let engine = scenario_engine();

    let result = engine
        .query(
            &LogicalFilter::new(),
            &PageRequest::new(1, 7).with_sort("marks", SortDirection::Desc),
        )
        .await
        .unwrap();

    assert_eq!(
        ids(&result),
        vec!["a-5", "a-4", "a-3", "a-2", "a-1", "c-7", "c-6"]
    );
}

// =============================================================================
// Filter Tests
// =============================================================================

/// An all-empty filter restricts nothing; reserved collections are never
/// partitions.
#[tokio::test]
async fn test_empty_filter_matches_every_record() {
    let engine = bank_engine();

    let result = engine
        .query(&LogicalFilter::new(), &PageRequest::new(1, 50))
        .await
        .unwrap();

    assert_eq!(result.total, 5);
    let partitions: BTreeSet<&str> = result.items.iter().map(|i| i.partition.as_str()).collect();
    assert!(!partitions.contains("syllabus"));
    assert_eq!(partitions.len(), 3);
}

/// `2.1` selects `2.1` and `2.1.3` but never `2.10`.
#[tokio::test]
async fn test_syllabus_prefix_is_hierarchical() {
    let engine = bank_engine();

    let result = engine
        .query(
            &LogicalFilter::new().with_syllabus_prefix("2.1"),
            &PageRequest::new(1, 50),
        )
        .await
        .unwrap();

    let found: BTreeSet<String> = ids(&result).into_iter().collect();
    assert_eq!(found, BTreeSet::from(["fq1".to_string(), "w1".to_string()]));
}

/// A nested part's syllabus number selects the whole full question.
#[tokio::test]
async fn test_nested_syllabus_selects_parent() {
    let engine = bank_engine();

    let result = engine
        .query(
            &LogicalFilter::new().with_syllabus_prefix("3.2"),
            &PageRequest::new(1, 50),
        )
        .await
        .unwrap();

    assert_eq!(ids(&result), vec!["m2", "fq1"]);
}

/// Paper filters prune whole partitions.
#[tokio::test]
async fn test_paper_filter() {
    let engine = bank_engine();

    let result = engine
        .query(
            &LogicalFilter::new().with_paper("0610_w21_qp_22"),
            &PageRequest::new(1, 50),
        )
        .await
        .unwrap();

    assert_eq!(ids(&result), vec!["w1"]);
    assert_eq!(result.total, 1);
}

/// Shape filters prune by schema tag.
#[tokio::test]
async fn test_schema_tag_filter() {
    let engine = bank_engine();

    let result = engine
        .query(
            &LogicalFilter::new().with_schema_tag(SchemaTag::MultipleChoice),
            &PageRequest::new(1, 50),
        )
        .await
        .unwrap();

    assert_eq!(result.total, 3);
    assert!(result
        .items
        .iter()
        .all(|i| i.schema_tag == SchemaTag::MultipleChoice));
}

/// Text search reaches nested parts and answer options.
#[tokio::test]
async fn test_text_query() {
    let engine = bank_engine();

    let result = engine
        .query(
            &LogicalFilter::new().with_text("osmosis"),
            &PageRequest::new(1, 50),
        )
        .await
        .unwrap();

    let found: BTreeSet<String> = ids(&result).into_iter().collect();
    assert_eq!(found, BTreeSet::from(["fq1".to_string(), "m2".to_string()]));
}

/// The explain report accounts for every eligible partition.
#[tokio::test]
async fn test_explain_reports_each_partition() {
    let engine = bank_engine();

    let explain = engine
        .explain(
            &LogicalFilter::new().with_schema_tag(SchemaTag::MultipleChoice),
            &PageRequest::new(1, 1),
        )
        .await
        .unwrap();

    assert_eq!(explain.total, Some(3));
    assert_eq!(explain.candidates.len(), 2);
    assert_eq!(explain.excluded.len(), 1);
    let fetched: u64 = explain.candidates.iter().map(|c| c.fetched.unwrap_or(0)).sum();
    assert_eq!(fetched, 1);
    assert!(explain.to_string().contains("=== EXPLAIN PLAN ==="));
}

/// Short exam vocabulary such as `pH` or `O2` is still searchable.
#[tokio::test]
async fn test_short_text_terms_match() {
    let store = MemoryStore::from_collections([(
        "0610_s20_qp_12_mcq",
        vec![
            json!({"_id": "m1", "number": 1, "text": "Effect of pH on enzymes", "options": ["O2", "CO2"]}),
            json!({"_id": "m2", "number": 2, "text": "Osmosis in roots", "options": ["water"]}),
        ],
    )])
    .unwrap();
    let engine = FederatedEngine::new(Arc::new(store), EngineConfig::default());

    for query in ["pH", "O2", "enzymes", "effect of pH"] {
        let result = engine
            .query(&LogicalFilter::new().with_text(query), &PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(ids(&result), vec!["m1"], "query {:?}", query);
    }
}

// =============================================================================
// Lookup Tests
// =============================================================================

/// An `_id` is found whichever partition and shape holds it.
#[tokio::test]
async fn test_get_by_id_searches_every_partition() {
    let engine = bank_engine();

    let found = engine.get_by_id("w1").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].identity(), ("0610_w21_qp_22_mcq", "w1"));
    assert_eq!(found[0].schema_tag, SchemaTag::MultipleChoice);

    let found = engine.get_by_id(" fq2 ").await.unwrap();
    assert_eq!(found[0].partition, "0610_s20_qp_32");

    assert!(engine.get_by_id("nope").await.unwrap().is_empty());
    assert!(engine.get_by_id("").await.unwrap().is_empty());
}

/// Topic counts include questions tagged only in nested parts.
#[tokio::test]
async fn test_count_topic() {
    let engine = bank_engine();

    assert_eq!(engine.count_topic("2.1").await.unwrap(), 2);
    assert_eq!(engine.count_topic("3").await.unwrap(), 2);
    assert_eq!(engine.count_topic("9").await.unwrap(), 0);
}
