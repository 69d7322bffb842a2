//! Partition-local predicates
//!
//! A [`Predicate`] is what a partition store evaluates: the logical filter
//! rewritten against one partition's field paths. Clauses are ANDed; within
//! a clause the listed fields are ORed.

use serde::Serialize;
use serde_json::Value;

use crate::syllabus::PrefixSet;

/// Syllabus-number clause: any of `fields` matches any prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyllabusClause {
    pub fields: Vec<String>,
    pub prefixes: PrefixSet,
}

/// Free-text clause: any query term appears in any of `fields`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextClause {
    pub fields: Vec<String>,
    pub query: String,
}

impl TextClause {
    /// Searchable terms of the query. Words of one or two characters are
    /// dropped unless the query has nothing longer (`pH`, `O2`).
    pub fn terms(&self) -> Vec<String> {
        let words = tokenize(&self.query);
        let mut terms: Vec<String> = words
            .iter()
            .filter(|word| word.chars().count() > MIN_TERM_CHARS)
            .cloned()
            .collect();
        if terms.is_empty() {
            terms = words;
        }
        terms.sort();
        terms.dedup();
        terms
    }
}

/// Conjunction of optional clauses. The default predicate matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Predicate {
    /// Restricts `_id` to one of these values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    /// Restricts the `paper` field of shared partitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub papers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syllabus: Option<SyllabusClause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextClause>,
}

impl Predicate {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_papers<I, S>(mut self, papers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.papers = Some(papers.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_syllabus(mut self, fields: &[&str], prefixes: PrefixSet) -> Self {
        self.syllabus = Some(SyllabusClause {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            prefixes,
        });
        self
    }

    pub fn with_text(mut self, fields: &[&str], query: impl Into<String>) -> Self {
        self.text = Some(TextClause {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            query: query.into(),
        });
        self
    }

    /// True when no clause restricts the partition
    pub fn is_unrestricted(&self) -> bool {
        self.ids.is_none()
            && self.papers.is_none()
            && self.syllabus.is_none()
            && self.text.is_none()
    }
}

/// Query words at or below this length only count when nothing longer is given
const MIN_TERM_CHARS: usize = 2;

/// Lowercased alphanumeric words
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Values reached by a dotted path. Arrays are flattened at every step, so
/// `subquestions.syllabus.number` visits each sub-question's number.
pub fn values_at<'a>(document: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![document];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            collect_field(value, segment, &mut next);
        }
        current = next;
    }

    let mut leaves = Vec::with_capacity(current.len());
    for value in current {
        flatten_into(value, &mut leaves);
    }
    leaves
}

/// String leaves reached by a dotted path
pub fn strings_at<'a>(document: &'a Value, path: &str) -> Vec<&'a str> {
    values_at(document, path)
        .into_iter()
        .filter_map(Value::as_str)
        .collect()
}

fn collect_field<'a>(value: &'a Value, segment: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if let Some(v) = map.get(segment) {
                out.push(v);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_field(item, segment, out);
            }
        }
        _ => {}
    }
}

fn flatten_into<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_into(item, out);
            }
        }
        Value::Null => {}
        other => out.push(other),
    }
}
