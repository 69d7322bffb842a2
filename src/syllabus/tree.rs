//! Syllabus hierarchy
//!
//! Topics are nested by their dotted numbers. A topic whose parent number is
//! absent from the input is attached to the nearest present ancestor (or the
//! root), so a sparse syllabus export still produces a connected tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::prefix;

/// One syllabus topic as stored in the `syllabus` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusTopic {
    pub number: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: Vec<String>,
}

impl SyllabusTopic {
    pub fn new(number: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            title: title.into(),
            content: Vec::new(),
        }
    }
}

/// A node of the rendered tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyllabusNode {
    pub number: String,
    pub title: String,
    pub children: Vec<SyllabusNode>,
}

/// Syllabus topics indexed by number
#[derive(Debug, Clone, Default)]
pub struct SyllabusTree {
    topics: BTreeMap<String, SyllabusTopic>,
}

impl SyllabusTree {
    /// Builds the tree. Later duplicates of a number replace earlier ones.
    pub fn build(topics: impl IntoIterator<Item = SyllabusTopic>) -> Self {
        let topics = topics
            .into_iter()
            .map(|t| SyllabusTopic {
                number: t.number.trim().to_string(),
                ..t
            })
            .filter(|t| !t.number.is_empty())
            .map(|t| (t.number.clone(), t))
            .collect();
        Self { topics }
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn get(&self, number: &str) -> Option<&SyllabusTopic> {
        self.topics.get(number)
    }

    /// `prefix` and every topic below it, in hierarchical order
    pub fn descendants(&self, prefix: &str) -> Vec<&SyllabusTopic> {
        let mut found: Vec<&SyllabusTopic> = self
            .topics
            .values()
            .filter(|t| prefix::matches(&t.number, prefix))
            .collect();
        found.sort_by(|a, b| compare_numbers(&a.number, &b.number));
        found
    }

    /// Present topics enclosing `number`, outermost first (excluding itself)
    pub fn ancestors(&self, number: &str) -> Vec<&SyllabusTopic> {
        let parts: Vec<&str> = number.split('.').collect();
        (1..parts.len())
            .filter_map(|n| self.topics.get(&parts[..n].join(".")))
            .collect()
    }

    /// Renders the whole hierarchy
    pub fn roots(&self) -> Vec<SyllabusNode> {
        self.render(|_| true)
    }

    /// Renders the hierarchy under `prefix`. The topic itself is the single
    /// root when present; otherwise its present descendants become roots.
    pub fn subtree(&self, prefix: &str) -> Vec<SyllabusNode> {
        self.render(|n| prefix::matches(n, prefix))
    }

    fn render<F>(&self, include: F) -> Vec<SyllabusNode>
    where
        F: Fn(&str) -> bool,
    {
        let mut ordered: Vec<&SyllabusTopic> =
            self.topics.values().filter(|t| include(&t.number)).collect();
        ordered.sort_by(|a, b| compare_numbers(&a.number, &b.number));

        // Attach each topic to its nearest included ancestor.
        let mut children: BTreeMap<Option<String>, Vec<&SyllabusTopic>> = BTreeMap::new();
        for topic in &ordered {
            let parent = self.nearest_parent(&topic.number, &include);
            children.entry(parent).or_default().push(topic);
        }

        build_nodes(None, &children)
    }

    fn nearest_parent<F>(&self, number: &str, include: &F) -> Option<String>
    where
        F: Fn(&str) -> bool,
    {
        let parts: Vec<&str> = number.split('.').collect();
        (1..parts.len())
            .rev()
            .map(|n| parts[..n].join("."))
            .find(|candidate| self.topics.contains_key(candidate) && include(candidate))
    }
}

fn build_nodes(
    parent: Option<String>,
    children: &BTreeMap<Option<String>, Vec<&SyllabusTopic>>,
) -> Vec<SyllabusNode> {
    children
        .get(&parent)
        .map(|topics| {
            topics
                .iter()
                .map(|t| SyllabusNode {
                    number: t.number.clone(),
                    title: t.title.clone(),
                    children: build_nodes(Some(t.number.clone()), children),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Orders dotted numbers segment by segment, numerically where possible,
/// so `2.9` sorts before `2.10`. Numeric segments precede non-numeric ones.
pub fn compare_numbers(a: &str, b: &str) -> std::cmp::Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return std::cmp::Ordering::Equal,
            (None, Some(_)) => return std::cmp::Ordering::Less,
            (Some(_), None) => return std::cmp::Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => x.cmp(y),
                };
                if ord != std::cmp::Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}
