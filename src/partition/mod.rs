//! Partitions and their discovery
//!
//! A partition is one named collection in the store. Its shape comes from
//! the name suffix (or an explicit hint) and its paper from the remaining
//! name.

mod registry;
mod tag;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::paper::PaperCode;

pub use registry::PartitionRegistry;
pub use tag::{classify, Classification, SchemaTag, DEFAULT_TAG};

/// One backing shard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub name: String,
    pub schema_tag: SchemaTag,
    /// Name with the shape suffix removed
    pub paper: String,
    /// Parsed paper metadata; `None` for shared partitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_code: Option<PaperCode>,
}

impl Partition {
    /// Classifies a discovered collection. The flag is true when the tag was
    /// defaulted. Surrounding whitespace is ignored for classification, but
    /// `name` stays exactly as the store reported it.
    pub fn discover(name: &str, hint: Option<&str>) -> (Self, bool) {
        let Classification {
            tag,
            paper,
            defaulted,
        } = classify(name.trim(), hint);
        let paper_code = PaperCode::parse(&paper).ok();
        (
            Self {
                name: name.to_string(),
                schema_tag: tag,
                paper,
                paper_code,
            },
            defaulted,
        )
    }

    /// True when the partition's records span papers and carry their own
    /// `paper` field
    pub fn is_shared(&self) -> bool {
        self.paper_code.is_none()
    }

    /// True when `papers` names this partition's paper or the partition itself
    pub fn belongs_to(&self, papers: &BTreeSet<String>) -> bool {
        papers.contains(&self.paper) || papers.contains(&self.name)
    }
}
