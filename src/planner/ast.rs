//! Federated query structures
//!
//! The caller-facing filter and page request, plus the sort specification
//! shared with partition stores.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::partition::SchemaTag;

/// Pseudo sort field ordering by free-text relevance score
pub const RELEVANCE_FIELD: &str = "relevance";

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    /// Field to sort by
    pub field: String,
    /// Sort direction
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Cross-partition query intent. Dimensions are ANDed; empty sets do not
/// restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicalFilter {
    pub paper_names: BTreeSet<String>,
    pub schema_tags: BTreeSet<SchemaTag>,
    /// ORed syllabus-number prefixes
    pub syllabus_prefixes: BTreeSet<String>,
    pub text: Option<String>,
}

impl LogicalFilter {
    /// Matches every record of every partition
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_paper(mut self, paper: impl Into<String>) -> Self {
        self.paper_names.insert(paper.into());
        self
    }

    pub fn with_schema_tag(mut self, tag: SchemaTag) -> Self {
        self.schema_tags.insert(tag);
        self
    }

    pub fn with_syllabus_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.syllabus_prefixes.insert(prefix.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Trimmed text query; blank text counts as none
    pub fn text_query(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Limits applied when normalizing a [`PageRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBounds {
    pub max_limit: u64,
    pub default_limit: u64,
    pub default_sort_field: String,
}

impl Default for PageBounds {
    fn default() -> Self {
        Self {
            max_limit: 100,
            default_limit: 20,
            default_sort_field: "number".to_string(),
        }
    }
}

/// Caller's page request, accepted as-is and normalized before planning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    pub page: i64,
    /// Zero or negative selects the default limit
    pub limit: i64,
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 0,
            sort_field: None,
            sort_direction: SortDirection::Asc,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_field = Some(field.into());
        self.sort_direction = direction;
        self
    }

    /// Clamps into range. The flag reports whether page or limit changed.
    pub fn normalize(&self, bounds: &PageBounds) -> (NormalizedPage, bool) {
        let max_limit = bounds.max_limit.max(1);
        let page = u64::try_from(self.page).unwrap_or(0).max(1);
        let limit = match u64::try_from(self.limit) {
            Ok(0) | Err(_) => bounds.default_limit.clamp(1, max_limit),
            Ok(limit) => limit.min(max_limit),
        };
        let clamped = i64::try_from(page).ok() != Some(self.page)
            || i64::try_from(limit).ok() != Some(self.limit);

        let field = self
            .sort_field
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(&bounds.default_sort_field);

        (
            NormalizedPage {
                page,
                limit,
                sort: SortSpec {
                    field: field.to_string(),
                    direction: self.sort_direction,
                },
            },
            clamped,
        )
    }
}

/// A page request after clamping: `page >= 1`, `1 <= limit <= max`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedPage {
    pub page: u64,
    pub limit: u64,
    pub sort: SortSpec,
}

impl NormalizedPage {
    /// Records before this page in the global ordering
    pub fn global_skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}
