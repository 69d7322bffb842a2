//! Schema tags and partition-name classification
//!
//! A partition's shape is read from its name suffix. Suffixes are tried
//! longest first so `_ssq` is never mistaken for `_sq`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The question shape a partition holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchemaTag {
    FullQuestion,
    SubQuestion,
    SubSubQuestion,
    MultipleChoice,
}

/// Tag assumed for partitions whose name carries no recognizable suffix
pub const DEFAULT_TAG: SchemaTag = SchemaTag::FullQuestion;

/// Suffix table, longest suffix first
const SUFFIXES: [(&str, SchemaTag); 4] = [
    ("_subq", SchemaTag::SubQuestion),
    ("_mcq", SchemaTag::MultipleChoice),
    ("_ssq", SchemaTag::SubSubQuestion),
    ("_sq", SchemaTag::FullQuestion),
];

impl SchemaTag {
    pub const ALL: [SchemaTag; 4] = [
        SchemaTag::FullQuestion,
        SchemaTag::SubQuestion,
        SchemaTag::SubSubQuestion,
        SchemaTag::MultipleChoice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaTag::FullQuestion => "full-question",
            SchemaTag::SubQuestion => "sub-question",
            SchemaTag::SubSubQuestion => "sub-sub-question",
            SchemaTag::MultipleChoice => "multiple-choice",
        }
    }

    /// Name suffix that selects this tag
    pub fn suffix(&self) -> &'static str {
        match self {
            SchemaTag::FullQuestion => "_sq",
            SchemaTag::SubQuestion => "_subq",
            SchemaTag::SubSubQuestion => "_ssq",
            SchemaTag::MultipleChoice => "_mcq",
        }
    }

    /// Interprets a store-provided schema hint. Unknown hints yield `None`.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "full-question" | "question" | "sq" => Some(SchemaTag::FullQuestion),
            "sub-question" | "subquestion" | "subq" => Some(SchemaTag::SubQuestion),
            "sub-sub-question" | "subsubquestion" | "ssq" => Some(SchemaTag::SubSubQuestion),
            "multiple-choice" | "mcq" => Some(SchemaTag::MultipleChoice),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SchemaTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hint(s).ok_or_else(|| format!("unknown schema tag '{}'", s))
    }
}

/// Result of reading a partition name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub tag: SchemaTag,
    /// Name with the shape suffix removed
    pub paper: String,
    /// True when no rule matched and [`DEFAULT_TAG`] was assumed
    pub defaulted: bool,
}

/// Classifies a partition by name, letting a recognized hint win.
pub fn classify(name: &str, hint: Option<&str>) -> Classification {
    let by_suffix = SUFFIXES
        .iter()
        .find(|(suffix, _)| name.len() > suffix.len() && name.ends_with(suffix));
    let paper = match by_suffix {
        Some((suffix, _)) => name[..name.len() - suffix.len()].to_string(),
        None => name.to_string(),
    };

    if let Some(tag) = hint.and_then(SchemaTag::from_hint) {
        return Classification {
            tag,
            paper,
            defaulted: false,
        };
    }

    match by_suffix {
        Some((_, tag)) => Classification {
            tag: *tag,
            paper,
            defaulted: false,
        },
        None => Classification {
            tag: DEFAULT_TAG,
            paper,
            defaulted: true,
        },
    }
}
