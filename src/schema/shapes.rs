//! Question shapes
//!
//! One [`QuestionShape`] per schema tag. A shape knows where its syllabus
//! numbers and searchable text live and how to decode a stored document.
//! Nothing outside this module looks at shape-specific fields.

use serde_json::Value;

use super::record::{FullQuestion, MultipleChoice, QuestionRecord, SubQuestion, SubSubQuestion};
use crate::partition::SchemaTag;

/// Field layout and decoder for one partition shape
pub trait QuestionShape: Send + Sync {
    fn tag(&self) -> SchemaTag;

    /// Paths carrying syllabus numbers
    fn syllabus_fields(&self) -> &'static [&'static str];

    /// Paths searched by free-text queries
    fn text_fields(&self) -> &'static [&'static str];

    fn decode(&self, document: Value) -> Result<QuestionRecord, serde_json::Error>;
}

pub struct FullQuestionShape;

impl QuestionShape for FullQuestionShape {
    fn tag(&self) -> SchemaTag {
        SchemaTag::FullQuestion
    }

    fn syllabus_fields(&self) -> &'static [&'static str] {
        &[
            "syllabus.number",
            "subquestions.syllabus.number",
            "subquestions.subsubquestions.syllabus.number",
        ]
    }

    fn text_fields(&self) -> &'static [&'static str] {
        &[
            "text",
            "subquestions.text",
            "subquestions.subsubquestions.text",
            "keywords",
        ]
    }

    fn decode(&self, document: Value) -> Result<QuestionRecord, serde_json::Error> {
        serde_json::from_value::<FullQuestion>(document).map(QuestionRecord::FullQuestion)
    }
}

pub struct SubQuestionShape;

impl QuestionShape for SubQuestionShape {
    fn tag(&self) -> SchemaTag {
        SchemaTag::SubQuestion
    }

    fn syllabus_fields(&self) -> &'static [&'static str] {
        &["syllabus.number", "subsubquestions.syllabus.number"]
    }

    fn text_fields(&self) -> &'static [&'static str] {
        &["text", "subsubquestions.text"]
    }

    fn decode(&self, document: Value) -> Result<QuestionRecord, serde_json::Error> {
        serde_json::from_value::<SubQuestion>(document).map(QuestionRecord::SubQuestion)
    }
}

pub struct SubSubQuestionShape;

impl QuestionShape for SubSubQuestionShape {
    fn tag(&self) -> SchemaTag {
        SchemaTag::SubSubQuestion
    }

    fn syllabus_fields(&self) -> &'static [&'static str] {
        &["syllabus.number"]
    }

    fn text_fields(&self) -> &'static [&'static str] {
        &["text"]
    }

    fn decode(&self, document: Value) -> Result<QuestionRecord, serde_json::Error> {
        serde_json::from_value::<SubSubQuestion>(document).map(QuestionRecord::SubSubQuestion)
    }
}

pub struct MultipleChoiceShape;

impl QuestionShape for MultipleChoiceShape {
    fn tag(&self) -> SchemaTag {
        SchemaTag::MultipleChoice
    }

    fn syllabus_fields(&self) -> &'static [&'static str] {
        &["syllabus.number"]
    }

    fn text_fields(&self) -> &'static [&'static str] {
        &["text", "options"]
    }

    fn decode(&self, document: Value) -> Result<QuestionRecord, serde_json::Error> {
        serde_json::from_value::<MultipleChoice>(document).map(QuestionRecord::MultipleChoice)
    }
}
