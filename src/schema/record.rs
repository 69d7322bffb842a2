//! Typed question records
//!
//! Stored documents are loosely typed: `image` may be a string or a list,
//! `syllabus` on sub-sub-questions may be one object or a list, numbers may
//! arrive as strings. The deserializers here absorb those variations so the
//! rest of the crate sees one shape per tag.

use std::collections::BTreeSet;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::partition::SchemaTag;

/// Syllabus topic reference attached to a question part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusRef {
    #[serde(default, deserialize_with = "lenient_string")]
    pub number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<String>,
}

/// A full structured question with its nested parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullQuestion {
    #[serde(rename = "_id", default, deserialize_with = "object_id")]
    pub id: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub number: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_marks")]
    pub marks: u32,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub image: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub ms_image: Vec<String>,
    #[serde(default)]
    pub syllabus: Option<SyllabusRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subquestions: Vec<SubQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,
}

/// A lettered part, standalone or nested in a [`FullQuestion`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuestion {
    #[serde(rename = "_id", default, deserialize_with = "object_id")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_marks")]
    pub marks: u32,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub image: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub ms_image: Vec<String>,
    #[serde(default)]
    pub syllabus: Option<SyllabusRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subsubquestions: Vec<SubSubQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_name: Option<String>,
    #[serde(default, deserialize_with = "optional_id", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string", skip_serializing_if = "Option::is_none")]
    pub parent_number: Option<String>,
}

/// A roman-numbered part, standalone or nested in a [`SubQuestion`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubSubQuestion {
    #[serde(rename = "_id", default, deserialize_with = "object_id")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_marks")]
    pub marks: u32,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub image: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub ms_image: Vec<String>,
    #[serde(default, deserialize_with = "syllabus_list")]
    pub syllabus: Vec<SyllabusRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper_name: Option<String>,
    #[serde(default, deserialize_with = "optional_id", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string", skip_serializing_if = "Option::is_none")]
    pub parent_number: Option<String>,
}

/// A multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoice {
    #[serde(rename = "_id", default, deserialize_with = "object_id")]
    pub id: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub number: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<String>,
    #[serde(default, deserialize_with = "lenient_marks")]
    pub marks: u32,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub image: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub ms_image: Vec<String>,
    #[serde(default)]
    pub syllabus: Option<SyllabusRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper: Option<String>,
}

/// A decoded record of any shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "kebab-case")]
pub enum QuestionRecord {
    FullQuestion(FullQuestion),
    SubQuestion(SubQuestion),
    SubSubQuestion(SubSubQuestion),
    MultipleChoice(MultipleChoice),
}

impl QuestionRecord {
    pub fn id(&self) -> &str {
        match self {
            QuestionRecord::FullQuestion(q) => &q.id,
            QuestionRecord::SubQuestion(q) => &q.id,
            QuestionRecord::SubSubQuestion(q) => &q.id,
            QuestionRecord::MultipleChoice(q) => &q.id,
        }
    }

    pub fn schema_tag(&self) -> SchemaTag {
        match self {
            QuestionRecord::FullQuestion(_) => SchemaTag::FullQuestion,
            QuestionRecord::SubQuestion(_) => SchemaTag::SubQuestion,
            QuestionRecord::SubSubQuestion(_) => SchemaTag::SubSubQuestion,
            QuestionRecord::MultipleChoice(_) => SchemaTag::MultipleChoice,
        }
    }

    /// Question number as displayed (`3`, `b`, `iv`)
    pub fn number_label(&self) -> String {
        match self {
            QuestionRecord::FullQuestion(q) => q.number.to_string(),
            QuestionRecord::SubQuestion(q) => q.number.clone(),
            QuestionRecord::SubSubQuestion(q) => q.number.clone(),
            QuestionRecord::MultipleChoice(q) => q.number.to_string(),
        }
    }

    /// Every syllabus number this record or any nested part is tagged with
    pub fn syllabus_numbers(&self) -> BTreeSet<String> {
        let mut numbers = BTreeSet::new();
        match self {
            QuestionRecord::FullQuestion(q) => {
                push_ref(&mut numbers, q.syllabus.as_ref());
                for sub in &q.subquestions {
                    sub.collect_numbers(&mut numbers);
                }
            }
            QuestionRecord::SubQuestion(q) => q.collect_numbers(&mut numbers),
            QuestionRecord::SubSubQuestion(q) => q.collect_numbers(&mut numbers),
            QuestionRecord::MultipleChoice(q) => push_ref(&mut numbers, q.syllabus.as_ref()),
        }
        numbers
    }
}

impl SubQuestion {
    fn collect_numbers(&self, numbers: &mut BTreeSet<String>) {
        push_ref(numbers, self.syllabus.as_ref());
        for part in &self.subsubquestions {
            part.collect_numbers(numbers);
        }
    }
}

impl SubSubQuestion {
    fn collect_numbers(&self, numbers: &mut BTreeSet<String>) {
        for syllabus in &self.syllabus {
            push_ref(numbers, Some(syllabus));
        }
    }
}

fn push_ref(numbers: &mut BTreeSet<String>, syllabus: Option<&SyllabusRef>) {
    if let Some(s) = syllabus {
        let number = s.number.trim();
        if !number.is_empty() {
            numbers.insert(number.to_string());
        }
    }
}

// Deserialization helpers

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(mut map) => match map.remove("$oid") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

fn object_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(String::new()),
        other => id_from_value(other).ok_or_else(|| de::Error::custom("unsupported _id form")),
    }
}

fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(id_from_value(Value::deserialize(deserializer)?))
}

fn string_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_from_value(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(string_from_value(Value::deserialize(deserializer)?))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| de::Error::custom(format!("question number {} out of range", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("question number '{}' is not an integer", s))),
        other => Err(de::Error::custom(format!(
            "question number must be an integer, got {}",
            other
        ))),
    }
}

/// Marks are optional metadata; anything unreadable counts as 0.
fn lenient_marks<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s]),
        Value::Array(items) => items
            .into_iter()
            .filter(|v| !v.is_null())
            .map(|v| match v {
                Value::String(s) => Ok(s),
                other => Err(de::Error::custom(format!("expected image path, got {}", other))),
            })
            .collect(),
        other => Err(de::Error::custom(format!(
            "expected image path or list, got {}",
            other
        ))),
    }
}

fn syllabus_list<'de, D>(deserializer: D) -> Result<Vec<SyllabusRef>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .into_iter()
            .filter(|v| !v.is_null())
            .map(|v| serde_json::from_value(v).map_err(de::Error::custom))
            .collect(),
        single => serde_json::from_value(single)
            .map(|s| vec![s])
            .map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_question_with_nested_parts() {
        let q: FullQuestion = serde_json::from_value(json!({
            "_id": {"$oid": "65f0aa"},
            "number": 4,
            "text": "Enzymes",
            "marks": null,
            "image": "img/q4.png",
            "syllabus": {"number": "5.1", "title": "Enzymes"},
            "subquestions": [{
                "number": "a",
                "text": "Define enzyme",
                "syllabus": {"number": "5.1.2", "title": "Definition"},
                "subsubquestions": [
                    {"number": "i", "text": "", "syllabus": {"number": "5.2", "title": ""}}
                ]
            }]
        }))
        .unwrap();

        assert_eq!(q.id, "65f0aa");
        assert_eq!(q.marks, 0);
        assert_eq!(q.image, vec!["img/q4.png"]);
        assert!(q.ms_image.is_empty());
        assert_eq!(q.subquestions[0].subsubquestions[0].syllabus.len(), 1);

        let numbers: Vec<String> = QuestionRecord::FullQuestion(q)
            .syllabus_numbers()
            .into_iter()
            .collect();
        assert_eq!(numbers, vec!["5.1", "5.1.2", "5.2"]);
    }

    #[test]
    fn test_sub_question_parent_linkage() {
        let q: SubQuestion = serde_json::from_value(json!({
            "_id": "s1",
            "number": "b",
            "text": "Explain",
            "parent_id": {"$oid": "65f0aa"},
            "parent_number": 4,
            "paper_name": "0610_s20_qp_32",
            "image": ["a.png", "b.png"],
            "subsubquestions": null
        }))
        .unwrap();
        assert_eq!(q.parent_id.as_deref(), Some("65f0aa"));
        assert_eq!(q.parent_number.as_deref(), Some("4"));
        assert_eq!(q.image.len(), 2);
        assert!(q.subsubquestions.is_empty());
    }

    #[test]
    fn test_sub_sub_question_syllabus_list() {
        let q: SubSubQuestion = serde_json::from_value(json!({
            "_id": "ss1",
            "number": "ii",
            "syllabus": [{"number": "2.1"}, {"number": "2.3", "title": "x"}]
        }))
        .unwrap();
        let record = QuestionRecord::SubSubQuestion(q);
        assert_eq!(record.syllabus_numbers().len(), 2);
        assert_eq!(record.number_label(), "ii");
        assert_eq!(record.schema_tag(), SchemaTag::SubSubQuestion);
    }

    #[test]
    fn test_multiple_choice_number_as_string() {
        let q: MultipleChoice = serde_json::from_value(json!({
            "_id": "m1",
            "number": "12",
            "text": "Which organelle?",
            "options": ["A", "B", "C", "D"],
            "answer": "C",
            "marks": 1.0
        }))
        .unwrap();
        assert_eq!(q.number, 12);
        assert_eq!(q.marks, 1);
        assert!(q.syllabus.is_none());
    }

    #[test]
    fn test_missing_number_rejected() {
        let result: Result<MultipleChoice, _> =
            serde_json::from_value(json!({"_id": "m1", "text": "No number"}));
        assert!(result.is_err());

        let result: Result<FullQuestion, _> =
            serde_json::from_value(json!({"_id": "q", "number": "four"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_record_serializes_with_shape() {
        let q: MultipleChoice =
            serde_json::from_value(json!({"_id": "m1", "number": 1, "text": "t"})).unwrap();
        let json = serde_json::to_value(QuestionRecord::MultipleChoice(q)).unwrap();
        assert_eq!(json["shape"], "multiple-choice");
        assert_eq!(json["_id"], "m1");
    }
}
