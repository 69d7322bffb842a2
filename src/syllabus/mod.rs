//! Syllabus topics
//!
//! - `prefix`: hierarchical topic-prefix matching used by every query
//! - `tree`: the topic hierarchy built from the `syllabus` collection

pub mod prefix;
mod tree;

pub use prefix::{matches, PrefixSet};
pub use tree::{compare_numbers, SyllabusNode, SyllabusTopic, SyllabusTree};
