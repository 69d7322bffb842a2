//! Question schemas
//!
//! Typed records for each partition shape, the per-shape field layout, and
//! the dispatcher that routes a partition to its shape.

mod dispatcher;
mod record;
mod shapes;

pub use dispatcher::{PartitionHandle, SchemaDispatcher};
pub use record::{
    FullQuestion, MultipleChoice, QuestionRecord, SubQuestion, SubSubQuestion, SyllabusRef,
};
pub use shapes::{
    FullQuestionShape, MultipleChoiceShape, QuestionShape, SubQuestionShape, SubSubQuestionShape,
};
