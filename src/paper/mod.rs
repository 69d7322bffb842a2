//! Exam paper metadata encoded in paper codes

mod code;

pub use code::{PaperCode, PaperCodeError, Season};
