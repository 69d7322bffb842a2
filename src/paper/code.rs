//! Paper-code parsing
//!
//! Codes look like `0610_s20_qp_32`: subject, session (season letter plus
//! two-digit year), component kind, variant. Anything after the fourth
//! segment (shape suffixes such as `_mcq`) is ignored.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Paper-code parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaperCodeError {
    #[error("paper code '{0}' must have at least four '_'-separated parts")]
    TooFewParts(String),

    #[error("paper code '{code}' has malformed session '{session}'")]
    MalformedSession { code: String, session: String },

    #[error("paper code '{0}' has an empty subject or variant")]
    EmptyPart(String),
}

/// Exam series a session letter stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// `m`: February/March series
    March,
    /// `s`: May/June series
    Summer,
    /// `w`: October/November series
    Winter,
}

impl Season {
    fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'm' => Some(Season::March),
            's' => Some(Season::Summer),
            'w' => Some(Season::Winter),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::March => "Feb/March",
            Season::Summer => "May/June",
            Season::Winter => "Oct/Nov",
        }
    }
}

/// Metadata carried by a paper code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaperCode {
    pub subject_code: String,
    pub session: String,
    pub year: String,
    pub kind: String,
    pub variant: String,
}

impl PaperCode {
    /// Parses `0610_s20_qp_32` into its parts.
    pub fn parse(code: &str) -> Result<Self, PaperCodeError> {
        let parts: Vec<&str> = code.trim().split('_').collect();
        if parts.len() < 4 {
            return Err(PaperCodeError::TooFewParts(code.to_string()));
        }

        let (subject_code, session, kind, variant) = (parts[0], parts[1], parts[2], parts[3]);
        if subject_code.is_empty() || variant.is_empty() {
            return Err(PaperCodeError::EmptyPart(code.to_string()));
        }

        let malformed = || PaperCodeError::MalformedSession {
            code: code.to_string(),
            session: session.to_string(),
        };
        let mut chars = session.chars();
        let letter = chars.next().ok_or_else(malformed)?;
        Season::from_letter(letter).ok_or_else(malformed)?;
        let digits: String = chars.collect();
        if digits.len() != 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }

        Ok(Self {
            subject_code: subject_code.to_string(),
            session: session.to_string(),
            year: format!("20{}", digits),
            kind: kind.to_string(),
            variant: variant.to_string(),
        })
    }

    /// Season of the session letter
    pub fn season(&self) -> Season {
        self.session
            .chars()
            .next()
            .and_then(Season::from_letter)
            .unwrap_or(Season::Summer)
    }

    /// The four-part code this metadata came from
    pub fn code(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.subject_code, self.session, self.kind, self.variant
        )
    }
}

impl FromStr for PaperCode {
    type Err = PaperCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PaperCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
