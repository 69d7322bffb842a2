//! Elapsed-time measurement for log fields

use std::time::Instant;

/// A simple duration timer for logging elapsed time
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed whole milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Elapsed milliseconds as a log field value
    pub fn elapsed_ms_field(&self) -> String {
        self.elapsed_ms().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
