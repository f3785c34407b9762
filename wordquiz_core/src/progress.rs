//! Progress tracking - answer tally for the running session

use serde::Serialize;

/// Attempt statistics for one play session
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStats {
    pub total_attempts: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub accuracy_percent: f64,
}

impl AttemptStats {
    pub fn record(&mut self, is_correct: bool) {
        self.total_attempts += 1;
        if is_correct {
            self.correct_count += 1;
        } else {
            self.incorrect_count += 1;
        }
        self.accuracy_percent = (self.correct_count as f64 / self.total_attempts as f64) * 100.0;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
