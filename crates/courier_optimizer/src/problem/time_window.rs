use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A delivery window `[start, end)`. Arriving early means waiting until
/// `start`; arriving after `end` is penalized by the cost model.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: Timestamp,
    end: Timestamp,
}

impl TimeWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        TimeWindow { start, end }
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }

    pub fn is_satisfied(&self, arrival: Timestamp) -> bool {
        arrival <= self.end
    }
}
