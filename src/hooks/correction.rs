use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};

pub const DEFAULT_CORRECTION_CAPACITY: usize = 50;

/// One retry of a failed call with corrected parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionAttempt {
    pub tool_name: String,
    pub original_params: Map<String, Value>,
    pub error: String,
    pub corrected_params: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

/// Ring buffer of the most recent correction attempts. Informational only.
#[derive(Debug)]
pub struct CorrectionLog {
    capacity: usize,
    entries: Mutex<VecDeque<CorrectionAttempt>>,
}

impl Default for CorrectionLog {
    fn default() -> Self {
        Self::new(DEFAULT_CORRECTION_CAPACITY)
    }
}

impl CorrectionLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn record(
        &self,
        tool_name: &str,
        original_params: Map<String, Value>,
        error: impl Into<String>,
        corrected_params: Map<String, Value>,
    ) {
        let attempt = CorrectionAttempt {
            tool_name: tool_name.to_string(),
            original_params,
            error: error.into(),
            corrected_params,
            timestamp: Utc::now(),
        };
        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(attempt);
    }

    /// Attempts for `tool_name`, oldest first.
    pub fn for_tool(&self, tool_name: &str) -> Vec<CorrectionAttempt> {
        self.entries
            .lock()
            .iter()
            .filter(|attempt| attempt.tool_name == tool_name)
            .cloned()
            .collect()
    }

    pub fn all(&self) -> Vec<CorrectionAttempt> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn keeps_only_most_recent_entries() {
        let log = CorrectionLog::new(3);
        for i in 0..5 {
            log.record(
                "Edit",
                params(json!({"attempt": i})),
                "old_string not found",
                params(json!({"attempt": i + 1})),
            );
        }
        let all = log.all();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].original_params["attempt"], json!(2));
        assert_eq!(all[2].original_params["attempt"], json!(4));
    }

    #[test]
    fn filters_by_tool_name() {
        let log = CorrectionLog::default();
        log.record("Edit", Map::new(), "e1", Map::new());
        log.record("Read", Map::new(), "e2", Map::new());
        log.record("Edit", Map::new(), "e3", Map::new());

        let edits: Vec<String> = log.for_tool("Edit").into_iter().map(|a| a.error).collect();
        assert_eq!(edits, vec!["e1", "e3"]);
        assert_eq!(log.capacity(), DEFAULT_CORRECTION_CAPACITY);
    }
}
