use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

/// One entry of the model-maintained task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub content: String,
    pub status: TodoStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_form: Option<String>,
}

/// Counts per status, as reported back to the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoSummary {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl TodoSummary {
    pub fn of(items: &[TodoItem]) -> Self {
        items.iter().fold(Self::default(), |mut summary, item| {
            match item.status {
                TodoStatus::Pending => summary.pending += 1,
                TodoStatus::InProgress => summary.in_progress += 1,
                TodoStatus::Completed => summary.completed += 1,
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed
    }

    pub fn describe(&self) -> String {
        format!(
            "Todos updated: {} total ({} pending, {} in progress, {} completed)",
            self.total(),
            self.pending,
            self.in_progress,
            self.completed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_payload_and_counts() {
        let items: Vec<TodoItem> = serde_json::from_str(
            r#"[
                {"content": "Read config", "status": "completed"},
                {"content": "Fix parser", "status": "in_progress", "activeForm": "Fixing parser"},
                {"content": "Add tests", "status": "pending"}
            ]"#,
        )
        .unwrap();

        assert_eq!(items[1].active_form.as_deref(), Some("Fixing parser"));
        let summary = TodoSummary::of(&items);
        assert_eq!(
            summary,
            TodoSummary {
                pending: 1,
                in_progress: 1,
                completed: 1
            }
        );
        assert_eq!(
            summary.describe(),
            "Todos updated: 3 total (1 pending, 1 in progress, 1 completed)"
        );
    }
}
