//! Tools the coordinator answers itself instead of the backend.

use serde_json::{json, Map, Value};

use crate::chat::{ParameterProperty, ParametersSchema, ToolSchema};
use crate::tools::{TodoItem, TodoSummary, ToolResult, UserInteraction, NO_ANSWER_MARKER};

pub(super) fn todo_write(interaction: &dyn UserInteraction, params: &Map<String, Value>) -> ToolResult {
    let Some(raw) = params.get("todos") else {
        return ToolResult::failure("invalid tool arguments: missing field `todos`");
    };
    let todos: Vec<TodoItem> = match serde_json::from_value(raw.clone()) {
        Ok(todos) => todos,
        Err(err) => return ToolResult::failure(format!("invalid tool arguments: {err}")),
    };

    interaction.todos_updated(&todos);
    let summary = TodoSummary::of(&todos);
    ToolResult::ok(summary.describe()).with_extra(
        "summary",
        json!({
            "total": summary.total(),
            "pending": summary.pending,
            "inProgress": summary.in_progress,
            "completed": summary.completed,
        }),
    )
}

pub(super) async fn ask_user(
    interaction: &dyn UserInteraction,
    params: &Map<String, Value>,
) -> ToolResult {
    let Some(question) = params.get("question").and_then(Value::as_str) else {
        return ToolResult::failure("invalid tool arguments: missing field `question`");
    };
    let options = params
        .get("options")
        .and_then(Value::as_array)
        .map(|options| options.iter().filter_map(option_label).collect::<Vec<_>>())
        .unwrap_or_default();

    match interaction.ask_user(question, &options).await {
        Some(answer) => ToolResult::ok(answer),
        None => ToolResult::ok(NO_ANSWER_MARKER).with_extra("answered", Value::Bool(false)),
    }
}

// Options arrive either as plain strings or as `{label, description}` objects.
fn option_label(option: &Value) -> Option<String> {
    match option {
        Value::String(label) => Some(label.clone()),
        Value::Object(map) => map.get("label").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Schemas for the tools answered by the coordinator itself.
pub(super) fn definitions() -> Vec<ToolSchema> {
    let mut todo_params = ParametersSchema::default();
    let item = ParameterProperty::new(
        "object",
        "A task with `content`, `status` (pending, in_progress or completed) and optional `activeForm`",
    );
    let mut todos = ParameterProperty::new("array", "The complete, updated task list");
    todos.items = Some(Box::new(item));
    todo_params.properties.insert("todos".into(), todos);
    todo_params.required.push("todos".into());

    let mut ask_params = ParametersSchema::default();
    ask_params.properties.insert(
        "question".into(),
        ParameterProperty::new("string", "The question to ask the user"),
    );
    let mut options = ParameterProperty::new("array", "Optional answers to choose from");
    options.items = Some(Box::new(ParameterProperty::new("string", "One answer")));
    ask_params.properties.insert("options".into(), options);
    ask_params.required.push("question".into());

    vec![
        ToolSchema::new(
            "TodoWrite",
            "Replace the session task list. Use it to plan and track multi-step work.",
            &todo_params,
        ),
        ToolSchema::new(
            "AskUser",
            "Ask the user a clarifying question and wait for the answer.",
            &ask_params,
        ),
    ]
}
