//! `Read`, `Write` and `Edit`.

use serde::Deserialize;
use serde_json::json;

use agentcore::tools::{ToolError, ToolResult};

use super::LocalTools;

const DEFAULT_OFFSET: usize = 1;
const DEFAULT_LIMIT: usize = 2000;
const MAX_LINE_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ReadArgs {
    file_path: String,
    #[serde(default = "default_offset")]
    offset: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_offset() -> usize {
    DEFAULT_OFFSET
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct WriteArgs {
    file_path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
pub struct EditArgs {
    file_path: String,
    old_string: String,
    new_string: String,
    #[serde(default)]
    replace_all: bool,
}

pub async fn read(tools: &LocalTools, args: ReadArgs) -> Result<ToolResult, ToolError> {
    if args.offset == 0 {
        return Err(ToolError::InvalidArgs("offset must be a 1-indexed line number".into()));
    }
    let path = tools.resolve(&args.file_path);
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ToolError::Execution(format!("{}: {e}", path.display())))?;

    let lines: Vec<&str> = content.lines().collect();
    if args.offset > lines.len().max(1) {
        return Err(ToolError::Execution(format!(
            "offset {} exceeds file length of {} lines",
            args.offset,
            lines.len()
        )));
    }
    let start = args.offset - 1;
    let end = start.saturating_add(args.limit).min(lines.len());
    let slice: Vec<String> = lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| format!("L{}: {}", start + i + 1, truncate_line(line)))
        .collect();

    Ok(ToolResult::ok(slice.join("\n")).with_extra("totalLines", json!(lines.len())))
}

pub async fn write(tools: &LocalTools, args: WriteArgs) -> Result<ToolResult, ToolError> {
    let path = tools.resolve(&args.file_path);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, args.content.as_bytes()).await?;
    Ok(ToolResult::ok(format!(
        "Wrote {} bytes to {}",
        args.content.len(),
        path.display()
    )))
}

pub async fn edit(tools: &LocalTools, args: EditArgs) -> Result<ToolResult, ToolError> {
    if args.old_string.is_empty() {
        return Err(ToolError::InvalidArgs("old_string must not be empty".into()));
    }
    if args.old_string == args.new_string {
        return Err(ToolError::InvalidArgs("old_string and new_string are identical".into()));
    }
    let path = tools.resolve(&args.file_path);
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ToolError::Execution(format!("{}: {e}", path.display())))?;

    let occurrences = content.matches(args.old_string.as_str()).count();
    match occurrences {
        0 => {
            return Ok(ToolResult::failure(format!(
                "old_string not found in {}",
                path.display()
            ))
            .with_suggestion("Read the file again and copy the exact text, including whitespace."))
        }
        n if n > 1 && !args.replace_all => {
            return Ok(ToolResult::failure(format!(
                "old_string appears {n} times in {}",
                path.display()
            ))
            .with_suggestion("Include more surrounding context, or set replace_all."))
        }
        _ => {}
    }

    let updated = if args.replace_all {
        content.replace(args.old_string.as_str(), &args.new_string)
    } else {
        content.replacen(args.old_string.as_str(), &args.new_string, 1)
    };
    tokio::fs::write(&path, updated.as_bytes()).await?;

    let replaced = if args.replace_all { occurrences } else { 1 };
    Ok(ToolResult::ok(format!(
        "Edited {}: {replaced} replacement(s)",
        path.display()
    ))
    .with_extra("replacements", json!(replaced)))
}

fn truncate_line(line: &str) -> String {
    if line.chars().count() <= MAX_LINE_LENGTH {
        return line.to_string();
    }
    let mut truncated: String = line.chars().take(MAX_LINE_LENGTH).collect();
    truncated.push_str("...");
    truncated
}
