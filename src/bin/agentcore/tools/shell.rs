//! `Bash`: one-shot commands through `sh -c`.

use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tokio::process::Command;

use agentcore::tools::{ToolError, ToolResult};

use super::LocalTools;

const DEFAULT_TIMEOUT_MS: u64 = 120_000;
const MAX_OUTPUT_CHARS: usize = 30_000;

#[derive(Debug, Deserialize)]
pub struct BashArgs {
    command: String,
    timeout_ms: Option<u64>,
}

pub async fn bash(tools: &LocalTools, args: BashArgs) -> Result<ToolResult, ToolError> {
    if args.command.trim().is_empty() {
        return Err(ToolError::InvalidArgs("command must not be empty".into()));
    }
    let timeout = Duration::from_millis(args.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS));

    let child = Command::new("sh")
        .arg("-c")
        .arg(&args.command)
        .current_dir(&tools.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ToolError::Execution(format!("Failed to spawn shell: {e}")))?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => output?,
        Err(_) => {
            return Ok(ToolResult::failure(format!(
                "Command timed out after {}ms",
                timeout.as_millis()
            ))
            .with_suggestion("Raise timeout_ms or run a narrower command."))
        }
    };

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stderr);
    }
    let text = truncate_output(text);
    let exit_code = output.status.code();

    if output.status.success() {
        Ok(ToolResult::ok(text).with_extra("exitCode", json!(exit_code)))
    } else {
        let code = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
        Ok(ToolResult::failure(format!("Exit code {code}\n{text}")).with_extra("exitCode", json!(exit_code)))
    }
}

fn truncate_output(text: String) -> String {
    if text.chars().count() <= MAX_OUTPUT_CHARS {
        return text;
    }
    let mut truncated: String = text.chars().take(MAX_OUTPUT_CHARS).collect();
    truncated.push_str("\n(output truncated)");
    truncated
}
