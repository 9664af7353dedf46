//! Local filesystem and shell tools served to the agent runtime.

mod files;
mod search;
mod shell;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use agentcore::chat::{ParameterProperty, ParametersSchema, ToolSchema};
use agentcore::tools::{ToolBackend, ToolError, ToolKind, ToolResult};

/// Serves `Read`, `Write`, `Edit`, `Glob`, `Grep` and `Bash` rooted at a
/// working directory.
#[derive(Debug, Clone)]
pub struct LocalTools {
    working_dir: PathBuf,
}

impl LocalTools {
    pub fn new(working_dir: PathBuf) -> Self {
        Self { working_dir }
    }

    /// Relative paths resolve against the working directory.
    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }
}

#[async_trait]
impl ToolBackend for LocalTools {
    async fn execute(&self, name: &str, params: &Map<String, Value>) -> Result<ToolResult, ToolError> {
        log::debug!("local tool {name}");
        match ToolKind::from_name(name) {
            ToolKind::Read => files::read(self, parse_args(params)?).await,
            ToolKind::Write => files::write(self, parse_args(params)?).await,
            ToolKind::Edit => files::edit(self, parse_args(params)?).await,
            ToolKind::Glob => search::glob(self, parse_args(params)?).await,
            ToolKind::Grep => search::grep(self, parse_args(params)?).await,
            ToolKind::Bash => shell::bash(self, parse_args(params)?).await,
            _ => Err(ToolError::NotFound(name.to_string())),
        }
    }

    fn definitions(&self) -> Vec<ToolSchema> {
        vec![
            schema(
                ToolKind::Read,
                "Read a text file. Lines are returned as `L<n>: <text>`.",
                &[
                    ("file_path", "string", "Path of the file to read."),
                    ("offset", "number", "1-indexed line to start from (default 1)."),
                    ("limit", "number", "Maximum lines to return (default 2000)."),
                ],
                &["file_path"],
            ),
            schema(
                ToolKind::Write,
                "Write a file, replacing its contents. Existing files must be read first.",
                &[
                    ("file_path", "string", "Path of the file to write."),
                    ("content", "string", "Full new contents."),
                ],
                &["file_path", "content"],
            ),
            schema(
                ToolKind::Edit,
                "Replace an exact string in a file that was read first.",
                &[
                    ("file_path", "string", "Path of the file to edit."),
                    ("old_string", "string", "Exact text to replace; must be unique unless replace_all."),
                    ("new_string", "string", "Replacement text."),
                    ("replace_all", "boolean", "Replace every occurrence."),
                ],
                &["file_path", "old_string", "new_string"],
            ),
            schema(
                ToolKind::Glob,
                "Find files by glob pattern such as `src/**/*.rs`.",
                &[
                    ("pattern", "string", "Glob pattern."),
                    ("path", "string", "Directory to search (defaults to the working directory)."),
                ],
                &["pattern"],
            ),
            schema(
                ToolKind::Grep,
                "Search file contents with a regular expression.",
                &[
                    ("pattern", "string", "Regular expression."),
                    ("path", "string", "Directory to search (defaults to the working directory)."),
                    ("include", "string", "Glob restricting which files are searched."),
                ],
                &["pattern"],
            ),
            schema(
                ToolKind::Bash,
                "Run a shell command in the working directory.",
                &[
                    ("command", "string", "Command line passed to `sh -c`."),
                    ("timeout_ms", "number", "Kill the command after this many milliseconds."),
                ],
                &["command"],
            ),
        ]
    }
}

fn parse_args<T: DeserializeOwned>(params: &Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|e| ToolError::InvalidArgs(e.to_string()))
}

fn schema(
    kind: ToolKind,
    description: &str,
    params: &[(&str, &str, &str)],
    required: &[&str],
) -> ToolSchema {
    let mut parameters = ParametersSchema::default();
    for (name, param_type, param_description) in params {
        parameters.properties.insert(
            (*name).to_string(),
            ParameterProperty::new(param_type, param_description),
        );
    }
    parameters.required = required.iter().map(|name| (*name).to_string()).collect();
    ToolSchema::new(kind.canonical_name(), description, &parameters)
}

#[cfg(test)]
mod tests;
