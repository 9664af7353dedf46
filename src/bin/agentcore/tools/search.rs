//! `Glob` and `Grep` over a directory tree.

use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use walkdir::WalkDir;

use agentcore::tools::{ToolError, ToolResult};

use super::LocalTools;

const MAX_RESULTS: usize = 200;
const SKIP_DIRS: &[&str] = &["node_modules", "target", "dist", "build", "__pycache__"];

#[derive(Debug, Deserialize)]
pub struct GlobArgs {
    pattern: String,
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GrepArgs {
    pattern: String,
    path: Option<String>,
    include: Option<String>,
}

pub async fn glob(tools: &LocalTools, args: GlobArgs) -> Result<ToolResult, ToolError> {
    let root = search_root(tools, args.path.as_deref());
    let matcher = FileGlob::new(&args.pattern)?;

    let matches = tokio::task::spawn_blocking(move || -> Result<Vec<String>, ToolError> {
        Ok(walk_files(&root)?
            .into_iter()
            .filter(|relative| matcher.is_match(relative))
            .map(|relative| relative.to_string_lossy().into_owned())
            .collect())
    })
    .await
    .map_err(|e| ToolError::Execution(e.to_string()))??;

    if matches.is_empty() {
        return Ok(ToolResult::ok("No files found."));
    }
    let total = matches.len();
    let mut content = matches.into_iter().take(MAX_RESULTS).collect::<Vec<_>>().join("\n");
    if total > MAX_RESULTS {
        content.push_str(&format!("\n(Results truncated to {MAX_RESULTS} of {total} files)"));
    }
    Ok(ToolResult::ok(content).with_extra("count", json!(total)))
}

pub async fn grep(tools: &LocalTools, args: GrepArgs) -> Result<ToolResult, ToolError> {
    let root = search_root(tools, args.path.as_deref());
    let regex = Regex::new(&args.pattern)
        .map_err(|e| ToolError::InvalidArgs(format!("invalid pattern: {e}")))?;
    let include = args.include.as_deref().map(FileGlob::new).transpose()?;

    let hits = tokio::task::spawn_blocking(move || -> Result<Vec<String>, ToolError> {
        let mut hits = Vec::new();
        for relative in walk_files(&root)? {
            if include.as_ref().is_some_and(|m| !m.is_match(&relative)) {
                continue;
            }
            // Binary and unreadable files are skipped.
            let Ok(content) = fs::read_to_string(root.join(&relative)) else {
                continue;
            };
            for (index, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    hits.push(format!("{}:{}: {}", relative.display(), index + 1, line.trim_end()));
                }
            }
        }
        Ok(hits)
    })
    .await
    .map_err(|e| ToolError::Execution(e.to_string()))??;

    if hits.is_empty() {
        return Ok(ToolResult::ok("No matches found."));
    }
    let total = hits.len();
    let mut content = hits.into_iter().take(MAX_RESULTS).collect::<Vec<_>>().join("\n");
    if total > MAX_RESULTS {
        content.push_str(&format!("\n(Results truncated to {MAX_RESULTS} of {total} lines)"));
    }
    Ok(ToolResult::ok(content).with_extra("count", json!(total)))
}

fn search_root(tools: &LocalTools, path: Option<&str>) -> PathBuf {
    match path {
        Some(path) => tools.resolve(path),
        None => tools.working_dir.clone(),
    }
}

/// Regular files under `root`, relative to it, in name order. Hidden and
/// build directories are not entered.
fn walk_files(root: &Path) -> Result<Vec<PathBuf>, ToolError> {
    if !root.is_dir() {
        return Err(ToolError::Execution(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !name.starts_with('.') && !SKIP_DIRS.contains(&name.as_ref())
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::debug!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

/// Compiled glob. Patterns without `/` match the file name alone; others
/// match the whole relative path, with `*` stopping at separators.
#[derive(Debug)]
pub struct FileGlob {
    matcher: GlobMatcher,
    name_only: bool,
}

impl FileGlob {
    pub fn new(pattern: &str) -> Result<Self, ToolError> {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .backslash_escape(true)
            .build()
            .map_err(|e| ToolError::InvalidArgs(format!("invalid glob {pattern}: {e}")))?;
        Ok(Self {
            matcher: glob.compile_matcher(),
            name_only: !pattern.contains('/'),
        })
    }

    pub fn is_match(&self, relative: &Path) -> bool {
        if self.name_only {
            relative
                .file_name()
                .is_some_and(|name| self.matcher.is_match(name))
        } else {
            self.matcher.is_match(relative)
        }
    }
}
