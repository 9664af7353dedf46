//! Canonical tool identifiers.

use std::fmt;

/// How the coordinator may schedule a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionClass {
    /// May run concurrently with other parallel-safe calls.
    Parallel,
    /// Runs alone, in original request order, after the parallel calls.
    Sequential,
}

/// Tool identity after alias normalization.
///
/// Backends name the same tool in several ways (`read_file`, `file_read`,
/// `Read`); everything downstream of [`ToolKind::from_name`] only sees the
/// canonical kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Read,
    Write,
    Edit,
    Glob,
    Grep,
    Bash,
    TodoWrite,
    AskUser,
    WebFetch,
    Search,
    /// Remote or domain-specific tools, kept verbatim.
    Custom(String),
}

impl ToolKind {
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "read" | "readfile" | "fileread" | "view" | "cat" => ToolKind::Read,
            "write" | "writefile" | "filewrite" | "create" | "createfile" => ToolKind::Write,
            "edit" | "editfile" | "fileedit" | "strreplace" | "patch" => ToolKind::Edit,
            "glob" | "findfiles" | "listfiles" | "ls" => ToolKind::Glob,
            "grep" | "searchfiles" | "ripgrep" | "rg" => ToolKind::Grep,
            "bash" | "shell" | "runcommand" | "exec" | "execute" | "terminal" => ToolKind::Bash,
            "todowrite" | "updatetodos" | "todo" | "todos" => ToolKind::TodoWrite,
            "askuser" | "askuserquestion" | "askquestion" | "ask" => ToolKind::AskUser,
            "webfetch" | "fetch" | "fetchurl" => ToolKind::WebFetch,
            "search" | "websearch" => ToolKind::Search,
            _ => ToolKind::Custom(name.trim().to_string()),
        }
    }

    pub fn canonical_name(&self) -> &str {
        match self {
            ToolKind::Read => "Read",
            ToolKind::Write => "Write",
            ToolKind::Edit => "Edit",
            ToolKind::Glob => "Glob",
            ToolKind::Grep => "Grep",
            ToolKind::Bash => "Bash",
            ToolKind::TodoWrite => "TodoWrite",
            ToolKind::AskUser => "AskUser",
            ToolKind::WebFetch => "WebFetch",
            ToolKind::Search => "Search",
            ToolKind::Custom(name) => name,
        }
    }

    pub fn execution_class(&self) -> ExecutionClass {
        match self {
            ToolKind::Bash | ToolKind::TodoWrite | ToolKind::AskUser => ExecutionClass::Sequential,
            _ => ExecutionClass::Parallel,
        }
    }

    pub fn is_sequential(&self) -> bool {
        self.execution_class() == ExecutionClass::Sequential
    }

    /// Tools that change files on disk.
    pub fn writes_files(&self) -> bool {
        matches!(self, ToolKind::Write | ToolKind::Edit)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

impl From<&str> for ToolKind {
    fn from(name: &str) -> Self {
        ToolKind::from_name(name)
    }
}
