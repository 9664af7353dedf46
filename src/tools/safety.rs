//! Dangerous shell command detection.

use std::sync::OnceLock;

use regex::Regex;

/// Category of a shell command that needs explicit user approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DangerCategory {
    DestructiveFilesystem,
    ForcedGit,
    PrivilegeEscalation,
    RawDiskWrite,
    RemoteScript,
    InsecurePermissions,
    ForkBomb,
}

impl DangerCategory {
    pub fn describe(&self) -> &'static str {
        match self {
            DangerCategory::DestructiveFilesystem => "recursive or forced file deletion",
            DangerCategory::ForcedGit => "destructive git operation",
            DangerCategory::PrivilegeEscalation => "privilege escalation",
            DangerCategory::RawDiskWrite => "raw disk write",
            DangerCategory::RemoteScript => "piping a remote script into a shell",
            DangerCategory::InsecurePermissions => "world-writable permissions",
            DangerCategory::ForkBomb => "fork bomb",
        }
    }
}

/// A matched dangerous command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DangerousOperation {
    pub category: DangerCategory,
    pub pattern: &'static str,
}

impl DangerousOperation {
    pub fn describe(&self) -> &'static str {
        self.category.describe()
    }
}

const PATTERNS: &[(DangerCategory, &str)] = &[
    (
        DangerCategory::DestructiveFilesystem,
        r"\brm\s+(-[a-zA-Z]*[rRf][a-zA-Z]*\s+)+",
    ),
    (DangerCategory::DestructiveFilesystem, r"\brm\s+--(recursive|force)\b"),
    (DangerCategory::DestructiveFilesystem, r"\bfind\b.*\s-delete\b"),
    (DangerCategory::DestructiveFilesystem, r"\bshred\b"),
    (DangerCategory::ForcedGit, r"\bgit\s+push\b.*(\s--force\b|\s-f\b|\s--force-with-lease\b)"),
    (DangerCategory::ForcedGit, r"\bgit\s+reset\s+--hard\b"),
    (DangerCategory::ForcedGit, r"\bgit\s+clean\s+-[a-zA-Z]*f"),
    (DangerCategory::ForcedGit, r"\bgit\s+branch\s+-D\b"),
    (DangerCategory::ForcedGit, r"\bgit\s+checkout\s+--\s+\."),
    (DangerCategory::RemoteScript, r"\b(curl|wget)\b[^|]*\|\s*(sudo\s+)?(ba|z|da)?sh\b"),
    (DangerCategory::PrivilegeEscalation, r"(^|[;&|]\s*)(sudo|su|doas)\b"),
    (DangerCategory::RawDiskWrite, r"\bdd\b.*\bof=/dev/"),
    (DangerCategory::RawDiskWrite, r"\bmkfs(\.\w+)?\b"),
    (DangerCategory::RawDiskWrite, r"\bfdisk\b"),
    (DangerCategory::RawDiskWrite, r">\s*/dev/(sd|nvme|hd|disk)"),
    (DangerCategory::InsecurePermissions, r"\bchmod\s+(-R\s+)?0?777\b"),
    (DangerCategory::ForkBomb, r":\(\)\s*\{\s*:\s*\|\s*:\s*&\s*\}\s*;\s*:"),
];

fn compiled() -> &'static [(DangerCategory, &'static str, Regex)] {
    static TABLE: OnceLock<Vec<(DangerCategory, &'static str, Regex)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        PATTERNS
            .iter()
            .filter_map(|(category, pattern)| match Regex::new(pattern) {
                Ok(regex) => Some((*category, *pattern, regex)),
                Err(err) => {
                    log::error!("invalid danger pattern {pattern}: {err}");
                    None
                }
            })
            .collect()
    })
}

/// Returns the first dangerous pattern the command matches.
pub fn classify_command(command: &str) -> Option<DangerousOperation> {
    compiled()
        .iter()
        .find(|(_, _, regex)| regex.is_match(command))
        .map(|(category, pattern, _)| DangerousOperation {
            category: *category,
            pattern,
        })
}
