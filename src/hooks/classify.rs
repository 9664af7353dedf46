//! Error text classification for failed tool results.

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::tools::ErrorType;

// First match wins, so specific patterns come before generic ones.
const RULES: &[(&str, ErrorType, &str)] = &[
    (
        r"has not been read|read it first",
        ErrorType::Recoverable,
        "Read the file with the Read tool, then retry the change.",
    ),
    (
        r"old_string|string to replace|not unique|multiple matches",
        ErrorType::Recoverable,
        "Re-read the file and pass an exact, unique snippet to replace.",
    ),
    (
        r"unknown tool",
        ErrorType::Recoverable,
        "Use one of the tools listed in the tool definitions.",
    ),
    (
        r"invalid tool arguments|missing (required )?(field|parameter|argument)|invalid type",
        ErrorType::Recoverable,
        "Check the parameter names and types expected by the tool.",
    ),
    (
        r"permission denied|operation not permitted|eacces|eperm",
        ErrorType::Fatal,
        "Pick a location you can write to or ask the user to adjust permissions.",
    ),
    (
        r"no space left|enospc|read-only file system|erofs",
        ErrorType::Fatal,
        "The filesystem cannot be written; ask the user to free space or remount.",
    ),
    (
        r"no such file|not found|does not exist|enoent",
        ErrorType::Recoverable,
        "Check the path; use Glob to locate the file.",
    ),
    (
        r"timed? ?out|etimedout|deadline exceeded",
        ErrorType::Transient,
        "The operation timed out; retry, possibly with a narrower scope.",
    ),
    (
        r"rate limit|too many requests|\b429\b|\b503\b|temporarily unavailable|connection (reset|refused)|econnreset|econnrefused",
        ErrorType::Transient,
        "The service is temporarily unavailable; retry shortly.",
    ),
];

fn rules() -> &'static [(Regex, ErrorType, &'static str)] {
    static TABLE: OnceLock<Vec<(Regex, ErrorType, &'static str)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        RULES
            .iter()
            .filter_map(|(pattern, error_type, suggestion)| {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(regex) => Some((regex, *error_type, *suggestion)),
                    Err(err) => {
                        log::error!("invalid classifier pattern {pattern}: {err}");
                        None
                    }
                }
            })
            .collect()
    })
}

/// Maps error text to a category and, when known, a suggestion.
pub fn classify_error(message: &str) -> (ErrorType, Option<&'static str>) {
    rules()
        .iter()
        .find(|(regex, _, _)| regex.is_match(message))
        .map(|(_, error_type, suggestion)| (*error_type, Some(*suggestion)))
        .unwrap_or((ErrorType::Unknown, None))
}
