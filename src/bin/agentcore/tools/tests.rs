use std::fs;

use serde_json::{json, Map, Value};

use super::search::FileGlob;
use super::*;

fn params(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("params must be an object"),
    }
}

fn tools_in(dir: &tempfile::TempDir) -> LocalTools {
    LocalTools::new(dir.path().to_path_buf())
}

#[tokio::test]
async fn read_returns_numbered_slice() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "one\ntwo\nthree\nfour\n").unwrap();

    let result = tools_in(&dir)
        .execute("Read", &params(json!({"file_path": "notes.txt", "offset": 2, "limit": 2})))
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.content.as_deref(), Some("L2: two\nL3: three"));
}

#[tokio::test]
async fn read_clamps_an_oversized_limit() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "one\ntwo\nthree\n").unwrap();

    let result = tools_in(&dir)
        .execute(
            "Read",
            &params(json!({"file_path": "a.txt", "offset": 2, "limit": u64::MAX})),
        )
        .await
        .unwrap();
    assert_eq!(result.content.as_deref(), Some("L2: two\nL3: three"));
}

#[tokio::test]
async fn read_rejects_offset_past_the_end() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "one\ntwo\n").unwrap();

    let err = tools_in(&dir)
        .execute("Read", &params(json!({"file_path": "a.txt", "offset": 3})))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Execution(message) if message.contains("exceeds")));
}

#[tokio::test]
async fn read_of_an_empty_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("empty.txt"), "").unwrap();

    let result = tools_in(&dir)
        .execute(
            "Read",
            &params(json!({"file_path": "empty.txt", "limit": u64::MAX})),
        )
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.content.as_deref(), Some(""));
    assert_eq!(result.extra.get("totalLines"), Some(&json!(0)));
}

#[tokio::test]
async fn read_rejects_zero_offset() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "one\n").unwrap();

    let err = tools_in(&dir)
        .execute("Read", &params(json!({"file_path": "a.txt", "offset": 0})))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::InvalidArgs(_)));
}

#[tokio::test]
async fn read_missing_file_is_an_execution_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = tools_in(&dir)
        .execute("Read", &params(json!({"file_path": "absent.txt"})))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Execution(_)));
}

#[tokio::test]
async fn write_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let result = tools_in(&dir)
        .execute(
            "write_file",
            &params(json!({"file_path": "nested/out.txt", "content": "hello"})),
        )
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(fs::read_to_string(dir.path().join("nested/out.txt")).unwrap(), "hello");
}

#[tokio::test]
async fn edit_requires_unique_match_unless_replace_all() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lib.rs");
    fs::write(&path, "let a = 1;\nlet b = 1;\n").unwrap();
    let tools = tools_in(&dir);

    let ambiguous = tools
        .execute(
            "Edit",
            &params(json!({"file_path": "lib.rs", "old_string": "= 1", "new_string": "= 2"})),
        )
        .await
        .unwrap();
    assert!(!ambiguous.success);
    assert!(ambiguous.suggestion.is_some());

    let all = tools
        .execute(
            "Edit",
            &params(json!({
                "file_path": "lib.rs",
                "old_string": "= 1",
                "new_string": "= 2",
                "replace_all": true
            })),
        )
        .await
        .unwrap();
    assert!(all.success);
    assert_eq!(fs::read_to_string(&path).unwrap(), "let a = 2;\nlet b = 2;\n");
}

#[tokio::test]
async fn edit_reports_missing_text() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "alpha").unwrap();
    let result = tools_in(&dir)
        .execute(
            "Edit",
            &params(json!({"file_path": "a.txt", "old_string": "beta", "new_string": "gamma"})),
        )
        .await
        .unwrap();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("not found"));
}

#[tokio::test]
async fn glob_matches_nested_paths_and_skips_hidden_dirs() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src/chat")).unwrap();
    fs::create_dir_all(dir.path().join(".git")).unwrap();
    fs::write(dir.path().join("src/lib.rs"), "").unwrap();
    fs::write(dir.path().join("src/chat/mod.rs"), "").unwrap();
    fs::write(dir.path().join("src/chat/notes.md"), "").unwrap();
    fs::write(dir.path().join(".git/config.rs"), "").unwrap();

    let result = tools_in(&dir)
        .execute("Glob", &params(json!({"pattern": "**/*.rs"})))
        .await
        .unwrap();
    assert_eq!(result.content.as_deref(), Some("src/chat/mod.rs\nsrc/lib.rs"));
}

#[tokio::test]
async fn grep_filters_by_include() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.rs"), "fn main() {}\n// TODO: tidy\n").unwrap();
    fs::write(dir.path().join("b.md"), "TODO: docs\n").unwrap();

    let result = tools_in(&dir)
        .execute("Grep", &params(json!({"pattern": "TODO", "include": "*.rs"})))
        .await
        .unwrap();
    assert_eq!(result.content.as_deref(), Some("a.rs:2: // TODO: tidy"));
}

#[tokio::test]
async fn grep_rejects_invalid_regex() {
    let dir = tempfile::tempdir().unwrap();
    let err = tools_in(&dir)
        .execute("Grep", &params(json!({"pattern": "("})))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::InvalidArgs(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn bash_runs_in_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("marker"), "").unwrap();
    let tools = tools_in(&dir);

    let ok = tools
        .execute("Bash", &params(json!({"command": "ls"})))
        .await
        .unwrap();
    assert!(ok.success);
    assert!(ok.content.unwrap_or_default().contains("marker"));

    let failed = tools
        .execute("shell", &params(json!({"command": "exit 3"})))
        .await
        .unwrap();
    assert!(!failed.success);
    assert_eq!(failed.extra.get("exitCode"), Some(&json!(3)));
}

#[tokio::test]
async fn unknown_tools_are_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = tools_in(&dir)
        .execute("Teleport", &Map::new())
        .await
        .unwrap_err();
    assert_eq!(err, ToolError::NotFound("Teleport".into()));
}

#[test]
fn definitions_use_canonical_names() {
    let names: Vec<String> = LocalTools::new(".".into())
        .definitions()
        .into_iter()
        .map(|schema| schema.name)
        .collect();
    assert_eq!(names, ["Read", "Write", "Edit", "Glob", "Grep", "Bash"]);
}

#[test]
fn glob_braces_and_name_only_patterns() {
    let matcher = FileGlob::new("*.{rs,toml}").unwrap();
    assert!(matcher.is_match(std::path::Path::new("deep/dir/Cargo.toml")));
    assert!(!matcher.is_match(std::path::Path::new("README.md")));

    let rooted = FileGlob::new("src/*.rs").unwrap();
    assert!(rooted.is_match(std::path::Path::new("src/lib.rs")));
    assert!(!rooted.is_match(std::path::Path::new("src/chat/mod.rs")));
}

#[test]
fn glob_character_classes_and_escapes() {
    let class = FileGlob::new("*.[ch]").unwrap();
    assert!(class.is_match(std::path::Path::new("src/main.c")));
    assert!(class.is_match(std::path::Path::new("include/util.h")));
    assert!(!class.is_match(std::path::Path::new("src/main.rs")));

    let negated = FileGlob::new("file[!0-9].txt").unwrap();
    assert!(negated.is_match(std::path::Path::new("fileA.txt")));
    assert!(!negated.is_match(std::path::Path::new("file7.txt")));

    let escaped = FileGlob::new(r"notes\*.md").unwrap();
    assert!(escaped.is_match(std::path::Path::new("notes*.md")));
    assert!(!escaped.is_match(std::path::Path::new("notes-1.md")));
}

#[tokio::test]
async fn glob_skips_build_directories() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("target/debug")).unwrap();
    fs::create_dir_all(dir.path().join("csrc")).unwrap();
    fs::write(dir.path().join("target/debug/build.c"), "").unwrap();
    fs::write(dir.path().join("csrc/main.c"), "").unwrap();
    fs::write(dir.path().join("csrc/main.h"), "").unwrap();

    let result = tools_in(&dir)
        .execute("Glob", &params(json!({"pattern": "*.[ch]"})))
        .await
        .unwrap();
    assert_eq!(result.content.as_deref(), Some("csrc/main.c\ncsrc/main.h"));
}
