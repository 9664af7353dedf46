//! TTL-bounded record of recent file reads.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

pub const DEFAULT_READ_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct FileReadCacheEntry {
    pub path: PathBuf,
    pub content: String,
    pub timestamp_read: DateTime<Utc>,
    read_at: Instant,
}

/// Process-lifetime cache shared by every hook and dispatch of a runtime.
///
/// Paths must already be normalized with [`normalize_path`].
#[derive(Debug)]
pub struct FileReadCache {
    ttl: Duration,
    entries: Mutex<HashMap<PathBuf, FileReadCacheEntry>>,
}

impl Default for FileReadCache {
    fn default() -> Self {
        Self::new(DEFAULT_READ_CACHE_TTL)
    }
}

impl FileReadCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn record_read(&self, path: &Path, content: impl Into<String>) {
        let entry = FileReadCacheEntry {
            path: path.to_path_buf(),
            content: content.into(),
            timestamp_read: Utc::now(),
            read_at: Instant::now(),
        };
        self.entries.lock().insert(path.to_path_buf(), entry);
    }

    /// Whether `path` was read within the TTL. Expired entries are evicted.
    pub fn was_recently_read(&self, path: &Path) -> bool {
        self.get(path).is_some()
    }

    pub fn get(&self, path: &Path) -> Option<FileReadCacheEntry> {
        let mut entries = self.entries.lock();
        match entries.get(path) {
            Some(entry) if entry.read_at.elapsed() <= self.ttl => Some(entry.clone()),
            Some(_) => {
                entries.remove(path);
                None
            }
            None => None,
        }
    }

    pub fn invalidate(&self, path: &Path) {
        self.entries.lock().remove(path);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired entry.
    pub fn purge_expired(&self) {
        let ttl = self.ttl;
        self.entries
            .lock()
            .retain(|_, entry| entry.read_at.elapsed() <= ttl);
    }
}

/// Resolves `path` against `working_dir` and removes `.`/`..` components
/// without touching the filesystem.
pub fn normalize_path(path: &Path, working_dir: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_relative_and_dotted_paths() {
        let cwd = Path::new("/work/project");
        assert_eq!(
            normalize_path(Path::new("src/../src/./main.rs"), cwd),
            PathBuf::from("/work/project/src/main.rs")
        );
        assert_eq!(
            normalize_path(Path::new("/etc/./hosts"), cwd),
            PathBuf::from("/etc/hosts")
        );
        assert_eq!(
            normalize_path(Path::new("../other/a.txt"), cwd),
            PathBuf::from("/work/other/a.txt")
        );
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = FileReadCache::new(Duration::from_millis(30));
        let path = Path::new("/tmp/a.txt");
        cache.record_read(path, "hello");
        assert!(cache.was_recently_read(path));
        assert_eq!(cache.get(path).map(|e| e.content), Some("hello".to_string()));

        std::thread::sleep(Duration::from_millis(60));
        assert!(!cache.was_recently_read(path));
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_removes_entry() {
        let cache = FileReadCache::default();
        let path = Path::new("/tmp/b.txt");
        cache.record_read(path, "x");
        cache.invalidate(path);
        assert!(!cache.was_recently_read(path));
    }
}
