use std::fs;
use std::path::PathBuf;

use crate::models::Task;

/// Persistence boundary: one durable slot holding the whole task list.
///
/// Both operations absorb their failures. `read` treats a missing or
/// unreadable blob as an empty list, `write` reports failure as `false`.
/// Callers never see an error type cross this boundary.
pub trait TaskStore {
    fn read(&self) -> Vec<Task>;
    fn write(&self, tasks: &[Task]) -> bool;
}

/// File-backed store: the full task list as one JSON array in a single file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Resolves the default store location: `$TEND_FILE` if set,
    /// otherwise `~/.tend/tasks.json`.
    pub fn new() -> Self {
        if let Ok(path) = std::env::var("TEND_FILE") {
            return JsonFileStore { path: PathBuf::from(path) };
        }
        let home_dir = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let path = PathBuf::from(home_dir).join(".tend").join("tasks.json");
        JsonFileStore { path }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore for JsonFileStore {
    fn read(&self) -> Vec<Task> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(tasks) => tasks,
            Err(e) => {
                log::warn!("ignoring malformed task file {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    fn write(&self, tasks: &[Task]) -> bool {
        let json = match serde_json::to_string_pretty(tasks) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("failed to serialize tasks: {}", e);
                return false;
            }
        };

        if let Some(dir) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(dir) {
                log::warn!("failed to create {}: {}", dir.display(), e);
                return false;
            }
        }

        // Write to a sibling temp file and rename so a failed write
        // never truncates the existing blob.
        let tmp = self.path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp, json) {
            log::warn!("failed to write {}: {}", tmp.display(), e);
            return false;
        }
        match fs::rename(&tmp, &self.path) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("failed to replace {}: {}", self.path.display(), e);
                let _ = fs::remove_file(&tmp);
                false
            }
        }
    }
}

/// In-memory fake injected into repository and UI tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemStore {
    tasks: std::cell::RefCell<Vec<Task>>,
    pub fail_writes: std::cell::Cell<bool>,
}

#[cfg(test)]
impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        MemStore {
            tasks: std::cell::RefCell::new(tasks),
            fail_writes: std::cell::Cell::new(false),
        }
    }
}

#[cfg(test)]
impl TaskStore for MemStore {
    fn read(&self) -> Vec<Task> {
        self.tasks.borrow().clone()
    }

    fn write(&self, tasks: &[Task]) -> bool {
        if self.fail_writes.get() {
            return false;
        }
        *self.tasks.borrow_mut() = tasks.to_vec();
        true
    }
}
