use crate::models::{Task, TaskPatch};
use crate::store::TaskStore;

/// CRUD facade over a [`TaskStore`].
///
/// Every operation re-reads the full list from the store, mutates it, and
/// writes the whole list back. Nothing is cached between calls, so the store
/// always holds the sole authoritative copy.
pub struct TaskRepository<S: TaskStore> {
    store: S,
}

impl<S: TaskStore> TaskRepository<S> {
    pub fn new(store: S) -> Self {
        TaskRepository { store }
    }

    pub fn list(&self) -> Vec<Task> {
        self.store.read()
    }

    /// Validates and appends a new task. Returns `false` when the text is
    /// empty/whitespace or the store write fails.
    pub fn add(&self, text: &str) -> bool {
        let Some(mut task) = Task::create(text) else {
            return false;
        };

        let mut tasks = self.store.read();
        // Millisecond ids collide when tasks arrive back to back; bump past
        // the current maximum to keep ids unique.
        if tasks.iter().any(|t| t.id == task.id) {
            let max_id = tasks.iter().map(|t| t.id).max().unwrap_or(task.id);
            task.id = max_id + 1;
        }
        tasks.push(task);
        self.store.write(&tasks)
    }

    /// Removes the first task with a matching id. Returns `false` when no
    /// task matches; nothing is written in that case.
    pub fn remove_by_id(&self, id: i64) -> bool {
        let mut tasks = self.store.read();
        let Some(index) = tasks.iter().position(|t| t.id == id) else {
            return false;
        };
        tasks.remove(index);
        self.store.write(&tasks)
    }

    /// Merges the patch's set fields over the matching task. Returns `false`
    /// when no task matches; nothing is written in that case.
    pub fn update_by_id(&self, id: i64, patch: &TaskPatch) -> bool {
        let mut tasks = self.store.read();
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };

        if let Some(text) = &patch.text {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return false;
            }
            task.text = trimmed.to_string();
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        if let Some(tags) = &patch.tags {
            task.tags = tags.clone();
        }
        self.store.write(&tasks)
    }

    /// Flips the completion flag of the matching task.
    pub fn toggle_by_id(&self, id: i64) -> bool {
        let current = match self.list().iter().find(|t| t.id == id) {
            Some(task) => task.completed,
            None => return false,
        };
        self.update_by_id(id, &TaskPatch::completed(!current))
    }

    /// Drops every stored task.
    pub fn clear(&self) -> bool {
        self.store.write(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn sample(id: i64, text: &str) -> Task {
        Task {
            id,
            text: text.to_string(),
            completed: false,
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            tags: vec!["home".to_string()],
        }
    }

    fn repo_with(tasks: Vec<Task>) -> TaskRepository<MemStore> {
        TaskRepository::new(MemStore::with_tasks(tasks))
    }

    #[test]
    fn add_appends_and_rejects_blank_text() {
        let repo = repo_with(Vec::new());

        assert!(repo.add("Buy milk"));
        assert!(!repo.add("   "));

        let tasks = repo.list();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "Buy milk");
        assert!(!tasks[0].completed);
    }

    #[test]
    fn add_bumps_colliding_ids() {
        let repo = repo_with(Vec::new());
        assert!(repo.add("first"));
        assert!(repo.add("second"));
        assert!(repo.add("third"));

        let mut ids: Vec<i64> = repo.list().iter().map(|t| t.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn add_preserves_insertion_order() {
        let repo = repo_with(Vec::new());
        for text in ["a", "b", "c"] {
            assert!(repo.add(text));
        }
        let texts: Vec<String> = repo.list().into_iter().map(|t| t.text).collect();
        assert_eq!(texts, ["a", "b", "c"]);
    }

    #[test]
    fn remove_keeps_other_tasks_in_order() {
        let repo = repo_with(vec![sample(1, "a"), sample(2, "b"), sample(3, "c")]);

        assert!(repo.remove_by_id(2));

        let tasks = repo.list();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, 1);
        assert_eq!(tasks[1].id, 3);
    }

    #[test]
    fn remove_unknown_id_returns_false_without_writing() {
        let store = MemStore::with_tasks(vec![sample(1, "a")]);
        // A write against this store would fail loudly, proving none happens.
        store.fail_writes.set(true);
        let repo = TaskRepository::new(store);

        assert!(!repo.remove_by_id(99));
        assert_eq!(repo.list().len(), 1);
    }

    #[test]
    fn update_changes_only_patched_fields() {
        let repo = repo_with(vec![sample(7, "old")]);

        assert!(repo.update_by_id(7, &TaskPatch::text("new")));

        let task = &repo.list()[0];
        assert_eq!(task.text, "new");
        assert_eq!(task.id, 7);
        assert!(!task.completed);
        assert_eq!(task.created_at, "2024-01-01T00:00:00+00:00");
        assert_eq!(task.tags, vec!["home".to_string()]);
    }

    #[test]
    fn update_trims_and_rejects_blank_replacement_text() {
        let repo = repo_with(vec![sample(7, "old")]);

        assert!(repo.update_by_id(7, &TaskPatch::text("  spaced  ")));
        assert_eq!(repo.list()[0].text, "spaced");

        assert!(!repo.update_by_id(7, &TaskPatch::text("   ")));
        assert_eq!(repo.list()[0].text, "spaced");
    }

    #[test]
    fn update_replaces_tags_and_nothing_else() {
        let repo = repo_with(vec![sample(3, "tagged")]);

        let tags = vec!["errand".to_string(), "urgent".to_string()];
        assert!(repo.update_by_id(3, &TaskPatch::tags(tags.clone())));

        let task = &repo.list()[0];
        assert_eq!(task.tags, tags);
        assert_eq!(task.text, "tagged");
        assert!(!task.completed);
    }

    #[test]
    fn update_unknown_id_returns_false() {
        let repo = repo_with(vec![sample(1, "a")]);
        assert!(!repo.update_by_id(42, &TaskPatch::completed(true)));
    }

    #[test]
    fn toggle_flips_completion_both_ways() {
        let repo = repo_with(vec![sample(5, "flip")]);

        assert!(repo.toggle_by_id(5));
        assert!(repo.list()[0].completed);

        assert!(repo.toggle_by_id(5));
        assert!(!repo.list()[0].completed);

        assert!(!repo.toggle_by_id(99));
    }

    #[test]
    fn failed_store_write_surfaces_as_false() {
        let store = MemStore::new();
        store.fail_writes.set(true);
        let repo = TaskRepository::new(store);

        assert!(!repo.add("doomed"));
        assert!(repo.list().is_empty());
    }

    #[test]
    fn full_lifecycle_scenario() {
        let repo = repo_with(Vec::new());

        assert!(repo.add("Buy milk"));
        let tasks = repo.list();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "Buy milk");
        assert!(!tasks[0].completed);
        let id = tasks[0].id;

        assert!(!repo.add(""));
        assert_eq!(repo.list().len(), 1);

        assert!(repo.update_by_id(id, &TaskPatch::completed(true)));
        assert!(repo.list()[0].completed);

        assert!(repo.remove_by_id(id));
        assert!(repo.list().is_empty());
    }
}
