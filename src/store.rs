//! Task store
//!
//! Every operation is one locked read-modify-write cycle over the CSV file:
//! acquire the [`FileLock`], decode all rows, mutate in memory, rewrite with
//! the configured [`RewriteStrategy`], release the lock on drop. Nothing is
//! written once an error has been detected.

use std::io::Seek;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, NaiveDateTime, Timelike};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::lock::FileLock;
use crate::record::{self, Row, Task};
use crate::rewrite::RewriteStrategy;

/// Wall-clock source for `created_at` / `completed_at`
pub type Clock = fn() -> NaiveDateTime;

/// Current local time truncated to whole seconds
pub fn local_now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// CSV-backed task store
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
    strategy: RewriteStrategy,
    lock_timeout: Option<Duration>,
    clock: Clock,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            strategy: RewriteStrategy::default(),
            lock_timeout: None,
            clock: local_now,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.path.clone())
            .with_strategy(config.rewrite)
            .with_lock_timeout(config.lock_timeout())
    }

    pub fn with_strategy(mut self, strategy: RewriteStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// `None` blocks until the lock is free
    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn strategy(&self) -> RewriteStrategy {
        self.strategy
    }

    /// Write the header row into a new or empty store.
    ///
    /// Returns `true` if the header was written, `false` if the store was
    /// already initialized.
    pub fn initialize(&self) -> Result<bool> {
        let mut lock = self.lock()?;
        if lock.file().metadata()?.len() > 0 {
            return Ok(false);
        }
        self.write_header(&mut lock)?;
        Ok(true)
    }

    /// Append a new task and return it
    pub fn add(&self, title: &str) -> Result<Task> {
        if title.trim().is_empty() {
            return Err(Error::InvalidInput("please provide task title".to_string()));
        }

        let mut lock = self.lock()?;
        let (header, mut tasks) = self.load(&mut lock)?;

        let id = next_id(&tasks)?;
        let task = Task {
            id,
            title: title.to_string(),
            created_at: (self.clock)(),
            completed_at: None,
        };
        tasks.push(task.clone());

        self.strategy.rewrite(&mut lock, &header, &tasks)?;
        tracing::debug!(path = %self.path.display(), id, "task added");
        Ok(task)
    }

    /// All tasks in file order
    pub fn list(&self) -> Result<Vec<Task>> {
        let mut lock = self.lock()?;
        let (_, tasks) = self.load(&mut lock)?;
        tracing::debug!(path = %self.path.display(), count = tasks.len(), "tasks listed");
        Ok(tasks)
    }

    /// Stamp `completed_at` on the task with `id`.
    ///
    /// An already completed task gets a fresh timestamp.
    pub fn complete(&self, id: u64) -> Result<Task> {
        let mut lock = self.lock()?;
        let (header, mut tasks) = self.load(&mut lock)?;

        let task = tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(Error::TaskNotFound(id))?;
        if task.completed_at.is_some() {
            tracing::debug!(id, "task already completed, overwriting timestamp");
        }
        task.completed_at = Some((self.clock)());
        let completed = task.clone();

        self.strategy.rewrite(&mut lock, &header, &tasks)?;
        tracing::debug!(path = %self.path.display(), id, "task completed");
        Ok(completed)
    }

    /// Remove the task with `id` and return it
    pub fn delete(&self, id: u64) -> Result<Task> {
        let mut lock = self.lock()?;
        let (header, mut tasks) = self.load(&mut lock)?;

        let idx = tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(Error::TaskNotFound(id))?;
        let removed = tasks.remove(idx);

        self.strategy.rewrite(&mut lock, &header, &tasks)?;
        tracing::debug!(path = %self.path.display(), id, remaining = tasks.len(), "task deleted");
        Ok(removed)
    }

    fn lock(&self) -> Result<FileLock> {
        match self.lock_timeout {
            Some(timeout) => FileLock::acquire(&self.path, timeout),
            None => FileLock::acquire_blocking(&self.path),
        }
    }

    /// Decode the locked store; a store without any rows is initialized first.
    fn load(&self, lock: &mut FileLock) -> Result<(Row, Vec<Task>)> {
        lock.file_mut().rewind()?;
        let rows = record::read_rows(lock.file())?;
        if rows.is_empty() {
            self.write_header(lock)?;
            return Ok((record::header_row(), Vec::new()));
        }

        record::decode(&rows).map_err(|err| self.with_path(err))
    }

    fn write_header(&self, lock: &mut FileLock) -> Result<()> {
        tracing::debug!(path = %self.path.display(), "initializing store");
        self.strategy.rewrite(lock, &record::header_row(), &[])
    }

    fn with_path(&self, err: Error) -> Error {
        match err {
            Error::MalformedStore { reason, .. } => Error::MalformedStore {
                path: self.path.clone(),
                reason,
            },
            other => other,
        }
    }
}

fn next_id(tasks: &[Task]) -> Result<u64> {
    let Some((idx, max)) = tasks
        .iter()
        .enumerate()
        .max_by_key(|(_, task)| task.id)
    else {
        return Ok(1);
    };
    max.id.checked_add(1).ok_or_else(|| Error::CorruptRecord {
        row: idx + 2,
        reason: format!("task ID {} leaves no room for a new task", max.id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicI64, Ordering};

    use chrono::NaiveDate;
    use tempfile::TempDir;

    static TICKS: AtomicI64 = AtomicI64::new(0);

    fn ticking_clock() -> NaiveDateTime {
        let base = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        base + chrono::Duration::seconds(TICKS.fetch_add(1, Ordering::SeqCst))
    }

    fn store(dir: &TempDir) -> TaskStore {
        TaskStore::new(dir.path().join("tasks.csv")).with_clock(ticking_clock)
    }

    #[test]
    fn initialize_writes_header_once() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert!(store.initialize().unwrap());
        assert!(!store.initialize().unwrap());
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "ID,Title,CreatedAt,CompletedAt\n"
        );
    }

    #[test]
    fn list_on_missing_store_creates_header_only_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert!(store.list().unwrap().is_empty());
        assert_eq!(
            fs::read_to_string(store.path()).unwrap(),
            "ID,Title,CreatedAt,CompletedAt\n"
        );
    }

    #[test]
    fn add_assigns_increasing_ids() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let ids: Vec<u64> = ["a", "b", "c"]
            .iter()
            .map(|title| store.add(title).unwrap().id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn add_uses_max_id_after_deletes() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        for title in ["a", "b", "c"] {
            store.add(title).unwrap();
        }

        store.delete(2).unwrap();
        assert_eq!(store.add("d").unwrap().id, 4);

        store.delete(4).unwrap();
        store.delete(3).unwrap();
        assert_eq!(store.add("e").unwrap().id, 2);
    }

    #[test]
    fn add_initializes_store_with_only_blank_lines() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "\n").unwrap();

        assert_eq!(store.add("first").unwrap().id, 1);
        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.starts_with("ID,Title,CreatedAt,CompletedAt\n1,first,"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn header_with_bad_rows_is_still_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let contents = "ID,Title,CreatedAt,CompletedAt\n\n1,short\n";
        fs::write(store.path(), contents).unwrap();

        assert!(matches!(
            store.add("x"),
            Err(Error::CorruptRecord { .. })
        ));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), contents);
    }

    #[test]
    fn add_refuses_when_ids_are_exhausted() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let contents = format!(
            "ID,Title,CreatedAt,CompletedAt\n1,a,2024-05-01 09:00:00,\n{},x,2024-05-01 09:00:00,\n",
            u64::MAX
        );
        fs::write(store.path(), &contents).unwrap();

        assert_eq!(store.list().unwrap().len(), 2);
        assert!(matches!(
            store.add("next"),
            Err(Error::CorruptRecord { row: 3, .. })
        ));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), contents);
    }

    #[test]
    fn add_rejects_empty_title_without_touching_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert!(matches!(store.add("  "), Err(Error::InvalidInput(_))));
        assert!(!store.path().exists());
    }

    #[test]
    fn complete_twice_updates_timestamp() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add("Buy milk").unwrap();

        let first = store.complete(1).unwrap().completed_at.unwrap();
        let second = store.complete(1).unwrap().completed_at.unwrap();
        assert!(second > first);

        let tasks = store.list().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].completed_at, Some(second));
    }

    #[test]
    fn missing_ids_leave_file_unchanged() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.add("one").unwrap();
        store.add("two").unwrap();
        let before = fs::read(store.path()).unwrap();

        assert!(matches!(store.complete(99), Err(Error::TaskNotFound(99))));
        assert!(matches!(store.delete(99), Err(Error::TaskNotFound(99))));
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn delete_preserves_order_of_remaining_tasks() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        for title in ["a", "b", "c", "d"] {
            store.add(title).unwrap();
        }

        let removed = store.delete(2).unwrap();
        assert_eq!(removed.title, "b");
        let titles: Vec<String> = store.list().unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["a", "c", "d"]);
    }

    #[test]
    fn corrupt_store_aborts_and_is_left_as_is() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let contents = "ID,Title,CreatedAt,CompletedAt\n1,ok,2024-05-01 09:00:00,\n2,broken\n";
        fs::write(store.path(), contents).unwrap();

        assert!(matches!(
            store.add("new"),
            Err(Error::CorruptRecord { row: 3, .. })
        ));
        assert!(matches!(store.list(), Err(Error::CorruptRecord { .. })));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), contents);

        // lock was released on the error path
        assert!(FileLock::try_acquire(store.path()).unwrap().is_some());
    }

    #[test]
    fn malformed_store_error_names_the_path() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::write(store.path(), "not,a,header\n").unwrap();

        match store.list().unwrap_err() {
            Error::MalformedStore { path, .. } => assert_eq!(path, store.path()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn all_strategies_agree() {
        for strategy in [
            RewriteStrategy::AtomicRename,
            RewriteStrategy::Recreate,
            RewriteStrategy::Truncate,
        ] {
            let dir = TempDir::new().unwrap();
            let store = store(&dir).with_strategy(strategy);
            store.add("keep").unwrap();
            store.add("drop").unwrap();
            store.complete(1).unwrap();
            store.delete(2).unwrap();

            let tasks = store.list().unwrap();
            assert_eq!(tasks.len(), 1, "strategy {strategy}");
            assert!(tasks[0].is_completed());
        }
    }

    #[test]
    fn bounded_wait_fails_while_lock_is_held() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).with_lock_timeout(Some(Duration::from_millis(50)));
        let _held = FileLock::acquire_blocking(store.path()).unwrap();

        assert!(matches!(store.list(), Err(Error::LockFailed(_))));
    }
}
