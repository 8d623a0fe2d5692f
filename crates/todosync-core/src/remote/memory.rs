//! In-process remote store
//!
//! Holds tasks in memory and assigns increasing ids, which is enough to run
//! the CLI without a server and to exercise failure paths in tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::RemoteStore;
use crate::error::RemoteError;
use crate::models::{NewTask, OwnerId, ServerId, Task};

#[derive(Debug, Default)]
struct Inner {
    tasks: Vec<Task>,
    next_id: u64,
    fail_list: bool,
    fail_creates: usize,
    failing_deletes: HashSet<ServerId>,
    list_calls: usize,
    create_calls: usize,
    delete_calls: usize,
}

/// Remote store kept in process memory
#[derive(Debug)]
pub struct MemoryRemoteStore {
    inner: Mutex<Inner>,
    latency: Option<Duration>,
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                ..Inner::default()
            }),
            latency: None,
        }
    }

    /// Start with the given tasks; new ids continue after the highest one
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            inner.next_id = tasks.iter().map(|t| t.id.0 + 1).max().unwrap_or(1);
            inner.tasks = tasks;
        }
        store
    }

    /// Delay every response by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next create call fail
    pub fn fail_next_create(&self) {
        self.lock().fail_creates += 1;
    }

    /// Make every delete of `id` fail
    pub fn fail_delete(&self, id: ServerId) {
        self.lock().failing_deletes.insert(id);
    }

    /// Make list calls fail
    pub fn fail_list(&self, fail: bool) {
        self.lock().fail_list = fail;
    }

    /// Snapshot of all stored tasks
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    pub fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    pub fn delete_calls(&self) -> usize {
        self.lock().delete_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn list(&self, owner: OwnerId) -> Result<Vec<Task>, RemoteError> {
        self.wait().await;
        let mut inner = self.lock();
        inner.list_calls += 1;
        if inner.fail_list {
            return Err(RemoteError::Rejected("list unavailable".into()));
        }
        Ok(inner
            .tasks
            .iter()
            .filter(|t| t.user_id == owner)
            .cloned()
            .collect())
    }

    async fn create(&self, task: NewTask) -> Result<Task, RemoteError> {
        self.wait().await;
        let mut inner = self.lock();
        inner.create_calls += 1;
        if inner.fail_creates > 0 {
            inner.fail_creates -= 1;
            return Err(RemoteError::Rejected("create refused".into()));
        }

        let created = Task {
            id: ServerId(inner.next_id),
            title: task.title,
            completed: task.completed,
            user_id: task.user_id,
        };
        inner.next_id += 1;
        inner.tasks.push(created.clone());
        debug!("Memory store created {}", created.id);
        Ok(created)
    }

    async fn delete(&self, id: ServerId) -> Result<(), RemoteError> {
        self.wait().await;
        let mut inner = self.lock();
        inner.delete_calls += 1;
        if inner.failing_deletes.contains(&id) {
            return Err(RemoteError::Rejected(format!("delete of {} refused", id)));
        }

        let before = inner.tasks.len();
        inner.tasks.retain(|t| t.id != id);
        if inner.tasks.len() == before {
            return Err(RemoteError::Rejected(format!("no todo with id {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u64, owner: u64) -> Task {
        Task {
            id: ServerId(id),
            title: format!("task {}", id),
            completed: false,
            user_id: OwnerId(owner),
        }
    }

    #[tokio::test]
    async fn test_list_filters_by_owner() {
        let store = MemoryRemoteStore::with_tasks(vec![task(1, 1), task(2, 2), task(3, 1)]);
        let mine = store.list(OwnerId(1)).await.unwrap();
        let ids: Vec<_> = mine.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![ServerId(1), ServerId(3)]);
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let store = MemoryRemoteStore::with_tasks(vec![task(7, 1)]);
        let created = store.create(NewTask::new("new", OwnerId(1))).await.unwrap();
        assert_eq!(created.id, ServerId(8));
        assert_eq!(store.tasks().len(), 2);
    }

    #[tokio::test]
    async fn test_injected_create_failure_is_one_shot() {
        let store = MemoryRemoteStore::new();
        store.fail_next_create();

        assert!(store.create(NewTask::new("a", OwnerId(1))).await.is_err());
        assert!(store.create(NewTask::new("a", OwnerId(1))).await.is_ok());
        assert_eq!(store.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_fails() {
        let store = MemoryRemoteStore::with_tasks(vec![task(1, 1)]);
        assert!(store.delete(ServerId(1)).await.is_ok());
        assert!(store.delete(ServerId(1)).await.is_err());
        assert_eq!(store.delete_calls(), 2);
    }

    #[tokio::test]
    async fn test_injected_delete_failure_keeps_task() {
        let store = MemoryRemoteStore::with_tasks(vec![task(1, 1)]);
        store.fail_delete(ServerId(1));
        assert!(store.delete(ServerId(1)).await.is_err());
        assert_eq!(store.tasks().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_list() {
        let store = MemoryRemoteStore::new();
        store.fail_list(true);
        assert!(store.list(OwnerId(1)).await.is_err());
        store.fail_list(false);
        assert!(store.list(OwnerId(1)).await.unwrap().is_empty());
    }
}
