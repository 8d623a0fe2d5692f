//! Sequential session
//!
//! [`Session`] pairs a [`TodoState`] with a [`RemoteStore`] and runs each
//! intent to completion: begin, await the store, finish. It suits callers
//! that issue one intent at a time, such as the command-line interface.
//! Interactive views that keep accepting input while requests run use the
//! [`Dispatcher`](crate::dispatch::Dispatcher) instead.

use futures_util::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

use crate::error::SyncResult;
use crate::models::{OwnerId, Task, TaskId};
use crate::remote::RemoteStore;
use crate::state::{ClearReport, TodoState};

/// A todo list bound to a remote store
pub struct Session<R> {
    state: TodoState,
    remote: R,
}

impl<R: RemoteStore> Session<R> {
    /// Create a session for `owner`
    pub fn new(owner: OwnerId, remote: R) -> Self {
        Self::with_state(TodoState::new(owner), remote)
    }

    /// Create a session around an existing state
    pub fn with_state(state: TodoState, remote: R) -> Self {
        Self { state, remote }
    }

    pub fn state(&self) -> &TodoState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut TodoState {
        &mut self.state
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Fetch the owner's tasks; returns how many were loaded
    pub async fn load(&mut self) -> SyncResult<usize> {
        let owner = self.state.begin_load();
        let result = self.remote.list(owner).await;
        self.state.finish_load(result)
    }

    /// Add a task and wait for the store to confirm it
    pub async fn add(&mut self, title: &str) -> SyncResult<Task> {
        let ticket = self.state.begin_add(title)?;
        let result = self.remote.create(ticket.task).await;
        self.state.finish_add(ticket.token, result)
    }

    /// Delete a confirmed task
    pub async fn delete(&mut self, id: &TaskId) -> SyncResult<()> {
        let id = self.state.begin_delete(id)?;
        let result = self.remote.delete(id).await;
        self.state.finish_delete(id, result)
    }

    /// Delete every completed task concurrently
    ///
    /// Results are applied in arrival order, so tasks leave the collection
    /// one by one rather than all at the end.
    pub async fn clear_completed(&mut self) -> SyncResult<ClearReport> {
        let Self { state, remote } = self;
        let remote = &*remote;
        let batch = state.begin_clear_completed();
        debug!("Clearing {} completed todos", batch.targets.len());

        let mut deletes: FuturesUnordered<_> = batch
            .targets
            .iter()
            .map(|&id| async move { (id, remote.delete(id).await) })
            .collect();

        while let Some((id, result)) = deletes.next().await {
            // Per-item failures are recorded in the batch report
            let _ = state.finish_clear_item(batch.id, id, result);
        }

        state.finish_clear_batch(batch.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::SyncError;
    use crate::models::{ServerId, StatusFilter};
    use crate::remote::MemoryRemoteStore;
    use crate::state::{LoadState, MSG_ADD_FAILED, MSG_EMPTY_TITLE, MSG_LOAD_FAILED};
    use std::sync::Arc;
    use std::time::Duration;

    const OWNER: OwnerId = OwnerId(1870);

    fn task(id: u64, title: &str, completed: bool) -> Task {
        Task {
            id: ServerId(id),
            title: title.to_string(),
            completed,
            user_id: OWNER,
        }
    }

    fn session(tasks: Vec<Task>) -> (Session<MemoryRemoteStore>, ManualClock) {
        let clock = ManualClock::new();
        let state = TodoState::with_clock(OWNER, Arc::new(clock.clone()));
        let session = Session::with_state(state, MemoryRemoteStore::with_tasks(tasks));
        (session, clock)
    }

    #[tokio::test]
    async fn test_load() {
        let (mut session, _) = session(vec![task(1, "a", false), task(2, "b", true)]);
        assert_eq!(session.load().await.unwrap(), 2);
        assert_eq!(session.state().load_state(), LoadState::Loaded);
        assert_eq!(session.remote().list_calls(), 1);
    }

    #[tokio::test]
    async fn test_load_failure() {
        let (mut session, _) = session(vec![task(1, "a", false)]);
        session.remote().fail_list(true);

        assert!(session.load().await.is_err());
        assert!(session.state().is_empty());
        assert_eq!(session.state().error_message(), Some(MSG_LOAD_FAILED));
    }

    #[tokio::test]
    async fn test_add_buy_milk() {
        let (mut session, _) = session(vec![]);
        session.load().await.unwrap();

        let created = session.add("Buy milk").await.unwrap();

        let matching: Vec<_> = session
            .state()
            .visible()
            .into_iter()
            .filter(|t| t.title == "Buy milk")
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].id, TaskId::Confirmed(created.id));
        assert!(session.state().pending().is_empty());
        assert_eq!(session.remote().tasks().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_add_makes_no_request() {
        let (mut session, _) = session(vec![]);

        let err = session.add("    ").await.unwrap_err();

        assert!(matches!(err, SyncError::EmptyTitle));
        assert_eq!(session.remote().create_calls(), 0);
        assert_eq!(session.state().error_message(), Some(MSG_EMPTY_TITLE));
    }

    #[tokio::test]
    async fn test_failed_add_leaves_collection_unchanged() {
        let (mut session, _) = session(vec![task(1, "a", false)]);
        session.load().await.unwrap();
        let before = session.state().tasks().to_vec();
        session.remote().fail_next_create();

        assert!(session.add("X").await.is_err());

        assert_eq!(session.state().tasks(), before.as_slice());
        assert!(session.state().pending().is_empty());
        assert!(!session.state().input_disabled());
        assert_eq!(session.state().error_message(), Some(MSG_ADD_FAILED));
    }

    #[tokio::test]
    async fn test_delete_missing_id_surfaces_failure() {
        let (mut session, _) = session(vec![task(1, "a", false)]);
        session.load().await.unwrap();

        let err = session
            .delete(&TaskId::Confirmed(ServerId(99)))
            .await
            .unwrap_err();

        assert!(err.is_network());
        assert_eq!(session.state().tasks().len(), 1);
        assert!(session.state().loading().is_none());
    }

    #[tokio::test]
    async fn test_clear_completed_with_one_failure() {
        let (mut session, _) = session(vec![
            task(1, "open", false),
            task(2, "done 1", true),
            task(3, "done 2", true),
            task(4, "done 3", true),
        ]);
        session.load().await.unwrap();
        session.remote().fail_delete(ServerId(3));

        let report = session.clear_completed().await.unwrap();

        assert_eq!(report.removed.len(), 2);
        assert_eq!(report.failures.len(), 1);
        let remaining: Vec<_> = session.state().tasks().iter().map(|t| t.id).collect();
        assert_eq!(remaining, vec![ServerId(1), ServerId(3)]);
        assert!(session.state().error_message().is_some());
        assert_eq!(session.remote().delete_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_completed_runs_concurrently() {
        let tasks: Vec<_> = (1..=5).map(|i| task(i, "done", true)).collect();
        let clock = ManualClock::new();
        let state = TodoState::with_clock(OWNER, Arc::new(clock));
        let store = MemoryRemoteStore::with_tasks(tasks).with_latency(Duration::from_millis(50));
        let mut session = Session::with_state(state, store);
        session.load().await.unwrap();

        let started = tokio::time::Instant::now();
        let report = session.clear_completed().await.unwrap();

        assert!(report.is_success());
        assert!(session.state().is_empty());
        // Five sequential deletes would take 250ms of virtual time
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_error_expires_with_clock() {
        let (mut session, clock) = session(vec![]);
        let _ = session.add("").await;
        assert!(session.state().error_message().is_some());

        clock.advance(Duration::from_secs(3));
        assert!(session.state_mut().tick());
        assert!(session.state().error_message().is_none());
    }

    #[tokio::test]
    async fn test_filter_and_count_after_operations() {
        let (mut session, _) = session(vec![task(1, "a", false), task(2, "b", true)]);
        session.load().await.unwrap();
        session.add("c").await.unwrap();

        session.state_mut().set_filter(StatusFilter::Active);
        let titles: Vec<_> = session
            .state()
            .visible()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["a", "c"]);
        assert_eq!(session.state().active_count(), 2);
    }
}
