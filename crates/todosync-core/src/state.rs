//! Synchronization core
//!
//! [`TodoState`] owns the authoritative task collection, the optimistic
//! entries awaiting confirmation, the in-flight markers and the error notice.
//!
//! Every intent is split in two halves:
//! - `begin_*` validates, applies the optimistic change and returns what
//!   must be sent to the remote store;
//! - `finish_*` reconciles the response against whatever the state is *now*.
//!
//! Nothing here performs I/O. [`Session`](crate::session::Session) and
//! [`Dispatcher`](crate::dispatch::Dispatcher) sit between the two halves and
//! talk to the [`RemoteStore`](crate::remote::RemoteStore).

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::dispatch::Completion;
use crate::error::{RemoteError, SyncError, SyncResult};
use crate::models::{
    LocalToken, NewTask, OwnerId, PendingTask, ServerId, StatusFilter, Task, TaskId, VisibleTask,
};
use crate::notice::{ErrorNotice, NoticeOrigin};

pub const MSG_LOAD_FAILED: &str = "Unable to load todos";
pub const MSG_EMPTY_TITLE: &str = "Title should not be empty";
pub const MSG_ADD_FAILED: &str = "Unable to add a todo";
pub const MSG_DELETE_FAILED: &str = "Unable to delete a todo";
pub const MSG_CLEAR_FAILED: &str = "Error occurred while clearing completed todos";

/// Identifier of a clear-completed batch
pub type BatchId = u64;

/// Single-flight gate for add submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputGate {
    /// Input accepts a new title
    Idle,
    /// An add is in flight; new submissions are rejected
    Submitting(LocalToken),
}

/// Progress of the initial load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

/// Create request produced by [`TodoState::begin_add`]
#[derive(Debug, Clone)]
pub struct AddTicket {
    /// Token of the optimistic entry
    pub token: LocalToken,
    /// Body to send to the store
    pub task: NewTask,
}

/// Snapshot of completed tasks to delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearBatch {
    pub id: BatchId,
    pub targets: Vec<ServerId>,
}

/// One failed delete inside a clear batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearFailure {
    pub id: ServerId,
    pub title: String,
    pub reason: String,
}

/// Outcome of a clear batch
///
/// Failures are kept in arrival order; the notice slot only shows the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearReport {
    pub batch: BatchId,
    pub removed: Vec<ServerId>,
    pub failures: Vec<ClearFailure>,
    /// Aggregation failed before every member reported
    pub aborted: bool,
}

impl ClearReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.aborted
    }
}

/// What a [`Completion`] changed
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Loaded(usize),
    Added(Task),
    Deleted(ServerId),
    ClearItem(ServerId),
    Cleared(ClearReport),
}

#[derive(Debug, Default)]
struct OpenBatch {
    targets: Vec<ServerId>,
    reported: HashSet<ServerId>,
    removed: Vec<ServerId>,
    failures: Vec<ClearFailure>,
}

/// Client-side todo list state
pub struct TodoState {
    owner: OwnerId,
    clock: Arc<dyn Clock>,
    /// Confirmed tasks in insertion order
    tasks: Vec<Task>,
    /// Optimistic tasks awaiting confirmation
    pending: Vec<PendingTask>,
    /// Target of the current single-item operation
    loading: Option<TaskId>,
    /// Tasks with a delete in flight (single or bulk)
    in_flight: BTreeSet<ServerId>,
    gate: InputGate,
    input_reopened: bool,
    draft: String,
    filter: StatusFilter,
    notice: ErrorNotice,
    load_state: LoadState,
    batches: HashMap<BatchId, OpenBatch>,
    next_batch: BatchId,
    last_clear_report: Option<ClearReport>,
}

impl TodoState {
    /// Create an empty state for `owner` using the system clock
    pub fn new(owner: OwnerId) -> Self {
        Self::with_clock(owner, Arc::new(SystemClock))
    }

    /// Create an empty state reading time from `clock`
    pub fn with_clock(owner: OwnerId, clock: Arc<dyn Clock>) -> Self {
        Self {
            owner,
            clock,
            tasks: Vec::new(),
            pending: Vec::new(),
            loading: None,
            in_flight: BTreeSet::new(),
            gate: InputGate::Idle,
            input_reopened: false,
            draft: String::new(),
            filter: StatusFilter::All,
            notice: ErrorNotice::default(),
            load_state: LoadState::NotLoaded,
            batches: HashMap::new(),
            next_batch: 1,
            last_clear_report: None,
        }
    }

    /// Override how long error notices stay visible
    pub fn with_notice_timeout(mut self, timeout: Duration) -> Self {
        self.notice = ErrorNotice::new(timeout);
        self
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    // ==================== Load ====================

    /// Start the initial load; returns the owner to list
    pub fn begin_load(&mut self) -> OwnerId {
        debug!("Loading todos for owner {}", self.owner);
        self.load_state = LoadState::Loading;
        self.owner
    }

    /// Apply the initial list response
    ///
    /// On failure the collection is left empty and no retry is scheduled.
    pub fn finish_load(&mut self, result: Result<Vec<Task>, RemoteError>) -> SyncResult<usize> {
        match result {
            Ok(tasks) => {
                let mut seen = HashSet::new();
                self.tasks = tasks.into_iter().filter(|t| seen.insert(t.id)).collect();
                self.load_state = LoadState::Loaded;
                info!("Loaded {} todos", self.tasks.len());
                Ok(self.tasks.len())
            }
            Err(e) => {
                warn!("Failed to load todos: {}", e);
                self.tasks.clear();
                self.load_state = LoadState::Failed;
                self.raise(MSG_LOAD_FAILED, NoticeOrigin::Load);
                Err(e.into())
            }
        }
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    // ==================== Add ====================

    /// Replace the input buffer
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Submit the input buffer as a new title
    pub fn submit_draft(&mut self) -> SyncResult<AddTicket> {
        let title = self.draft.clone();
        self.begin_add(&title)
    }

    /// Start adding a task
    ///
    /// A blank title raises the validation notice and yields no ticket.
    /// While another add is in flight the call is rejected without touching
    /// the notice.
    pub fn begin_add(&mut self, title: &str) -> SyncResult<AddTicket> {
        if let InputGate::Submitting(_) = self.gate {
            debug!("Add rejected: another add is in flight");
            return Err(SyncError::AddInFlight);
        }

        let title = title.trim();
        if title.is_empty() {
            self.raise(MSG_EMPTY_TITLE, NoticeOrigin::Add);
            return Err(SyncError::EmptyTitle);
        }

        let token = LocalToken::new();
        self.pending.push(PendingTask {
            token,
            title: title.to_string(),
            owner: self.owner,
        });
        self.loading = Some(TaskId::Pending(token));
        self.gate = InputGate::Submitting(token);

        debug!("Adding todo {} ({:?})", token, title);
        Ok(AddTicket {
            token,
            task: NewTask::new(title, self.owner),
        })
    }

    /// Reconcile a create response
    ///
    /// The optimistic entry is removed exactly once. On success the server's
    /// task takes its place at the end of the collection.
    pub fn finish_add(
        &mut self,
        token: LocalToken,
        result: Result<Task, RemoteError>,
    ) -> SyncResult<Task> {
        let Some(pos) = self.pending.iter().position(|p| p.token == token) else {
            return Err(SyncError::UnknownToken(token));
        };
        self.pending.remove(pos);

        if self.loading == Some(TaskId::Pending(token)) {
            self.loading = None;
        }
        if self.gate == InputGate::Submitting(token) {
            self.gate = InputGate::Idle;
            self.input_reopened = true;
        }

        match result {
            Ok(task) => {
                if !self.tasks.iter().any(|t| t.id == task.id) {
                    self.tasks.push(task.clone());
                }
                self.draft.clear();
                self.notice.dismiss_from(NoticeOrigin::Add);
                info!("Added todo {} as {}", token, task.id);
                Ok(task)
            }
            Err(e) => {
                warn!("Failed to add todo {}: {}", token, e);
                self.raise(MSG_ADD_FAILED, NoticeOrigin::Add);
                Err(e.into())
            }
        }
    }

    /// True exactly while an add is in flight
    pub fn input_disabled(&self) -> bool {
        matches!(self.gate, InputGate::Submitting(_))
    }

    /// Consume the "input became available again" transition
    pub fn take_input_reopened(&mut self) -> bool {
        std::mem::take(&mut self.input_reopened)
    }

    // ==================== Delete ====================

    /// Start deleting a confirmed task
    ///
    /// Tasks still being created are rejected rather than queued.
    pub fn begin_delete(&mut self, id: &TaskId) -> SyncResult<ServerId> {
        let id = match *id {
            TaskId::Pending(token) => return Err(SyncError::NotConfirmed(token)),
            TaskId::Confirmed(id) => id,
        };
        if self.in_flight.contains(&id) {
            return Err(SyncError::DeleteInFlight(id));
        }

        self.in_flight.insert(id);
        self.loading = Some(TaskId::Confirmed(id));
        debug!("Deleting todo {}", id);
        Ok(id)
    }

    /// Reconcile a delete response
    pub fn finish_delete(&mut self, id: ServerId, result: Result<(), RemoteError>) -> SyncResult<()> {
        self.in_flight.remove(&id);
        if self.loading == Some(TaskId::Confirmed(id)) {
            self.loading = None;
        }

        match result {
            Ok(()) => {
                self.remove_task(id);
                self.notice.dismiss_from(NoticeOrigin::Delete(id));
                info!("Deleted todo {}", id);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete todo {}: {}", id, e);
                self.raise(MSG_DELETE_FAILED, NoticeOrigin::Delete(id));
                Err(e.into())
            }
        }
    }

    // ==================== Clear completed ====================

    /// Snapshot the completed tasks and open a batch for them
    ///
    /// Tasks that already have a delete in flight are left out. Every member
    /// gets its own in-flight marker.
    pub fn begin_clear_completed(&mut self) -> ClearBatch {
        let id = self.next_batch;
        self.next_batch += 1;

        let targets: Vec<ServerId> = self
            .tasks
            .iter()
            .filter(|t| t.completed && !self.in_flight.contains(&t.id))
            .map(|t| t.id)
            .collect();
        self.in_flight.extend(targets.iter().copied());

        self.batches.insert(
            id,
            OpenBatch {
                targets: targets.clone(),
                ..OpenBatch::default()
            },
        );

        debug!("Clear batch #{} targets {} todos", id, targets.len());
        ClearBatch { id, targets }
    }

    /// Apply one delete result of a clear batch
    ///
    /// Successful deletes are removed immediately. Results for ids outside
    /// the batch, or reported twice, are ignored.
    pub fn finish_clear_item(
        &mut self,
        batch: BatchId,
        id: ServerId,
        result: Result<(), RemoteError>,
    ) -> SyncResult<()> {
        let open = self
            .batches
            .get_mut(&batch)
            .ok_or(SyncError::UnknownBatch(batch))?;
        if !open.targets.contains(&id) || !open.reported.insert(id) {
            return Ok(());
        }
        self.in_flight.remove(&id);

        match result {
            Ok(()) => {
                self.tasks.retain(|t| t.id != id);
                open.removed.push(id);
                debug!("Clear batch #{}: deleted {}", batch, id);
                Ok(())
            }
            Err(e) => {
                let title = self
                    .tasks
                    .iter()
                    .find(|t| t.id == id)
                    .map(|t| t.title.clone())
                    .unwrap_or_else(|| id.to_string());
                warn!("Clear batch #{}: failed to delete {}: {}", batch, id, e);
                open.failures.push(ClearFailure {
                    id,
                    title: title.clone(),
                    reason: e.to_string(),
                });
                self.notice.raise(
                    format!("Unable to delete todo: {}", title),
                    NoticeOrigin::Clear(batch),
                    self.clock.now(),
                );
                Err(e.into())
            }
        }
    }

    /// Close a batch once every delete has settled
    ///
    /// If nothing failed the notice is cleared; otherwise the last failure's
    /// message is left standing.
    pub fn finish_clear_batch(&mut self, batch: BatchId) -> SyncResult<ClearReport> {
        let open = self
            .batches
            .remove(&batch)
            .ok_or(SyncError::UnknownBatch(batch))?;
        self.release_unreported(&open);

        if open.failures.is_empty() {
            self.notice.dismiss();
        }

        info!(
            "Clear batch #{} finished: {} removed, {} failed",
            batch,
            open.removed.len(),
            open.failures.len()
        );
        Ok(self.record_report(batch, open, false))
    }

    /// Close a batch whose aggregation failed
    pub fn abort_clear_batch(&mut self, batch: BatchId, reason: &str) -> SyncResult<ClearReport> {
        let open = self
            .batches
            .remove(&batch)
            .ok_or(SyncError::UnknownBatch(batch))?;
        self.release_unreported(&open);

        warn!("Clear batch #{} aborted: {}", batch, reason);
        self.raise(MSG_CLEAR_FAILED, NoticeOrigin::Clear(batch));
        Ok(self.record_report(batch, open, true))
    }

    /// Report of the most recently closed batch
    pub fn last_clear_report(&self) -> Option<&ClearReport> {
        self.last_clear_report.as_ref()
    }

    fn release_unreported(&mut self, open: &OpenBatch) {
        for id in &open.targets {
            if !open.reported.contains(id) {
                self.in_flight.remove(id);
            }
        }
    }

    fn record_report(&mut self, batch: BatchId, open: OpenBatch, aborted: bool) -> ClearReport {
        let report = ClearReport {
            batch,
            removed: open.removed,
            failures: open.failures,
            aborted,
        };
        self.last_clear_report = Some(report.clone());
        report
    }

    // ==================== Completions ====================

    /// Route a dispatcher completion to the matching `finish_*`
    pub fn apply(&mut self, completion: Completion) -> SyncResult<Applied> {
        match completion {
            Completion::Loaded(result) => self.finish_load(result).map(Applied::Loaded),
            Completion::Created { token, result } => {
                self.finish_add(token, result).map(Applied::Added)
            }
            Completion::Deleted { id, result } => {
                self.finish_delete(id, result).map(|()| Applied::Deleted(id))
            }
            Completion::ClearItem { batch, id, result } => self
                .finish_clear_item(batch, id, result)
                .map(|()| Applied::ClearItem(id)),
            Completion::ClearFinished { batch, result } => match result {
                Ok(()) => self.finish_clear_batch(batch).map(Applied::Cleared),
                Err(reason) => self.abort_clear_batch(batch, &reason).map(Applied::Cleared),
            },
        }
    }

    // ==================== Projection ====================

    /// Confirmed tasks in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Optimistic tasks awaiting confirmation
    pub fn pending(&self) -> &[PendingTask] {
        &self.pending
    }

    pub fn task(&self, id: ServerId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    /// Tasks matching the current filter
    pub fn visible(&self) -> Vec<VisibleTask> {
        self.filtered(self.filter)
    }

    /// Confirmed tasks followed by optimistic ones, filtered by status
    pub fn filtered(&self, filter: StatusFilter) -> Vec<VisibleTask> {
        self.tasks
            .iter()
            .map(VisibleTask::from)
            .chain(self.pending.iter().map(VisibleTask::from))
            .filter(|t| filter.matches(t.completed))
            .collect()
    }

    /// Incomplete confirmed tasks; optimistic entries are not counted
    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    pub fn has_completed(&self) -> bool {
        self.tasks.iter().any(|t| t.completed)
    }

    /// No confirmed and no optimistic tasks
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.pending.is_empty()
    }

    /// Target of the current single-item operation
    pub fn loading(&self) -> Option<TaskId> {
        self.loading
    }

    /// Tasks with a delete in flight, in id order
    pub fn in_flight(&self) -> impl Iterator<Item = ServerId> + '_ {
        self.in_flight.iter().copied()
    }

    /// Whether a row should show a busy indicator
    pub fn is_pending(&self, id: &TaskId) -> bool {
        if self.loading.as_ref() == Some(id) {
            return true;
        }
        match id {
            TaskId::Pending(token) => self.pending.iter().any(|p| p.token == *token),
            TaskId::Confirmed(id) => self.in_flight.contains(id),
        }
    }

    // ==================== Notice ====================

    /// Current error message, empty once its deadline has passed
    pub fn error_message(&self) -> Option<&str> {
        self.notice.message_at(self.clock.now())
    }

    pub fn notice(&self) -> &ErrorNotice {
        &self.notice
    }

    /// User dismissal: clears immediately and cancels the deadline
    pub fn dismiss_error(&mut self) {
        self.notice.dismiss();
    }

    /// Expire the notice against the clock; true if it was cleared
    pub fn tick(&mut self) -> bool {
        self.notice.expire(self.clock.now())
    }

    fn raise(&mut self, message: &str, origin: NoticeOrigin) {
        self.notice.raise(message, origin, self.clock.now());
    }

    fn remove_task(&mut self, id: ServerId) {
        self.tasks.retain(|t| t.id != id);
    }
}
