//! Task scheduler (RFC 9051 §5.5 pipelining rules applied to higher‑level work).
//!
//! Where [`pipeline`](crate::pipeline) batches raw [`Command`]s for wire
//! efficiency, the scheduler sits one layer up: it owns a DAG of
//! higher‑level tasks (open mailbox, fetch, search, sync, append, copy,
//! move, idle, …), each of which may issue one or more commands over its
//! lifetime. A task becomes eligible for dispatch once every task it
//! depends on has completed and the connection has finished bring‑up
//! (see [`bringup`](crate::bringup)); eligible tasks are dispatched in the
//! order they were submitted, never reordered by dependency shape.
//!
//! Selecting a mailbox is the one operation the scheduler special‑cases:
//! only one `SELECT`/`EXAMINE` may be outstanding for a given mailbox at a
//! time, so a second request for the same mailbox while the first is still
//! pending or in flight is coalesced onto the existing task rather than
//! starting a new one.

use std::collections::{HashMap, VecDeque};

use crate::types::{Mailbox, Tag};

/// Stable identity for a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// What kind of higher‑level operation a task represents.
///
/// Only [`TaskKind::SelectMailbox`] affects scheduling (it's the one kind
/// that gets coalesced); the rest exist so callers and tests can label and
/// inspect the DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// `SELECT`/`EXAMINE` a mailbox.
    SelectMailbox(Mailbox),
    /// `FETCH`/`UID FETCH`.
    Fetch,
    /// `SEARCH`/`UID SEARCH`/`ESEARCH`.
    Search,
    /// A mailbox synchronisation round (the C8 decision table).
    Sync,
    /// `APPEND`.
    Append,
    /// `COPY`/`UID COPY`.
    Copy,
    /// `MOVE`/`UID MOVE`.
    Move,
    /// An `IDLE` watch.
    Idle,
    /// Anything else (e.g. `NOOP`, `STATUS`, `LIST`).
    Other,
}

/// A task's current position in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Submitted, waiting on dependencies and/or connection readiness.
    Pending,
    /// Dispatched; one or more tags are outstanding.
    Dispatched,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed(String),
    /// Cancelled before or after dispatch; its effects are discarded.
    Cancelled,
}

#[derive(Debug, Clone)]
struct Task {
    kind: TaskKind,
    depends_on: Vec<TaskId>,
    tags: Vec<Tag>,
    state: TaskState,
    cancel_requested: bool,
}

/// Owns the task DAG for one connection.
///
/// The scheduler does not itself know how to execute a task - it only
/// decides *when* a submitted task becomes eligible to run and tracks its
/// outcome. The caller drives [`Scheduler::ready_tasks`] in a loop,
/// dispatches whatever it returns, and reports outcomes back via
/// [`Scheduler::dispatch`]/[`Scheduler::complete`]/[`Scheduler::fail`].
#[derive(Debug)]
pub struct Scheduler {
    next_id: u64,
    tasks: HashMap<TaskId, Task>,
    submission_order: VecDeque<TaskId>,
    selecting: HashMap<Mailbox, TaskId>,
    connection_ready: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Creates an empty scheduler. The connection is assumed not ready
    /// (bring‑up not yet complete) until [`Scheduler::set_connection_ready`]
    /// is called.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            tasks: HashMap::new(),
            submission_order: VecDeque::new(),
            selecting: HashMap::new(),
            connection_ready: false,
        }
    }

    /// Gates dispatch on the bring‑up FSM having reached *ready*. No task
    /// is ever eligible for dispatch while this is `false`, regardless of
    /// dependency state.
    pub fn set_connection_ready(&mut self, ready: bool) {
        self.connection_ready = ready;
    }

    /// Whether the connection has finished bring‑up.
    #[must_use]
    pub fn is_connection_ready(&self) -> bool {
        self.connection_ready
    }

    fn alloc(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Submits a task with the given dependencies.
    ///
    /// For [`TaskKind::SelectMailbox`], if a task selecting the same
    /// mailbox is already pending or dispatched, that task's id is
    /// returned instead of creating a new one - the request is coalesced.
    pub fn submit(&mut self, kind: TaskKind, depends_on: Vec<TaskId>) -> TaskId {
        if let TaskKind::SelectMailbox(ref mailbox) = kind {
            if let Some(existing) = self.selecting.get(mailbox) {
                if let Some(task) = self.tasks.get(existing) {
                    if matches!(task.state, TaskState::Pending | TaskState::Dispatched) {
                        return *existing;
                    }
                }
            }
        }

        let id = self.alloc();
        if let TaskKind::SelectMailbox(ref mailbox) = kind {
            self.selecting.insert(mailbox.clone(), id);
        }
        self.tasks.insert(
            id,
            Task {
                kind,
                depends_on,
                tags: Vec::new(),
                state: TaskState::Pending,
                cancel_requested: false,
            },
        );
        self.submission_order.push_back(id);
        id
    }

    fn dependencies_satisfied(&self, task: &Task) -> bool {
        task.depends_on.iter().all(|dep| {
            self.tasks
                .get(dep)
                .is_some_and(|t| matches!(t.state, TaskState::Completed))
        })
    }

    /// Returns the ids of every pending task whose dependencies have all
    /// completed, in submission order. Empty if the connection isn't
    /// ready yet. Does not mutate scheduler state; call
    /// [`Scheduler::dispatch`] for each id the caller actually sends.
    #[must_use]
    pub fn ready_tasks(&self) -> Vec<TaskId> {
        if !self.connection_ready {
            return Vec::new();
        }
        self.submission_order
            .iter()
            .filter(|id| {
                self.tasks
                    .get(id)
                    .is_some_and(|t| t.state == TaskState::Pending && self.dependencies_satisfied(t))
            })
            .copied()
            .collect()
    }

    /// Marks a task dispatched, recording the command tag(s) it issued.
    pub fn dispatch(&mut self, id: TaskId, tags: Vec<Tag>) {
        if let Some(task) = self.tasks.get_mut(&id) {
            task.tags = tags;
            task.state = TaskState::Dispatched;
        }
    }

    /// Marks a task completed and returns the ids of tasks that became
    /// newly eligible for dispatch as a result (still subject to
    /// [`Scheduler::ready_tasks`]'s connection‑ready gate).
    pub fn complete(&mut self, id: TaskId) -> Vec<TaskId> {
        let was_cancelled = self
            .tasks
            .get(&id)
            .is_some_and(|t| t.cancel_requested);
        if let Some(task) = self.tasks.get_mut(&id) {
            task.state = if was_cancelled {
                TaskState::Cancelled
            } else {
                TaskState::Completed
            };
        }
        self.clear_selecting_if_done(&id);

        self.submission_order
            .iter()
            .filter(|dep_id| {
                self.tasks.get(dep_id).is_some_and(|t| {
                    t.state == TaskState::Pending
                        && t.depends_on.contains(&id)
                        && self.dependencies_satisfied(t)
                })
            })
            .copied()
            .collect()
    }

    /// Marks a task failed. Dependents remain pending forever (the caller
    /// is expected to fail them explicitly, mirroring "dependents are not
    /// scheduled until parents complete").
    pub fn fail(&mut self, id: TaskId, reason: impl Into<String>) {
        if let Some(task) = self.tasks.get_mut(&id) {
            task.state = TaskState::Failed(reason.into());
        }
        self.clear_selecting_if_done(&id);
    }

    /// Requests cancellation of a task.
    ///
    /// If the task hasn't been dispatched yet it's cancelled immediately
    /// and removed from future `ready_tasks` results. If it has already
    /// been dispatched, its commands are left to finish (the tag stream
    /// must stay consistent) but its `cancel_requested` flag is set so the
    /// caller knows to discard the eventual reply's effects; `complete`
    /// called afterwards resolves it to `Cancelled` rather than
    /// `Completed`.
    pub fn cancel(&mut self, id: TaskId) {
        let Some(task) = self.tasks.get_mut(&id) else {
            return;
        };
        match task.state {
            TaskState::Pending => {
                task.state = TaskState::Cancelled;
                self.clear_selecting_if_done(&id);
            }
            TaskState::Dispatched => {
                task.cancel_requested = true;
            }
            TaskState::Completed | TaskState::Failed(_) | TaskState::Cancelled => {}
        }
    }

    /// Whether a task has a cancellation pending (requested but not yet
    /// resolved by a `complete`/`fail` call).
    #[must_use]
    pub fn is_cancel_requested(&self, id: TaskId) -> bool {
        self.tasks.get(&id).is_some_and(|t| t.cancel_requested)
    }

    /// The current state of a task.
    #[must_use]
    pub fn state(&self, id: TaskId) -> Option<&TaskState> {
        self.tasks.get(&id).map(|t| &t.state)
    }

    /// The kind of a task.
    #[must_use]
    pub fn kind(&self, id: TaskId) -> Option<&TaskKind> {
        self.tasks.get(&id).map(|t| &t.kind)
    }

    /// The tags a dispatched task issued.
    #[must_use]
    pub fn tags(&self, id: TaskId) -> Option<&[Tag]> {
        self.tasks.get(&id).map(|t| t.tags.as_slice())
    }

    fn clear_selecting_if_done(&mut self, id: &TaskId) {
        self.selecting.retain(|_, selecting_id| selecting_id != id);
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn tag(s: &str) -> Tag {
        Tag::new(s)
    }

    #[test]
    fn tasks_are_not_ready_until_connection_is_ready() {
        let mut scheduler = Scheduler::new();
        let task = scheduler.submit(TaskKind::Other, vec![]);
        assert!(scheduler.ready_tasks().is_empty());

        scheduler.set_connection_ready(true);
        assert_eq!(scheduler.ready_tasks(), vec![task]);
    }

    #[test]
    fn dependents_wait_for_parents_to_complete() {
        let mut scheduler = Scheduler::new();
        scheduler.set_connection_ready(true);

        let parent = scheduler.submit(TaskKind::Fetch, vec![]);
        let child = scheduler.submit(TaskKind::Search, vec![parent]);

        assert_eq!(scheduler.ready_tasks(), vec![parent]);

        scheduler.dispatch(parent, vec![tag("A001")]);
        let unblocked = scheduler.complete(parent);
        assert_eq!(unblocked, vec![child]);
        assert_eq!(scheduler.ready_tasks(), vec![child]);
    }

    #[test]
    fn ready_tasks_preserve_submission_order() {
        let mut scheduler = Scheduler::new();
        scheduler.set_connection_ready(true);

        let first = scheduler.submit(TaskKind::Other, vec![]);
        let second = scheduler.submit(TaskKind::Other, vec![]);
        let third = scheduler.submit(TaskKind::Other, vec![]);

        assert_eq!(scheduler.ready_tasks(), vec![first, second, third]);
    }

    #[test]
    fn selecting_the_same_mailbox_twice_coalesces() {
        let mut scheduler = Scheduler::new();
        let inbox = Mailbox::inbox();

        let first = scheduler.submit(TaskKind::SelectMailbox(inbox.clone()), vec![]);
        let second = scheduler.submit(TaskKind::SelectMailbox(inbox.clone()), vec![]);
        assert_eq!(first, second);

        // Different mailbox gets its own task.
        let other = scheduler.submit(TaskKind::SelectMailbox(Mailbox::new("Archive")), vec![]);
        assert_ne!(first, other);
    }

    #[test]
    fn a_completed_select_frees_the_mailbox_for_a_fresh_task() {
        let mut scheduler = Scheduler::new();
        scheduler.set_connection_ready(true);
        let inbox = Mailbox::inbox();

        let first = scheduler.submit(TaskKind::SelectMailbox(inbox.clone()), vec![]);
        scheduler.dispatch(first, vec![tag("A001")]);
        scheduler.complete(first);

        let second = scheduler.submit(TaskKind::SelectMailbox(inbox), vec![]);
        assert_ne!(first, second);
    }

    #[test]
    fn cancelling_a_pending_task_removes_it_from_ready_tasks() {
        let mut scheduler = Scheduler::new();
        scheduler.set_connection_ready(true);

        let task = scheduler.submit(TaskKind::Other, vec![]);
        scheduler.cancel(task);

        assert!(scheduler.ready_tasks().is_empty());
        assert_eq!(scheduler.state(task), Some(&TaskState::Cancelled));
    }

    #[test]
    fn cancelling_a_dispatched_task_waits_for_its_reply_then_resolves_cancelled() {
        let mut scheduler = Scheduler::new();
        scheduler.set_connection_ready(true);

        let task = scheduler.submit(TaskKind::Fetch, vec![]);
        scheduler.dispatch(task, vec![tag("A001")]);
        scheduler.cancel(task);

        // Still dispatched - the tag stream must stay consistent.
        assert_eq!(scheduler.state(task), Some(&TaskState::Dispatched));
        assert!(scheduler.is_cancel_requested(task));

        scheduler.complete(task);
        assert_eq!(scheduler.state(task), Some(&TaskState::Cancelled));
    }

    #[test]
    fn failing_a_parent_leaves_dependents_pending() {
        let mut scheduler = Scheduler::new();
        scheduler.set_connection_ready(true);

        let parent = scheduler.submit(TaskKind::Sync, vec![]);
        let child = scheduler.submit(TaskKind::Fetch, vec![parent]);

        scheduler.dispatch(parent, vec![tag("A001")]);
        scheduler.fail(parent, "NO sync failed");

        assert!(matches!(scheduler.state(parent), Some(TaskState::Failed(_))));
        assert!(scheduler.ready_tasks().is_empty());
        assert_eq!(scheduler.state(child), Some(&TaskState::Pending));
    }

    #[test]
    fn a_task_with_multiple_dependencies_waits_for_all_of_them() {
        let mut scheduler = Scheduler::new();
        scheduler.set_connection_ready(true);

        let a = scheduler.submit(TaskKind::Fetch, vec![]);
        let b = scheduler.submit(TaskKind::Search, vec![]);
        let joined = scheduler.submit(TaskKind::Sync, vec![a, b]);

        scheduler.dispatch(a, vec![tag("A001")]);
        scheduler.complete(a);
        assert!(!scheduler.ready_tasks().contains(&joined));

        scheduler.dispatch(b, vec![tag("A002")]);
        let unblocked = scheduler.complete(b);
        assert_eq!(unblocked, vec![joined]);
    }
}
