//! Drag-and-drop reconciliation between the local board and the remote store.
//!
//! A drag is applied to the [`Board`] immediately. Moves that change a
//! task's column produce a [`PendingMove`], which is confirmed against the
//! server and then settled back into the board by the owning
//! [`BoardController`].

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::api::TaskApi;
use crate::board::{Board, Column};
use crate::error::{ApiError, BoardError};
use crate::models::{Status, Task, TaskId, TaskPatch};

/// A column and a position inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragLocation {
    pub column: Column,
    pub index: usize,
}

impl DragLocation {
    pub fn new(column: Column, index: usize) -> Self {
        DragLocation { column, index }
    }
}

/// Outcome of a drag gesture. `destination` is `None` when the card was
/// dropped outside every column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragResult {
    pub source: DragLocation,
    pub destination: Option<DragLocation>,
}

impl DragResult {
    pub fn new(source: DragLocation, destination: Option<DragLocation>) -> Self {
        DragResult {
            source,
            destination,
        }
    }
}

/// Remote update still owed after a cross-column drag.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMove {
    /// The record as it was before the drag.
    pub original: Task,
    pub from: DragLocation,
    pub to: DragLocation,
}

impl PendingMove {
    pub fn task_id(&self) -> TaskId {
        self.original.id
    }

    pub fn target_status(&self) -> Status {
        self.to.column.status()
    }

    /// Sends the status update for this move.
    pub async fn confirm(&self, api: &dyn TaskApi) -> Result<Task, ApiError> {
        info!(
            task_id = self.task_id(),
            status = %self.target_status(),
            "confirming move"
        );
        api.update_task(self.task_id(), &TaskPatch::status(self.target_status()))
            .await
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Nothing changed: no destination, or dropped where it started.
    Unchanged,
    /// Order changed inside one column. No remote call is needed.
    Reordered {
        column: Column,
        from: usize,
        to: usize,
    },
    /// The task changed column and the server must be told.
    Moved(PendingMove),
}

/// What to do with the board when a move cannot be confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Put the task back where it came from.
    #[default]
    Rollback,
    /// Keep showing the optimistic state.
    LeaveStale,
}

#[derive(Debug)]
pub enum Settlement {
    Confirmed(Task),
    RolledBack(ApiError),
    LeftStale(ApiError),
}

impl Settlement {
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Settlement::Confirmed(_) => None,
            Settlement::RolledBack(e) | Settlement::LeftStale(e) => Some(e),
        }
    }
}

/// Single owner of the board state. All mutation goes through here.
#[derive(Debug, Clone, Default)]
pub struct BoardController {
    board: Board,
    policy: FailurePolicy,
}

impl BoardController {
    pub fn new(policy: FailurePolicy) -> Self {
        BoardController {
            board: Board::new(),
            policy,
        }
    }

    pub fn with_board(board: Board, policy: FailurePolicy) -> Self {
        BoardController { board, policy }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Replaces the board with a freshly fetched task list.
    pub fn load(&mut self, tasks: Vec<Task>) {
        self.board = Board::from_tasks(tasks);
    }

    pub fn remove_task(&mut self, id: TaskId) -> Option<Task> {
        self.board.remove_by_id(id).map(|(_, _, t)| t)
    }

    /// Applies a drag to the board before anything is sent to the server.
    pub fn on_drag_end(&mut self, drag: DragResult) -> Result<DragOutcome, BoardError> {
        let Some(dest) = drag.destination else {
            debug!("drag ended outside any column");
            return Ok(DragOutcome::Unchanged);
        };
        let source = drag.source;
        let len = self.board.column(source.column).len();
        if source.index >= len {
            return Err(BoardError::IndexOutOfRange {
                column: source.column,
                index: source.index,
                len,
            });
        }

        if source.column == dest.column {
            let to = dest.index.min(len - 1);
            if source.index == to {
                return Ok(DragOutcome::Unchanged);
            }
            self.board
                .move_task((source.column, source.index), (dest.column, dest.index))?;
            return Ok(DragOutcome::Reordered {
                column: source.column,
                from: source.index,
                to,
            });
        }

        let original = self
            .board
            .move_task((source.column, source.index), (dest.column, dest.index))?;
        let to_len = self.board.column(dest.column).len();
        let pending = PendingMove {
            original,
            from: source,
            to: DragLocation::new(dest.column, dest.index.min(to_len - 1)),
        };
        debug!(
            task_id = pending.task_id(),
            from = %source.column,
            to = %dest.column,
            "task moved optimistically"
        );
        Ok(DragOutcome::Moved(pending))
    }

    /// Reconciles the server's answer to a pending move with the board.
    pub fn settle(&mut self, pending: &PendingMove, result: Result<Task, ApiError>) -> Settlement {
        match result {
            Ok(task) => {
                self.merge_confirmed(pending, task.clone());
                Settlement::Confirmed(task)
            }
            Err(e) => {
                error!(
                    task_id = pending.task_id(),
                    status = %pending.target_status(),
                    error = %e,
                    "status update failed"
                );
                match self.policy {
                    FailurePolicy::Rollback => {
                        self.roll_back(pending);
                        Settlement::RolledBack(e)
                    }
                    FailurePolicy::LeaveStale => Settlement::LeftStale(e),
                }
            }
        }
    }

    /// Applies a drag and waits for the server to confirm it.
    pub async fn drag_and_confirm(
        &mut self,
        api: &dyn TaskApi,
        drag: DragResult,
    ) -> Result<(DragOutcome, Option<Settlement>), BoardError> {
        let outcome = self.on_drag_end(drag)?;
        let settlement = match &outcome {
            DragOutcome::Moved(pending) => {
                let result = pending.confirm(api).await;
                Some(self.settle(pending, result))
            }
            _ => None,
        };
        Ok((outcome, settlement))
    }

    fn merge_confirmed(&mut self, pending: &PendingMove, task: Task) {
        let expected = pending.to.column;
        let actual = Column::for_status(task.status);
        let Some((current, _)) = self.board.locate(task.id) else {
            debug!(task_id = pending.task_id(), "confirmed task no longer on the board");
            return;
        };
        if current == actual {
            self.board.replace(actual, task);
            return;
        }

        // A reload may have put the card back in its old column. Any other
        // column means the user moved it again before the answer arrived.
        let stale = Column::for_status(pending.original.status);
        if current != expected && current != stale {
            debug!(
                task_id = pending.task_id(),
                column = %current,
                "task moved again before confirmation; keeping local position"
            );
            return;
        }

        let index = if actual == expected {
            pending.to.index
        } else {
            warn!(
                task_id = pending.task_id(),
                expected = %expected,
                actual = %actual,
                "server returned a different status; re-homing task"
            );
            self.board.column(actual).len()
        };
        self.board.remove_by_id(task.id);
        self.board.insert(actual, index, task);
    }

    fn roll_back(&mut self, pending: &PendingMove) {
        if self.board.remove_by_id(pending.task_id()).is_none() {
            debug!(task_id = pending.task_id(), "task vanished before rollback");
            return;
        }
        self.board.insert(
            pending.from.column,
            pending.from.index,
            pending.original.clone(),
        );
    }
}
