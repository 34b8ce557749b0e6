use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;
use crate::models::{Status, Task, TaskId};

/// One of the three status buckets rendered side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Todo,
    Doing,
    Done,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::Todo, Column::Doing, Column::Done];

    /// Column key as used by the board (`todo`, `doing`, `done`).
    pub fn key(self) -> &'static str {
        match self {
            Column::Todo => "todo",
            Column::Doing => "doing",
            Column::Done => "done",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Column::Todo => "A fazer",
            Column::Doing => "Fazendo",
            Column::Done => "Pronto",
        }
    }

    /// Status a task takes when it lands in this column.
    pub fn status(self) -> Status {
        match self {
            Column::Todo => Status::Todo,
            Column::Doing => Status::Doing,
            Column::Done => Status::Done,
        }
    }

    pub fn for_status(status: Status) -> Self {
        match status {
            Status::Todo => Column::Todo,
            Status::Doing => Column::Doing,
            Status::Done => Column::Done,
        }
    }

    pub fn position(self) -> usize {
        match self {
            Column::Todo => 0,
            Column::Doing => 1,
            Column::Done => 2,
        }
    }

    pub fn from_position(position: usize) -> Option<Self> {
        Column::ALL.get(position).copied()
    }

    pub fn left(self) -> Self {
        Column::from_position(self.position().saturating_sub(1)).unwrap_or(self)
    }

    pub fn right(self) -> Self {
        Column::from_position(self.position() + 1).unwrap_or(self)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(Column::Todo),
            "doing" => Ok(Column::Doing),
            "done" => Ok(Column::Done),
            other => Err(format!(
                "unknown column '{}' (expected todo, doing or done)",
                other
            )),
        }
    }
}

/// Three ordered task lists keyed by column.
///
/// Every task appears in exactly one column. Order inside a column is for
/// display only and is never sent to the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    todo: Vec<Task>,
    doing: Vec<Task>,
    done: Vec<Task>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partitions tasks by status, keeping the order they arrive in.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut board = Board::new();
        for task in tasks {
            let column = Column::for_status(task.status);
            board.column_mut(column).push(task);
        }
        board
    }

    pub fn column(&self, column: Column) -> &[Task] {
        match column {
            Column::Todo => &self.todo,
            Column::Doing => &self.doing,
            Column::Done => &self.done,
        }
    }

    fn column_mut(&mut self, column: Column) -> &mut Vec<Task> {
        match column {
            Column::Todo => &mut self.todo,
            Column::Doing => &mut self.doing,
            Column::Done => &mut self.done,
        }
    }

    /// Total number of tasks across all columns.
    pub fn len(&self) -> usize {
        self.todo.len() + self.doing.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Column, &Task)> + '_ {
        Column::ALL
            .into_iter()
            .flat_map(move |c| self.column(c).iter().map(move |t| (c, t)))
    }

    /// Finds the column and index holding the task with `id`.
    pub fn locate(&self, id: TaskId) -> Option<(Column, usize)> {
        Column::ALL.into_iter().find_map(|c| {
            self.column(c)
                .iter()
                .position(|t| t.id == id)
                .map(|i| (c, i))
        })
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.locate(id).map(|(c, i)| &self.column(c)[i])
    }

    /// Removes and returns the task at `index` of `column`.
    pub fn remove(&mut self, column: Column, index: usize) -> Result<Task, BoardError> {
        let tasks = self.column_mut(column);
        if index >= tasks.len() {
            return Err(BoardError::IndexOutOfRange {
                column,
                index,
                len: tasks.len(),
            });
        }
        Ok(tasks.remove(index))
    }

    /// Inserts `task` at `index` of `column`, appending when the index is past
    /// the end. Returns the index actually used.
    pub fn insert(&mut self, column: Column, index: usize, task: Task) -> usize {
        let tasks = self.column_mut(column);
        let index = index.min(tasks.len());
        tasks.insert(index, task);
        index
    }

    /// Removes the task with `id` wherever it is.
    pub fn remove_by_id(&mut self, id: TaskId) -> Option<(Column, usize, Task)> {
        let (column, index) = self.locate(id)?;
        self.remove(column, index).ok().map(|t| (column, index, t))
    }

    /// Replaces the record with the same id inside `column`. Returns false when
    /// the column does not hold that task.
    pub fn replace(&mut self, column: Column, task: Task) -> bool {
        match self.column_mut(column).iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => false,
        }
    }

    /// Moves the task at `from` to `to`, re-stamping its status when it changes
    /// column. Returns the record as it was before the move.
    pub fn move_task(
        &mut self,
        from: (Column, usize),
        to: (Column, usize),
    ) -> Result<Task, BoardError> {
        let task = self.remove(from.0, from.1)?;
        let original = task.clone();
        let mut moved = task;
        moved.status = to.0.status();
        self.insert(to.0, to.1, moved);
        Ok(original)
    }
}
