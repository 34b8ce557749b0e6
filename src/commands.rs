use std::io::{self, Write};

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::api::TaskApi;
use crate::board::{Board, Column};
use crate::drag::{BoardController, DragLocation, DragResult, FailurePolicy, Settlement};
use crate::error::{Error, Result};
use crate::models::{Priority, Status, Task, TaskId, UserId};
use crate::validation::{TaskForm, UserForm};

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Green,
        Priority::Medium => Color::Yellow,
        Priority::High => Color::Red,
    }
}

fn confirm(question: &str) -> io::Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "s"))
}

/// Prints the three columns side by side.
pub async fn cmd_board(api: &dyn TaskApi) -> Result<()> {
    let board = Board::from_tasks(api.list_tasks().await?);
    if board.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(Column::ALL.iter().map(|c| {
            Cell::new(format!("{} ({})", c.title(), board.column(*c).len()))
                .add_attribute(Attribute::Bold)
        }));

    let depth = Column::ALL
        .iter()
        .map(|c| board.column(*c).len())
        .max()
        .unwrap_or(0);
    for row in 0..depth {
        table.add_row(Column::ALL.iter().map(|c| match board.column(*c).get(row) {
            Some(t) => Cell::new(format!(
                "#{} {}\n{} · {}",
                t.id,
                t.description,
                t.priority.label(),
                t.sector_name
            ))
            .fg(priority_color(t.priority)),
            None => Cell::new(""),
        }));
    }

    println!("{table}");
    Ok(())
}

/// Lists every task in a table.
pub async fn cmd_task_list(api: &dyn TaskApi) -> Result<()> {
    let tasks = api.list_tasks().await?;
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Usuário").add_attribute(Attribute::Bold),
            Cell::new("Descrição").add_attribute(Attribute::Bold),
            Cell::new("Setor").add_attribute(Attribute::Bold),
            Cell::new("Prioridade").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
            Cell::new("Data").add_attribute(Attribute::Bold),
        ]);

    for t in tasks {
        let status_color = match t.status {
            Status::Todo => Color::Reset,
            Status::Doing => Color::Yellow,
            Status::Done => Color::Green,
        };
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(t.owner_label()),
            Cell::new(&t.description),
            Cell::new(&t.sector_name),
            Cell::new(t.priority.label()).fg(priority_color(t.priority)),
            Cell::new(Column::for_status(t.status).title()).fg(status_color),
            Cell::new(t.created_at.format("%Y-%m-%d %H:%M")),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Validates the form and creates a task in the TODO column.
pub async fn cmd_task_add(api: &dyn TaskApi, form: TaskForm, silent: bool) -> Result<Task> {
    let new_task = form.to_new_task(Status::Todo)?;
    let task = api.create_task(&new_task).await?;
    if !silent {
        println!("Task added (id = {})", task.id);
    }
    Ok(task)
}

/// Fields given on the command line for `task edit`. Missing ones keep their
/// current value.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub user: Option<UserId>,
    pub description: Option<String>,
    pub sector: Option<String>,
    pub priority: Option<String>,
}

/// Edits an existing task's details. The status is left as it is.
pub async fn cmd_task_edit(
    api: &dyn TaskApi,
    id: TaskId,
    edit: TaskEdit,
    silent: bool,
) -> Result<Task> {
    let current = find_task(api, id).await?;
    let form = TaskForm {
        user_id: edit.user.unwrap_or(current.user).to_string(),
        description: edit.description.unwrap_or(current.description),
        sector_name: edit.sector.unwrap_or(current.sector_name),
        priority: edit
            .priority
            .unwrap_or_else(|| current.priority.code().to_string()),
    };
    let patch = form.to_patch()?;
    let task = api.update_task(id, &patch).await?;
    if !silent {
        println!("Task {} updated.", id);
    }
    Ok(task)
}

/// Moves a task to another column (or position) through the drag engine and
/// waits for the server to confirm the new status.
pub async fn cmd_task_move(
    api: &dyn TaskApi,
    id: TaskId,
    column: Column,
    index: Option<usize>,
    policy: FailurePolicy,
    silent: bool,
) -> Result<Board> {
    let mut controller = BoardController::new(policy);
    controller.load(api.list_tasks().await?);
    let (from_column, from_index) = controller.board().locate(id).ok_or(Error::NotFound {
        what: "task",
        id,
    })?;

    let drag = DragResult::new(
        DragLocation::new(from_column, from_index),
        Some(DragLocation::new(column, index.unwrap_or(0))),
    );
    let (_, settlement) = controller.drag_and_confirm(api, drag).await?;

    match settlement {
        None => {
            if !silent {
                println!("Task {} stays in '{}'.", id, column.title());
            }
        }
        Some(Settlement::Confirmed(task)) => {
            if !silent {
                println!(
                    "Task {} moved to '{}'.",
                    task.id,
                    Column::for_status(task.status).title()
                );
            }
        }
        Some(Settlement::RolledBack(e)) | Some(Settlement::LeftStale(e)) => {
            return Err(e.into());
        }
    }
    Ok(controller.board().clone())
}

/// Removes a task after confirmation.
pub async fn cmd_task_remove(api: &dyn TaskApi, id: TaskId, force: bool, silent: bool) -> Result<()> {
    if !force && !confirm("Deseja realmente excluir esta tarefa?")? {
        println!("Aborted.");
        return Ok(());
    }
    api.delete_task(id).await?;
    if !silent {
        println!("Task {} removed.", id);
    }
    Ok(())
}

/// Lists registered users.
pub async fn cmd_user_list(api: &dyn TaskApi) -> Result<()> {
    let users = api.list_users().await?;
    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["ID", "Nome", "E-mail"]);
    for u in users {
        table.add_row(vec![u.id.to_string(), u.name, u.email]);
    }
    println!("{table}");
    Ok(())
}

/// Validates the registration form and creates the user.
pub async fn cmd_user_add(api: &dyn TaskApi, form: UserForm, silent: bool) -> Result<()> {
    let new_user = form.into_new_user()?;
    let user = api.create_user(&new_user).await?;
    if !silent {
        println!("User '{}' registered (id = {})", user.name, user.id);
    }
    Ok(())
}

/// Removes a user after confirmation. The server deletes the user's tasks too.
pub async fn cmd_user_remove(api: &dyn TaskApi, id: UserId, force: bool, silent: bool) -> Result<()> {
    if !force && !confirm("Deseja realmente excluir este usuário?")? {
        println!("Aborted.");
        return Ok(());
    }
    api.delete_user(id).await?;
    if !silent {
        println!("User {} removed.", id);
    }
    Ok(())
}

async fn find_task(api: &dyn TaskApi, id: TaskId) -> Result<Task> {
    api.list_tasks()
        .await?
        .into_iter()
        .find(|t| t.id == id)
        .ok_or(Error::NotFound { what: "task", id })
}
