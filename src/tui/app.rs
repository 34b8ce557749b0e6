use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use ratatui::layout::{Position, Rect};
use ratatui::widgets::TableState;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::api::TaskApi;
use crate::board::Column;
use crate::drag::{BoardController, DragLocation, DragOutcome, DragResult, PendingMove, Settlement};
use crate::error::ApiError;
use crate::models::{Priority, Status, Task, TaskId, User, UserId};
use crate::validation::{self, TaskForm, UserForm, ValidationResult};

type Request = Pin<Box<dyn Future<Output = ApiEvent> + Send>>;

/// Rows taken by one card inside a column list.
pub const CARD_HEIGHT: u16 = 2;

/// Results of background requests, delivered back to the UI loop.
#[derive(Debug)]
pub enum ApiEvent {
    TasksLoaded(Result<Vec<Task>, ApiError>),
    UsersLoaded(Result<Vec<User>, ApiError>),
    MoveSettled(PendingMove, Result<Task, ApiError>),
    TaskSaved(Result<Task, ApiError>),
    UserSaved(Result<User, ApiError>),
    Deleted(DeleteTarget, Result<(), ApiError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    Task(TaskId),
    User(UserId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// A card is picked up with the keyboard and follows the arrows.
    Grabbing,
    Form,
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Board,
    Tables,
}

/// Which table has focus in the tables view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFocus {
    Users,
    Tasks,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    NewTask,
    EditTask(TaskId),
    NewUser,
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub key: &'static str,
    pub label: &'static str,
    pub value: String,
}

/// An open modal form with its fields and the last validation result.
#[derive(Debug, Clone)]
pub struct FormState {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    pub active: usize,
    pub errors: ValidationResult,
    pub server_error: Option<String>,
    pub submitting: bool,
}

impl FormState {
    fn task(kind: FormKind, task: Option<&Task>) -> Self {
        let value = |f: fn(&Task) -> String| task.map(f).unwrap_or_default();
        FormState {
            kind,
            fields: vec![
                FormField {
                    key: validation::USER_ID,
                    label: "Usuário",
                    value: value(|t| t.user.to_string()),
                },
                FormField {
                    key: validation::DESCRIPTION,
                    label: "Descrição",
                    value: value(|t| t.description.clone()),
                },
                FormField {
                    key: validation::SECTOR_NAME,
                    label: "Setor",
                    value: value(|t| t.sector_name.clone()),
                },
                FormField {
                    key: validation::PRIORITY,
                    label: "Prioridade",
                    value: value(|t| t.priority.code().to_string()),
                },
            ],
            active: 0,
            errors: ValidationResult::default(),
            server_error: None,
            submitting: false,
        }
    }

    fn user() -> Self {
        FormState {
            kind: FormKind::NewUser,
            fields: vec![
                FormField {
                    key: validation::NAME,
                    label: "Nome",
                    value: String::new(),
                },
                FormField {
                    key: validation::EMAIL,
                    label: "E-mail",
                    value: String::new(),
                },
            ],
            active: 0,
            errors: ValidationResult::default(),
            server_error: None,
            submitting: false,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::NewTask => "Nova Tarefa",
            FormKind::EditTask(_) => "Editar Tarefa",
            FormKind::NewUser => "Cadastrar Usuário",
        }
    }

    pub fn value(&self, key: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    fn active_field_mut(&mut self) -> &mut FormField {
        &mut self.fields[self.active]
    }

    fn task_form(&self) -> TaskForm {
        TaskForm {
            user_id: self.value(validation::USER_ID).to_string(),
            description: self.value(validation::DESCRIPTION).to_string(),
            sector_name: self.value(validation::SECTOR_NAME).to_string(),
            priority: self.value(validation::PRIORITY).to_string(),
        }
    }

    fn user_form(&self) -> UserForm {
        UserForm::new(self.value(validation::NAME), self.value(validation::EMAIL))
    }
}

/// A card picked up with the keyboard, and where it would land.
///
/// The card is held by id: background results may shift it while it is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grab {
    pub task: TaskId,
    pub target: DragLocation,
}

pub struct App {
    pub controller: BoardController,
    pub users: Vec<User>,
    pub view_mode: ViewMode,
    pub input_mode: InputMode,
    /// Selected card on the board.
    pub selected: DragLocation,
    pub grab: Option<Grab>,
    /// Card under the mouse button since the last press.
    pub mouse_source: Option<TaskId>,
    pub form: Option<FormState>,
    pub pending_delete: Option<DeleteTarget>,
    pub banner: Option<String>,
    pub loading: bool,
    pub table_focus: TableFocus,
    pub users_state: TableState,
    pub tasks_state: TableState,
    /// Inner areas of the three columns from the last draw, for mouse hit tests.
    pub column_areas: [Rect; 3],
    pub column_offsets: [usize; 3],
    api: Arc<dyn TaskApi>,
    runtime: Handle,
    tx: UnboundedSender<ApiEvent>,
}

impl App {
    /// Creates the app and starts the initial fetches.
    pub fn new(
        api: Arc<dyn TaskApi>,
        runtime: Handle,
        controller: BoardController,
    ) -> (App, UnboundedReceiver<ApiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut app = App {
            controller,
            users: Vec::new(),
            view_mode: ViewMode::Board,
            input_mode: InputMode::Normal,
            selected: DragLocation::new(Column::Todo, 0),
            grab: None,
            mouse_source: None,
            form: None,
            pending_delete: None,
            banner: None,
            loading: false,
            table_focus: TableFocus::Tasks,
            users_state: TableState::default(),
            tasks_state: TableState::default(),
            column_areas: [Rect::default(); 3],
            column_offsets: [0; 3],
            api,
            runtime,
            tx,
        };
        app.refresh();
        (app, rx)
    }

    fn spawn<F>(&self, request: F)
    where
        F: Future<Output = ApiEvent> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            // The receiver is gone only when the UI has quit.
            let _ = tx.send(request.await);
        });
    }

    /// Re-fetches tasks and users.
    pub fn refresh(&mut self) {
        self.loading = true;
        let api = Arc::clone(&self.api);
        self.spawn(async move { ApiEvent::TasksLoaded(api.list_tasks().await) });
        self.refresh_users();
    }

    fn refresh_tasks(&mut self) {
        self.loading = true;
        let api = Arc::clone(&self.api);
        self.spawn(async move { ApiEvent::TasksLoaded(api.list_tasks().await) });
    }

    fn refresh_users(&mut self) {
        let api = Arc::clone(&self.api);
        self.spawn(async move { ApiEvent::UsersLoaded(api.list_users().await) });
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.controller
            .board()
            .column(self.selected.column)
            .get(self.selected.index)
    }

    pub fn user_name(&self, id: UserId) -> Option<&str> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.name.as_str())
    }

    /// Tasks in board order, as listed in the tables view.
    pub fn all_tasks(&self) -> Vec<&Task> {
        self.controller.board().iter().map(|(_, t)| t).collect()
    }

    fn clamp_selection(&mut self) {
        let len = self.controller.board().column(self.selected.column).len();
        self.selected.index = self.selected.index.min(len.saturating_sub(1));
        clamp_table(&mut self.users_state, self.users.len());
        clamp_table(&mut self.tasks_state, self.controller.board().len());
    }

    // Navigation

    pub fn move_up(&mut self) {
        match self.view_mode {
            ViewMode::Board => self.selected.index = self.selected.index.saturating_sub(1),
            ViewMode::Tables => self.focused_table().select_previous(),
        }
    }

    pub fn move_down(&mut self) {
        match self.view_mode {
            ViewMode::Board => {
                let len = self.controller.board().column(self.selected.column).len();
                if self.selected.index + 1 < len {
                    self.selected.index += 1;
                }
            }
            ViewMode::Tables => self.focused_table().select_next(),
        }
    }

    pub fn move_left(&mut self) {
        match self.view_mode {
            ViewMode::Board => {
                self.selected.column = self.selected.column.left();
                self.clamp_selection();
            }
            ViewMode::Tables => self.table_focus = TableFocus::Users,
        }
    }

    pub fn move_right(&mut self) {
        match self.view_mode {
            ViewMode::Board => {
                self.selected.column = self.selected.column.right();
                self.clamp_selection();
            }
            ViewMode::Tables => self.table_focus = TableFocus::Tasks,
        }
    }

    fn focused_table(&mut self) -> &mut TableState {
        match self.table_focus {
            TableFocus::Users => &mut self.users_state,
            TableFocus::Tasks => &mut self.tasks_state,
        }
    }

    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Board => ViewMode::Tables,
            ViewMode::Tables => ViewMode::Board,
        };
        self.clamp_selection();
    }

    // Dragging

    /// Applies a finished drag and, for a column change, sends the status update.
    pub fn drag_end(&mut self, drag: DragResult) {
        match self.controller.on_drag_end(drag) {
            Ok(DragOutcome::Unchanged) => {}
            Ok(DragOutcome::Reordered { column, to, .. }) => {
                self.selected = DragLocation::new(column, to);
            }
            Ok(DragOutcome::Moved(pending)) => {
                self.selected = pending.to;
                let api = Arc::clone(&self.api);
                self.spawn(async move {
                    let result = pending.confirm(api.as_ref()).await;
                    ApiEvent::MoveSettled(pending, result)
                });
            }
            Err(e) => warn!(error = %e, "ignoring drag"),
        }
    }

    pub fn start_grab(&mut self) {
        if self.view_mode != ViewMode::Board {
            return;
        }
        let Some(task) = self.selected_task().map(|t| t.id) else {
            return;
        };
        self.grab = Some(Grab {
            task,
            target: self.selected,
        });
        self.input_mode = InputMode::Grabbing;
    }

    /// Moves the grab target by one column (`dx`) or one row (`dy`).
    pub fn steer_grab(&mut self, dx: i8, dy: i8) {
        let Some(grab) = self.grab.as_mut() else {
            return;
        };
        let board = self.controller.board();
        let Some((source_column, _)) = board.locate(grab.task) else {
            return;
        };
        if dx < 0 {
            grab.target.column = grab.target.column.left();
        } else if dx > 0 {
            grab.target.column = grab.target.column.right();
        }
        // A card can land one past the end of a foreign column, but only on an
        // existing slot of its own.
        let len = board.column(grab.target.column).len();
        let max = if grab.target.column == source_column {
            len.saturating_sub(1)
        } else {
            len
        };
        grab.target.index = if dy < 0 {
            grab.target.index.saturating_sub(1)
        } else if dy > 0 {
            grab.target.index + 1
        } else {
            grab.target.index
        }
        .min(max);
    }

    pub fn drop_grab(&mut self) {
        if let Some(grab) = self.grab.take() {
            self.drag_held(grab.task, Some(grab.target));
        }
        self.input_mode = InputMode::Normal;
    }

    pub fn cancel_grab(&mut self) {
        self.grab = None;
        self.input_mode = InputMode::Normal;
    }

    /// Column and row under a screen position, from the last drawn layout.
    pub fn hit_test(&self, column: u16, row: u16) -> Option<DragLocation> {
        let pos = Position::new(column, row);
        Column::ALL.into_iter().find_map(|c| {
            let area = self.column_areas[c.position()];
            if !area.contains(pos) {
                return None;
            }
            let index = ((row - area.y) / CARD_HEIGHT) as usize + self.column_offsets[c.position()];
            Some(DragLocation::new(c, index))
        })
    }

    pub fn mouse_down(&mut self, column: u16, row: u16) {
        if self.view_mode != ViewMode::Board || self.input_mode != InputMode::Normal {
            return;
        }
        let Some(source) = self.hit_test(column, row) else {
            self.mouse_source = None;
            return;
        };
        self.mouse_source = self
            .controller
            .board()
            .column(source.column)
            .get(source.index)
            .map(|t| t.id);
        if self.mouse_source.is_some() {
            self.selected = source;
        }
    }

    pub fn mouse_up(&mut self, column: u16, row: u16) {
        let Some(task) = self.mouse_source.take() else {
            return;
        };
        let destination = self.hit_test(column, row);
        debug!(task_id = task, ?destination, "mouse drag finished");
        self.drag_held(task, destination);
    }

    /// Drops a held card from wherever it sits now. A card that left the
    /// board while held is not moved.
    fn drag_held(&mut self, task: TaskId, destination: Option<DragLocation>) {
        match self.controller.board().locate(task) {
            Some((column, index)) => {
                self.drag_end(DragResult::new(DragLocation::new(column, index), destination))
            }
            None => debug!(task_id = task, "held card is gone; drag cancelled"),
        }
    }

    // Forms

    pub fn start_new_task(&mut self) {
        let mut form = FormState::task(FormKind::NewTask, None);
        if let [only] = self.users.as_slice() {
            form.fields[0].value = only.id.to_string();
        }
        self.open_form(form);
    }

    pub fn start_edit_task(&mut self) {
        let Some(task) = self.selected_task().cloned() else {
            return;
        };
        self.open_form(FormState::task(FormKind::EditTask(task.id), Some(&task)));
    }

    pub fn start_register_user(&mut self) {
        self.open_form(FormState::user());
    }

    fn open_form(&mut self, form: FormState) {
        self.form = Some(form);
        self.input_mode = InputMode::Form;
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.input_mode = InputMode::Normal;
    }

    pub fn form_next_field(&mut self) {
        if let Some(form) = self.form.as_mut() {
            form.active = (form.active + 1) % form.fields.len();
        }
    }

    pub fn form_previous_field(&mut self) {
        if let Some(form) = self.form.as_mut() {
            form.active = (form.active + form.fields.len() - 1) % form.fields.len();
        }
    }

    pub fn form_input(&mut self, c: char) {
        if let Some(form) = self.form.as_mut() {
            form.active_field_mut().value.push(c);
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(form) = self.form.as_mut() {
            form.active_field_mut().value.pop();
        }
    }

    /// Cycles choice fields (user, priority) with the arrow keys.
    pub fn form_cycle(&mut self, forward: bool) {
        let users: Vec<String> = self.users.iter().map(|u| u.id.to_string()).collect();
        let priorities: Vec<String> = Priority::ALL.iter().map(|p| p.code().to_string()).collect();
        let Some(form) = self.form.as_mut() else {
            return;
        };
        let field = form.active_field_mut();
        let options = match field.key {
            validation::USER_ID => &users,
            validation::PRIORITY => &priorities,
            _ => return,
        };
        if options.is_empty() {
            return;
        }
        let current = options.iter().position(|o| o.eq_ignore_ascii_case(field.value.trim()));
        let next = match (current, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % options.len(),
            (Some(i), false) => (i + options.len() - 1) % options.len(),
        };
        field.value = options[next].clone();
    }

    /// Enter inside a form: next field, or submit on the last one.
    pub fn form_enter(&mut self) {
        let last = match self.form.as_ref() {
            Some(form) => form.active + 1 == form.fields.len(),
            None => return,
        };
        if last {
            self.submit_form();
        } else {
            self.form_next_field();
        }
    }

    /// Validates the open form and, when valid, sends it.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if form.submitting {
            return;
        }
        form.server_error = None;

        let api = Arc::clone(&self.api);
        let request: Result<Request, ValidationResult> = match form.kind {
            FormKind::NewTask => form
                .task_form()
                .to_new_task(Status::Todo)
                .map(move |body| -> Request {
                    Box::pin(async move { ApiEvent::TaskSaved(api.create_task(&body).await) })
                }),
            FormKind::EditTask(id) => form.task_form().to_patch().map(move |patch| -> Request {
                Box::pin(async move { ApiEvent::TaskSaved(api.update_task(id, &patch).await) })
            }),
            FormKind::NewUser => form
                .user_form()
                .into_new_user()
                .map(move |body| -> Request {
                    Box::pin(async move { ApiEvent::UserSaved(api.create_user(&body).await) })
                }),
        };

        match request {
            Ok(request) => {
                form.errors = ValidationResult::default();
                form.submitting = true;
                self.spawn(request);
            }
            Err(errors) => form.errors = errors,
        }
    }

    // Deletion

    pub fn request_delete(&mut self) {
        let target = match self.view_mode {
            ViewMode::Board => self.selected_task().map(|t| DeleteTarget::Task(t.id)),
            ViewMode::Tables => match self.table_focus {
                TableFocus::Users => self
                    .users_state
                    .selected()
                    .and_then(|i| self.users.get(i))
                    .map(|u| DeleteTarget::User(u.id)),
                TableFocus::Tasks => self
                    .tasks_state
                    .selected()
                    .and_then(|i| self.all_tasks().get(i).map(|t| t.id))
                    .map(DeleteTarget::Task),
            },
        };
        if let Some(target) = target {
            self.pending_delete = Some(target);
            self.input_mode = InputMode::ConfirmDelete;
        }
    }

    pub fn confirm_delete(&mut self) {
        self.input_mode = InputMode::Normal;
        let Some(target) = self.pending_delete.take() else {
            return;
        };
        let api = Arc::clone(&self.api);
        self.spawn(async move {
            let result = match target {
                DeleteTarget::Task(id) => api.delete_task(id).await,
                DeleteTarget::User(id) => api.delete_user(id).await,
            };
            ApiEvent::Deleted(target, result)
        });
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.input_mode = InputMode::Normal;
    }

    // Background results

    pub fn handle_event(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::TasksLoaded(result) => {
                self.loading = false;
                match result {
                    Ok(tasks) => self.controller.load(tasks),
                    Err(e) => self.banner = Some(e.user_message("buscar tarefas")),
                }
            }
            ApiEvent::UsersLoaded(result) => match result {
                Ok(users) => self.users = users,
                Err(e) => self.banner = Some(e.user_message("buscar usuários")),
            },
            ApiEvent::MoveSettled(pending, result) => {
                match self.controller.settle(&pending, result) {
                    Settlement::Confirmed(_) => {}
                    Settlement::RolledBack(e) | Settlement::LeftStale(e) => {
                        self.banner = Some(e.user_message("atualizar status"));
                    }
                }
            }
            ApiEvent::TaskSaved(result) => self.form_saved(result.map(|_| ()), "salvar a tarefa"),
            ApiEvent::UserSaved(result) => {
                let ok = result.is_ok();
                self.form_saved(result.map(|_| ()), "cadastrar usuário");
                if ok {
                    self.refresh_users();
                }
            }
            ApiEvent::Deleted(target, result) => match (target, result) {
                (DeleteTarget::Task(id), Ok(())) => {
                    self.controller.remove_task(id);
                    self.refresh_tasks();
                }
                (DeleteTarget::User(_), Ok(())) => self.refresh(),
                (DeleteTarget::Task(_), Err(e)) => {
                    self.banner = Some(e.user_message("excluir a tarefa"))
                }
                (DeleteTarget::User(_), Err(e)) => {
                    self.banner = Some(e.user_message("excluir o usuário"))
                }
            },
        }
        self.clamp_selection();
    }

    fn form_saved(&mut self, result: Result<(), ApiError>, action: &str) {
        match result {
            Ok(()) => {
                self.close_form();
                self.banner = None;
                self.refresh_tasks();
            }
            Err(e) => match self.form.as_mut() {
                Some(form) => {
                    form.submitting = false;
                    form.server_error = Some(e.user_message(action));
                }
                None => self.banner = Some(e.user_message(action)),
            },
        }
    }
}

fn clamp_table(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}
