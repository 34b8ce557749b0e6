mod common;

use std::sync::Arc;

use ratatui::layout::Rect;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedReceiver;

use boardust::board::Column;
use boardust::drag::{BoardController, FailurePolicy};
use boardust::models::Status;
use boardust::tui::app::{ApiEvent, App, InputMode};
use common::{task, MemoryApi};

/// Builds an app over `api` and applies the initial task and user fetches.
fn start(
    runtime: &Runtime,
    api: Arc<MemoryApi>,
    policy: FailurePolicy,
) -> (App, UnboundedReceiver<ApiEvent>) {
    let (mut app, mut events) = App::new(api, runtime.handle().clone(), BoardController::new(policy));
    for _ in 0..2 {
        let event = events.blocking_recv().unwrap();
        app.handle_event(event);
    }
    assert!(!app.loading);
    (app, events)
}

#[test]
fn test_keyboard_drag_is_confirmed() {
    let runtime = Runtime::new().unwrap();
    let api = Arc::new(MemoryApi::with_tasks(vec![task(1, Status::Todo), task(2, Status::Todo)]));
    let (mut app, mut events) = start(&runtime, api.clone(), FailurePolicy::Rollback);

    app.start_grab();
    assert_eq!(app.input_mode, InputMode::Grabbing);
    app.steer_grab(1, 0);
    app.steer_grab(0, 1);
    app.drop_grab();

    assert_eq!(app.input_mode, InputMode::Normal);
    assert_eq!(app.controller.board().locate(1), Some((Column::Doing, 0)));

    let event = events.blocking_recv().unwrap();
    assert!(matches!(event, ApiEvent::MoveSettled(..)));
    app.handle_event(event);

    assert_eq!(api.task(1).unwrap().status, Status::Doing);
    assert!(app.banner.is_none());
}

#[test]
fn test_refused_drag_rolls_back_and_shows_banner() {
    let runtime = Runtime::new().unwrap();
    let api = Arc::new(
        MemoryApi::with_tasks(vec![task(1, Status::Todo), task(2, Status::Doing)]).failing_updates(),
    );
    let (mut app, mut events) = start(&runtime, api, FailurePolicy::Rollback);

    app.start_grab();
    app.steer_grab(1, 0);
    app.drop_grab();
    assert_eq!(app.controller.board().locate(1), Some((Column::Doing, 0)));

    let event = events.blocking_recv().unwrap();
    app.handle_event(event);

    assert_eq!(app.controller.board().locate(1), Some((Column::Todo, 0)));
    assert_eq!(
        app.banner.as_deref(),
        Some("Erro ao atualizar status: Erro desconhecido.")
    );
}

#[test]
fn test_held_card_follows_background_changes() {
    let runtime = Runtime::new().unwrap();
    let api = Arc::new(
        MemoryApi::with_tasks(vec![task(1, Status::Todo), task(2, Status::Todo)]).failing_updates(),
    );
    let (mut app, mut events) = start(&runtime, api.clone(), FailurePolicy::Rollback);

    app.start_grab();
    app.steer_grab(1, 0);
    app.drop_grab();
    assert_eq!(app.controller.board().locate(1), Some((Column::Doing, 0)));

    // Pick up task 2 and carry it to Done while the refusal for task 1 is in flight.
    app.move_left();
    app.start_grab();
    app.steer_grab(1, 0);
    app.steer_grab(1, 0);

    let event = events.blocking_recv().unwrap();
    app.handle_event(event);
    assert_eq!(app.controller.board().locate(1), Some((Column::Todo, 0)));
    assert_eq!(app.controller.board().locate(2), Some((Column::Todo, 1)));

    app.drop_grab();

    let done: Vec<u64> = app
        .controller
        .board()
        .column(Column::Done)
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(done, vec![2]);
    assert_eq!(app.controller.board().locate(1), Some((Column::Todo, 0)));

    let event = events.blocking_recv().unwrap();
    app.handle_event(event);
    assert_eq!(api.patches().last().unwrap().0, 2);
}

#[test]
fn test_held_card_deleted_elsewhere_cancels_drop() {
    let runtime = Runtime::new().unwrap();
    let api = Arc::new(MemoryApi::with_tasks(vec![task(1, Status::Todo)]));
    let (mut app, _events) = start(&runtime, api.clone(), FailurePolicy::Rollback);

    app.start_grab();
    app.steer_grab(1, 0);
    app.controller.load(Vec::new());
    app.drop_grab();

    assert_eq!(app.input_mode, InputMode::Normal);
    assert!(app.controller.board().is_empty());
    assert!(api.patches().is_empty());
}

#[test]
fn test_mouse_drag_uses_drawn_columns() {
    let runtime = Runtime::new().unwrap();
    let api = Arc::new(MemoryApi::with_tasks(vec![
        task(1, Status::Todo),
        task(2, Status::Todo),
        task(3, Status::Done),
    ]));
    let (mut app, mut events) = start(&runtime, api.clone(), FailurePolicy::Rollback);
    app.column_areas = [
        Rect::new(1, 1, 20, 10),
        Rect::new(23, 1, 20, 10),
        Rect::new(45, 1, 20, 10),
    ];

    // Second card of the first column, released on top of the last column.
    app.mouse_down(5, 3);
    app.mouse_up(50, 1);

    let done: Vec<u64> = app
        .controller
        .board()
        .column(Column::Done)
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(done, vec![2, 3]);

    let event = events.blocking_recv().unwrap();
    app.handle_event(event);
    assert_eq!(api.task(2).unwrap().status, Status::Done);
}

#[test]
fn test_mouse_release_outside_columns_changes_nothing() {
    let runtime = Runtime::new().unwrap();
    let api = Arc::new(MemoryApi::with_tasks(vec![task(1, Status::Todo)]));
    let (mut app, _events) = start(&runtime, api.clone(), FailurePolicy::Rollback);
    app.column_areas = [
        Rect::new(1, 1, 20, 10),
        Rect::new(23, 1, 20, 10),
        Rect::new(45, 1, 20, 10),
    ];
    let before = app.controller.board().clone();

    app.mouse_down(5, 1);
    app.mouse_up(5, 30);

    assert_eq!(app.controller.board(), &before);
    assert!(api.patches().is_empty());
}

#[test]
fn test_task_form_shows_all_errors_then_saves() {
    let runtime = Runtime::new().unwrap();
    let api = Arc::new(MemoryApi::new());
    let (mut app, mut events) = start(&runtime, api.clone(), FailurePolicy::Rollback);

    app.start_new_task();
    app.submit_form();
    let form = app.form.as_ref().unwrap();
    assert_eq!(form.errors.field_errors().len(), 4);
    assert!(!form.submitting);

    for (i, text) in ["7", "Arrumar impressora", "TI", "high"].iter().enumerate() {
        if i > 0 {
            app.form_enter();
        }
        text.chars().for_each(|c| app.form_input(c));
    }
    app.form_enter();
    assert!(app.form.as_ref().unwrap().submitting);

    // Saved, then the task list is fetched again.
    for _ in 0..2 {
        let event = events.blocking_recv().unwrap();
        app.handle_event(event);
    }

    assert!(app.form.is_none());
    assert_eq!(app.input_mode, InputMode::Normal);
    let todo = app.controller.board().column(Column::Todo);
    assert_eq!(todo.len(), 1);
    assert_eq!(todo[0].description, "Arrumar impressora");
    assert_eq!(todo[0].user, 7);
}

#[test]
fn test_delete_requires_confirmation() {
    let runtime = Runtime::new().unwrap();
    let api = Arc::new(MemoryApi::with_tasks(vec![task(1, Status::Todo)]));
    let (mut app, mut events) = start(&runtime, api.clone(), FailurePolicy::Rollback);

    app.request_delete();
    assert_eq!(app.input_mode, InputMode::ConfirmDelete);
    app.cancel_delete();
    assert!(api.task(1).is_some());

    app.request_delete();
    app.confirm_delete();
    for _ in 0..2 {
        let event = events.blocking_recv().unwrap();
        app.handle_event(event);
    }

    assert!(api.task(1).is_none());
    assert!(app.controller.board().is_empty());
}
