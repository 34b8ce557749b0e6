mod common;

use boardust::board::{Board, Column};
use boardust::drag::{
    BoardController, DragLocation, DragOutcome, DragResult, FailurePolicy, PendingMove, Settlement,
};
use boardust::error::ApiError;
use boardust::models::{Status, TaskPatch};
use common::{task, MemoryApi};

fn ids(board: &Board, column: Column) -> Vec<u64> {
    board.column(column).iter().map(|t| t.id).collect()
}

fn sample_tasks() -> Vec<boardust::models::Task> {
    vec![
        task(1, Status::Todo),
        task(3, Status::Todo),
        task(5, Status::Todo),
        task(8, Status::Doing),
        task(9, Status::Done),
    ]
}

fn drag_to_doing() -> DragResult {
    DragResult::new(
        DragLocation::new(Column::Todo, 2),
        Some(DragLocation::new(Column::Doing, 0)),
    )
}

fn refused() -> ApiError {
    ApiError::Server {
        status: 500,
        message: "boom".into(),
    }
}

#[tokio::test]
async fn test_cross_column_drag_is_confirmed() {
    let api = MemoryApi::with_tasks(sample_tasks());
    let mut controller = BoardController::new(FailurePolicy::Rollback);
    controller.load(sample_tasks());

    let (outcome, settlement) = controller
        .drag_and_confirm(&api, drag_to_doing())
        .await
        .unwrap();

    assert!(matches!(outcome, DragOutcome::Moved(_)));
    assert!(matches!(settlement, Some(Settlement::Confirmed(ref t)) if t.status == Status::Doing));
    assert_eq!(api.patches(), vec![(5, TaskPatch::status(Status::Doing))]);

    let board = controller.board();
    assert_eq!(ids(board, Column::Todo), vec![1, 3]);
    assert_eq!(ids(board, Column::Doing), vec![5, 8]);
    assert_eq!(ids(board, Column::Done), vec![9]);
    assert_eq!(board.get(5).unwrap().status, Status::Doing);
}

#[tokio::test]
async fn test_reorder_makes_no_remote_call() {
    let api = MemoryApi::with_tasks(sample_tasks());
    let mut controller = BoardController::new(FailurePolicy::Rollback);
    controller.load(sample_tasks());

    let (outcome, settlement) = controller
        .drag_and_confirm(
            &api,
            DragResult::new(
                DragLocation::new(Column::Todo, 0),
                Some(DragLocation::new(Column::Todo, 1)),
            ),
        )
        .await
        .unwrap();

    assert!(matches!(outcome, DragOutcome::Reordered { .. }));
    assert!(settlement.is_none());
    assert!(api.patches().is_empty());
    assert_eq!(ids(controller.board(), Column::Todo), vec![3, 1, 5]);
}

#[tokio::test]
async fn test_failed_confirmation_rolls_back() {
    let api = MemoryApi::with_tasks(sample_tasks()).failing_updates();
    let mut controller = BoardController::new(FailurePolicy::Rollback);
    controller.load(sample_tasks());
    let before = controller.board().clone();

    let (_, settlement) = controller
        .drag_and_confirm(&api, drag_to_doing())
        .await
        .unwrap();

    assert!(matches!(settlement, Some(Settlement::RolledBack(_))));
    assert_eq!(controller.board(), &before);
}

#[tokio::test]
async fn test_failed_confirmation_can_leave_stale_state() {
    let api = MemoryApi::with_tasks(sample_tasks()).failing_updates();
    let mut controller = BoardController::new(FailurePolicy::LeaveStale);
    controller.load(sample_tasks());

    let (_, settlement) = controller
        .drag_and_confirm(&api, drag_to_doing())
        .await
        .unwrap();

    let settlement = settlement.unwrap();
    assert!(matches!(settlement, Settlement::LeftStale(_)));
    assert!(settlement.error().is_some());
    assert_eq!(ids(controller.board(), Column::Doing), vec![5, 8]);
    assert_eq!(api.task(5).unwrap().status, Status::Todo);
}

#[test]
fn test_confirmed_record_replaces_local_copy() {
    let mut controller = BoardController::new(FailurePolicy::Rollback);
    controller.load(sample_tasks());

    let pending = match controller.on_drag_end(drag_to_doing()).unwrap() {
        DragOutcome::Moved(p) => p,
        other => panic!("expected a move, got {:?}", other),
    };
    let mut server = task(5, Status::Doing);
    server.description = "Atualizada no servidor".into();

    controller.settle(&pending, Ok(server));

    let local = controller.board().get(5).unwrap();
    assert_eq!(local.description, "Atualizada no servidor");
    assert_eq!(controller.board().locate(5), Some((Column::Doing, 0)));
}

#[test]
fn test_server_status_wins_when_it_differs() {
    let mut controller = BoardController::new(FailurePolicy::Rollback);
    controller.load(sample_tasks());

    let pending = match controller.on_drag_end(drag_to_doing()).unwrap() {
        DragOutcome::Moved(p) => p,
        other => panic!("expected a move, got {:?}", other),
    };

    controller.settle(&pending, Ok(task(5, Status::Done)));

    assert_eq!(ids(controller.board(), Column::Doing), vec![8]);
    assert_eq!(ids(controller.board(), Column::Done), vec![9, 5]);
}

#[test]
fn test_confirmation_after_reload_rehomes_task() {
    let mut controller = BoardController::new(FailurePolicy::Rollback);
    controller.load(sample_tasks());

    let pending = match controller.on_drag_end(drag_to_doing()).unwrap() {
        DragOutcome::Moved(p) => p,
        other => panic!("expected a move, got {:?}", other),
    };
    // A refetch answered before the update was applied on the server.
    controller.load(sample_tasks());
    assert_eq!(controller.board().locate(5), Some((Column::Todo, 2)));

    let settlement = controller.settle(&pending, Ok(task(5, Status::Doing)));

    assert!(matches!(settlement, Settlement::Confirmed(_)));
    let board = controller.board();
    assert_eq!(board.locate(5), Some((Column::Doing, 0)));
    assert_eq!(ids(board, Column::Todo), vec![1, 3]);
    assert_eq!(board.get(5).unwrap().status, Status::Doing);
}

#[test]
fn test_confirmation_keeps_later_local_move() {
    let mut controller = BoardController::new(FailurePolicy::Rollback);
    controller.load(sample_tasks());

    let pending = match controller.on_drag_end(drag_to_doing()).unwrap() {
        DragOutcome::Moved(p) => p,
        other => panic!("expected a move, got {:?}", other),
    };
    let _second = controller
        .on_drag_end(DragResult::new(
            DragLocation::new(Column::Doing, 0),
            Some(DragLocation::new(Column::Done, 0)),
        ))
        .unwrap();

    controller.settle(&pending, Ok(task(5, Status::Doing)));

    assert_eq!(controller.board().locate(5), Some((Column::Done, 0)));
}

#[test]
fn test_concurrent_moves_settle_independently() {
    let mut controller = BoardController::new(FailurePolicy::Rollback);
    controller.load(sample_tasks());

    let first = match controller.on_drag_end(drag_to_doing()).unwrap() {
        DragOutcome::Moved(p) => p,
        other => panic!("expected a move, got {:?}", other),
    };
    let second = match controller
        .on_drag_end(DragResult::new(
            DragLocation::new(Column::Todo, 0),
            Some(DragLocation::new(Column::Done, 1)),
        ))
        .unwrap()
    {
        DragOutcome::Moved(p) => p,
        other => panic!("expected a move, got {:?}", other),
    };

    // Second answer arrives first and fails; the first one then succeeds.
    controller.settle(&second, Err(refused()));
    controller.settle(&first, Ok(task(5, Status::Doing)));

    let board = controller.board();
    assert_eq!(ids(board, Column::Todo), vec![1, 3]);
    assert_eq!(ids(board, Column::Doing), vec![5, 8]);
    assert_eq!(ids(board, Column::Done), vec![9]);
}

#[test]
fn test_rollback_after_task_removed_is_noop() {
    let mut controller = BoardController::new(FailurePolicy::Rollback);
    controller.load(sample_tasks());

    let pending: PendingMove = match controller.on_drag_end(drag_to_doing()).unwrap() {
        DragOutcome::Moved(p) => p,
        other => panic!("expected a move, got {:?}", other),
    };
    controller.remove_task(5);

    let settlement = controller.settle(&pending, Err(refused()));

    assert!(matches!(settlement, Settlement::RolledBack(_)));
    assert!(controller.board().get(5).is_none());
    assert_eq!(controller.board().len(), 4);
}
