pub mod app;
pub mod ui;

use std::{io, sync::Arc, time::Duration};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::{runtime::Handle, sync::mpsc::UnboundedReceiver};
use tracing::info;

use crate::api::TaskApi;
use crate::drag::BoardController;
use app::{ApiEvent, App, InputMode};
use ui::ui;

const TICK: Duration = Duration::from_millis(100);

/// Runs the interactive board until the user quits.
///
/// Network requests run on `runtime`; this thread only draws and handles input.
pub fn run_tui(api: Arc<dyn TaskApi>, runtime: Handle, controller: BoardController) -> io::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (mut app, mut events) = App::new(api, runtime, controller);
    info!("interactive board started");

    let res = run_app(&mut terminal, &mut app, &mut events);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    events: &mut UnboundedReceiver<ApiEvent>,
) -> io::Result<()> {
    loop {
        while let Ok(ev) = events.try_recv() {
            app.handle_event(ev);
        }

        terminal.draw(|f| ui(f, app))?;

        if !event::poll(TICK)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match app.input_mode {
                InputMode::Normal => match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Down | KeyCode::Char('j') => app.move_down(),
                    KeyCode::Up | KeyCode::Char('k') => app.move_up(),
                    KeyCode::Left | KeyCode::Char('h') => app.move_left(),
                    KeyCode::Right | KeyCode::Char('l') => app.move_right(),
                    KeyCode::Char(' ') => app.start_grab(),
                    KeyCode::Char('a') => app.start_new_task(),
                    KeyCode::Char('e') | KeyCode::Enter => app.start_edit_task(),
                    KeyCode::Char('u') => app.start_register_user(),
                    KeyCode::Char('d') | KeyCode::Delete => app.request_delete(),
                    KeyCode::Char('r') => app.refresh(),
                    KeyCode::Char('v') => app.toggle_view(),
                    KeyCode::Esc => app.banner = None,
                    _ => {}
                },
                InputMode::Grabbing => match key.code {
                    KeyCode::Left => app.steer_grab(-1, 0),
                    KeyCode::Right => app.steer_grab(1, 0),
                    KeyCode::Up => app.steer_grab(0, -1),
                    KeyCode::Down => app.steer_grab(0, 1),
                    KeyCode::Char(' ') | KeyCode::Enter => app.drop_grab(),
                    KeyCode::Esc => app.cancel_grab(),
                    _ => {}
                },
                InputMode::Form => match key.code {
                    KeyCode::Esc => app.close_form(),
                    KeyCode::Enter => app.form_enter(),
                    KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => app.submit_form(),
                    KeyCode::Tab | KeyCode::Down => app.form_next_field(),
                    KeyCode::BackTab | KeyCode::Up => app.form_previous_field(),
                    KeyCode::Left => app.form_cycle(false),
                    KeyCode::Right => app.form_cycle(true),
                    KeyCode::Char(c) => app.form_input(c),
                    KeyCode::Backspace => app.form_backspace(),
                    _ => {}
                },
                InputMode::ConfirmDelete => match key.code {
                    KeyCode::Char('y') | KeyCode::Char('s') => app.confirm_delete(),
                    KeyCode::Char('n') | KeyCode::Esc => app.cancel_delete(),
                    _ => {}
                },
            },
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => app.mouse_down(mouse.column, mouse.row),
                MouseEventKind::Up(MouseButton::Left) => app.mouse_up(mouse.column, mouse.row),
                MouseEventKind::ScrollDown => app.move_down(),
                MouseEventKind::ScrollUp => app.move_up(),
                _ => {}
            },
            _ => {}
        }
    }
}
