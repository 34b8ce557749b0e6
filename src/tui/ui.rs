use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::board::Column;
use crate::models::{Priority, Task};
use super::app::{App, DeleteTarget, InputMode, TableFocus, ViewMode, CARD_HEIGHT};

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Green,
        Priority::Medium => Color::Yellow,
        Priority::High => Color::Red,
    }
}

fn column_color(column: Column) -> Color {
    match column {
        Column::Todo => Color::Blue,
        Column::Doing => Color::Yellow,
        Column::Done => Color::Green,
    }
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if app.banner.is_some() { 3 } else { 0 }),
            Constraint::Min(0),    // Board or tables
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    if let Some(banner) = &app.banner {
        let alert = Paragraph::new(banner.as_str())
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL).title("Erro"));
        f.render_widget(alert, chunks[0]);
    }

    match app.view_mode {
        ViewMode::Board => draw_board(f, app, chunks[1]),
        ViewMode::Tables => draw_tables(f, app, chunks[1]),
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Board => "q: Quit | ←→↑↓: Select | Space: Grab | mouse: Drag | a: New task | e: Edit | u: New user | d: Del | r: Refresh | v: Tables",
            ViewMode::Tables => "q: Quit | ←→: Users/Tasks | ↑↓: Select | d: Del | u: New user | a: New task | r: Refresh | v: Board",
        },
        InputMode::Grabbing => "←→↑↓: Choose destination | Space/Enter: Drop | Esc: Cancel",
        InputMode::Form => "Tab/Enter: Next field | ←→: Choose user/priority | Enter on last field: Save | Esc: Cancel",
        InputMode::ConfirmDelete => "y: Confirm | n/Esc: Cancel",
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[2]);

    match app.input_mode {
        InputMode::Form => draw_form(f, app),
        InputMode::ConfirmDelete => draw_confirm(f, app),
        _ => {}
    }
}

fn card(task: &Task, owner: Option<&str>, width: u16) -> ListItem<'static> {
    let owner = owner.map(str::to_string).unwrap_or_else(|| task.owner_label());
    let mut description = task.description.clone();
    let max = width.saturating_sub(2) as usize;
    if description.chars().count() > max && max > 1 {
        description = description.chars().take(max - 1).collect::<String>() + "…";
    }
    ListItem::new(vec![
        Line::from(Span::styled(
            description,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("● ", Style::default().fg(priority_color(task.priority))),
            Span::styled(task.sector_name.clone(), Style::default().fg(Color::Gray)),
            Span::raw(format!(" · {}", owner)),
        ]),
    ])
}

fn draw_board(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(area);

    for column in Column::ALL {
        let i = column.position();
        let tasks = app.controller.board().column(column);
        let task_count = tasks.len();
        let title = if app.loading {
            format!("{} ({}) …", column.title(), task_count)
        } else {
            format!("{} ({})", column.title(), task_count)
        };

        let grab_target = app
            .grab
            .filter(|g| g.target.column == column)
            .map(|g| g.target.index);
        let focused = app.selected.column == column;

        let mut items: Vec<ListItem> = tasks
            .iter()
            .map(|t| card(t, app.user_name(t.user), chunks[i].width))
            .collect();
        if let Some(index) = grab_target {
            // Drop slot marker where the grabbed card would land.
            let marker = ListItem::new(vec![
                Line::from(Span::styled("── soltar aqui ──", Style::default().fg(Color::Cyan))),
                Line::from(""),
            ]);
            items.insert(index.min(items.len()), marker);
        }

        let block = Block::default()
            .title(Span::styled(title, Style::default().fg(column_color(column)).add_modifier(Modifier::BOLD)))
            .borders(Borders::ALL)
            .border_style(if focused {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            });
        app.column_areas[i] = block.inner(chunks[i]);

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray));

        let mut state = ListState::default().with_offset(app.column_offsets[i]);
        if focused && grab_target.is_none() && task_count > 0 {
            state.select(Some(app.selected.index));
        }
        f.render_stateful_widget(list, chunks[i], &mut state);
        app.column_offsets[i] = state.offset();
    }

    // Keep the hit test in card units.
    for area in app.column_areas.iter_mut() {
        area.height -= area.height % CARD_HEIGHT;
    }
}

fn draw_tables(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    let focus_style = |focus: TableFocus| {
        if app.table_focus == focus {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        }
    };

    let user_rows: Vec<Row> = app
        .users
        .iter()
        .map(|u| Row::new(vec![
            Cell::from(u.id.to_string()),
            Cell::from(u.name.clone()),
            Cell::from(u.email.clone()),
        ]))
        .collect();
    let users = Table::new(user_rows, [Constraint::Length(4), Constraint::Min(10), Constraint::Min(16)])
        .header(Row::new(vec!["ID", "Nome", "E-mail"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title("Usuários").border_style(focus_style(TableFocus::Users)))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    let task_rows: Vec<Row> = app
        .all_tasks()
        .into_iter()
        .map(|t| {
            let owner = app.user_name(t.user).map(str::to_string).unwrap_or_else(|| t.owner_label());
            Row::new(vec![
                Cell::from(t.id.to_string()),
                Cell::from(owner),
                Cell::from(t.description.clone()),
                Cell::from(t.sector_name.clone()),
                Cell::from(t.priority.label()).style(Style::default().fg(priority_color(t.priority))),
                Cell::from(Column::for_status(t.status).title()),
                Cell::from(t.created_at.format("%d/%m/%Y %H:%M").to_string()),
            ])
        })
        .collect();
    let tasks = Table::new(task_rows, [
            Constraint::Length(4),
            Constraint::Length(12),
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(16),
        ])
        .header(Row::new(vec!["ID", "Usuário", "Descrição", "Setor", "Prio", "Status", "Data"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title("Tarefas").border_style(focus_style(TableFocus::Tasks)))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(users, chunks[0], &mut app.users_state);
    f.render_stateful_widget(tasks, chunks[1], &mut app.tasks_state);
}

fn draw_form(f: &mut Frame, app: &App) {
    let Some(form) = &app.form else { return };

    let mut lines: Vec<Line> = Vec::new();
    for (i, field) in form.fields.iter().enumerate() {
        let active = i == form.active;
        let mut value = field.value.clone();
        if field.key == crate::validation::USER_ID {
            if let Some(name) = field.value.trim().parse().ok().and_then(|id| app.user_name(id)) {
                value = format!("{} ({})", value, name);
            }
        }
        if active {
            value.push('▏');
        }
        lines.push(Line::from(vec![
            Span::styled(
                format!("{:<11}", field.label),
                if active {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                },
            ),
            Span::styled(value, Style::default().fg(Color::Yellow)),
        ]));
        if let Some(message) = form.errors.error(field.key) {
            lines.push(Line::from(Span::styled(
                format!("           {}", message),
                Style::default().fg(Color::Red),
            )));
        }
    }
    if let Some(message) = &form.server_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))));
    }
    if form.submitting {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Salvando…", Style::default().fg(Color::Gray))));
    }

    let height = lines.len() as u16 + 2;
    let area = centered_rect(60, height, f.area());
    f.render_widget(Clear, area); // Clear the area first

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(form.title()));
    f.render_widget(body, area);
}

fn draw_confirm(f: &mut Frame, app: &App) {
    let question = match app.pending_delete {
        Some(DeleteTarget::Task(_)) => "Deseja realmente excluir esta tarefa? (y/n)",
        Some(DeleteTarget::User(_)) => "Deseja realmente excluir este usuário? (y/n)",
        None => return,
    };
    let area = centered_rect(50, 3, f.area());
    f.render_widget(Clear, area);
    let body = Paragraph::new(question)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("Excluir"));
    f.render_widget(body, area);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let height = height.min(r.height);
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((r.height - height) / 2),
            Constraint::Length(height),
            Constraint::Length((r.height - height) / 2),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
