use std::io;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::bridge::ApiEvent;
use crate::controller::DashboardController;
use crate::field::TextField;
use crate::keymap;
use crate::models::{Filter, TaskStatus};
use crate::view::{Focus, FormField};

pub fn run_tui(
    controller: &mut DashboardController,
    events: &mut UnboundedReceiver<ApiEvent>,
    tick_rate: Duration,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, controller, events, tick_rate);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        log::error!("Dashboard loop failed: {err:?}");
    }
    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    controller: &mut DashboardController,
    events: &mut UnboundedReceiver<ApiEvent>,
    tick_rate: Duration,
) -> Result<()> {
    loop {
        refresh(terminal, controller, events)?;

        // Wake up early when a deferred reload falls due before the next tick.
        let timeout = controller
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .map_or(tick_rate, |until| until.min(tick_rate));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(action) = keymap::action_for_key(controller.view(), key) {
                        controller.dispatch(action);
                    }
                }
            }
        }

        controller.tick(Instant::now());

        if controller.should_quit() {
            return Ok(());
        }
    }
}

/// Applies every backend result that has arrived, then draws.
fn refresh<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    controller: &mut DashboardController,
    events: &mut UnboundedReceiver<ApiEvent>,
) -> Result<()> {
    while let Ok(api_event) = events.try_recv() {
        controller.handle_event(api_event);
    }
    terminal.draw(|f| ui(f, controller))?;
    Ok(())
}

pub fn ui(f: &mut Frame, controller: &DashboardController) {
    let view = controller.view();
    let state = controller.state();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    let titles: Vec<Line> = Filter::ALL.iter().map(|filter| Line::from(filter.label())).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("SprintSync"))
        .select(state.filter.index())
        .style(Style::default().fg(Color::Cyan))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::Black),
        );
    f.render_widget(tabs, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
        .split(chunks[1]);

    render_tasks(f, controller, body[0]);
    render_ai_panel(f, controller, body[1]);

    let help = if view.modal_open() {
        "Tab: next field • Enter: save • Ctrl+S: save • Esc: cancel"
    } else {
        "n: new • a: AI title • g: draft • p: plan • c: use suggestion • s: status • d: delete • f: filter • r: reload • t: test • q: quit"
    };
    f.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );

    if view.modal_open() {
        render_create_modal(f, controller);
    }
    if let Some(confirm) = &view.confirm {
        let popup_area = centered_rect(50, 20, f.area());
        let block = Block::default()
            .title("Confirm")
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::DarkGray));
        let content = Paragraph::new(format!("{}\n\ny: yes • n: no", confirm.message))
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(Color::White));
        f.render_widget(Clear, popup_area);
        f.render_widget(content, popup_area);
    }

    render_toasts(f, controller);
}

fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Done => Color::Green,
        TaskStatus::InProgress => Color::Yellow,
        TaskStatus::Todo => Color::Blue,
        TaskStatus::Other => Color::White,
    }
}

fn render_tasks(f: &mut Frame, controller: &DashboardController, area: Rect) {
    let view = controller.view();
    let filter = controller.state().filter;
    let cards = view.visible_cards(filter);

    let items: Vec<ListItem> = cards
        .iter()
        .map(|task| {
            let mut lines = vec![Line::from(vec![
                Span::styled(format!("#{} ", task.id), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{} ", task.title), Style::default().fg(Color::White)),
                Span::styled(
                    format!("[{}]", task.status.as_str()),
                    Style::default().fg(status_color(task.status)),
                ),
            ])];
            if let Some(first) = task.description.lines().find(|l| !l.trim().is_empty()) {
                lines.push(Line::from(Span::styled(
                    format!("   {first}"),
                    Style::default().fg(Color::Gray),
                )));
            }
            ListItem::new(lines)
        })
        .collect();

    let title = format!("Tasks ({})", cards.len());
    let border_style = if view.focus == Focus::Board && !view.modal_open() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    if items.is_empty() {
        let empty = Paragraph::new("No tasks yet. Press n to create one.")
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(border_style),
            )
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, area);
        return;
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style),
        )
        .highlight_style(
            Style::default()
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ");

    let mut list_state = ListState::default();
    list_state.select(view.selected);
    f.render_stateful_widget(list, area, &mut list_state);
}

fn render_ai_panel(f: &mut Frame, controller: &DashboardController, area: Rect) {
    let view = controller.view();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let title_focused = view.focus == Focus::AiTitle && !view.modal_open();
    let input = Paragraph::new(field_lines(&view.ai_title, title_focused)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("AI Task Title")
            .border_style(focus_style(title_focused)),
    );
    f.render_widget(input, chunks[0]);

    let panel = &view.ai_response;
    let mut lines: Vec<Line> = Vec::new();
    if !panel.hidden {
        lines.extend(panel.text.lines().map(|l| Line::from(l.to_string())));
        if let Some(action) = &panel.action {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("[c] {}", action.label),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )));
        }
    }
    let response = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("AI Suggestion"))
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(Color::White));
    f.render_widget(response, chunks[1]);
}

fn render_create_modal(f: &mut Frame, controller: &DashboardController) {
    let view = controller.view();
    let area = centered_rect(70, 70, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title("Create Task")
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(inner);

    let focused = |field: FormField| view.focus == Focus::Form(field);

    let title = Paragraph::new(field_lines(&view.form.title, focused(FormField::Title))).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Title")
            .border_style(focus_style(focused(FormField::Title))),
    );
    f.render_widget(title, chunks[0]);

    let description = Paragraph::new(field_lines(
        &view.form.description,
        focused(FormField::Description),
    ))
    .wrap(Wrap { trim: false })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Description")
            .border_style(focus_style(focused(FormField::Description))),
    );
    f.render_widget(description, chunks[1]);

    let status_spans: Vec<Span> = TaskStatus::SELECTABLE
        .iter()
        .flat_map(|status| {
            let style = if *status == view.form.status {
                Style::default()
                    .fg(Color::Black)
                    .bg(status_color(*status))
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(status_color(*status))
            };
            [Span::styled(format!(" {} ", status.as_str()), style), Span::raw(" ")]
        })
        .collect();
    let status = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Status (←/→)")
            .border_style(focus_style(focused(FormField::Status))),
    );
    f.render_widget(status, chunks[2]);
}

fn render_toasts(f: &mut Frame, controller: &DashboardController) {
    let toasts = &controller.view().toasts;
    if toasts.is_empty() {
        return;
    }
    let area = f.area();
    let width = area.width.min(50);
    let mut y = area.y + 1;

    for toast in toasts.iter() {
        if y + 3 > area.bottom() {
            break;
        }
        let rect = Rect::new(area.right().saturating_sub(width + 1), y, width, 3);
        let widget = Paragraph::new(toast.message.as_str())
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::White).bg(toast.kind.color()));
        f.render_widget(Clear, rect);
        f.render_widget(widget, rect);
        y += 3;
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

/// Renders a field's lines, highlighting the cursor cell when focused.
fn field_lines(field: &TextField, focused: bool) -> Vec<Line<'static>> {
    field
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if !focused || i != field.cursor_row {
                return Line::from(line.clone());
            }
            let chars: Vec<char> = line.chars().collect();
            let col = field.cursor_col.min(chars.len());
            let before: String = chars[..col].iter().collect();
            let (cursor, after) = match chars.get(col) {
                Some(c) => (c.to_string(), chars[col + 1..].iter().collect::<String>()),
                None => (" ".to_string(), String::new()),
            };
            Line::from(vec![
                Span::raw(before),
                Span::styled(cursor, Style::default().bg(Color::Cyan).fg(Color::Black)),
                Span::raw(after),
            ])
        })
        .collect()
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
