use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, Paragraph, Row as TableRow, Table, TableState, Wrap,
};
use ratatui::Frame;

pub mod layout;

use crate::app::{App, InputMode};
use crate::core::{NotifyLevel, PromptKind};
use crate::domain::{short_display, PageView, Row};
use crate::infrastructure::ethereum::NATIVE_SYMBOL;

use layout::centered_rect;

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    draw_stats(f, areas.stats, app);
    draw_table(f, areas.table, app);
    draw_pager(f, areas.pager, app);
    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.input_mode == InputMode::Confirm {
        draw_confirm_popup(f, areas.size, app);
    }
    if app.help_open {
        draw_help_popup(f, areas.size);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let title = Line::from(vec![Span::styled(
        app.ctx.title().to_string(),
        Style::default()
            .fg(Color::LightCyan)
            .add_modifier(Modifier::BOLD),
    )]);
    let left = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let (dot, dot_color) = if app.connected {
        ("●", Color::LightGreen)
    } else {
        ("○", Color::DarkGray)
    };
    let right_line = Line::from(vec![
        Span::styled(format!("{dot} "), Style::default().fg(dot_color)),
        Span::styled("RPC ", Style::default().fg(Color::DarkGray)),
        Span::raw(app.endpoint.clone()),
    ]);
    let right = Paragraph::new(right_line)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn draw_stats(f: &mut Frame, area: Rect, app: &App) {
    let line = Line::from(vec![
        Span::styled("Wallets ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}   ", app.stats.wallet_count)),
        Span::styled("Total ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}   ", app.stats.balance_display(NATIVE_SYMBOL))),
        Span::styled("Value ", Style::default().fg(Color::DarkGray)),
        Span::raw(app.fiat_display()),
    ]);
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .title("Stats (s to refresh)")
            .borders(Borders::ALL),
    );
    f.render_widget(paragraph, area);
}

fn draw_table(f: &mut Frame, area: Rect, app: &App) {
    let view = app.ctx.view();
    let visible = view.visible(app.ctx.rows().rows());

    let mut header_cells = vec!["#", "Label", "Address", "Balance", "Tx count"];
    if app.select_mode {
        header_cells.insert(0, "");
    }
    let header = TableRow::new(header_cells).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<TableRow> = visible
        .iter()
        .enumerate()
        .map(|(offset, row)| table_row(row, view.range.start + offset, app.select_mode))
        .collect();

    let mut widths = vec![
        Constraint::Length(5),
        Constraint::Length(8),
        Constraint::Min(16),
        Constraint::Length(16),
        Constraint::Length(12),
    ];
    if app.select_mode {
        widths.insert(0, Constraint::Length(3));
    }

    let title = if app.select_mode {
        format!("Rows ({} selected)", app.ctx.rows().selected_count())
    } else {
        "Rows".to_string()
    };
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if view.range.contains(&app.cursor) {
        state.select(Some(app.cursor - view.range.start));
    }
    f.render_stateful_widget(table, area, &mut state);
}

fn table_row(row: &Row, index: usize, select_mode: bool) -> TableRow<'static> {
    let address = match (&row.rejected_input, &row.address) {
        (Some(rejected), _) => {
            Cell::from(rejected.clone()).style(Style::default().fg(Color::LightRed))
        }
        (None, Some(address)) => Cell::from(short_display(address)),
        (None, None) => {
            Cell::from("enter address").style(Style::default().fg(Color::DarkGray))
        }
    };
    let figure_style = |text: &str| match text {
        "Failed" => Style::default().fg(Color::LightRed),
        "loading..." => Style::default().fg(Color::LightYellow),
        _ => Style::default(),
    };
    let balance = row.balance_display().to_string();
    let tx_count = row.tx_count_display().to_string();

    let mut cells = vec![
        Cell::from(PageView::row_number(index).to_string()),
        Cell::from(row.label.clone()),
        address,
        Cell::from(balance.clone()).style(figure_style(&balance)),
        Cell::from(tx_count.clone()).style(figure_style(&tx_count)),
    ];
    if select_mode {
        let mark = if row.selected { "[x]" } else { "[ ]" };
        cells.insert(0, Cell::from(mark));
    }

    let style = if row.selected {
        Style::default().fg(Color::LightMagenta)
    } else {
        Style::default()
    };
    TableRow::new(cells).style(style)
}

fn draw_pager(f: &mut Frame, area: Rect, app: &App) {
    let view = app.ctx.view();
    let control = |label: &'static str, enabled: bool| {
        let style = if enabled {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Span::styled(label, style)
    };

    let line = Line::from(vec![
        Span::styled("Page ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}/{}  ", view.current_page, view.total_pages)),
        Span::styled("Rows ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", app.ctx.rows().len())),
        Span::styled("Per page ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}   ", app.ctx.pagination().page_size)),
        control("«first ", view.can_first()),
        control("‹prev ", view.can_prev()),
        control("next› ", view.can_next()),
        control("last»", view.can_last()),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let line = match app.progress_text() {
        Some(progress) => Line::from(vec![
            Span::styled(progress, Style::default().fg(Color::LightYellow)),
            Span::styled("  (S to stop)", Style::default().fg(Color::DarkGray)),
        ]),
        None => match app.status_text() {
            Some((text, level)) => {
                let color = match level {
                    NotifyLevel::Info => Color::LightGreen,
                    NotifyLevel::Warn => Color::LightYellow,
                    NotifyLevel::Error => Color::LightRed,
                };
                Line::from(vec![
                    Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text.to_string(), Style::default().fg(color)),
                ])
            }
            None => Line::from(""),
        },
    };
    f.render_widget(Paragraph::new(line), area);
}

/// Get command hint for autocompletion
fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let commands = [
        ("add", "Add a row: add [address] [label]"),
        ("import", "Import a file: import <path>"),
        ("import-text", "Import pasted addresses"),
        ("query", "Query every address"),
        ("stop", "Stop the running query"),
        ("refresh", "Refresh the highlighted row"),
        ("stats", "Refresh stats and price"),
        ("copy", "Copy all addresses"),
        ("export", "Export the table to CSV"),
        ("title", "Set the page title"),
        ("pagesize", "Set rows per page (10/20/50/100)"),
        ("page", "Jump to page"),
        ("delete", "Delete selected rows"),
        ("help", "Show key bindings"),
        ("quit", "Quit"),
    ];

    let word = input.split_whitespace().next().unwrap_or("");
    for (cmd, desc) in commands {
        if cmd.starts_with(word) {
            return Some(desc);
        }
    }
    None
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint = command_hint(&app.command.input);
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(app.command.input.clone()),
                Span::styled(
                    format!("  {}", hint.unwrap_or("")),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        InputMode::Prompt(kind) => {
            let help = match kind {
                PromptKind::Address(_) => "  (empty=clear, Enter=ok Esc=cancel)",
                PromptKind::Title => "  (empty=default, Enter=ok Esc=cancel)",
                _ => "  (Enter=ok Esc=cancel)",
            };
            Line::from(vec![
                Span::styled(
                    format!("> {} ", kind.title()),
                    Style::default().fg(Color::LightCyan),
                ),
                Span::raw(prompt_preview(&app.command.input)),
                Span::styled(help, Style::default().fg(Color::DarkGray)),
            ])
        }
        InputMode::Confirm => Line::from(Span::styled(
            "y = delete, n = cancel",
            Style::default().fg(Color::LightYellow),
        )),
        InputMode::Normal => action_hints(app),
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

/// Multi-line pastes shown on one line
fn prompt_preview(input: &str) -> String {
    input.replace(['\r', '\n'], " ⏎ ")
}

fn action_hints(app: &App) -> Line<'static> {
    let keys: &[(&str, &str)] = if app.select_mode {
        &[
            ("space", "select"),
            ("a", "all"),
            ("v", "delete selected"),
            ("Esc", "cancel"),
        ]
    } else {
        &[
            ("a", "add"),
            ("e", "address"),
            ("n", "label"),
            ("dd", "delete"),
            ("r", "refresh"),
            ("R", "query all"),
            ("i", "import"),
            ("v", "select"),
            (":", "command"),
            ("?", "help"),
        ]
    };
    let mut spans = Vec::new();
    for (key, desc) in keys {
        spans.push(Span::styled(
            key.to_string(),
            Style::default().fg(Color::LightCyan),
        ));
        spans.push(Span::styled(
            format!(" {desc}  "),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn draw_confirm_popup(f: &mut Frame, area: Rect, app: &App) {
    let popup_area = centered_rect(40, 20, area);
    f.render_widget(Clear, popup_area);

    let count = app.ctx.rows().selected_count();
    let lines = vec![
        Line::from(""),
        Line::from(format!("Delete {} selected rows?", count)),
        Line::from(""),
        Line::from(Span::styled(
            "y confirm   n cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Confirm").borders(Borders::ALL))
        .alignment(Alignment::Center);
    f.render_widget(paragraph, popup_area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(64, 70, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from("Navigation"),
        Line::from("  j / k        Move row (vim)"),
        Line::from("  h / l        Prev / next page"),
        Line::from("  Home / End   First / last page"),
        Line::from("  g / G        Top / bottom of page"),
        Line::from(""),
        Line::from("Rows"),
        Line::from("  a            Add row"),
        Line::from("  e / Enter    Edit address"),
        Line::from("  n            Edit label"),
        Line::from("  d d          Delete row (press twice)"),
        Line::from("  v            Select mode / delete selected"),
        Line::from("  i / I        Import file / paste addresses"),
        Line::from("  y            Copy all addresses"),
        Line::from("  E            Export CSV"),
        Line::from(""),
        Line::from("Queries"),
        Line::from("  r            Refresh row"),
        Line::from("  R / S        Query all / stop"),
        Line::from("  s            Refresh stats"),
        Line::from(""),
        Line::from("Table"),
        Line::from("  t            Edit title"),
        Line::from("  z            Cycle page size"),
        Line::from("  :            Command line"),
        Line::from("  ?            Toggle help"),
        Line::from("  q            Quit"),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}
