//! Frame rendering.
//!
//! Pure view over [`App`]: nothing here mutates state. The transcript is
//! rebuilt as styled lines each frame and scrolled from the bottom, so a
//! stream in progress always stays in view.

use crate::app::{App, CustomField, Mode, SetupFocus};
use crate::theme::{self, Theme};
use chrono::Local;
use eq_core::{
    extract_sections, is_structured, GenerationMetrics, Message, MessageKind, Section, Sender,
    SqlOutcome,
};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use std::time::Instant;

const MAX_RESULT_ROWS: usize = 20;
const MAX_CELL_WIDTH: usize = 24;

pub fn draw(frame: &mut Frame, app: &App) {
    let theme = if app.dark { theme::dark() } else { theme::light() };
    let area = frame.size();
    frame.render_widget(Block::new().style(Style::new().bg(theme.bg)), area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    draw_header(frame, app, &theme, rows[0]);
    draw_transcript(frame, app, &theme, rows[1]);
    draw_input(frame, app, &theme, rows[2]);

    match app.mode {
        Mode::DomainSetup => draw_domain_setup(frame, app, &theme, area),
        Mode::Help => draw_help(frame, &theme, area),
        Mode::Chat => {}
    }
}

fn draw_header(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let domain = app
        .profile
        .as_ref()
        .map(|p| p.name.as_str())
        .unwrap_or("no domain");
    let (dot, dot_color) = if app.connected { ("●", theme.ok) } else { ("○", theme.critical) };

    let mut status_spans = vec![
        Span::styled(dot, Style::new().fg(dot_color)),
        Span::raw(" "),
        Span::styled(app.server_status.clone(), theme.muted_style()),
    ];
    if app.awaiting_response {
        status_spans.push(Span::styled("  generating…", Style::new().fg(theme.accent)));
    }
    if app.copy_feedback_active(Instant::now()) {
        status_spans.push(Span::styled("  SQL copied", Style::new().fg(theme.ok)));
    }

    let lines = vec![
        Line::from(vec![
            Span::styled("EdgeQuery", theme.header()),
            Span::styled(format!("  [{domain}]"), Style::new().fg(theme.accent)),
        ]),
        Line::from(status_spans),
    ];
    let block = Block::new()
        .borders(Borders::BOTTOM)
        .border_style(Style::new().fg(theme.border));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_transcript(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let block = Block::new()
        .borders(Borders::NONE)
        .style(Style::new().bg(theme.bg).fg(theme.text));
    let inner_width = area.width.saturating_sub(2).max(1);

    let lines = if app.transcript.is_empty() {
        vec![
            Line::default(),
            Line::styled(
                "  Ask a question about your data. Tab inserts a sample query.",
                theme.muted_style(),
            ),
        ]
    } else {
        transcript_lines(app, theme)
    };

    // Wrapped-height estimate so the view sticks to the bottom.
    let total: u16 = lines
        .iter()
        .map(|line| wrapped_height(line, inner_width))
        .sum();
    let offset = total
        .saturating_sub(area.height)
        .saturating_sub(app.scroll)
        .min(total.saturating_sub(1));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

fn wrapped_height(line: &Line, width: u16) -> u16 {
    let w = line.width().max(1) as u16;
    w.div_ceil(width)
}

fn transcript_lines<'a>(app: &'a App, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    for message in app.transcript.messages() {
        lines.push(Line::default());
        match message.sender {
            Sender::User => push_user_message(&mut lines, message, theme),
            Sender::Assistant => push_assistant_message(&mut lines, app, message, theme),
            Sender::System => push_system_message(&mut lines, message, theme),
        }
    }
    lines
}

fn timestamp(message: &Message) -> String {
    message.timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

fn push_user_message<'a>(lines: &mut Vec<Line<'a>>, message: &'a Message, theme: &Theme) {
    lines.push(Line::from(vec![
        Span::styled("You", Style::new().fg(theme.user).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {}", timestamp(message)), theme.muted_style()),
    ]));
    lines.push(Line::styled(format!("  {}", message.content), Style::new().fg(theme.text)));
}

fn push_assistant_message<'a>(
    lines: &mut Vec<Line<'a>>,
    app: &App,
    message: &'a Message,
    theme: &Theme,
) {
    lines.push(Line::from(vec![
        Span::styled("Assistant", Style::new().fg(theme.accent).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  {}", timestamp(message)), theme.muted_style()),
    ]));

    if !is_structured(&message.content) {
        let mut text = format!("  {}", message.content);
        if message.is_streaming {
            text.push('▌');
        }
        for line in text.split('\n') {
            lines.push(Line::styled(line.to_string(), Style::new().fg(theme.text)));
        }
        return;
    }

    let structured = extract_sections(&message.content, message.is_streaming);
    let panels = [
        (Section::Reasoning, "Reasoning", theme.reasoning, structured.reasoning.as_str()),
        (Section::Explanation, "Explanation", theme.explanation, structured.explanation.as_str()),
        (Section::Sql, "SQL Query", theme.sql, structured.sql.as_str()),
    ];
    for (section, title, color, body) in panels {
        let present = structured.has(section)
            || (message.is_streaming && structured.partial.get(section));
        if !present || !app.reveal.is_visible(message.id, section) {
            continue;
        }
        let expanded = app.expanded.get(section);
        let marker = if expanded { "▾" } else { "▸" };
        lines.push(Line::from(Span::styled(
            format!("  {marker} {title}"),
            theme.section(color),
        )));
        if !expanded {
            continue;
        }
        let mut body = body.to_string();
        if message.is_streaming && !structured.has(section) {
            body.push('…');
        } else if message.is_streaming {
            body.push('▌');
        }
        for line in body.split('\n') {
            lines.push(Line::styled(format!("    {line}"), Style::new().fg(theme.text)));
        }
    }
}

fn push_system_message<'a>(lines: &mut Vec<Line<'a>>, message: &'a Message, theme: &Theme) {
    match &message.kind {
        MessageKind::SqlWarning => {
            lines.push(Line::from(Span::styled(
                format!("  ⚠ {}", message.content),
                Style::new().fg(theme.warn),
            )));
        }
        MessageKind::SqlResult { query, result } => {
            lines.push(Line::from(Span::styled(
                "Query Results",
                Style::new().fg(theme.sql).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::styled(format!("  {query}"), theme.muted_style()));
            for line in sql_result_lines(result) {
                let style = if result.success {
                    Style::new().fg(theme.text)
                } else {
                    Style::new().fg(theme.critical)
                };
                lines.push(Line::styled(format!("  {line}"), style));
            }
        }
        MessageKind::GenerationMetrics { metrics } => {
            for line in metrics_lines(metrics) {
                lines.push(Line::styled(format!("  {line}"), theme.muted_style()));
            }
        }
        MessageKind::Plain => {
            lines.push(Line::styled(format!("  {}", message.content), theme.muted_style()));
        }
    }
}

/// Renders a SQL outcome as monospace table text. Output is plain
/// strings so it can be styled by the caller and unit tested directly.
fn sql_result_lines(result: &SqlOutcome) -> Vec<String> {
    if !result.success {
        let reason = result.error.as_deref().unwrap_or("unknown error");
        return vec![format!("✗ {reason}")];
    }
    if let Some(affected) = result.affected_rows {
        return vec![format!("✓ {affected} row(s) affected")];
    }
    let Some(rows) = result.data.as_ref().filter(|rows| !rows.is_empty()) else {
        return vec!["✓ no rows returned".to_string()];
    };

    let columns: Vec<&String> = rows[0].keys().collect();
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows.iter().take(MAX_RESULT_ROWS) {
        for (i, column) in columns.iter().enumerate() {
            let cell = cell_text(row.get(*column));
            widths[i] = widths[i].max(cell.chars().count()).min(MAX_CELL_WIDTH);
        }
    }

    let mut lines = Vec::new();
    lines.push(
        columns
            .iter()
            .enumerate()
            .map(|(i, c)| pad(c, widths[i]))
            .collect::<Vec<_>>()
            .join("  "),
    );
    lines.push(widths.iter().map(|w| "─".repeat(*w)).collect::<Vec<_>>().join("  "));
    for row in rows.iter().take(MAX_RESULT_ROWS) {
        lines.push(
            columns
                .iter()
                .enumerate()
                .map(|(i, c)| pad(&cell_text(row.get(*c)), widths[i]))
                .collect::<Vec<_>>()
                .join("  "),
        );
    }
    if rows.len() > MAX_RESULT_ROWS {
        lines.push(format!("… {} more row(s)", rows.len() - MAX_RESULT_ROWS));
    }
    if let Some(count) = result.row_count {
        lines.push(format!("{count} row(s)"));
    }
    lines
}

fn cell_text(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn pad(text: &str, width: usize) -> String {
    let truncated: String = text.chars().take(width).collect();
    format!("{truncated:<width$}")
}

/// Session throughput tier, mirrored in the metrics panel label.
fn speed_tier(tokens_per_second: f64) -> &'static str {
    if tokens_per_second >= 20.0 {
        "Excellent"
    } else if tokens_per_second >= 10.0 {
        "Good"
    } else if tokens_per_second >= 5.0 {
        "Fair"
    } else {
        "Slow"
    }
}

fn metrics_lines(metrics: &GenerationMetrics) -> Vec<String> {
    let session = &metrics.session;
    let overall = &metrics.overall;
    let mut lines = vec![format!(
        "⏱ {} tokens in {:.2}s ({:.1} tok/s — {})",
        session.tokens,
        session.total_time,
        session.tokens_per_second,
        speed_tier(session.tokens_per_second)
    )];
    if let Some(ttft) = session.ttft {
        lines.push(format!(
            "  first token {:.2}s, median inter-token {:.0}ms",
            ttft,
            session.median_inter_token_time * 1000.0
        ));
    }
    lines.push(format!(
        "  overall: {} tokens, {:.1} tok/s avg",
        overall.total_tokens, overall.tokens_per_second
    ));
    lines
}

fn draw_input(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let title = if app.connected { " Message " } else { " Message (offline) " };
    let block = Block::new()
        .borders(Borders::ALL)
        .border_style(Style::new().fg(theme.border))
        .title(Span::styled(title, theme.muted_style()));
    let inner = block.inner(area);
    frame.render_widget(
        Paragraph::new(app.input.as_str()).style(Style::new().fg(theme.text)).block(block),
        area,
    );
    if app.mode == Mode::Chat {
        let cursor_x = inner.x + (app.input.chars().count() as u16).min(inner.width.saturating_sub(1));
        frame.set_cursor(cursor_x, inner.y);
    }
}

fn draw_domain_setup(frame: &mut Frame, app: &App, theme: &Theme, area: Rect) {
    let popup = centered_rect(area, 70, 80);
    frame.render_widget(Clear, popup);
    let block = Block::new()
        .borders(Borders::ALL)
        .border_style(Style::new().fg(theme.accent))
        .title(Span::styled(" Domain Setup ", theme.header()))
        .style(Style::new().bg(theme.surface));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines = vec![
        Line::styled(
            "Pick a domain for SQL generation. ↑/↓ select, Enter apply, Esc close.",
            theme.muted_style(),
        ),
        Line::default(),
    ];
    for (i, config) in app.catalog.iter().enumerate() {
        lines.push(list_entry(app, theme, i, &config.name, &config.description));
    }
    lines.push(list_entry(
        app,
        theme,
        app.catalog.len(),
        "Custom domain…",
        "Define your own name, description and schema",
    ));

    if app.form.focus == SetupFocus::Custom {
        lines.push(Line::default());
        lines.push(Line::styled(
            "Custom domain (Tab switches fields, Ctrl+S applies):",
            theme.muted_style(),
        ));
        let fields = [
            (CustomField::Name, "Name", app.form.draft.name.as_str()),
            (CustomField::Description, "Description", app.form.draft.description.as_str()),
            (CustomField::Schema, "Schema", app.form.draft.schema.as_str()),
        ];
        for (field, label, value) in fields {
            let style = if app.form.field == field {
                Style::new().fg(theme.accent).add_modifier(Modifier::BOLD)
            } else {
                theme.muted_style()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("  {label}: "), style),
                Span::styled(value.replace('\n', "⏎"), Style::new().fg(theme.text)),
            ]));
        }
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn list_entry<'a>(
    app: &App,
    theme: &Theme,
    index: usize,
    name: &'a str,
    description: &'a str,
) -> Line<'a> {
    let selected = app.form.selected == index && app.form.focus == SetupFocus::List;
    let marker = if selected { "▸ " } else { "  " };
    let name_style = if selected {
        Style::new().fg(theme.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::new().fg(theme.text)
    };
    Line::from(vec![
        Span::styled(marker, name_style),
        Span::styled(name, name_style),
        Span::styled(format!(" — {description}"), theme.muted_style()),
    ])
}

fn draw_help(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_rect(area, 60, 60);
    frame.render_widget(Clear, popup);
    let block = Block::new()
        .borders(Borders::ALL)
        .border_style(Style::new().fg(theme.accent))
        .title(Span::styled(" Keys ", theme.header()))
        .style(Style::new().bg(theme.surface));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let entries = [
        ("Enter", "send message"),
        ("Tab", "insert next sample query"),
        ("Ctrl+O", "connect / disconnect"),
        ("Ctrl+D", "domain setup"),
        ("Ctrl+L", "clear transcript"),
        ("Ctrl+Y", "copy latest SQL to clipboard"),
        ("Ctrl+T", "toggle light / dark theme"),
        ("F2 / F3 / F4", "collapse reasoning / explanation / SQL"),
        ("↑ / ↓, PgUp / PgDn", "scroll transcript"),
        ("F1", "this help"),
        ("Ctrl+C", "quit"),
    ];
    let lines: Vec<Line> = entries
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("  {key:<20}"), Style::new().fg(theme.accent)),
                Span::styled(*what, Style::new().fg(theme.text)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
