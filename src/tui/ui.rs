//! TUI layout and rendering with ratatui.
//!
//! # Overview
//!
//! This module handles rendering the user interface including:
//! - Login prompt
//! - Header with the username and solved counter
//! - Live clock, alarm list and the "how it works" panel
//! - Full-screen ringing view with its success and rejection overlays
//! - Modal dialogs for adding an alarm and for notices
//!
//! # Example
//!
//! ```no_run
//! use codealarm::tui::app::App;
//! use codealarm::tui::ui::render;
//! use ratatui::Frame;
//!
//! fn draw(frame: &mut Frame, app: &App) {
//!     render(frame, app);
//! }
//! ```

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::app::{App, FormField, KeyContext, NoticeKind, Screen};
use crate::challenge::GatePhase;
use crate::clock::{format_hms, format_long_date};

fn create_block() -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
}

fn create_block_with_title<'a>(title: impl Into<Line<'a>>) -> Block<'a> {
    create_block().title(title)
}

/// Render the TUI based on current application state.
///
/// The ringing screen takes the whole terminal. The other screens use a
/// header, content and footer layout with dialogs drawn on top.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.screen() == Screen::Ringing {
        render_ringing(frame, app, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(frame, app, chunks[0]);
    match app.screen() {
        Screen::Login => render_login(frame, app, chunks[1]),
        _ => render_main(frame, app, chunks[1]),
    }
    render_footer(frame, app, chunks[2]);

    if app.form().is_some() {
        render_form_dialog(frame, app, area);
    }
    if app.notice().is_some() {
        render_notice_dialog(frame, app, area);
    }
}

/// Render the header with the app name, username and solved counter.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let mut spans = vec![Span::styled(
        "codealarm",
        Style::default()
            .fg(theme.primary)
            .add_modifier(Modifier::BOLD),
    )];

    match app.identity() {
        Some(identity) => {
            spans.push(Span::styled("  |  ", Style::default().fg(theme.dim)));
            spans.push(Span::styled(
                identity.username.clone(),
                Style::default().fg(theme.normal),
            ));
            spans.push(Span::styled("  |  Solved: ", Style::default().fg(theme.dim)));
            spans.push(Span::styled(
                app.solved_count().to_string(),
                Style::default()
                    .fg(theme.secondary)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        None => spans.push(Span::styled(
            "  |  Wake up and code",
            Style::default().fg(theme.dim),
        )),
    }

    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(create_block().border_style(Style::default().fg(theme.primary)));
    frame.render_widget(header, area);
}

fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let dialog = centered_rect(60, 60, area);

    let input = if app.is_login_pending() {
        Span::styled("Verifying...", Style::default().fg(theme.secondary))
    } else {
        Span::styled(
            format!("{}_", app.login_input()),
            Style::default().fg(theme.normal).add_modifier(Modifier::BOLD),
        )
    };

    let lines = vec![
        Line::from(Span::styled(
            "Welcome",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Enter your LeetCode username to get started."),
        Line::from(""),
        Line::from(vec![
            Span::styled("Username: ", Style::default().fg(theme.dim)),
            input,
        ]),
    ];

    let login = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(create_block_with_title(" Login ").border_style(Style::default().fg(theme.primary)));
    frame.render_widget(login, dialog);
}

fn render_main(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Clock and date
            Constraint::Min(5),    // Alarm list
            Constraint::Length(4), // How it works
        ])
        .split(area);

    render_clock(frame, app, chunks[0]);
    render_alarm_list(frame, app, chunks[1]);
    render_info(frame, app, chunks[2]);
}

fn render_clock(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let now = app.now();
    let clock = Paragraph::new(vec![
        Line::from(Span::styled(
            format_hms(now.time()),
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format_long_date(now),
            Style::default().fg(theme.dim),
        )),
    ])
    .alignment(Alignment::Center)
    .block(create_block().border_style(Style::default().fg(theme.dim)));
    frame.render_widget(clock, area);
}

fn render_alarm_list(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let alarms = app.alarms();
    let block = create_block_with_title(format!(" Alarms ({}) ", alarms.len()))
        .border_style(Style::default().fg(theme.primary));

    if alarms.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No alarms set", Style::default().fg(theme.normal))),
            Line::from(Span::styled(
                "Add an alarm to start coding challenges!",
                Style::default().fg(theme.dim),
            )),
        ])
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let label_width = usize::from(area.width.saturating_sub(20));
    let items: Vec<ListItem> = alarms
        .iter()
        .map(|alarm| {
            let (status, status_style) = if alarm.is_active {
                (
                    " ON ",
                    Style::default()
                        .fg(theme.inverted_fg)
                        .bg(theme.success)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                (" OFF", Style::default().fg(theme.dim))
            };
            let time_style = if alarm.is_active {
                Style::default().fg(theme.normal).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.dim)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", alarm.time), time_style),
                Span::styled(
                    format!(" {:<width$} ", truncate_string(&alarm.label, label_width), width = label_width),
                    Style::default().fg(theme.normal),
                ),
                Span::styled(status, status_style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(theme.secondary).add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(app.selected_index()));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_info(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let info = Paragraph::new(
        "When your alarm rings, solve any LeetCode problem of your choice to turn it off! \
         Each solved problem increases your counter.",
    )
    .style(Style::default().fg(theme.normal))
    .wrap(Wrap { trim: true })
    .block(create_block_with_title(" How it works ").border_style(Style::default().fg(theme.secondary)));
    frame.render_widget(info, area);
}

/// Full-screen ringing view, or the acknowledgment overlay when one is up.
fn render_ringing(frame: &mut Frame, app: &App, area: Rect) {
    let Some(gate) = app.gate() else {
        return;
    };
    let theme = app.theme();

    match gate.phase() {
        GatePhase::Solved { .. } | GatePhase::Done => {
            render_overlay(
                frame,
                area,
                "Problem Solved!",
                "Great job! Alarm has been disabled.".to_string(),
                Style::default().fg(theme.inverted_fg).bg(theme.success),
            );
            return;
        }
        GatePhase::Rejected { .. } => {
            render_overlay(
                frame,
                area,
                "Not So Fast!",
                "We haven't detected a new solved problem yet. Please solve a problem first!"
                    .to_string(),
                Style::default().fg(theme.normal).bg(theme.danger),
            );
            return;
        }
        GatePhase::Ringing | GatePhase::Checking => {}
    }

    let background = if gate.flicker_on() {
        Style::default().fg(theme.inverted_fg).bg(theme.alert)
    } else {
        Style::default().fg(theme.normal)
    };
    frame.render_widget(Block::default().style(background), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(5), // Banner
            Constraint::Min(8),    // Instructions
            Constraint::Length(3), // Action
            Constraint::Length(4), // Verification note
        ])
        .split(area);

    let label = app.ringing_label().unwrap_or("Alarm");
    let banner = Paragraph::new(vec![
        Line::from(Span::styled(
            "ALARM!",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("{}  {}", format_hms(app.now().time()), label)),
        Line::from("Solve any LeetCode problem to turn off the alarm"),
    ])
    .alignment(Alignment::Center)
    .style(background)
    .block(create_block());
    frame.render_widget(banner, chunks[0]);

    let instructions = Paragraph::new(vec![
        Line::from(Span::styled(
            "Instructions:",
            Style::default().fg(theme.primary).add_modifier(Modifier::BOLD),
        )),
        Line::from("1. Go to LeetCode.com"),
        Line::from("2. Choose any problem you want to solve"),
        Line::from("3. Submit your solution successfully"),
        Line::from("4. Come back and mark as solved"),
    ])
    .style(Style::default().fg(theme.normal))
    .block(create_block_with_title(" Your Challenge "));
    frame.render_widget(Clear, chunks[1]);
    frame.render_widget(instructions, chunks[1]);

    let (action_text, action_style) = if gate.is_checking() {
        ("Checking...", Style::default().fg(theme.dim))
    } else if app.is_fetching_baseline() {
        ("Reading your solved count...", Style::default().fg(theme.dim))
    } else if app.is_baseline_pending() {
        (
            "[Enter] Retry reading your solved count",
            Style::default().fg(theme.alert).add_modifier(Modifier::BOLD),
        )
    } else {
        (
            "[Enter] I Solved a Problem!",
            Style::default()
                .fg(theme.inverted_fg)
                .bg(theme.success)
                .add_modifier(Modifier::BOLD),
        )
    };
    let action = Paragraph::new(Span::styled(action_text, action_style))
        .alignment(Alignment::Center)
        .block(create_block().border_style(Style::default().fg(theme.success)));
    frame.render_widget(Clear, chunks[2]);
    frame.render_widget(action, chunks[2]);

    let count = match gate.initial_solved_count() {
        Some(_) => app.solved_count().to_string(),
        None => "unknown".to_string(),
    };
    let mut note = vec![Line::from(format!(
        "The alarm only stops once a new solved problem is detected. Your current solved count: {count}"
    ))];
    if gate.is_audio_deferred() {
        note.push(Line::from(Span::styled(
            "Press any key to enable the alarm sound.",
            Style::default().fg(theme.secondary),
        )));
    }
    let verification = Paragraph::new(note)
        .style(Style::default().fg(theme.normal))
        .wrap(Wrap { trim: true })
        .block(create_block_with_title(" Verification Required "));
    frame.render_widget(Clear, chunks[3]);
    frame.render_widget(verification, chunks[3]);
}

fn render_overlay(frame: &mut Frame, area: Rect, title: &str, message: String, style: Style) {
    frame.render_widget(Block::default().style(style), area);
    let dialog = centered_rect(60, 40, area);
    let overlay = Paragraph::new(vec![
        Line::from(Span::styled(
            title.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(message),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .style(style)
    .block(create_block());
    frame.render_widget(overlay, dialog);
}

fn render_form_dialog(frame: &mut Frame, app: &App, area: Rect) {
    let Some(form) = app.form() else {
        return;
    };
    let theme = app.theme();
    let dialog_area = centered_rect(50, 50, area);
    frame.render_widget(Clear, dialog_area);

    let field = |name: &'static str, value: &str, focused: bool| {
        let value_style = if focused {
            Style::default()
                .fg(theme.secondary)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(theme.normal)
        };
        let cursor = if focused { "_" } else { "" };
        Line::from(vec![
            Span::styled(format!("{name:>6}: "), Style::default().fg(theme.dim)),
            Span::styled(format!("{value}{cursor}"), value_style),
        ])
    };

    let mut lines = vec![
        Line::from(""),
        field("Time", &form.time, form.focus == FormField::Time),
        field("Label", &form.label, form.focus == FormField::Label),
        Line::from(""),
    ];
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(theme.danger),
        )));
    }
    lines.push(Line::from(Span::styled(
        "[Tab] next field  [Enter] save  [Esc] cancel",
        Style::default().fg(theme.dim),
    )));

    let dialog = Paragraph::new(lines)
        .block(create_block_with_title(" Set Alarm ").border_style(Style::default().fg(theme.primary)));
    frame.render_widget(dialog, dialog_area);
}

fn render_notice_dialog(frame: &mut Frame, app: &App, area: Rect) {
    let Some(notice) = app.notice() else {
        return;
    };
    let theme = app.theme();
    let dialog_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, dialog_area);

    let color = match notice.kind {
        NoticeKind::Error => theme.danger,
        NoticeKind::Info => theme.primary,
    };

    let dialog = Paragraph::new(vec![
        Line::from(Span::styled(
            notice.title.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(notice.message.clone()),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to dismiss",
            Style::default().fg(theme.dim),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(create_block().border_style(Style::default().fg(color)));
    frame.render_widget(dialog, dialog_area);
}

/// Render the footer with the keys available in the current context.
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme();
    let mut spans: Vec<Span> = get_footer_commands(app.key_context())
        .iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(
                    format!("[{}]", key),
                    Style::default()
                        .fg(theme.secondary)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("{} ", desc), Style::default().fg(theme.normal)),
            ]
        })
        .collect();

    if let Some(status) = app.status() {
        spans.push(Span::styled(
            format!(" {}", status),
            Style::default().fg(theme.success),
        ));
    }

    let footer = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(create_block().border_style(Style::default().fg(theme.dim)));
    frame.render_widget(footer, area);
}

fn get_footer_commands(context: KeyContext) -> &'static [(&'static str, &'static str)] {
    match context {
        KeyContext::LoginInput => &[("Enter", "Log in"), ("Esc", "Quit")],
        KeyContext::Main => &[
            ("a", "Add"),
            ("Space", "On/Off"),
            ("d", "Delete"),
            ("j/k", "Move"),
            ("L", "Log out"),
            ("q", "Quit"),
        ],
        KeyContext::Form => &[("Tab", "Next"), ("Enter", "Save"), ("Esc", "Cancel")],
        KeyContext::Notice => &[("any key", "Dismiss")],
        KeyContext::Ringing => &[("Enter", "I Solved a Problem!")],
    }
}

// ==================== Helper Functions ====================

/// Truncate a string to a maximum display length with ellipsis.
///
/// # Examples
///
/// ```
/// use codealarm::tui::ui::truncate_string;
///
/// assert_eq!(truncate_string("hello", 10), "hello");
/// assert_eq!(truncate_string("hello world", 8), "hello...");
/// ```
#[must_use]
pub fn truncate_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return ".".repeat(max_len);
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{kept}...")
}

/// Create a centered rectangle with given percentage of the parent area.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}
