//! UI rendering for the TUI.

use chalkboard_core::{
    AnimationStatus, Explanation, ExplanationStatus, SessionSnapshot, SessionState,
    MAX_QUESTION_LEN,
};
use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, NoticeLevel, SessionPane, ViewMode};
use crate::player::format_time;

// ========== Status Badge Colors ==========
// Mirrors the status palette of the web client this replaces

/// Completed work
const BADGE_COMPLETED: Color = Color::Rgb(34, 197, 94);
/// Work in progress (processing / generating)
const BADGE_ACTIVE: Color = Color::Rgb(234, 179, 8);
/// Failed work
const BADGE_FAILED: Color = Color::Rgb(239, 68, 68);
/// Queued work
const BADGE_PENDING: Color = Color::Rgb(148, 163, 184);

// ========== Chrome Colors ==========

/// Border color for the focused panel
const BORDER_FOCUS: Color = Color::Rgb(0, 180, 180);
/// Border color for unfocused panels
const BORDER_DIM: Color = Color::Rgb(70, 70, 70);
/// Label color for metadata attributes
const LABEL_COLOR: Color = Color::Rgb(100, 180, 180);
/// Dim gray for secondary text
const TEXT_DIM: Color = Color::Rgb(128, 128, 128);

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    match app.view_mode {
        ViewMode::Home => render_home_view(frame, app),
        ViewMode::Session => render_session_view(frame, app),
    }
}

// ========== Home View ==========

/// Render the home view (question input + recent sessions).
fn render_home_view(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(2), // Header
        Constraint::Length(5), // Question input
        Constraint::Min(5),    // Recent sessions
        Constraint::Length(1), // Footer
    ])
    .split(area);

    render_app_header(frame, chunks[0]);
    render_question_input(frame, app, chunks[1]);
    render_recent_sessions(frame, app, chunks[2]);
    render_footer(
        frame,
        app,
        chunks[3],
        " q quit · i ask a question · j/k select · Enter open · r reload ",
    );
}

/// Render the app name header.
fn render_app_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(" chalkboard — ask, watch, learn")
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

/// Render the recent sessions table (five most recent).
fn render_recent_sessions(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Recent Sessions ")
        .border_style(Style::default().fg(BORDER_DIM));

    if app.recent_sessions.is_empty() {
        let empty = Paragraph::new("No sessions yet. Press 'i' and ask your first question.")
            .style(Style::default().fg(TEXT_DIM))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let rows: Vec<Row> = app
        .recent_sessions
        .iter()
        .map(|session| {
            let created = session
                .created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string();
            let short_id: String = session.session_id.chars().take(8).collect();
            Row::new(vec![
                Cell::from(session.title.clone()),
                Cell::from(short_id).style(Style::default().fg(TEXT_DIM)),
                Cell::from(created).style(Style::default().fg(TEXT_DIM)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(18),
        ],
    )
    .header(
        Row::new(vec!["Title", "Id", "Created"])
            .style(Style::default().fg(LABEL_COLOR).bold()),
    )
    .row_highlight_style(Style::default().bg(Color::Rgb(40, 40, 40)).bold())
    .highlight_symbol("> ")
    .block(block);

    frame.render_stateful_widget(table, area, &mut app.sessions_table);
}

// ========== Session View ==========

/// Render the session view (history, animations, player, input).
fn render_session_view(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(2), // Header
        Constraint::Min(10),   // Main content
        Constraint::Length(5), // Follow-up question input
        Constraint::Length(1), // Footer
    ])
    .split(area);

    let title = app
        .session_title
        .clone()
        .unwrap_or_else(|| "(untitled)".to_string());
    let header = Paragraph::new(format!(" {}", title))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.session_state.clone() {
        SessionState::Ready(snapshot) => {
            render_session_content(frame, app, &snapshot, chunks[1]);
        }
        _ => {
            let loading = Paragraph::new("Loading session...")
                .style(Style::default().fg(TEXT_DIM))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            frame.render_widget(loading, chunks[1]);
        }
    }

    render_question_input(frame, app, chunks[2]);
    render_footer(
        frame,
        app,
        chunks[3],
        " q back · i ask · Tab panel · j/k select · Space play · h/l seek · m mute · r restart ",
    );
}

/// Render the explanation/animation panels for a ready snapshot.
fn render_session_content(frame: &mut Frame, app: &App, snapshot: &SessionSnapshot, area: Rect) {
    let columns = Layout::horizontal([
        Constraint::Percentage(42), // Questions & explanations
        Constraint::Percentage(58), // Animations + player
    ])
    .split(area);

    render_explanations(frame, app, snapshot, columns[0]);

    let right = Layout::vertical([
        Constraint::Min(5),    // Animation list
        Constraint::Length(7), // Player panel
    ])
    .split(columns[1]);

    render_animations(frame, app, snapshot, right[0]);
    render_player(frame, app, right[1]);
}

/// Render the question history with status badges and the selected
/// explanation's text.
fn render_explanations(frame: &mut Frame, app: &App, snapshot: &SessionSnapshot, area: Rect) {
    let focused = app.pane == SessionPane::Explanations;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Questions & Explanations ")
        .border_style(Style::default().fg(if focused { BORDER_FOCUS } else { BORDER_DIM }));

    if snapshot.explanations.is_empty() {
        let empty = Paragraph::new("No questions yet. Press 'i' to ask one.")
            .style(Style::default().fg(TEXT_DIM))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let halves = Layout::vertical([
        Constraint::Percentage(45), // Question list
        Constraint::Percentage(55), // Selected explanation text
    ])
    .split(inner);

    let mut lines: Vec<Line> = Vec::new();
    for (idx, explanation) in snapshot.explanations.iter().enumerate() {
        let marker = if idx == app.selected_explanation { "> " } else { "  " };
        let mut spans = vec![
            Span::styled(
                format!("{}Q{} ", marker, idx + 1),
                if idx == app.selected_explanation {
                    Style::default().bold()
                } else {
                    Style::default()
                },
            ),
            explanation_badge(explanation.status),
            Span::raw(" "),
        ];
        spans.push(Span::raw(clip(&explanation.question, 60)));
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines), halves[0]);

    let selected = snapshot.explanations.get(app.selected_explanation);
    let text = render_explanation_text(selected);
    frame.render_widget(
        text.block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(BORDER_DIM))
                .title(" Explanation "),
        )
        .wrap(Wrap { trim: false }),
        halves[1],
    );
}

/// Body text (or status placeholder) for the selected explanation.
fn render_explanation_text(explanation: Option<&Explanation>) -> Paragraph<'static> {
    let Some(explanation) = explanation else {
        return Paragraph::new("").style(Style::default().fg(TEXT_DIM));
    };

    match (&explanation.explanation_text, explanation.status) {
        (Some(text), _) => Paragraph::new(text.clone()),
        (None, ExplanationStatus::Failed) => Paragraph::new("Explanation generation failed")
            .style(Style::default().fg(BADGE_FAILED)),
        (None, ExplanationStatus::Processing) => Paragraph::new("Generating explanation...")
            .style(Style::default().fg(BADGE_ACTIVE)),
        (None, _) => Paragraph::new("Waiting for a worker to pick this up...")
            .style(Style::default().fg(TEXT_DIM)),
    }
}

/// Render the animation list.
fn render_animations(frame: &mut Frame, app: &App, snapshot: &SessionSnapshot, area: Rect) {
    let focused = app.pane == SessionPane::Animations;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Animations ")
        .border_style(Style::default().fg(if focused { BORDER_FOCUS } else { BORDER_DIM }));

    if snapshot.animations.is_empty() {
        let empty = Paragraph::new(
            "No animations generated yet.\nAnimations will appear here once explanations are processed.",
        )
        .style(Style::default().fg(TEXT_DIM))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for (idx, animation) in snapshot.animations.iter().enumerate() {
        let marker = if idx == app.selected_animation { "> " } else { "  " };
        let duration = animation
            .duration
            .map(format_time)
            .unwrap_or_else(|| "-:--".to_string());
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}{} ", marker, clip(&animation.title, 40)),
                if idx == app.selected_animation {
                    Style::default().bold()
                } else {
                    Style::default()
                },
            ),
            animation_badge(animation.status),
            Span::styled(
                format!(" {} · {}", animation.animation_type, duration),
                Style::default().fg(TEXT_DIM),
            ),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Render the player panel for the selected animation.
fn render_player(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Player ")
        .border_style(Style::default().fg(BORDER_DIM));

    let Some(animation) = app.current_animation() else {
        let empty = Paragraph::new("Select an animation")
            .style(Style::default().fg(TEXT_DIM))
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    };

    if animation.status != AnimationStatus::Completed {
        let message = match animation.status {
            AnimationStatus::Pending => "Animation queued for generation...",
            AnimationStatus::Generating => "Generating animation...",
            AnimationStatus::Failed => "Animation generation failed",
            AnimationStatus::Completed => unreachable!(),
        };
        let style = match animation.status {
            AnimationStatus::Failed => Style::default().fg(BADGE_FAILED),
            _ => Style::default().fg(BADGE_ACTIVE),
        };
        let paragraph = Paragraph::new(message)
            .style(style)
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::vertical([
        Constraint::Length(1), // Transport state
        Constraint::Length(1), // Progress gauge
        Constraint::Length(1), // Media URL
        Constraint::Length(1), // Thumbnail URL
    ])
    .split(inner);

    let transport = Line::from(vec![
        Span::styled(
            if app.player.playing { "[playing]" } else { "[paused]" },
            Style::default().fg(if app.player.playing {
                BADGE_COMPLETED
            } else {
                TEXT_DIM
            }),
        ),
        Span::raw(" "),
        Span::styled(
            if app.player.muted { "[muted]" } else { "[sound]" },
            Style::default().fg(TEXT_DIM),
        ),
        Span::raw("  "),
        Span::styled(animation.title.clone(), Style::default().bold()),
    ]);
    frame.render_widget(Paragraph::new(transport), rows[0]);

    let gauge = Gauge::default()
        .ratio(app.player.progress())
        .label(format!(
            "{} / {}",
            format_time(app.player.position),
            format_time(app.player.duration)
        ))
        .gauge_style(Style::default().fg(BORDER_FOCUS));
    frame.render_widget(gauge, rows[1]);

    let video_url = app.client().animation_file_url(animation.id);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("video: ", Style::default().fg(LABEL_COLOR)),
            Span::styled(video_url, Style::default().fg(TEXT_DIM)),
        ])),
        rows[2],
    );

    let thumbnail_url = app.client().animation_thumbnail_url(animation.id);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("thumb: ", Style::default().fg(LABEL_COLOR)),
            Span::styled(thumbnail_url, Style::default().fg(TEXT_DIM)),
        ])),
        rows[3],
    );
}

// ========== Shared Widgets ==========

/// Render the question input box (shared by both views).
fn render_question_input(frame: &mut Frame, app: &App, area: Rect) {
    let count = app.input.chars().count();
    let title = if app.submitting {
        " Submitting... ".to_string()
    } else {
        format!(" Ask a Question — {}/{} ", count, MAX_QUESTION_LEN)
    };

    let border_style = if app.submitting {
        Style::default().fg(TEXT_DIM)
    } else if app.editing {
        Style::default().fg(BORDER_FOCUS)
    } else {
        Style::default().fg(BORDER_DIM)
    };

    let hint = if app.editing {
        ""
    } else {
        "press 'i' to type"
    };
    let body = if app.input.is_empty() && !app.editing {
        Paragraph::new(hint).style(Style::default().fg(TEXT_DIM))
    } else {
        Paragraph::new(app.input.clone())
    };

    let input = body
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style),
        );
    frame.render_widget(input, area);
}

/// Render the footer: a transient notice when present, key help otherwise.
fn render_footer(frame: &mut Frame, app: &App, area: Rect, help: &str) {
    let paragraph = match &app.notice {
        Some(notice) => {
            let style = match notice.level {
                NoticeLevel::Info => Style::default().fg(BADGE_COMPLETED),
                NoticeLevel::Error => Style::default().fg(BADGE_FAILED),
            };
            Paragraph::new(format!(" {}", notice.text)).style(style.bold())
        }
        None => Paragraph::new(help).style(Style::default().fg(TEXT_DIM)),
    };
    frame.render_widget(paragraph, area);
}

/// Status badge for an explanation.
fn explanation_badge(status: ExplanationStatus) -> Span<'static> {
    let color = match status {
        ExplanationStatus::Completed => BADGE_COMPLETED,
        ExplanationStatus::Processing => BADGE_ACTIVE,
        ExplanationStatus::Failed => BADGE_FAILED,
        ExplanationStatus::Pending => BADGE_PENDING,
    };
    Span::styled(format!("[{}]", status), Style::default().fg(color))
}

/// Status badge for an animation.
fn animation_badge(status: AnimationStatus) -> Span<'static> {
    let color = match status {
        AnimationStatus::Completed => BADGE_COMPLETED,
        AnimationStatus::Generating => BADGE_ACTIVE,
        AnimationStatus::Failed => BADGE_FAILED,
        AnimationStatus::Pending => BADGE_PENDING,
    };
    Span::styled(format!("[{}]", status), Style::default().fg(color))
}

/// Clip text to `max` characters with an ellipsis.
fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("exactly-10", 10), "exactly-10");
        let clipped = clip("a very long question about thermodynamics", 10);
        assert_eq!(clipped.chars().count(), 10);
        assert!(clipped.ends_with("..."));
    }
}
