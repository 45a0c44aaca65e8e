pub mod details;
pub mod plugin_list;
pub mod status_bar;

use crate::ui::theme::Theme;
use scope_tui::app::mode::Mode;
use scope_tui::app::AppState;
use scope_tui::plugin::pending::CommitOutcome;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, state: &mut AppState, theme: &Theme) {
    let area = f.area();
    if (area.width, area.height) != (state.terminal_width, state.terminal_height) {
        state.resize(area.width, area.height);
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),    // Panes
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    if state.mode == Mode::Error {
        render_error_screen(f, state, theme, chunks[0]);
    } else {
        let panes = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[0]);
        plugin_list::render(f, state, theme, panes[0]);
        details::render(f, state, theme, panes[1]);
    }

    status_bar::render(f, state, theme, chunks[1]);

    if state.mode == Mode::Progress {
        render_progress_popup(f, state, theme);
    }

    if state.show_help {
        render_help_overlay(f, theme);
    }
}

fn render_error_screen(f: &mut Frame, state: &AppState, theme: &Theme, area: Rect) {
    let message = state.load_error.as_deref().unwrap_or("Unknown error");

    let mut lines = vec![
        Line::from(Span::styled(
            "Could not load plugins",
            Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(message, Style::default().fg(theme.foreground))),
        Line::from(""),
    ];
    if !state.ledger.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("{} staged change(s) are kept.", state.ledger.len()),
            Style::default().fg(theme.staged),
        )));
    }
    lines.push(Line::from(Span::styled(
        "Press r to retry, q to quit.",
        Style::default().fg(theme.dim),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Error ")
        .style(Style::default().bg(theme.background).fg(theme.error));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_progress_popup(f: &mut Frame, state: &AppState, theme: &Theme) {
    let area = centered_rect(40, 20, f.area());

    let text = format!(
        "{} Applying {} staged change(s)...\n\nPlease wait.",
        state.get_spinner_char(),
        state.applying
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Applying ")
        .style(Style::default().bg(theme.background));

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(theme.foreground))
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

/// Lines describing the most recent commit, failures first.
pub(crate) fn report_lines<'a>(state: &'a AppState, theme: &Theme) -> Vec<Line<'a>> {
    let Some(report) = &state.last_report else {
        return Vec::new();
    };

    let mut lines = vec![Line::from(Span::styled(
        format!("Last commit: {report}"),
        Style::default().fg(theme.dim),
    ))];
    for entry in &report.entries {
        let (label, color) = match &entry.outcome {
            CommitOutcome::Failed(e) => (format!("  ✗ {} ({e})", entry.id), theme.error),
            CommitOutcome::Applied => (format!("  ✓ {} → {}", entry.id, entry.target), theme.installed),
            CommitOutcome::Skipped => (format!("  - {} unchanged", entry.id), theme.dim),
        };
        lines.push(Line::from(Span::styled(label, Style::default().fg(color))));
    }
    lines
}

fn render_help_overlay(f: &mut Frame, theme: &Theme) {
    let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(theme.foreground);
    let section_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let sections: [(&str, &[(&str, &str)]); 3] = [
        (
            "Navigation",
            &[
                ("j / ↓", "Next plugin"),
                ("k / ↑", "Previous plugin"),
                ("PgDn / PgUp", "Page down / up"),
                ("g / Home", "First plugin"),
                ("G / End", "Last plugin"),
            ],
        ),
        (
            "Staging",
            &[
                ("u", "Stage install at user scope"),
                ("p", "Stage install at project scope"),
                ("l", "Stage install at local scope"),
                ("d / x", "Stage uninstall"),
                ("Space", "Toggle project / local"),
                ("c / Backspace", "Clear staged change"),
                ("Enter", "Apply staged changes"),
                ("Esc", "Discard all staged changes"),
            ],
        ),
        (
            "General",
            &[
                ("r", "Reload plugins"),
                ("?", "Toggle this help"),
                ("q / Ctrl-C", "Quit"),
            ],
        ),
    ];

    let mut lines: Vec<Line> = vec![];
    for (title, keys) in sections {
        lines.push(Line::from(Span::styled(format!("  ── {title} ──"), section_style)));
        for (key, desc) in keys {
            lines.push(Line::from(vec![
                Span::styled(format!("    {key:<16}"), key_style),
                Span::styled(*desc, desc_style),
            ]));
        }
        lines.push(Line::from(""));
    }

    let area = centered_rect(60, 80, f.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .title_bottom(Line::from(" ? or Esc to close ").centered())
        .style(Style::default().bg(theme.background));

    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block), area);
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
