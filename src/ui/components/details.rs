use super::plugin_list::intent_label;
use super::report_lines;
use crate::ui::theme::Theme;
use scope_tui::app::AppState;
use scope_tui::plugin::merge::PluginRow;
use scopetui_plugin_interface::ScopeTier;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, state: &AppState, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Details ")
        .style(Style::default().bg(theme.background).fg(theme.foreground));

    let mut lines = match state.selected_row() {
        Some(plugin) => plugin_lines(state, plugin, theme),
        None if state.is_loading() => vec![Line::from(Span::styled(
            format!("{} Loading plugins...", state.get_spinner_char()),
            Style::default().fg(theme.dim),
        ))],
        None => vec![Line::from(Span::styled(
            "No plugins available",
            Style::default().fg(theme.dim),
        ))],
    };

    let report = report_lines(state, theme);
    if !report.is_empty() {
        lines.push(Line::from(""));
        lines.extend(report);
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn field<'a>(label: &'a str, value: String, theme: &Theme) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{label:<12}"), Style::default().fg(theme.dim)),
        Span::styled(value, Style::default().fg(theme.foreground)),
    ])
}

fn plugin_lines<'a>(state: &'a AppState, plugin: &'a PluginRow, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(Span::styled(
            plugin.name.clone(),
            Style::default().fg(theme.header).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(plugin.id.as_str(), Style::default().fg(theme.dim))),
        Line::from(""),
    ];

    let mut version = if plugin.version.is_empty() {
        "unknown".to_string()
    } else {
        plugin.version.clone()
    };
    if plugin.has_update() {
        version.push_str(&format!("  ({} available)", plugin.latest_version));
    }
    lines.push(field("Version", version, theme));
    if !plugin.author.is_empty() {
        lines.push(field("Author", plugin.author.clone(), theme));
    }
    if let Some(count) = plugin.install_count {
        lines.push(field("Installs", count.to_string(), theme));
    }
    if let Some(source) = &plugin.source_path {
        lines.push(field("Source", source.clone(), theme));
    }

    let installed = match (plugin.is_installed(), plugin.enabled) {
        (false, _) => "not installed".to_string(),
        (true, true) => format!("{} (enabled)", plugin.scope),
        (true, false) => format!("{} (disabled)", plugin.scope),
    };
    lines.push(field("Installed", installed, theme));
    if plugin.orphaned {
        lines.push(Line::from(Span::styled(
            "Not listed by any marketplace",
            Style::default().fg(theme.disabled),
        )));
    }

    if let Some(target) = state.ledger.get(&plugin.id) {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<12}", "Staged"), Style::default().fg(theme.dim)),
            Span::styled(
                intent_label(target),
                Style::default().fg(theme.staged).add_modifier(Modifier::BOLD),
            ),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Settings",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for tier in ScopeTier::PERSISTED {
        let value = match state.scopes.tier(&plugin.id, tier) {
            Some(true) => "enabled",
            Some(false) => "disabled",
            None => "-",
        };
        lines.push(field(tier.as_str(), value.to_string(), theme));
    }

    if !plugin.description.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            plugin.description.as_str(),
            Style::default().fg(theme.foreground),
        )));
    }

    lines
}
