use crate::ui::theme::Theme;
use scope_tui::app::AppState;
use scope_tui::plugin::merge::{DisplayRow, PluginRow};
use scope_tui::utils::unicode::{display_width, pad_to_width, truncate_to_width};
use scopetui_plugin_interface::ScopeTier;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Columns reserved right of the name: version, scope and staged intent.
const TRAILER_WIDTH: usize = 30;

pub fn render(f: &mut Frame, state: &AppState, theme: &Theme, area: Rect) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let range = state.nav.visible_range(state.rows.len());

    let items: Vec<ListItem> = state.rows[range.clone()]
        .iter()
        .zip(range)
        .map(|(row, index)| match row {
            DisplayRow::Header { marketplace } => ListItem::new(Line::from(Span::styled(
                format!("── {marketplace} ──"),
                Style::default().fg(theme.header).add_modifier(Modifier::BOLD),
            ))),
            DisplayRow::Plugin(plugin) => {
                let item = ListItem::new(plugin_line(state, plugin, theme, inner_width));
                if index == state.nav.selected() {
                    item.style(Style::default().bg(theme.selected_bg).add_modifier(Modifier::BOLD))
                } else {
                    item
                }
            }
        })
        .collect();

    let plugin_count = state.rows.iter().filter(|row| !row.is_header()).count();
    let mut block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Plugins ({plugin_count}) "))
        .style(Style::default().bg(theme.background).fg(theme.foreground));
    if !state.ledger.is_empty() {
        block = block.title_bottom(
            Line::from(Span::styled(
                format!(" {} staged, Enter to apply ", state.ledger.len()),
                Style::default().fg(theme.staged),
            ))
            .right_aligned(),
        );
    }

    f.render_widget(List::new(items).block(block), area);
}

fn plugin_line(state: &AppState, plugin: &PluginRow, theme: &Theme, width: usize) -> Line<'static> {
    let (marker, marker_color) = if !plugin.is_installed() {
        ("  ", theme.dim)
    } else if plugin.enabled {
        ("● ", theme.installed)
    } else {
        ("○ ", theme.disabled)
    };

    let name_width = width.saturating_sub(TRAILER_WIDTH + display_width(marker)).max(8);
    let name = pad_to_width(&truncate_to_width(&plugin.name, name_width), name_width);

    let mut spans = vec![
        Span::styled(marker, Style::default().fg(marker_color)),
        Span::styled(name, Style::default().fg(theme.foreground)),
        Span::styled(
            format!(" {:<9}", truncate_to_width(&plugin.version, 9)),
            Style::default().fg(theme.dim),
        ),
    ];

    if plugin.has_update() {
        spans.push(Span::styled("↑", Style::default().fg(theme.update)));
    } else {
        spans.push(Span::raw(" "));
    }

    let scope_label = if plugin.is_installed() {
        plugin.scope.as_str()
    } else {
        "-"
    };
    spans.push(Span::styled(
        format!(" {scope_label:<7}"),
        Style::default().fg(marker_color),
    ));

    if let Some(target) = state.ledger.get(&plugin.id) {
        spans.push(Span::styled(
            format!(" → {}", intent_label(target)),
            Style::default().fg(theme.staged).add_modifier(Modifier::BOLD),
        ));
    }

    Line::from(spans)
}

pub(crate) fn intent_label(target: ScopeTier) -> &'static str {
    match target {
        ScopeTier::None => "uninstall",
        tier => tier.as_str(),
    }
}
