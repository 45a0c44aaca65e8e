use crate::ui::theme::Theme;
use scope_tui::app::mode::Mode;
use scope_tui::app::AppState;
use scope_tui::plugin::pending::OrphanPolicy;
use scope_tui::utils::unicode::display_width;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub fn render(f: &mut Frame, state: &AppState, theme: &Theme, area: Rect) {
    if let Some((message, time)) = &state.status_message
        && time.elapsed().as_secs() <= 3
    {
        render_status_message(f, message, theme, area);
        return;
    }

    let mode_text = if state.is_loading() && state.mode != Mode::Progress {
        format!("{} {}", state.get_spinner_char(), state.mode)
    } else {
        state.mode.to_string()
    };

    let installed = state
        .rows
        .iter()
        .filter_map(|row| row.as_plugin())
        .filter(|plugin| plugin.is_installed())
        .count();

    let mut left_content = format!(
        " {} | {} installed | {} staged",
        mode_text,
        installed,
        state.ledger.len()
    );
    let orphans = state.orphaned_intents().len();
    if orphans > 0 {
        let suffix = if state.orphan_policy() == OrphanPolicy::Block {
            " [blocked]"
        } else {
            ""
        };
        left_content.push_str(&format!(" | {orphans} vanished{suffix}"));
    }

    let nav_hint = "? help  q quit";
    let version_text = format!("{} v{}", state.app_info.name, state.app_info.version);

    let used = display_width(&left_content) + nav_hint.len() + version_text.len() + 3;
    let padding = (area.width as usize).saturating_sub(used);

    let base_style = Style::default()
        .fg(theme.status_bar_fg)
        .bg(theme.status_bar_bg);

    let status_line = format!(
        "{} {} {:>padding$} {} ",
        left_content,
        nav_hint,
        "",
        version_text,
        padding = padding
    );

    let status = Paragraph::new(Line::from(vec![Span::styled(status_line, base_style)]));
    f.render_widget(status, area);
}

fn render_status_message(f: &mut Frame, message: &str, theme: &Theme, area: Rect) {
    let display_message = format!(" {message} ");

    let style = Style::default()
        .fg(theme.status_bar_fg)
        .bg(ratatui::style::Color::Rgb(0, 100, 0))
        .add_modifier(Modifier::BOLD);

    let padding = (area.width as usize).saturating_sub(display_width(&display_message));
    let status_line = format!(
        "{}{:padding$}",
        display_message,
        "",
        padding = padding
    );

    let status = Paragraph::new(Line::from(vec![Span::styled(status_line, style)]));
    f.render_widget(status, area);
}
