use super::mode::Mode;
use super::state::{AppState, LoadResult};
use crate::plugin::pending::CommitReport;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use scopetui_plugin_interface::ScopeTier;

/// Everything the event loop feeds into the state machine.
#[derive(Debug)]
pub enum AppEvent {
    Loaded(LoadResult),
    Committed(CommitReport),
    Key(KeyEvent),
    Resize(u16, u16),
}

pub fn handle_event(event: AppEvent, state: &mut AppState) -> Result<()> {
    match event {
        AppEvent::Loaded(result) => state.apply_loaded(result),
        AppEvent::Committed(report) => state.finish_commit(report),
        AppEvent::Key(key) => handle_key_event(key, state)?,
        AppEvent::Resize(width, height) => state.resize(width, height),
    }
    Ok(())
}

pub fn handle_key_event(key: KeyEvent, state: &mut AppState) -> Result<()> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        state.should_quit = true;
        return Ok(());
    }

    if state.show_help {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
        ) {
            state.show_help = false;
        }
        return Ok(());
    }

    if key.code == KeyCode::Char('q') {
        state.should_quit = true;
        return Ok(());
    }

    match state.mode {
        Mode::Main => handle_main_mode(key, state)?,
        Mode::Progress => {}
        Mode::Error => handle_error_mode(key, state)?,
    }
    Ok(())
}

fn handle_main_mode(key: KeyEvent, state: &mut AppState) -> Result<()> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            state.nav.move_up(&state.rows);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.nav.move_down(&state.rows);
        }
        KeyCode::PageUp => state.nav.page_up(&state.rows),
        KeyCode::PageDown => state.nav.page_down(&state.rows),
        KeyCode::Home | KeyCode::Char('g') => state.nav.move_to_start(&state.rows),
        KeyCode::End | KeyCode::Char('G') => state.nav.move_to_end(&state.rows),
        KeyCode::Char('u') => {
            state.stage_selected(ScopeTier::User);
        }
        KeyCode::Char('p') => {
            state.stage_selected(ScopeTier::Project);
        }
        KeyCode::Char('l') => {
            state.stage_selected(ScopeTier::Local);
        }
        KeyCode::Char('d') | KeyCode::Char('x') => {
            state.stage_selected(ScopeTier::None);
        }
        KeyCode::Char(' ') => {
            state.toggle_selected();
        }
        KeyCode::Char('c') | KeyCode::Backspace => {
            state.clear_selected();
        }
        KeyCode::Enter => {
            state.start_commit();
        }
        KeyCode::Esc => state.cancel_all(),
        KeyCode::Char('r') => request_reload(state),
        KeyCode::Char('?') => state.show_help = true,
        _ => {}
    }
    Ok(())
}

fn handle_error_mode(key: KeyEvent, state: &mut AppState) -> Result<()> {
    match key.code {
        KeyCode::Char('r') | KeyCode::Enter => request_reload(state),
        KeyCode::Char('?') => state.show_help = true,
        _ => {}
    }
    Ok(())
}

fn request_reload(state: &mut AppState) {
    if state.is_loading() {
        return;
    }
    state.set_status_message("Reloading plugins...".to_string());
    state.start_load();
}
