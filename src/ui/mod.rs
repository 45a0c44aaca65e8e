pub mod components;
pub mod theme;

use scope_tui::app::event::{handle_event, handle_key_event, AppEvent};
use scope_tui::app::AppState;
use scope_tui::plugin::scope::SettingsLocations;
use theme::Theme;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;
use tracing::debug;

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = disable_raw_mode();
        let _ = execute!(stdout, LeaveAlternateScreen);
        let _ = stdout.flush();
    }
}

pub fn run_tui(mut state: AppState, theme: Theme) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (settings_tx, settings_rx) = mpsc::channel();
    let _watcher = setup_settings_watcher(state.locations(), settings_tx);

    state.start_load();
    let result = run_app(&mut terminal, &mut state, &theme, settings_rx);
    terminal.show_cursor()?;

    result
}

/// Watch the directories holding the settings files; only events touching
/// one of the files themselves are forwarded.
fn setup_settings_watcher(
    locations: &SettingsLocations,
    tx: mpsc::Sender<()>,
) -> Option<RecommendedWatcher> {
    let files: HashSet<PathBuf> = locations.iter().map(|(_, path)| path.to_path_buf()).collect();
    let dirs: HashSet<PathBuf> = files
        .iter()
        .filter_map(|path| path.parent().map(|dir| dir.to_path_buf()))
        .filter(|dir| dir.is_dir())
        .collect();

    let watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res
                && !event.kind.is_access()
                && event.paths.iter().any(|path| files.contains(path))
            {
                let _ = tx.send(());
            }
        },
        Config::default(),
    );

    match watcher {
        Ok(mut w) => {
            let mut watching = 0;
            for dir in &dirs {
                if w.watch(dir, RecursiveMode::NonRecursive).is_ok() {
                    watching += 1;
                }
            }
            debug!(directories = watching, "Settings watcher started");
            (watching > 0).then_some(w)
        }
        Err(e) => {
            debug!(error = %e, "Settings watcher unavailable");
            None
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    theme: &Theme,
    settings_rx: mpsc::Receiver<()>,
) -> Result<()> {
    loop {
        terminal.draw(|f| {
            components::render(f, state, theme);
        })?;

        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key_event(key, state)?;
                }
                Event::Resize(width, height) => {
                    handle_event(AppEvent::Resize(width, height), state)?;
                }
                _ => {}
            }
        }

        state.check_background_tasks();
        state.tick_spinner();
        state.clear_expired_status_message();

        let mut settings_changed = false;
        while settings_rx.try_recv().is_ok() {
            settings_changed = true;
        }
        if settings_changed {
            state.refresh_scopes();
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}
