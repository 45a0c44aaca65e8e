use super::mode::Mode;
use super::navigation::NavigationController;
use crate::config::{AppInfo, Config};
use crate::plugin::merge::{find_plugin, merge_with_options, DisplayRow, MergeOptions, PluginRow};
use crate::plugin::pending::{installed_scopes, CommitReport, OrphanPolicy, PendingLedger};
use crate::plugin::scope::{ScopeResolver, ScopeState, SettingsLocations};
use scopetui_plugin_interface::{BackendError, PluginBackend, PluginIdentity, PluginListing, ScopeTier};
use std::sync::{mpsc, Arc};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Rows above and below the list viewport: status bar plus list borders.
const CHROME_HEIGHT: u16 = 3;

/// Output of one background load.
#[derive(Debug, Clone, Default)]
pub struct LoadedPlugins {
    pub listing: PluginListing,
    pub scopes: ScopeState,
}

pub type LoadResult = Result<LoadedPlugins, BackendError>;

pub struct AppState {
    pub mode: Mode,
    pub rows: Vec<DisplayRow>,
    pub scopes: ScopeState,
    pub ledger: PendingLedger,
    pub nav: NavigationController,
    /// Cause shown while in `Mode::Error`.
    pub load_error: Option<String>,
    /// Outcome of the most recent commit.
    pub last_report: Option<CommitReport>,
    pub status_message: Option<(String, Instant)>,
    pub should_quit: bool,
    pub show_help: bool,
    pub spinner_frame: usize,
    /// Number of intents in the commit currently running.
    pub applying: usize,
    pub terminal_width: u16,
    pub terminal_height: u16,
    pub app_info: AppInfo,
    backend: Arc<dyn PluginBackend>,
    locations: SettingsLocations,
    orphan_policy: OrphanPolicy,
    merge_options: MergeOptions,
    load_rx: Option<mpsc::Receiver<LoadResult>>,
    commit_rx: Option<mpsc::Receiver<CommitReport>>,
    has_loaded: bool,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn PluginBackend>,
        locations: SettingsLocations,
        config: &Config,
        app_info: AppInfo,
    ) -> Self {
        Self {
            mode: Mode::Main,
            rows: Vec::new(),
            scopes: ScopeState::default(),
            ledger: PendingLedger::new(),
            nav: NavigationController::default(),
            load_error: None,
            last_report: None,
            status_message: None,
            should_quit: false,
            show_help: false,
            spinner_frame: 0,
            applying: 0,
            terminal_width: 80,
            terminal_height: 24,
            app_info,
            backend,
            locations,
            orphan_policy: config.pending.orphan_policy,
            merge_options: MergeOptions {
                include_orphans: config.display.show_orphaned_installs,
            },
            load_rx: None,
            commit_rx: None,
            has_loaded: false,
        }
    }

    pub fn locations(&self) -> &SettingsLocations {
        &self.locations
    }

    pub fn orphan_policy(&self) -> OrphanPolicy {
        self.orphan_policy
    }

    pub fn is_loading(&self) -> bool {
        self.load_rx.is_some()
    }

    pub fn is_committing(&self) -> bool {
        self.commit_rx.is_some()
    }

    /// Query the backend and resolve scopes off the event loop.
    ///
    /// Calling this while a load is in flight replaces the pending receiver;
    /// the older result is discarded when it arrives.
    pub fn start_load(&mut self) {
        let (tx, rx) = mpsc::channel();
        self.load_rx = Some(rx);

        let backend = Arc::clone(&self.backend);
        let locations = self.locations.clone();
        std::thread::spawn(move || {
            let result = backend.list_plugins(true).map(|listing| LoadedPlugins {
                listing,
                scopes: ScopeResolver::resolve_locations(&locations),
            });
            let _ = tx.send(result);
        });
        debug!("Plugin load started");
    }

    /// Poll background work (non-blocking).
    pub fn check_background_tasks(&mut self) {
        self.check_load();
        self.check_commit();
    }

    fn check_load(&mut self) {
        if let Some(rx) = &self.load_rx {
            match rx.try_recv() {
                Ok(result) => {
                    self.load_rx = None;
                    self.apply_loaded(result);
                }
                Err(mpsc::TryRecvError::Empty) => {}
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.load_rx = None;
                    self.apply_loaded(Err(BackendError::Malformed(
                        "plugin load thread crashed".to_string(),
                    )));
                }
            }
        }
    }

    fn check_commit(&mut self) {
        if let Some(rx) = &self.commit_rx {
            match rx.try_recv() {
                Ok(report) => {
                    self.commit_rx = None;
                    self.finish_commit(report);
                }
                Err(mpsc::TryRecvError::Empty) => {}
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.commit_rx = None;
                    self.applying = 0;
                    self.mode = Mode::Main;
                    self.set_status_message("Commit thread crashed".to_string());
                    self.start_load();
                }
            }
        }
    }

    /// Swap in a completed load.
    ///
    /// Rows and scopes are replaced wholesale. Staged intents survive and are
    /// reconciled against the new rows with the configured orphan policy.
    pub fn apply_loaded(&mut self, result: LoadResult) {
        let loaded = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, "Plugin load failed");
                self.rows.clear();
                self.scopes = ScopeState::default();
                self.nav.reclamp(&self.rows);
                self.load_error = Some(e.to_string());
                self.mode = Mode::Error;
                return;
            }
        };

        let previous = self.selected_row().map(|row| row.id.clone());
        let rows = merge_with_options(
            &loaded.listing.installed,
            &loaded.listing.available,
            self.merge_options,
        );
        self.rows = rows;
        self.scopes = loaded.scopes;

        let carried = previous
            .and_then(|id| find_plugin(&self.rows, &id))
            .is_some_and(|index| self.nav.select(index, &self.rows));
        if !carried {
            if self.has_loaded {
                self.nav.reclamp(&self.rows);
            } else {
                self.nav.move_to_start(&self.rows);
            }
        }
        self.has_loaded = true;

        let reconciliation = self.ledger.reconcile(&self.rows, self.orphan_policy);
        if !reconciliation.is_clean() {
            let count = reconciliation.orphans.len();
            let message = match self.orphan_policy {
                OrphanPolicy::Drop => format!("Dropped {count} staged change(s) for vanished plugins"),
                OrphanPolicy::Warn => format!("{count} staged change(s) refer to vanished plugins"),
                OrphanPolicy::Block => {
                    format!("{count} staged change(s) refer to vanished plugins; Esc to clear")
                }
            };
            self.set_status_message(message);
        }

        self.load_error = None;
        if self.mode == Mode::Error {
            self.mode = Mode::Main;
        }
        info!(
            rows = self.rows.len(),
            staged = self.ledger.len(),
            "Plugins loaded"
        );
    }

    /// Re-read the settings files after one changed on disk.
    pub fn refresh_scopes(&mut self) {
        self.scopes = ScopeResolver::resolve_locations(&self.locations);
        debug!(plugins = self.scopes.len(), "Settings scopes refreshed");
    }

    pub fn selected_row(&self) -> Option<&PluginRow> {
        self.rows.get(self.nav.selected()).and_then(DisplayRow::as_plugin)
    }

    /// Staged tier if any, otherwise the installed one.
    pub fn effective_scope(&self, row: &PluginRow) -> ScopeTier {
        self.ledger.get(&row.id).unwrap_or(row.scope)
    }

    /// Staged intents whose plugin is not in the current rows.
    pub fn orphaned_intents(&self) -> Vec<PluginIdentity> {
        self.ledger.orphans(&self.rows)
    }

    pub fn stage_selected(&mut self, tier: ScopeTier) -> bool {
        let Some(id) = self.selected_row().map(|row| row.id.clone()) else {
            return false;
        };
        self.ledger.stage(id, tier);
        true
    }

    /// Flip the selected plugin between Project and Local.
    pub fn toggle_selected(&mut self) -> bool {
        let Some(row) = self.selected_row() else {
            return false;
        };
        let target = match self.effective_scope(row) {
            ScopeTier::Local => ScopeTier::Project,
            _ => ScopeTier::Local,
        };
        self.stage_selected(target)
    }

    pub fn clear_selected(&mut self) -> bool {
        let Some(id) = self.selected_row().map(|row| row.id.clone()) else {
            return false;
        };
        self.ledger.clear(&id).is_some()
    }

    pub fn cancel_all(&mut self) {
        if !self.ledger.is_empty() {
            self.ledger.clear_all();
            self.set_status_message("Staged changes discarded".to_string());
        }
    }

    /// Hand the ledger to a background commit. Returns false when refused.
    pub fn start_commit(&mut self) -> bool {
        if self.ledger.is_empty() {
            self.set_status_message("Nothing staged".to_string());
            return false;
        }
        if self.is_loading() {
            self.set_status_message("Still loading, try again shortly".to_string());
            return false;
        }
        if self.orphan_policy == OrphanPolicy::Block {
            let orphans = self.orphaned_intents();
            if !orphans.is_empty() {
                self.set_status_message(format!(
                    "Commit blocked: {} staged change(s) refer to vanished plugins",
                    orphans.len()
                ));
                return false;
            }
        }

        let mut ledger = std::mem::take(&mut self.ledger);
        let installed = installed_scopes(&self.rows);
        self.applying = ledger.len();
        self.mode = Mode::Progress;

        let (tx, rx) = mpsc::channel();
        self.commit_rx = Some(rx);
        let backend = Arc::clone(&self.backend);
        std::thread::spawn(move || {
            let report = ledger.commit(backend.as_ref(), &installed);
            let _ = tx.send(report);
        });
        info!(intents = self.applying, "Commit started");
        true
    }

    /// Leave `Progress`, keep the report for display, and reload.
    pub fn finish_commit(&mut self, report: CommitReport) {
        self.applying = 0;
        if self.mode == Mode::Progress {
            self.mode = Mode::Main;
        }
        let message = if report.has_failures() {
            format!("Commit finished with failures: {report}")
        } else {
            format!("Commit finished: {report}")
        };
        self.set_status_message(message);
        self.last_report = Some(report);
        self.start_load();
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.terminal_width = width;
        self.terminal_height = height;
        let page = height.saturating_sub(CHROME_HEIGHT) as usize;
        self.nav.set_page_size(page, self.rows.len());
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    pub fn clear_expired_status_message(&mut self) {
        if let Some((_, time)) = &self.status_message
            && time.elapsed().as_secs() > 3
        {
            self.status_message = None;
        }
    }

    pub fn tick_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % 8;
    }

    pub fn get_spinner_char(&self) -> char {
        const SPINNER_FRAMES: [char; 8] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧'];
        SPINNER_FRAMES[self.spinner_frame]
    }

    /// Block until every background task has reported back.
    #[cfg(test)]
    pub(crate) fn wait_for_background(&mut self) {
        let deadline = Instant::now() + std::time::Duration::from_secs(5);
        while (self.is_loading() || self.is_committing()) && Instant::now() < deadline {
            self.check_background_tasks();
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::plugin::merge::tests::{available, installed};
    use crate::plugin::pending::CommitOutcome;
    use crate::plugin::testing::{BackendCall, MockBackend, Op};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    pub(crate) fn sample_listing() -> PluginListing {
        PluginListing {
            installed: vec![installed("lint@tools", ScopeTier::Project, true)],
            available: vec![
                available("lint@tools", "lint", "tools"),
                available("fmt@tools", "fmt", "tools"),
                available("docs@writing", "docs", "writing"),
            ],
        }
    }

    pub(crate) fn state_with(
        backend: Arc<MockBackend>,
        config: &Config,
        dir: &TempDir,
    ) -> AppState {
        let locations = SettingsLocations::new(&dir.path().join("work"), &dir.path().join("home"));
        AppState::new(backend, locations, config, AppInfo::from_build())
    }

    pub(crate) fn loaded_state(listing: PluginListing) -> (AppState, Arc<MockBackend>, TempDir) {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(MockBackend::new(listing));
        let mut state = state_with(Arc::clone(&backend), &Config::default(), &dir);
        state.start_load();
        state.wait_for_background();
        (state, backend, dir)
    }

    fn select(state: &mut AppState, raw: &str) {
        let index = find_plugin(&state.rows, &PluginIdentity::new(raw)).unwrap();
        assert!(state.nav.select(index, &state.rows));
    }

    #[test]
    fn test_first_load_selects_first_plugin() {
        let (state, backend, _dir) = loaded_state(sample_listing());

        assert_eq!(state.mode, Mode::Main);
        // [tools] fmt lint [writing] docs
        assert_eq!(state.rows.len(), 5);
        assert_eq!(state.nav.selected(), 1);
        assert_eq!(state.selected_row().unwrap().id.as_str(), "fmt@tools");
        assert_eq!(backend.calls(), vec![BackendCall::List(true)]);
    }

    #[test]
    fn test_load_resolves_settings_scopes() {
        let dir = TempDir::new().unwrap();
        let settings_dir = dir.path().join("work").join(".claude");
        fs::create_dir_all(&settings_dir).unwrap();
        fs::write(
            settings_dir.join("settings.local.json"),
            r#"{"enabledPlugins": {"lint@tools": false}}"#,
        )
        .unwrap();

        let backend = Arc::new(MockBackend::new(sample_listing()));
        let mut state = state_with(backend, &Config::default(), &dir);
        state.start_load();
        state.wait_for_background();

        assert_eq!(
            state.scopes.tier(&PluginIdentity::new("lint@tools"), ScopeTier::Local),
            Some(false)
        );
    }

    #[test]
    fn test_load_failure_enters_error_mode() {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(MockBackend::new(sample_listing()));
        backend.fail_list(BackendError::Malformed("not json".to_string()));
        let mut state = state_with(Arc::clone(&backend), &Config::default(), &dir);
        state.start_load();
        state.wait_for_background();

        assert_eq!(state.mode, Mode::Error);
        assert!(state.rows.is_empty());
        assert!(state.load_error.as_deref().unwrap().contains("not json"));
    }

    #[test]
    fn test_successful_reload_leaves_error_mode() {
        let mut state = loaded_state(sample_listing()).0;
        state.apply_loaded(Err(BackendError::Malformed("boom".to_string())));
        assert_eq!(state.mode, Mode::Error);

        state.apply_loaded(Ok(LoadedPlugins {
            listing: sample_listing(),
            scopes: ScopeState::default(),
        }));
        assert_eq!(state.mode, Mode::Main);
        assert_eq!(state.load_error, None);
        assert!(state.selected_row().is_some());
    }

    #[test]
    fn test_reload_keeps_selection_and_ledger() {
        let (mut state, _backend, _dir) = loaded_state(sample_listing());
        select(&mut state, "docs@writing");
        state.stage_selected(ScopeTier::User);

        let mut listing = sample_listing();
        listing.available.push(available("aaa@tools", "aaa", "tools"));
        state.apply_loaded(Ok(LoadedPlugins {
            listing,
            scopes: ScopeState::default(),
        }));

        assert_eq!(state.selected_row().unwrap().id.as_str(), "docs@writing");
        assert_eq!(
            state.ledger.get(&PluginIdentity::new("docs@writing")),
            Some(ScopeTier::User)
        );
    }

    #[test]
    fn test_reload_reclamps_when_selection_vanishes() {
        let (mut state, _backend, _dir) = loaded_state(sample_listing());
        select(&mut state, "docs@writing");

        let mut listing = sample_listing();
        listing.available.pop();
        state.apply_loaded(Ok(LoadedPlugins {
            listing,
            scopes: ScopeState::default(),
        }));

        assert_eq!(state.rows.len(), 3);
        assert_eq!(state.selected_row().unwrap().id.as_str(), "lint@tools");
    }

    fn vanish_docs(state: &mut AppState) {
        let mut listing = sample_listing();
        listing.available.pop();
        state.apply_loaded(Ok(LoadedPlugins {
            listing,
            scopes: ScopeState::default(),
        }));
    }

    fn orphan_state(policy: OrphanPolicy) -> (AppState, Arc<MockBackend>, TempDir) {
        let dir = TempDir::new().unwrap();
        let backend = Arc::new(MockBackend::new(sample_listing()));
        let mut config = Config::default();
        config.pending.orphan_policy = policy;
        let mut state = state_with(Arc::clone(&backend), &config, &dir);
        state.start_load();
        state.wait_for_background();

        select(&mut state, "docs@writing");
        state.stage_selected(ScopeTier::User);
        select(&mut state, "fmt@tools");
        state.stage_selected(ScopeTier::Local);
        vanish_docs(&mut state);
        (state, backend, dir)
    }

    #[test]
    fn test_orphan_policy_drop() {
        let (mut state, backend, _dir) = orphan_state(OrphanPolicy::Drop);
        assert_eq!(state.ledger.len(), 1);
        assert!(state.orphaned_intents().is_empty());

        assert!(state.start_commit());
        state.wait_for_background();
        assert_eq!(
            backend.mutations(),
            vec![BackendCall::Install(PluginIdentity::new("fmt@tools"), ScopeTier::Local)]
        );
    }

    #[test]
    fn test_orphan_policy_warn() {
        let (mut state, backend, _dir) = orphan_state(OrphanPolicy::Warn);
        assert_eq!(state.ledger.len(), 2);
        assert_eq!(state.orphaned_intents(), vec![PluginIdentity::new("docs@writing")]);
        assert!(state.status_message.is_some());

        assert!(state.start_commit());
        state.wait_for_background();
        assert_eq!(backend.mutations().len(), 2);
    }

    #[test]
    fn test_orphan_policy_block() {
        let (mut state, backend, _dir) = orphan_state(OrphanPolicy::Block);
        assert!(!state.start_commit());
        assert_eq!(state.mode, Mode::Main);
        assert_eq!(state.ledger.len(), 2);

        state.cancel_all();
        select(&mut state, "fmt@tools");
        state.stage_selected(ScopeTier::Local);
        assert!(state.start_commit());
        state.wait_for_background();
        assert_eq!(backend.mutations().len(), 1);
    }

    #[test]
    fn test_commit_round_trip() {
        let (mut state, backend, _dir) = loaded_state(sample_listing());
        select(&mut state, "fmt@tools");
        state.stage_selected(ScopeTier::User);
        select(&mut state, "lint@tools");
        state.stage_selected(ScopeTier::None);

        assert!(state.start_commit());
        assert_eq!(state.mode, Mode::Progress);
        assert_eq!(state.applying, 2);
        assert!(state.ledger.is_empty());

        state.wait_for_background();
        assert_eq!(state.mode, Mode::Main);
        assert_eq!(state.applying, 0);
        assert_eq!(
            backend.mutations(),
            vec![
                BackendCall::Install(PluginIdentity::new("fmt@tools"), ScopeTier::User),
                BackendCall::Uninstall(PluginIdentity::new("lint@tools"), ScopeTier::Project),
            ]
        );

        // reloaded after the commit
        let fmt = find_plugin(&state.rows, &PluginIdentity::new("fmt@tools")).unwrap();
        assert_eq!(state.rows[fmt].as_plugin().unwrap().scope, ScopeTier::User);
        let lint = find_plugin(&state.rows, &PluginIdentity::new("lint@tools")).unwrap();
        assert_eq!(state.rows[lint].as_plugin().unwrap().scope, ScopeTier::None);

        let installed: Vec<(String, ScopeTier)> = backend
            .listing()
            .installed
            .iter()
            .map(|record| (record.id.as_str().to_string(), record.scope))
            .collect();
        assert_eq!(installed, vec![("fmt@tools".to_string(), ScopeTier::User)]);
    }

    #[test]
    fn test_commit_partial_failure_is_reported() {
        let (mut state, backend, _dir) = loaded_state(sample_listing());
        backend.fail(Op::Install, "fmt@tools");
        select(&mut state, "fmt@tools");
        state.stage_selected(ScopeTier::User);
        select(&mut state, "docs@writing");
        state.stage_selected(ScopeTier::Project);

        state.start_commit();
        state.wait_for_background();

        let report = state.last_report.as_ref().unwrap();
        assert!(report.has_failures());
        assert_eq!(report.applied().count(), 1);
        let failed: Vec<_> = report.failures().map(|(id, _)| id.as_str()).collect();
        assert_eq!(failed, vec!["fmt@tools"]);
        assert_eq!(state.mode, Mode::Main);
        assert!(state.ledger.is_empty());
    }

    #[test]
    fn test_commit_skips_current_tier() {
        let (mut state, backend, _dir) = loaded_state(sample_listing());
        select(&mut state, "lint@tools");
        state.stage_selected(ScopeTier::Project);

        state.start_commit();
        state.wait_for_background();

        assert!(backend.mutations().is_empty());
        let report = state.last_report.as_ref().unwrap();
        assert_eq!(report.entries[0].outcome, CommitOutcome::Skipped);
    }

    #[test]
    fn test_commit_with_empty_ledger_is_refused() {
        let (mut state, _backend, _dir) = loaded_state(sample_listing());
        assert!(!state.start_commit());
        assert_eq!(state.mode, Mode::Main);
    }

    #[test]
    fn test_toggle_between_project_and_local() {
        let (mut state, _backend, _dir) = loaded_state(sample_listing());
        select(&mut state, "lint@tools");
        let id = PluginIdentity::new("lint@tools");

        state.toggle_selected();
        assert_eq!(state.ledger.get(&id), Some(ScopeTier::Local));
        state.toggle_selected();
        assert_eq!(state.ledger.get(&id), Some(ScopeTier::Project));

        assert!(state.clear_selected());
        assert!(!state.clear_selected());
        assert_eq!(state.ledger.get(&id), None);
    }

    #[test]
    fn test_resize_sets_page_size() {
        let (mut state, _backend, _dir) = loaded_state(sample_listing());
        state.resize(100, 10);
        assert_eq!(state.nav.page_size(), 7);
        assert_eq!((state.terminal_width, state.terminal_height), (100, 10));

        state.resize(100, 2);
        assert_eq!(state.nav.page_size(), 1);
    }

    #[test]
    fn test_refresh_scopes_rereads_settings() {
        let (mut state, _backend, dir) = loaded_state(sample_listing());
        assert!(state.scopes.is_empty());

        let home_settings = dir.path().join("home").join(".claude");
        fs::create_dir_all(&home_settings).unwrap();
        fs::write(
            home_settings.join("settings.json"),
            r#"{"enabledPlugins": {"fmt@tools": true}}"#,
        )
        .unwrap();

        state.refresh_scopes();
        assert_eq!(
            state.scopes.tier(&PluginIdentity::new("fmt@tools"), ScopeTier::User),
            Some(true)
        );
    }
}
