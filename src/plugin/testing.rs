//! In-memory backend used by the crate's tests.

use scopetui_plugin_interface::{
    BackendError, InstalledRecord, PluginBackend, PluginIdentity, PluginListing, ScopeTier,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Install,
    Uninstall,
    Disable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    List(bool),
    Install(PluginIdentity, ScopeTier),
    Uninstall(PluginIdentity, ScopeTier),
    Disable(PluginIdentity, ScopeTier),
}

#[derive(Default)]
struct MockState {
    listing: PluginListing,
    calls: Vec<BackendCall>,
    failing: HashSet<(Op, PluginIdentity)>,
    list_error: Option<BackendError>,
}

/// Stateful fake: installs and uninstalls mutate the listing it reports.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new(listing: PluginListing) -> Self {
        Self {
            state: Mutex::new(MockState {
                listing,
                ..MockState::default()
            }),
        }
    }

    pub fn fail(&self, op: Op, id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert((op, PluginIdentity::new(id)));
    }

    pub fn fail_list(&self, error: BackendError) {
        self.state.lock().unwrap().list_error = Some(error);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls other than listing.
    pub fn mutations(&self) -> Vec<BackendCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, BackendCall::List(_)))
            .collect()
    }

    pub fn listing(&self) -> PluginListing {
        self.state.lock().unwrap().listing.clone()
    }

    fn check(state: &MockState, op: Op, id: &PluginIdentity) -> Result<(), BackendError> {
        if state.failing.contains(&(op, id.clone())) {
            return Err(BackendError::Rejected(format!("{op:?} refused for {id}")));
        }
        Ok(())
    }
}

impl PluginBackend for MockBackend {
    fn list_plugins(&self, include_available: bool) -> Result<PluginListing, BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(BackendCall::List(include_available));
        if let Some(error) = &state.list_error {
            return Err(error.clone());
        }
        let mut listing = state.listing.clone();
        if !include_available {
            listing.available.clear();
        }
        Ok(listing)
    }

    fn install_plugin(&self, id: &PluginIdentity, scope: ScopeTier) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(BackendCall::Install(id.clone(), scope));
        Self::check(&state, Op::Install, id)?;
        state
            .listing
            .installed
            .retain(|record| !(&record.id == id && record.scope == scope));
        state.listing.installed.push(InstalledRecord {
            id: id.clone(),
            version: "1.0.0".to_string(),
            install_path: PathBuf::from("/plugins").join(id.as_str()),
            installed_at: None,
            last_updated: None,
            scope,
            enabled: true,
            project_path: None,
        });
        Ok(())
    }

    fn uninstall_plugin(&self, id: &PluginIdentity, scope: ScopeTier) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(BackendCall::Uninstall(id.clone(), scope));
        Self::check(&state, Op::Uninstall, id)?;
        state
            .listing
            .installed
            .retain(|record| !(&record.id == id && record.scope == scope));
        Ok(())
    }

    fn disable_plugin(&self, id: &PluginIdentity, scope: ScopeTier) -> Result<(), BackendError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(BackendCall::Disable(id.clone(), scope));
        Self::check(&state, Op::Disable, id)?;
        for record in state.listing.installed.iter_mut() {
            if &record.id == id && record.scope == scope {
                record.enabled = false;
            }
        }
        Ok(())
    }
}
