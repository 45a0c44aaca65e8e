//! Scope resolution across settings tiers.
//!
//! Each tier (user, project, local) has its own settings file holding an
//! `enabledPlugins` map. Resolution reads every file independently and
//! records what each tier says about each plugin, including explicit
//! `false` entries. Nothing is merged away: a plugin enabled at user scope
//! and disabled locally reports both facts.
//!
//! A missing or unreadable file is an ordinary state, not an error. That
//! tier just contributes nothing.

use crate::utils::paths::{local_settings_path, project_settings_path, user_settings_path};
use scopetui_plugin_interface::{PluginIdentity, ScopeTier};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Failure to read one settings source. Swallowed by [`ScopeResolver`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path} is not a settings object")]
    Shape { path: PathBuf },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    enabled_plugins: BTreeMap<String, serde_json::Value>,
}

/// Where each tier's settings file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsLocations {
    pub user: PathBuf,
    pub project: PathBuf,
    pub local: PathBuf,
}

impl SettingsLocations {
    pub fn new(working_dir: &Path, home_dir: &Path) -> Self {
        Self {
            user: user_settings_path(home_dir),
            project: project_settings_path(working_dir),
            local: local_settings_path(working_dir),
        }
    }

    pub fn path_for(&self, tier: ScopeTier) -> Option<&Path> {
        match tier {
            ScopeTier::None => None,
            ScopeTier::User => Some(&self.user),
            ScopeTier::Project => Some(&self.project),
            ScopeTier::Local => Some(&self.local),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeTier, &Path)> {
        ScopeTier::PERSISTED
            .into_iter()
            .filter_map(move |tier| self.path_for(tier).map(|path| (tier, path)))
    }
}

/// Plugin identity → tier → enabled, as declared by the settings sources.
///
/// Built wholesale by [`ScopeResolver::resolve`]; never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeState {
    entries: BTreeMap<PluginIdentity, BTreeMap<ScopeTier, bool>>,
}

impl ScopeState {
    pub fn get(&self, id: &PluginIdentity) -> Option<&BTreeMap<ScopeTier, bool>> {
        self.entries.get(id)
    }

    /// `Some(enabled)` when `tier` declares the plugin, `None` when it is absent there.
    pub fn tier(&self, id: &PluginIdentity, tier: ScopeTier) -> Option<bool> {
        self.entries.get(id).and_then(|tiers| tiers.get(&tier)).copied()
    }

    pub fn is_enabled_anywhere(&self, id: &PluginIdentity) -> bool {
        self.entries
            .get(id)
            .is_some_and(|tiers| tiers.values().any(|enabled| *enabled))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PluginIdentity, &BTreeMap<ScopeTier, bool>)> {
        self.entries.iter()
    }

    fn record(&mut self, id: PluginIdentity, tier: ScopeTier, enabled: bool) {
        self.entries.entry(id).or_default().insert(tier, enabled);
    }
}

/// Read the `enabledPlugins` map of one settings file.
///
/// Entries whose value is not a boolean are skipped.
pub fn read_settings(path: &Path) -> Result<BTreeMap<PluginIdentity, bool>, SettingsReadError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_error = |source: serde_json::Error| SettingsReadError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let value: serde_json::Value = serde_json::from_str(&content).map_err(parse_error)?;
    // Derived struct deserializers also accept arrays, so check the shape first.
    if !value.is_object() {
        return Err(SettingsReadError::Shape {
            path: path.to_path_buf(),
        });
    }
    let settings: SettingsFile = serde_json::from_value(value).map_err(parse_error)?;

    let mut plugins = BTreeMap::new();
    for (id, value) in settings.enabled_plugins {
        match value.as_bool() {
            Some(enabled) => {
                plugins.insert(PluginIdentity::new(id), enabled);
            }
            None => trace!(path = %path.display(), plugin = %id, "Skipping non-boolean enabledPlugins entry"),
        }
    }
    Ok(plugins)
}

pub struct ScopeResolver;

impl ScopeResolver {
    /// Resolve the per-tier state for a working directory and home directory.
    pub fn resolve(working_dir: &Path, home_dir: &Path) -> ScopeState {
        Self::resolve_locations(&SettingsLocations::new(working_dir, home_dir))
    }

    /// Resolve from explicit locations. Never fails.
    pub fn resolve_locations(locations: &SettingsLocations) -> ScopeState {
        let mut state = ScopeState::default();

        for (tier, path) in locations.iter() {
            // Running from the home directory makes the project file the user file.
            if tier == ScopeTier::Project && path == locations.user.as_path() {
                debug!(path = %path.display(), "Project settings coincide with user settings, skipping");
                continue;
            }

            match read_settings(path) {
                Ok(plugins) => {
                    debug!(scope = %tier, path = %path.display(), count = plugins.len(), "Read settings source");
                    for (id, enabled) in plugins {
                        state.record(id, tier, enabled);
                    }
                }
                Err(SettingsReadError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                    trace!(scope = %tier, path = %path.display(), "No settings source");
                }
                Err(e) => {
                    debug!(scope = %tier, error = %e, "Ignoring unreadable settings source");
                }
            }
        }

        state
    }
}
