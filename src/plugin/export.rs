//! Export and import of the installed plugin set.
//!
//! The file is versioned JSON:
//!
//! ```json
//! { "version": 1, "plugins": [ { "id": "lint@tools", "scope": "user", "enabled": true } ] }
//! ```
//!
//! Readers reject any version other than [`EXPORT_VERSION`] before looking
//! at the rest of the document.

use scopetui_plugin_interface::{BackendError, PluginBackend, PluginIdentity, PluginListing, ScopeTier};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid export file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported export version {found} (expected {})", EXPORT_VERSION)]
    UnsupportedVersion { found: serde_json::Value },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedPlugin {
    pub id: PluginIdentity,
    pub scope: ScopeTier,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFile {
    pub version: u32,
    pub plugins: Vec<ExportedPlugin>,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: serde_json::Value,
}

impl ExportFile {
    /// One entry per installation, ordered by identity then tier.
    pub fn from_listing(listing: &PluginListing) -> Self {
        let mut plugins: Vec<ExportedPlugin> = listing
            .installed
            .iter()
            .map(|record| ExportedPlugin {
                id: record.id.clone(),
                scope: record.scope,
                enabled: record.enabled,
            })
            .collect();
        plugins.sort_by(|a, b| a.id.cmp(&b.id).then(a.scope.cmp(&b.scope)));

        Self {
            version: EXPORT_VERSION,
            plugins,
        }
    }

    pub fn parse(content: &str) -> Result<Self, ExportError> {
        let probe: VersionProbe = serde_json::from_str(content)?;
        if probe.version.as_u64() != Some(u64::from(EXPORT_VERSION)) {
            return Err(ExportError::UnsupportedVersion {
                found: probe.version,
            });
        }
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn read(path: &Path) -> Result<Self, ExportError> {
        let content = fs::read_to_string(path).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn write(&self, path: &Path) -> Result<(), ExportError> {
        let content = self.to_json()?;
        fs::write(path, content).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Query the backend and write its installed set to `path`.
pub fn export_to_path(backend: &dyn PluginBackend, path: &Path) -> Result<ExportFile, ExportError> {
    let listing = backend.list_plugins(false)?;
    let file = ExportFile::from_listing(&listing);
    file.write(path)?;
    info!(path = %path.display(), count = file.plugins.len(), "Exported plugins");
    Ok(file)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// Installed. A failed follow-up disable is recorded but does not undo the install.
    Installed { disable_error: Option<BackendError> },
    /// Already installed at some tier.
    Skipped,
    Failed(BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    pub id: PluginIdentity,
    pub scope: ScopeTier,
    pub outcome: ImportOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub entries: Vec<ImportEntry>,
}

impl ImportReport {
    pub fn installed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, ImportOutcome::Installed { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome == ImportOutcome::Skipped)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, ImportOutcome::Failed(_)))
            .count()
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} installed, {} skipped, {} failed",
            self.installed_count(),
            self.skipped_count(),
            self.failed_count()
        )
    }
}

/// Install every exported plugin that is not installed yet.
pub fn import(backend: &dyn PluginBackend, file: &ExportFile) -> Result<ImportReport, ExportError> {
    let listing = backend.list_plugins(false)?;
    let mut present: HashSet<PluginIdentity> =
        listing.installed.iter().map(|record| record.id.clone()).collect();
    let mut report = ImportReport::default();

    for plugin in &file.plugins {
        let outcome = if present.contains(&plugin.id) {
            ImportOutcome::Skipped
        } else if !plugin.scope.is_installed() {
            ImportOutcome::Failed(BackendError::Rejected(format!(
                "{} has no installation scope",
                plugin.id
            )))
        } else {
            match backend.install_plugin(&plugin.id, plugin.scope) {
                Ok(()) => {
                    present.insert(plugin.id.clone());
                    let disable_error = if plugin.enabled {
                        None
                    } else {
                        backend.disable_plugin(&plugin.id, plugin.scope).err()
                    };
                    if let Some(e) = &disable_error {
                        warn!(plugin = %plugin.id, error = %e, "Installed but could not disable");
                    }
                    ImportOutcome::Installed { disable_error }
                }
                Err(e) => {
                    warn!(plugin = %plugin.id, error = %e, "Import install failed");
                    ImportOutcome::Failed(e)
                }
            }
        };

        report.entries.push(ImportEntry {
            id: plugin.id.clone(),
            scope: plugin.scope,
            outcome,
        });
    }

    info!(summary = %report, "Import finished");
    Ok(report)
}
