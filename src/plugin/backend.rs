//! Backend that shells out to the plugin CLI.
//!
//! Commands issued, with `<cmd>` taken from the config:
//!
//! ```text
//! <cmd> plugin list --json [--available]
//! <cmd> plugin install <id> --scope <tier>
//! <cmd> plugin uninstall <id> --scope <tier>
//! <cmd> plugin disable <id> --scope <tier>
//! ```

use scopetui_plugin_interface::{
    BackendError, InstalledRecord, PluginBackend, PluginIdentity, PluginListing, ScopeTier,
};
use serde::Deserialize;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

/// `plugin list --json` prints either the full listing or, without
/// `--available`, a bare array of installations.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListOutput {
    InstalledOnly(Vec<InstalledRecord>),
    Full(PluginListing),
}

/// Parse the stdout of `plugin list --json`.
pub fn parse_listing(stdout: &str) -> Result<PluginListing, BackendError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(BackendError::Malformed("empty output".to_string()));
    }

    match serde_json::from_str::<ListOutput>(trimmed) {
        Ok(ListOutput::Full(listing)) => Ok(listing),
        Ok(ListOutput::InstalledOnly(installed)) => Ok(PluginListing {
            installed,
            available: Vec::new(),
        }),
        Err(e) => {
            let preview: String = trimmed.chars().take(200).collect();
            debug!(content_preview = %preview, "Unparseable plugin listing");
            Err(BackendError::Malformed(e.to_string()))
        }
    }
}

pub struct CliBackend {
    command: String,
}

impl CliBackend {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn run(&self, args: &[&str]) -> Result<String, BackendError> {
        let rendered = format!("{} {}", self.command, args.join(" "));
        debug!(command = %rendered, "Running backend command");

        let output = Command::new(&self.command)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| BackendError::Spawn {
                command: rendered.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(command = %rendered, code = ?output.status.code(), stderr = %stderr, "Backend command failed");
            return Err(BackendError::Exit {
                command: rendered,
                code: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run_scoped(
        &self,
        action: &str,
        id: &PluginIdentity,
        scope: ScopeTier,
    ) -> Result<(), BackendError> {
        if !scope.is_installed() {
            return Err(BackendError::Rejected(format!(
                "cannot {action} {id} without a scope"
            )));
        }
        self.run(&["plugin", action, id.as_str(), "--scope", scope.as_str()])
            .map(|_| ())
    }
}

impl PluginBackend for CliBackend {
    fn list_plugins(&self, include_available: bool) -> Result<PluginListing, BackendError> {
        let mut args = vec!["plugin", "list", "--json"];
        if include_available {
            args.push("--available");
        }
        let stdout = self.run(&args)?;
        let listing = parse_listing(&stdout)?;
        debug!(
            installed = listing.installed.len(),
            available = listing.available.len(),
            "Parsed plugin listing"
        );
        Ok(listing)
    }

    fn install_plugin(&self, id: &PluginIdentity, scope: ScopeTier) -> Result<(), BackendError> {
        self.run_scoped("install", id, scope)
    }

    fn uninstall_plugin(&self, id: &PluginIdentity, scope: ScopeTier) -> Result<(), BackendError> {
        self.run_scoped("uninstall", id, scope)
    }

    fn disable_plugin(&self, id: &PluginIdentity, scope: ScopeTier) -> Result<(), BackendError> {
        self.run_scoped("disable", id, scope)
    }
}
