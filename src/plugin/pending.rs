//! Staged scope changes and their batch application.
//!
//! The ledger holds at most one intent per plugin: the tier the operator
//! wants it at, with [`ScopeTier::None`] meaning "uninstall". Nothing
//! touches the backend until [`PendingLedger::commit`], which attempts every
//! intent, reports each outcome, and always leaves the ledger empty.

use crate::plugin::merge::DisplayRow;
use scopetui_plugin_interface::{BackendError, PluginBackend, PluginIdentity, ScopeTier};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::{debug, info, warn};

/// Installed tier per plugin, as displayed when the commit starts.
pub type InstalledScopes = HashMap<PluginIdentity, ScopeTier>;

/// Snapshot of the installed tier of every plugin row.
pub fn installed_scopes(rows: &[DisplayRow]) -> InstalledScopes {
    rows.iter()
        .filter_map(DisplayRow::as_plugin)
        .map(|row| (row.id.clone(), row.scope))
        .collect()
}

/// Handling of staged intents whose plugin disappeared after a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    /// Remove them silently.
    Drop,
    /// Keep them and tell the operator.
    #[default]
    Warn,
    /// Keep them and refuse to commit until they are cleared.
    Block,
}

/// What a reload did to the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub orphans: Vec<PluginIdentity>,
    pub dropped: bool,
}

impl Reconciliation {
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    /// Already at the requested tier; no backend call was made.
    Skipped,
    Failed(BackendError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    pub id: PluginIdentity,
    pub target: ScopeTier,
    pub outcome: CommitOutcome,
}

/// Per-plugin result of a commit pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub entries: Vec<CommitEntry>,
}

impl CommitReport {
    pub fn applied(&self) -> impl Iterator<Item = &PluginIdentity> {
        self.entries
            .iter()
            .filter(|e| e.outcome == CommitOutcome::Applied)
            .map(|e| &e.id)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &PluginIdentity> {
        self.entries
            .iter()
            .filter(|e| e.outcome == CommitOutcome::Skipped)
            .map(|e| &e.id)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&PluginIdentity, &BackendError)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            CommitOutcome::Failed(err) => Some((&e.id, err)),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for CommitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} applied, {} skipped, {} failed",
            self.applied().count(),
            self.skipped().count(),
            self.failures().count()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingLedger {
    intents: BTreeMap<PluginIdentity, ScopeTier>,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the desired tier for `id`, replacing any earlier intent.
    pub fn stage(&mut self, id: PluginIdentity, tier: ScopeTier) {
        debug!(plugin = %id, scope = %tier, "Staged scope change");
        self.intents.insert(id, tier);
    }

    pub fn clear(&mut self, id: &PluginIdentity) -> Option<ScopeTier> {
        self.intents.remove(id)
    }

    pub fn clear_all(&mut self) {
        self.intents.clear();
    }

    pub fn get(&self, id: &PluginIdentity) -> Option<ScopeTier> {
        self.intents.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PluginIdentity, ScopeTier)> {
        self.intents.iter().map(|(id, tier)| (id, *tier))
    }

    /// Staged identities with no plugin row in `rows`.
    pub fn orphans(&self, rows: &[DisplayRow]) -> Vec<PluginIdentity> {
        let present: HashSet<&PluginIdentity> = rows.iter().filter_map(DisplayRow::identity).collect();
        self.intents
            .keys()
            .filter(|id| !present.contains(id))
            .cloned()
            .collect()
    }

    /// Apply `policy` to intents orphaned by a reload.
    pub fn reconcile(&mut self, rows: &[DisplayRow], policy: OrphanPolicy) -> Reconciliation {
        let orphans = self.orphans(rows);
        if orphans.is_empty() {
            return Reconciliation::default();
        }

        let dropped = policy == OrphanPolicy::Drop;
        if dropped {
            for id in &orphans {
                self.intents.remove(id);
            }
            debug!(count = orphans.len(), "Dropped staged changes for vanished plugins");
        } else {
            warn!(count = orphans.len(), policy = ?policy, "Staged changes reference vanished plugins");
        }

        Reconciliation { orphans, dropped }
    }

    /// Apply every intent against `backend`.
    ///
    /// Intents run in identity order. A failure never stops the pass. The
    /// ledger is empty afterwards whatever the outcomes.
    pub fn commit(
        &mut self,
        backend: &dyn PluginBackend,
        installed: &InstalledScopes,
    ) -> CommitReport {
        let intents = std::mem::take(&mut self.intents);
        let mut report = CommitReport::default();

        for (id, target) in intents {
            let current = installed.get(&id).copied().unwrap_or_default();

            let outcome = if target == current {
                CommitOutcome::Skipped
            } else {
                let result = if target == ScopeTier::None {
                    backend.uninstall_plugin(&id, current)
                } else {
                    backend.install_plugin(&id, target)
                };
                match result {
                    Ok(()) => CommitOutcome::Applied,
                    Err(e) => {
                        warn!(plugin = %id, scope = %target, error = %e, "Staged change failed");
                        CommitOutcome::Failed(e)
                    }
                }
            };

            report.entries.push(CommitEntry {
                id,
                target,
                outcome,
            });
        }

        info!(summary = %report, "Commit finished");
        report
    }
}
