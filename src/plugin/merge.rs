//! Merging of installed and available plugin records into display rows.
//!
//! The output is a flat list: for every marketplace (ordinal order) a header
//! row followed by that marketplace's plugins ordered by display name. The
//! merge is a pure function of its inputs, so reloading unchanged data
//! keeps every row at the same index.
//!
//! The available list is assumed to be a superset of the installed one.
//! [`merge`] relies on that and drops installed-only plugins;
//! [`merge_with_options`] can seed rows for them instead.

use scopetui_plugin_interface::{
    is_newer_version, AvailableRecord, InstalledRecord, PluginIdentity, ScopeTier,
};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Group name for identities without a marketplace segment.
pub const UNKNOWN_MARKETPLACE: &str = "(unknown)";

/// One plugin as shown in the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRow {
    pub id: PluginIdentity,
    pub name: String,
    pub marketplace: String,
    /// Installed version when installed, otherwise the advertised one.
    pub version: String,
    /// Version the marketplace advertises. Empty for installed-only rows.
    pub latest_version: String,
    pub description: String,
    pub author: String,
    pub source_path: Option<String>,
    pub install_count: Option<u64>,
    /// Most specific tier the plugin is installed at, `None` when not installed.
    pub scope: ScopeTier,
    pub enabled: bool,
    /// Installed but not advertised by any marketplace.
    pub orphaned: bool,
}

impl PluginRow {
    pub fn is_installed(&self) -> bool {
        self.scope.is_installed()
    }

    /// The marketplace advertises a newer version than the one installed.
    pub fn has_update(&self) -> bool {
        self.is_installed()
            && !self.latest_version.is_empty()
            && is_newer_version(&self.latest_version, &self.version).unwrap_or(false)
    }

    fn from_available(record: &AvailableRecord) -> Self {
        let name = if record.name.is_empty() {
            record.id.name().to_string()
        } else {
            record.name.clone()
        };
        let marketplace = if record.marketplace_name.is_empty() {
            marketplace_of(&record.id)
        } else {
            record.marketplace_name.clone()
        };

        Self {
            id: record.id.clone(),
            name,
            marketplace,
            version: record.version.clone(),
            latest_version: record.version.clone(),
            description: record.description.clone(),
            author: record.author_name().to_string(),
            source_path: record.source_path().map(str::to_string),
            install_count: record.install_count,
            scope: ScopeTier::None,
            enabled: false,
            orphaned: false,
        }
    }

    fn from_installed(record: &InstalledRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.id.name().to_string(),
            marketplace: marketplace_of(&record.id),
            version: record.version.clone(),
            latest_version: String::new(),
            description: String::new(),
            author: String::new(),
            source_path: None,
            install_count: None,
            scope: record.scope,
            enabled: record.enabled,
            orphaned: true,
        }
    }

    fn overlay(&mut self, record: &InstalledRecord) {
        self.scope = record.scope;
        self.enabled = record.enabled;
        if !record.version.is_empty() {
            self.version = record.version.clone();
        }
    }
}

fn marketplace_of(id: &PluginIdentity) -> String {
    id.marketplace().unwrap_or(UNKNOWN_MARKETPLACE).to_string()
}

/// A row of the merged list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayRow {
    /// Marketplace group header. Never selectable.
    Header { marketplace: String },
    Plugin(PluginRow),
}

impl DisplayRow {
    pub fn is_header(&self) -> bool {
        matches!(self, DisplayRow::Header { .. })
    }

    pub fn as_plugin(&self) -> Option<&PluginRow> {
        match self {
            DisplayRow::Plugin(row) => Some(row),
            DisplayRow::Header { .. } => None,
        }
    }

    pub fn identity(&self) -> Option<&PluginIdentity> {
        self.as_plugin().map(|row| &row.id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Seed rows for installed plugins missing from the available list.
    pub include_orphans: bool,
}

/// Merge with the available list treated as authoritative for membership.
pub fn merge(installed: &[InstalledRecord], available: &[AvailableRecord]) -> Vec<DisplayRow> {
    merge_with_options(installed, available, MergeOptions::default())
}

pub fn merge_with_options(
    installed: &[InstalledRecord],
    available: &[AvailableRecord],
    options: MergeOptions,
) -> Vec<DisplayRow> {
    // A plugin can be installed at several tiers; the row shows the most specific one.
    let mut installed_index: HashMap<&PluginIdentity, &InstalledRecord> = HashMap::new();
    for record in installed {
        installed_index
            .entry(&record.id)
            .and_modify(|current| {
                if record.scope > current.scope {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    let mut groups: BTreeMap<String, Vec<PluginRow>> = BTreeMap::new();
    let mut seen: HashSet<&PluginIdentity> = HashSet::new();

    for record in available {
        if !seen.insert(&record.id) {
            continue;
        }
        let mut row = PluginRow::from_available(record);
        if let Some(installed) = installed_index.get(&record.id) {
            row.overlay(installed);
        }
        groups.entry(row.marketplace.clone()).or_default().push(row);
    }

    if options.include_orphans {
        for (id, record) in &installed_index {
            if seen.contains(id) {
                continue;
            }
            let row = PluginRow::from_installed(record);
            groups.entry(row.marketplace.clone()).or_default().push(row);
        }
    }

    let mut rows = Vec::with_capacity(groups.len() + seen.len());
    for (marketplace, mut members) in groups {
        members.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        rows.push(DisplayRow::Header { marketplace });
        rows.extend(members.into_iter().map(DisplayRow::Plugin));
    }
    rows
}

/// Index of the first plugin row.
pub fn first_plugin_index(rows: &[DisplayRow]) -> Option<usize> {
    rows.iter().position(|row| !row.is_header())
}

/// Index of the row for `id`.
pub fn find_plugin(rows: &[DisplayRow], id: &PluginIdentity) -> Option<usize> {
    rows.iter().position(|row| row.identity() == Some(id))
}
