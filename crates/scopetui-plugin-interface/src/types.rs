//! Plugin records and identifiers shared with the backend.
//!
//! All wire shapes use camelCase keys, matching the JSON emitted by the
//! plugin CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Unique `<name>@<marketplace>` key for a plugin.
///
/// The marketplace is everything after the *last* `@`, so names such as
/// `@scope/tool@market` keep their leading `@`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginIdentity(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("plugin id '{0}' must have the form <name>@<marketplace>")]
    MissingMarketplace(String),
    #[error("plugin id '{0}' has an empty name")]
    EmptyName(String),
}

impl PluginIdentity {
    /// Wrap a raw id without validation. Ids coming back from the backend go
    /// through here so a single odd entry never poisons a whole listing.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Validating constructor for ids typed by a user.
    pub fn parse(raw: &str) -> Result<Self, IdentityError> {
        let id = Self::new(raw.trim());
        match id.split() {
            (_, None) => Err(IdentityError::MissingMarketplace(raw.to_string())),
            ("", Some(_)) => Err(IdentityError::EmptyName(raw.to_string())),
            _ => Ok(id),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name segment. Falls back to the whole id when there is no marketplace.
    pub fn name(&self) -> &str {
        self.split().0
    }

    pub fn marketplace(&self) -> Option<&str> {
        self.split().1
    }

    fn split(&self) -> (&str, Option<&str>) {
        match self.0.rsplit_once('@') {
            Some((name, marketplace)) if !marketplace.is_empty() => (name, Some(marketplace)),
            _ => (self.0.as_str(), None),
        }
    }
}

impl fmt::Display for PluginIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PluginIdentity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for PluginIdentity {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Installation scope tier.
///
/// `None` is the "not installed" sentinel and is never persisted in a
/// settings source. The derived ordering runs from least to most specific.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ScopeTier {
    #[default]
    None,
    User,
    Project,
    Local,
}

impl ScopeTier {
    /// Tiers that can hold an installation.
    pub const PERSISTED: [ScopeTier; 3] = [ScopeTier::User, ScopeTier::Project, ScopeTier::Local];

    pub fn is_installed(self) -> bool {
        self != ScopeTier::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScopeTier::None => "none",
            ScopeTier::User => "user",
            ScopeTier::Project => "project",
            ScopeTier::Local => "local",
        }
    }
}

impl fmt::Display for ScopeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(ScopeTier::None),
            "user" => Ok(ScopeTier::User),
            "project" => Ok(ScopeTier::Project),
            "local" => Ok(ScopeTier::Local),
            _ => Err(format!(
                "Invalid scope '{}'. Must be: none, user, project, local",
                s
            )),
        }
    }
}

/// JSON field that may be a string, an object, or anything else.
///
/// Used for `source` and `author`, whose shape varies between marketplaces.
/// Only the string form of a source resolves to a path; everything else
/// resolves to nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FlexibleField {
    String(String),
    Object(Map<String, Value>),
    #[default]
    Unknown,
}

impl FlexibleField {
    /// The string form, when present and non-empty.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlexibleField::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// A string-valued key of the object form.
    pub fn field(&self, key: &str) -> Option<&str> {
        match self {
            FlexibleField::Object(map) => map.get(key).and_then(Value::as_str),
            _ => None,
        }
    }
}

impl From<Value> for FlexibleField {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => FlexibleField::String(s),
            Value::Object(map) => FlexibleField::Object(map),
            _ => FlexibleField::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for FlexibleField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(FlexibleField::from)
    }
}

impl Serialize for FlexibleField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FlexibleField::String(s) => serializer.serialize_str(s),
            FlexibleField::Object(map) => map.serialize(serializer),
            FlexibleField::Unknown => serializer.serialize_none(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// One installation of a plugin at one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledRecord {
    pub id: PluginIdentity,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub install_path: PathBuf,
    #[serde(default)]
    pub installed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    pub scope: ScopeTier,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Only set for project and local installs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<PathBuf>,
}

/// A plugin advertised by a marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableRecord {
    #[serde(alias = "pluginId")]
    pub id: PluginIdentity,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub marketplace_name: String,
    #[serde(default)]
    pub source: FlexibleField,
    #[serde(default)]
    pub author: FlexibleField,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub install_count: Option<u64>,
}

impl AvailableRecord {
    pub fn source_path(&self) -> Option<&str> {
        self.source.as_str()
    }

    /// Author name from either the string or the object form; empty otherwise.
    pub fn author_name(&self) -> &str {
        self.author
            .as_str()
            .or_else(|| self.author.field("name"))
            .unwrap_or("")
    }
}

/// Result of a backend list query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginListing {
    #[serde(default)]
    pub installed: Vec<InstalledRecord>,
    #[serde(default)]
    pub available: Vec<AvailableRecord>,
}

impl PluginListing {
    /// Installations of `id` across all scopes.
    pub fn installations<'a>(
        &'a self,
        id: &'a PluginIdentity,
    ) -> impl Iterator<Item = &'a InstalledRecord> + 'a {
        self.installed.iter().filter(move |record| &record.id == id)
    }

    pub fn is_installed(&self, id: &PluginIdentity) -> bool {
        self.installations(id).next().is_some()
    }
}
