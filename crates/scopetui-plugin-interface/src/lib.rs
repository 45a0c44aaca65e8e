//! Data contract between scope-tui and a plugin backend.
//!
//! The backend is whatever physically lists, installs, uninstalls and
//! disables plugins. This crate holds the record shapes it returns, the
//! identifiers both sides agree on, and the [`PluginBackend`] trait the
//! host drives.

pub mod backend;
pub mod types;
pub mod version;

pub use backend::{BackendError, PluginBackend};
pub use types::{
    AvailableRecord, FlexibleField, IdentityError, InstalledRecord, PluginIdentity, PluginListing,
    ScopeTier,
};
pub use version::{is_newer_version, INTERFACE_VERSION};
