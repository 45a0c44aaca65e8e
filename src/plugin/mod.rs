pub mod backend;
pub mod export;
pub mod merge;
pub mod pending;
pub mod scope;
#[cfg(test)]
pub(crate) mod testing;

pub use backend::CliBackend;
pub use export::{ExportError, ExportFile, ImportOutcome, ImportReport};
pub use merge::{merge, merge_with_options, DisplayRow, MergeOptions, PluginRow};
pub use pending::{CommitOutcome, CommitReport, OrphanPolicy, PendingLedger};
pub use scope::{ScopeResolver, ScopeState, SettingsLocations, SettingsReadError};
