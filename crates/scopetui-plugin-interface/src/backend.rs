//! The capability a plugin backend exposes to the host.

use crate::types::{PluginIdentity, PluginListing, ScopeTier};

/// Failure reported by a backend operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("failed to run `{command}`: {message}")]
    Spawn { command: String, message: String },

    #[error("`{command}` exited with status {}: {stderr}", status_label(.code))]
    Exit {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("malformed backend output: {0}")]
    Malformed(String),

    #[error("{0}")]
    Rejected(String),
}

fn status_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "unknown".to_string(),
    }
}

/// Lists and mutates plugin installations.
///
/// Implementations are called from worker threads, hence `Send + Sync`.
/// Every call blocks until the backend has finished.
pub trait PluginBackend: Send + Sync {
    /// `include_available` asks for the marketplace catalogue as well as the
    /// installed set.
    fn list_plugins(&self, include_available: bool) -> Result<PluginListing, BackendError>;

    fn install_plugin(&self, id: &PluginIdentity, scope: ScopeTier) -> Result<(), BackendError>;

    fn uninstall_plugin(&self, id: &PluginIdentity, scope: ScopeTier) -> Result<(), BackendError>;

    /// Used after an install to reach a disabled state.
    fn disable_plugin(&self, id: &PluginIdentity, scope: ScopeTier) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_error_message() {
        let err = BackendError::Exit {
            command: "claude plugin list".to_string(),
            code: Some(2),
            stderr: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "`claude plugin list` exited with status 2: boom"
        );

        let killed = BackendError::Exit {
            command: "claude".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert_eq!(killed.to_string(), "`claude` exited with status unknown: ");
    }
}
