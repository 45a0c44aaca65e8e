use std::fmt;

/// Top-level UI mode. Only `Main` accepts navigation and staging input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Main,
    /// Staged changes are being applied.
    Progress,
    /// Loading failed; the list is replaced by the error summary.
    Error,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Main => write!(f, "MAIN"),
            Mode::Progress => write!(f, "APPLYING"),
            Mode::Error => write!(f, "ERROR"),
        }
    }
}
