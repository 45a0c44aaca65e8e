//! Version helpers.

use semver::Version;

/// Current interface crate version.
pub const INTERFACE_VERSION: &str = env!("CARGO_PKG_VERSION");

fn parse_lenient(raw: &str) -> Result<Version, String> {
    let trimmed = raw.trim().trim_start_matches('v');
    Version::parse(trimmed).map_err(|e| format!("Invalid version '{}': {}", raw, e))
}

/// Check whether `candidate` is strictly newer than `current`.
///
/// A leading `v` is accepted on either side.
///
/// # Example
///
/// ```
/// use scopetui_plugin_interface::is_newer_version;
///
/// assert!(is_newer_version("1.2.0", "1.1.9").unwrap());
/// assert!(!is_newer_version("v1.0.0", "1.0.0").unwrap());
/// ```
pub fn is_newer_version(candidate: &str, current: &str) -> Result<bool, String> {
    Ok(parse_lenient(candidate)? > parse_lenient(current)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_version() {
        assert!(is_newer_version("0.2.0", "0.1.0").unwrap());
        assert!(is_newer_version("1.0.0", "1.0.0-beta.1").unwrap());
    }

    #[test]
    fn test_not_newer_when_equal_or_older() {
        assert!(!is_newer_version("0.1.0", "0.1.0").unwrap());
        assert!(!is_newer_version("0.0.9", "0.1.0").unwrap());
    }

    #[test]
    fn test_invalid_version_string() {
        assert!(is_newer_version("latest", "0.1.0").is_err());
        assert!(is_newer_version("0.1.0", "").is_err());
    }

    #[test]
    fn test_interface_version_constant() {
        Version::parse(INTERFACE_VERSION).expect("INTERFACE_VERSION should be valid semver");
    }
}
