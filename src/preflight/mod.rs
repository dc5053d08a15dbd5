//! Preflight checks for the guestfish binary.
//!
//! Locating the tool is a capability handed to configuration rather than an
//! implicit `PATH` lookup, so configuration can be resolved in tests without a
//! real guestfish installed.
//!
//! # Example
//!
//! ```rust
//! use guestfish_tarball::preflight::{command_exists, BinaryLocator, PathSearch};
//!
//! if !command_exists("guestfish") {
//!     println!("libguestfs-tools not installed");
//! }
//!
//! let found = PathSearch.locate("sh");
//! assert!(found.is_ok());
//! ```

use std::path::PathBuf;

/// Resolves a binary name (or path) to an executable on the host.
pub trait BinaryLocator {
    /// Returns the resolved path, or a human readable reason it was not found.
    fn locate(&self, binary: &str) -> Result<PathBuf, String>;
}

/// Looks binaries up on the process `PATH`; explicit paths are checked as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathSearch;

impl BinaryLocator for PathSearch {
    fn locate(&self, binary: &str) -> Result<PathBuf, String> {
        which::which(binary).map_err(|e| e.to_string())
    }
}

impl<F> BinaryLocator for F
where
    F: Fn(&str) -> Result<PathBuf, String>,
{
    fn locate(&self, binary: &str) -> Result<PathBuf, String> {
        self(binary)
    }
}

/// Check if a command exists on the host system.
pub fn command_exists(cmd: &str) -> bool {
    PathSearch.locate(cmd).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_exists() {
        // 'sh' should exist on any Unix system
        assert!(command_exists("sh"));
        assert!(!command_exists("definitely_not_a_real_command_12345"));
    }

    #[test]
    fn test_path_search_accepts_absolute_path() {
        let found = PathSearch.locate("/bin/sh").unwrap();
        assert_eq!(found, PathBuf::from("/bin/sh"));
    }

    #[test]
    fn test_closure_locator() {
        let locator = |name: &str| -> Result<PathBuf, String> {
            if name == "guestfish" {
                Ok(PathBuf::from("/opt/fake/guestfish"))
            } else {
                Err(format!("{} not found", name))
            }
        };
        assert_eq!(
            locator.locate("guestfish").unwrap(),
            PathBuf::from("/opt/fake/guestfish")
        );
        assert!(locator.locate("other").is_err());
    }
}
