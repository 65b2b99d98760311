//! Package description tool port.

use std::path::Path;

use crate::error::Result;

/// Describes a package manifest as raw JSON.
///
/// The document carries `targets` and `products`; see
/// [`PackageDescription`](crate::snapshot::manifest::PackageDescription).
pub trait ManifestDescriber: Send + Sync {
    /// Runs the description tool for the package rooted at `package_root`.
    ///
    /// # Errors
    ///
    /// Returns a `ManifestTool` error if the tool cannot run or exits non-zero.
    fn describe(&self, package_root: &Path) -> Result<String>;
}
