//! `repoflat hydrate` and `repoflat rehydrate`: reserved names.

use crate::error::{Error, Result};

/// Always fails; the command name is reserved.
///
/// # Errors
///
/// Always returns a `Validation` error.
pub fn run(name: &str) -> Result<()> {
    Err(Error::validation(format!("`{name}` is not implemented")))
}
