//! Decision provider for destructive operations.

/// Answers yes/no questions before anything is deleted or overwritten.
pub trait Confirm: Send + Sync {
    /// Returns `true` if the operation described by `prompt` may proceed.
    fn confirm(&self, prompt: &str) -> bool;
}
