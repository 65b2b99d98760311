//! Live adapters for real external interactions.

pub mod clock;
pub mod confirm;
pub mod filesystem;
pub mod manifest;
pub mod vcs;

pub use clock::{FixedClock, LiveClock};
pub use confirm::{AutoConfirm, TerminalConfirm};
pub use filesystem::LiveFileSystem;
pub use manifest::LiveManifestDescriber;
pub use vcs::LiveGitRepo;
