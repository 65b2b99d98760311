//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the pipeline and something it
//! does not own: time, the disk, version control, the package description
//! tool, and the human at the terminal.
//! Implementations live in `src/adapters/`.

pub mod clock;
pub mod confirm;
pub mod filesystem;
pub mod manifest;
pub mod vcs;

pub use clock::Clock;
pub use confirm::Confirm;
pub use filesystem::{DirEntry, EntryKind, FileSystem, WalkItem};
pub use manifest::ManifestDescriber;
pub use vcs::VcsRepo;
