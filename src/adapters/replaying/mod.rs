//! Replaying adapters that serve recorded interactions.

pub mod clock;
pub mod manifest;
pub mod vcs;

pub use clock::ReplayingClock;
pub use manifest::ReplayingManifestDescriber;
pub use vcs::ReplayingVcsRepo;
