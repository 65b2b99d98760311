//! Adapter implementations for the port traits.

pub mod live;
#[cfg(test)]
pub mod memory;
pub mod recording;
pub mod replaying;
