//! Host facts and minimum system requirements
//!
//! Provides the resources of each host to tune, read from an inventory or
//! from the local system.

mod resources;

pub use resources::*;
