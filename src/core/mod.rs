//! Core tuning engine module
//!
//! Runs topology resolution, apportionment and capacity estimation over every
//! host of an infrastructure.

mod tuner;

pub use tuner::*;
