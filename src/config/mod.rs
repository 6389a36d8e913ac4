//! Configuration module for petune
//!
//! Provides CLI arguments and the runtime settings of a tuning run.

mod settings;

pub use settings::*;
