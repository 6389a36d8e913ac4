//! Tuning calculations
//!
//! Arithmetic primitives, capacity formulas and the apportionment engine that
//! turns a host's resources into recommended service settings.

mod capacity;
mod engine;
mod primitives;
mod settings;

pub use capacity::*;
pub use engine::{
    apportion, HostProfile, CODE_CACHE_PER_WORKER_MB, MINIMUM_WORKERS, RESERVED_PROCESSORS,
};
pub use primitives::*;
pub use settings::*;
