//! Infrastructure topology
//!
//! Reads role-based inventories and resolves them into the services each
//! host runs.

mod inventory;
mod resolver;

pub use inventory::*;
pub use resolver::*;
