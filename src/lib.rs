//! # petune - Puppet Enterprise tuning recommendations
//!
//! petune turns the processors and memory of each host in a Puppet
//! Enterprise infrastructure, and the services co-located on it, into
//! recommended service settings with a CPU/RAM utilization report.
//!
//! ## Features
//!
//! - **Topology Resolution**: Map role-based inventories to per-host services
//! - **Resource Apportionment**: Workers, threads, heaps and buffers per host
//! - **Capacity Estimates**: Nodes a worker pool can serve, workers needed
//! - **Common Settings**: Factor out settings shared by every host
//! - **Hiera Export**: Write `nodes/<host>.yaml` and `common.yaml`
//!
//! ## Quick Start
//!
//! ```no_run
//! use petune::config::TuneConfig;
//! use petune::core::TuneEngine;
//! use petune::topology::Inventory;
//! use std::path::Path;
//!
//! let inventory = Inventory::load(Path::new("inventory.yaml")).unwrap();
//! let engine = TuneEngine::new(TuneConfig::default());
//!
//! let report = engine.execute(&inventory.roles, &inventory).unwrap();
//! report.print_summary().unwrap();
//! ```
//!
//! ## Tuning a Single Host
//!
//! ```
//! use petune::calculate::{apportion, keys, HeapSize, SettingValue};
//! use petune::system::HostResources;
//! use petune::topology::{InfrastructureShape, ServiceClass, ServiceClassSet};
//!
//! let classes: ServiceClassSet = [ServiceClass::Console].into_iter().collect();
//! let result = apportion(
//!     &HostResources { cpu: 4, ram_mb: 8192 },
//!     &classes,
//!     &InfrastructureShape::default(),
//! );
//!
//! assert_eq!(
//!     result.params[keys::CONSOLE_JAVA_ARGS],
//!     SettingValue::Heap(HeapSize::fixed(4096))
//! );
//! assert_eq!(result.totals.ram.used, 4096);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod calculate;
pub mod config;
pub mod core;
pub mod error;
pub mod report;
pub mod system;
pub mod topology;

// Re-export commonly used types
pub use calculate::{apportion, SettingValue, SettingsResult};
pub use config::TuneConfig;
pub use core::{TuneEngine, TuneReport};
pub use error::{Result, TuneError};
pub use report::optimize_common;
pub use topology::{resolve_topology, Inventory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use petune::prelude::*;
    //! ```

    pub use crate::calculate::{
        apportion, keys, AgentWorkload, CapacityEstimate, HeapSize, Params, SettingValue,
        SettingsResult, Totals, Usage,
    };
    pub use crate::config::{OutputFormat, TuneConfig};
    pub use crate::core::{HostReport, TuneEngine, TuneReport};
    pub use crate::error::{Result, TuneError};
    pub use crate::report::{optimize_common, render_json, render_text, write_hiera};
    pub use crate::system::{meets_minimum_requirements, FactSource, HostResources, LocalFacts};
    pub use crate::topology::{
        resolve_topology, InfrastructureShape, Inventory, RoleInventory, ServiceClass,
        ServiceClassMembership, ServiceClassSet,
    };
}
