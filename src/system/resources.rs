//! Host resource detection
//!
//! Host facts (CPU count and RAM) come either from an inventory file or from
//! the local system. Both sources sit behind [`FactSource`] so the tuner never
//! cares where a host's resources were read from.

use crate::error::{Result, TuneError};
use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Minimum processors for a supported host
pub const MINIMUM_CPU: u32 = 4;

/// Minimum memory in megabytes for a supported host
pub const MINIMUM_RAM_MB: u64 = 8192;

const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

/// Processors and memory available on one host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResources {
    /// Logical processors
    pub cpu: u32,
    /// Memory in megabytes
    pub ram_mb: u64,
}

impl HostResources {
    /// Create host resources, rejecting empty hosts
    pub fn new(cpu: u32, ram_mb: u64) -> Result<Self> {
        if cpu == 0 || ram_mb == 0 {
            return Err(TuneError::inventory(format!(
                "host resources must be positive, got {} CPU(s) / {} MB RAM",
                cpu, ram_mb
            )));
        }
        Ok(Self { cpu, ram_mb })
    }

    /// RAM formatted for humans
    pub fn ram_display(&self) -> String {
        humansize::format_size(self.ram_mb.saturating_mul(BYTES_PER_MEGABYTE), humansize::BINARY)
    }
}

/// True when a host can run the platform: at least 4 CPUs and 8192 MB RAM,
/// or unconditionally when `forced`.
pub fn meets_minimum_requirements(resources: &HostResources, forced: bool) -> bool {
    forced || (resources.cpu >= MINIMUM_CPU && resources.ram_mb >= MINIMUM_RAM_MB)
}

/// Like [`meets_minimum_requirements`], reporting the shortfall as an error.
pub fn check_minimum_requirements(host: &str, resources: &HostResources, forced: bool) -> Result<()> {
    if meets_minimum_requirements(resources, forced) {
        return Ok(());
    }
    Err(TuneError::InsufficientResources {
        host: host.to_string(),
        cpu: resources.cpu,
        ram_mb: resources.ram_mb,
        min_cpu: MINIMUM_CPU,
        min_ram_mb: MINIMUM_RAM_MB,
    })
}

/// Source of per-host resource facts
pub trait FactSource: Sync {
    /// Resources of `host`, or [`TuneError::UnavailableFacts`] when unknown
    fn resolve_host_facts(&self, host: &str) -> Result<HostResources>;
}

/// Facts of the machine petune runs on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFacts {
    /// Local hostname
    pub hostname: String,
    /// Local resources
    pub resources: HostResources,
}

impl LocalFacts {
    /// Collect facts from the running system
    pub fn collect() -> Result<Self> {
        let hostname = hostname::get()
            .map_err(|e| TuneError::facts("localhost", e.to_string()))?
            .to_string_lossy()
            .to_string();

        let mut sys = System::new();
        sys.refresh_memory();

        let cpu = u32::try_from(num_cpus::get())
            .map_err(|e| TuneError::facts(&hostname, e.to_string()))?;
        let ram_mb = sys.total_memory() / BYTES_PER_MEGABYTE;
        let resources = HostResources::new(cpu, ram_mb)
            .map_err(|e| TuneError::facts(&hostname, e.to_string()))?;

        tracing::debug!("Local facts for {}: {} CPU(s), {} MB RAM", hostname, cpu, ram_mb);
        Ok(Self { hostname, resources })
    }

    /// Print local facts to console
    pub fn print_summary(&self) {
        println!("=== Host Facts ===\n");
        println!("Hostname: {}", self.hostname);
        println!("CPU:      {} logical core(s)", self.resources.cpu);
        println!("Memory:   {} ({} MB)", self.resources.ram_display(), self.resources.ram_mb);
        println!(
            "Minimum:  {}",
            if meets_minimum_requirements(&self.resources, false) { "met" } else { "NOT met" }
        );
    }
}

impl FactSource for LocalFacts {
    fn resolve_host_facts(&self, host: &str) -> Result<HostResources> {
        if host == self.hostname {
            Ok(self.resources)
        } else {
            Err(TuneError::facts(host, "only the local host is known"))
        }
    }
}
