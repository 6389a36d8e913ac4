//! Settings values and apportionment results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Hiera parameter names produced by the apportionment engine
pub mod keys {
    /// PostgreSQL shared buffers (`"2048MB"`)
    pub const DATABASE_SHARED_BUFFERS: &str = "puppet_enterprise::profile::database::shared_buffers";
    /// PuppetDB command processing threads
    pub const PUPPETDB_COMMAND_PROCESSING_THREADS: &str =
        "puppet_enterprise::puppetdb::command_processing_threads";
    /// Puppet Server JRuby instances
    pub const MASTER_JRUBY_MAX_ACTIVE_INSTANCES: &str =
        "puppet_enterprise::master::puppetserver::jruby_max_active_instances";
    /// Puppet Server code cache (`"512m"`)
    pub const MASTER_RESERVED_CODE_CACHE: &str =
        "puppet_enterprise::master::puppetserver::reserved_code_cache";
    /// Puppet Server heap
    pub const MASTER_JAVA_ARGS: &str = "puppet_enterprise::profile::master::java_args";
    /// PuppetDB heap
    pub const PUPPETDB_JAVA_ARGS: &str = "puppet_enterprise::profile::puppetdb::java_args";
    /// Console services heap
    pub const CONSOLE_JAVA_ARGS: &str = "puppet_enterprise::profile::console::java_args";
    /// Orchestration services heap
    pub const ORCHESTRATOR_JAVA_ARGS: &str = "puppet_enterprise::profile::orchestrator::java_args";
    /// ActiveMQ broker heap in megabytes
    pub const BROKER_HEAP_MB: &str = "puppet_enterprise::profile::amq::broker::heap_mb";
}

/// JVM heap bounds in megabytes, serialized as `{"Xms": "2048m", "Xmx": "2048m"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeapSize {
    /// Initial heap
    #[serde(rename = "Xms", with = "megabytes_suffix")]
    pub min_mb: u64,
    /// Maximum heap
    #[serde(rename = "Xmx", with = "megabytes_suffix")]
    pub max_mb: u64,
}

impl HeapSize {
    /// A heap that starts at its maximum size
    pub fn fixed(mb: u64) -> Self {
        Self { min_mb: mb, max_mb: mb }
    }
}

mod megabytes_suffix {
    use crate::calculate::string_to_megabytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(mb: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{}m", mb))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let text = String::deserialize(deserializer)?;
        string_to_megabytes(&text).map_err(serde::de::Error::custom)
    }
}

/// A single recommended setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Plain count
    Integer(u64),
    /// Value carrying its own unit suffix, such as `"2048MB"`
    Text(String),
    /// JVM heap bounds
    Heap(HeapSize),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
            Self::Heap(heap) => write!(f, "Xms{}m Xmx{}m", heap.min_mb, heap.max_mb),
        }
    }
}

impl From<u64> for SettingValue {
    fn from(n: u64) -> Self {
        Self::Integer(n)
    }
}

impl From<HeapSize> for SettingValue {
    fn from(heap: HeapSize) -> Self {
        Self::Heap(heap)
    }
}

/// Settings keyed by parameter name
pub type Params = BTreeMap<String, SettingValue>;

/// Total and consumed amount of one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Amount the host has
    pub total: u64,
    /// Amount the recommended settings consume
    pub used: u64,
}

impl Usage {
    /// Unused amount, zero when overcommitted
    pub fn free(&self) -> u64 {
        self.total.saturating_sub(self.used)
    }

    /// True when the settings consume more than the host has
    pub fn is_overcommitted(&self) -> bool {
        self.used > self.total
    }
}

/// Utilization report for one host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Processors
    #[serde(rename = "CPU")]
    pub cpu: Usage,
    /// Memory in megabytes
    #[serde(rename = "RAM")]
    pub ram: Usage,
    /// Heap budget per Puppet Server worker in megabytes
    #[serde(rename = "MB_PER_JRUBY", default, skip_serializing_if = "Option::is_none")]
    pub mb_per_worker: Option<u64>,
}

/// Output of one apportionment run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettingsResult {
    /// Recommended settings
    pub params: Params,
    /// CPU and RAM accounting
    pub totals: Totals,
}

impl SettingsResult {
    /// Puppet Server worker count, when the host runs a master
    pub fn workers(&self) -> Option<u64> {
        match self.params.get(keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES) {
            Some(SettingValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }
}
