//! Role inventory and inventory files
//!
//! An inventory file names the hosts of an infrastructure, their resources,
//! and the role each host plays:
//!
//! ```yaml
//! nodes:
//!   master.example.com:
//!     resources: { cpu: 8, ram: 16g }
//! roles:
//!   puppet_master_host: master.example.com
//!   compile_master: [compile1.example.com, compile2.example.com]
//! ```

use crate::calculate::string_to_megabytes;
use crate::error::{collect_errors, IoResultExt, Result, TuneError};
use crate::system::{FactSource, HostResources};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

/// Infrastructure roles a host can play
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Primary master
    PrimaryMaster,
    /// Dedicated console host
    ConsoleHost,
    /// Dedicated PuppetDB host(s)
    PuppetdbHost,
    /// Dedicated PostgreSQL host
    DatabaseHost,
    /// High-availability replica of the primary master
    PrimaryMasterReplica,
    /// Compile master(s)
    CompileMaster,
}

impl Role {
    /// Every role, in inventory order
    pub const ALL: [Role; 6] = [
        Role::PrimaryMaster,
        Role::ConsoleHost,
        Role::PuppetdbHost,
        Role::DatabaseHost,
        Role::PrimaryMasterReplica,
        Role::CompileMaster,
    ];

    /// Inventory key of this role
    pub fn key(&self) -> &'static str {
        match self {
            Self::PrimaryMaster => "puppet_master_host",
            Self::ConsoleHost => "console_host",
            Self::PuppetdbHost => "puppetdb_host",
            Self::DatabaseHost => "database_host",
            Self::PrimaryMasterReplica => "primary_master_replica",
            Self::CompileMaster => "compile_master",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Value of a role: one hostname or a list of hostnames
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleValue {
    /// Single host
    Host(String),
    /// Several hosts
    Hosts(Vec<String>),
}

impl RoleValue {
    /// Hostnames in declaration order
    pub fn hosts(&self) -> Vec<&str> {
        match self {
            Self::Host(host) => vec![host.as_str()],
            Self::Hosts(hosts) => hosts.iter().map(String::as_str).collect(),
        }
    }

    /// First declared hostname
    pub fn first(&self) -> Option<&str> {
        self.hosts().into_iter().next()
    }

    /// The value without blank hostnames, or `None` when no host is left
    pub fn without_blank_hosts(&self) -> Option<RoleValue> {
        match self {
            Self::Host(host) if host.trim().is_empty() => None,
            Self::Host(host) => Some(Self::Host(host.clone())),
            Self::Hosts(hosts) => {
                let kept: Vec<String> = hosts
                    .iter()
                    .filter(|host| !host.trim().is_empty())
                    .cloned()
                    .collect();
                if kept.is_empty() {
                    None
                } else {
                    Some(Self::Hosts(kept))
                }
            }
        }
    }

    fn validate(&self, role: Role) -> Result<()> {
        let hosts = self.hosts();
        if hosts.is_empty() {
            return Err(TuneError::inventory(format!("role '{}' has an empty host list", role)));
        }
        if hosts.iter().any(|host| host.trim().is_empty()) {
            return Err(TuneError::inventory(format!("role '{}' has an empty hostname", role)));
        }
        Ok(())
    }
}

impl From<&str> for RoleValue {
    fn from(host: &str) -> Self {
        Self::Host(host.to_string())
    }
}

impl From<Vec<&str>> for RoleValue {
    fn from(hosts: Vec<&str>) -> Self {
        Self::Hosts(hosts.into_iter().map(String::from).collect())
    }
}

/// Which host plays which role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInventory {
    /// Primary master
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub puppet_master_host: Option<RoleValue>,
    /// Console host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console_host: Option<RoleValue>,
    /// PuppetDB host(s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub puppetdb_host: Option<RoleValue>,
    /// PostgreSQL host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_host: Option<RoleValue>,
    /// Replica of the primary master
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_master_replica: Option<RoleValue>,
    /// Compile master(s)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_master: Option<RoleValue>,
}

impl RoleInventory {
    /// Value of `role`, if assigned
    pub fn get(&self, role: Role) -> Option<&RoleValue> {
        match role {
            Role::PrimaryMaster => self.puppet_master_host.as_ref(),
            Role::ConsoleHost => self.console_host.as_ref(),
            Role::PuppetdbHost => self.puppetdb_host.as_ref(),
            Role::DatabaseHost => self.database_host.as_ref(),
            Role::PrimaryMasterReplica => self.primary_master_replica.as_ref(),
            Role::CompileMaster => self.compile_master.as_ref(),
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<RoleValue> {
        match role {
            Role::PrimaryMaster => &mut self.puppet_master_host,
            Role::ConsoleHost => &mut self.console_host,
            Role::PuppetdbHost => &mut self.puppetdb_host,
            Role::DatabaseHost => &mut self.database_host,
            Role::PrimaryMasterReplica => &mut self.primary_master_replica,
            Role::CompileMaster => &mut self.compile_master,
        }
    }

    /// True when `role` is assigned
    pub fn has(&self, role: Role) -> bool {
        self.get(role).is_some()
    }

    /// Hosts assigned to `role`
    pub fn hosts(&self, role: Role) -> Vec<&str> {
        self.get(role).map(RoleValue::hosts).unwrap_or_default()
    }

    /// Every host playing any role
    pub fn all_hosts(&self) -> BTreeSet<&str> {
        Role::ALL.iter().flat_map(|role| self.hosts(*role)).collect()
    }

    /// Reject empty hostnames and empty host lists, reporting every bad role
    pub fn validate(&self) -> Result<()> {
        let results = Role::ALL
            .iter()
            .filter_map(|role| self.get(*role).map(|value| value.validate(*role)))
            .collect();
        collect_errors(results).map(|_| ())
    }

    /// Drop blank hostnames and empty host lists.
    ///
    /// Returns the roles that remain, which always pass [`Self::validate`],
    /// and the reason each bad role value was rejected.
    pub fn sanitize(&self) -> (RoleInventory, Vec<(Role, TuneError)>) {
        let mut clean = self.clone();
        let mut rejected = Vec::new();
        for role in Role::ALL {
            let slot = clean.slot_mut(role);
            if let Some(value) = slot.take() {
                if let Err(e) = value.validate(role) {
                    tracing::warn!("Ignoring bad hosts of role '{}': {}", role, e);
                    rejected.push((role, e));
                }
                *slot = value.without_blank_hosts();
            }
        }
        (clean, rejected)
    }
}

/// A count or a magnitude written as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Magnitude {
    /// Plain number
    Number(u64),
    /// Text such as `"4"` or `"16g"`
    Text(String),
}

/// Resources declared for a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResources {
    /// Processor count
    pub cpu: Magnitude,
    /// Memory in megabytes, or with a unit suffix
    pub ram: Magnitude,
}

/// A node entry of an inventory file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    /// Declared resources
    pub resources: NodeResources,
}

/// Inventory file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Nodes and their resources
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeEntry>,
    /// Role assignments
    #[serde(default)]
    pub roles: RoleInventory,
}

impl Inventory {
    /// Load an inventory, as JSON for `.json` files and YAML otherwise
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_path(path)?;
        let inventory = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            _ => Self::from_yaml_str(&content)?,
        };
        tracing::info!(
            "Loaded inventory {:?} with {} node(s)",
            path,
            inventory.nodes.len()
        );
        Ok(inventory)
    }

    /// Parse a YAML inventory.
    ///
    /// Role values are not checked here; blank hostnames fail only their own
    /// role when tuning.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse a JSON inventory
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Inventory of a single host playing the primary master role
    pub fn single_host(host: &str, resources: HostResources) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            host.to_string(),
            NodeEntry {
                resources: NodeResources {
                    cpu: Magnitude::Number(u64::from(resources.cpu)),
                    ram: Magnitude::Text(format!("{}m", resources.ram_mb)),
                },
            },
        );
        Self {
            nodes,
            roles: RoleInventory {
                puppet_master_host: Some(RoleValue::from(host)),
                ..Default::default()
            },
        }
    }

    /// Resources declared for `host`
    pub fn resources_for(&self, host: &str) -> Result<HostResources> {
        let entry = self
            .nodes
            .get(host)
            .ok_or_else(|| TuneError::facts(host, "no resources declared in the inventory"))?;

        let cpu = match &entry.resources.cpu {
            Magnitude::Number(n) => u32::try_from(*n).ok(),
            Magnitude::Text(text) => text.trim().parse::<u32>().ok(),
        }
        .ok_or_else(|| TuneError::inventory(format!("invalid cpu count for '{}'", host)))?;

        let ram_mb = match &entry.resources.ram {
            Magnitude::Number(n) => *n,
            Magnitude::Text(text) => string_to_megabytes(text)?,
        };

        HostResources::new(cpu, ram_mb)
    }
}

impl FactSource for Inventory {
    fn resolve_host_facts(&self, host: &str) -> Result<HostResources> {
        self.resources_for(host)
    }
}
