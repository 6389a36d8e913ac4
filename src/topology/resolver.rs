//! Topology resolution
//!
//! Translates role assignments into the services each host runs. The primary
//! master runs every service unless a dedicated host takes one over;
//! compile masters only ever run Puppet Server.

use super::inventory::{Role, RoleInventory};
use crate::error::{Result, TuneError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Services that can be installed on a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServiceClass {
    /// Puppet Server
    #[serde(rename = "master")]
    Master,
    /// Console services
    #[serde(rename = "console")]
    Console,
    /// PuppetDB
    #[serde(rename = "puppetdb")]
    Puppetdb,
    /// PostgreSQL
    #[serde(rename = "database")]
    Database,
    /// ActiveMQ broker
    #[serde(rename = "broker")]
    Broker,
    /// Orchestration services
    #[serde(rename = "orchestrator")]
    Orchestrator,
    /// Marks the primary master
    #[serde(rename = "primary-master")]
    PrimaryMaster,
    /// Marks the replica of the primary master
    #[serde(rename = "primary-master-replica")]
    PrimaryMasterReplica,
    /// Marks a compile master
    #[serde(rename = "compile-master")]
    CompileMaster,
}

impl ServiceClass {
    /// Every service class
    pub const ALL: [ServiceClass; 9] = [
        ServiceClass::Master,
        ServiceClass::Console,
        ServiceClass::Puppetdb,
        ServiceClass::Database,
        ServiceClass::Broker,
        ServiceClass::Orchestrator,
        ServiceClass::PrimaryMaster,
        ServiceClass::PrimaryMasterReplica,
        ServiceClass::CompileMaster,
    ];

    /// Services the primary master runs unless they are split to other hosts
    pub const PRIMARY_SERVICES: [ServiceClass; 5] = [
        ServiceClass::Console,
        ServiceClass::Puppetdb,
        ServiceClass::Database,
        ServiceClass::Broker,
        ServiceClass::Orchestrator,
    ];

    /// Name of this class
    pub fn name(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Console => "console",
            Self::Puppetdb => "puppetdb",
            Self::Database => "database",
            Self::Broker => "broker",
            Self::Orchestrator => "orchestrator",
            Self::PrimaryMaster => "primary-master",
            Self::PrimaryMasterReplica => "primary-master-replica",
            Self::CompileMaster => "compile-master",
        }
    }
}

impl fmt::Display for ServiceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Services active on one host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceClassSet(BTreeSet<ServiceClass>);

impl ServiceClassSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `class` is active
    pub fn contains(&self, class: ServiceClass) -> bool {
        self.0.contains(&class)
    }

    /// Activate `class`
    pub fn insert(&mut self, class: ServiceClass) -> bool {
        self.0.insert(class)
    }

    /// Active classes in order
    pub fn iter(&self) -> impl Iterator<Item = ServiceClass> + '_ {
        self.0.iter().copied()
    }

    /// True when no service is active
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short description of the host's role
    pub fn describe(&self) -> &'static str {
        if self.contains(ServiceClass::PrimaryMaster) {
            "Primary Master"
        } else if self.contains(ServiceClass::PrimaryMasterReplica) {
            "Replica Master"
        } else if self.contains(ServiceClass::CompileMaster) {
            "Compile Master"
        } else if self.contains(ServiceClass::Console) {
            "Console Host"
        } else if self.contains(ServiceClass::Puppetdb) {
            "PuppetDB Host"
        } else if self.contains(ServiceClass::Database) {
            "Database Host"
        } else {
            "Host"
        }
    }
}

impl FromIterator<ServiceClass> for ServiceClassSet {
    fn from_iter<I: IntoIterator<Item = ServiceClass>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<ServiceClass> for ServiceClassSet {
    fn extend<I: IntoIterator<Item = ServiceClass>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

/// Hosts running each service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceClassMembership {
    classes: BTreeMap<ServiceClass, BTreeSet<String>>,
}

impl Default for ServiceClassMembership {
    fn default() -> Self {
        Self {
            classes: ServiceClass::ALL
                .iter()
                .map(|class| (*class, BTreeSet::new()))
                .collect(),
        }
    }
}

impl ServiceClassMembership {
    /// Hosts running `class`
    pub fn hosts(&self, class: ServiceClass) -> &BTreeSet<String> {
        static EMPTY: BTreeSet<String> = BTreeSet::new();
        self.classes.get(&class).unwrap_or(&EMPTY)
    }

    /// Every host running any service
    pub fn all_hosts(&self) -> BTreeSet<&str> {
        self.classes
            .values()
            .flat_map(|hosts| hosts.iter().map(String::as_str))
            .collect()
    }

    /// Services `host` is a member of
    pub fn classes_for_host(&self, host: &str) -> ServiceClassSet {
        self.classes
            .iter()
            .filter(|(_, hosts)| hosts.contains(host))
            .map(|(class, _)| *class)
            .collect()
    }

    /// Services to tune on `host`.
    ///
    /// A replica runs whatever the primary master it replicates runs, so it
    /// picks up the primary master's services.
    pub fn tuned_classes_for_host(&self, host: &str) -> ServiceClassSet {
        let mut classes = self.classes_for_host(host);
        if classes.contains(ServiceClass::PrimaryMasterReplica) {
            if let Some(primary) = self.hosts(ServiceClass::PrimaryMaster).iter().next() {
                classes.extend(
                    self.classes_for_host(primary)
                        .iter()
                        .filter(|class| *class != ServiceClass::PrimaryMaster),
                );
            }
        }
        classes
    }

    fn assign(&mut self, class: ServiceClass, hosts: &[&str]) {
        let entry = self.classes.entry(class).or_default();
        entry.clear();
        entry.extend(hosts.iter().map(|host| host.to_string()));
    }

    fn add(&mut self, class: ServiceClass, hosts: &[&str]) {
        self.classes
            .entry(class)
            .or_default()
            .extend(hosts.iter().map(|host| host.to_string()));
    }
}

/// Overall shape of an infrastructure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InfrastructureShape {
    /// Console and PuppetDB run on the primary master
    pub is_monolithic: bool,
    /// Compile masters serve agents
    pub with_compile_masters: bool,
    /// A replica of the primary master exists
    pub with_replica: bool,
    /// PostgreSQL runs on its own host in a monolithic infrastructure
    pub with_external_database: bool,
    /// Puppet Server workers need a code cache (JRuby 9k)
    pub with_code_cache: bool,
}

impl InfrastructureShape {
    /// Detect the shape of the infrastructure described by `roles`
    pub fn detect(roles: &RoleInventory) -> Self {
        let is_monolithic = !roles.has(Role::ConsoleHost) && !roles.has(Role::PuppetdbHost);
        let primary = roles.hosts(Role::PrimaryMaster);
        let with_external_database = is_monolithic
            && !primary.is_empty()
            && roles
                .hosts(Role::DatabaseHost)
                .iter()
                .any(|host| !primary.contains(host));

        Self {
            is_monolithic,
            with_compile_masters: roles.has(Role::CompileMaster),
            with_replica: roles.has(Role::PrimaryMasterReplica),
            with_external_database,
            with_code_cache: false,
        }
    }

    /// Enable code cache sizing
    pub fn with_code_cache(mut self, enabled: bool) -> Self {
        self.with_code_cache = enabled;
        self
    }
}

/// True when the roles name neither a primary master nor dedicated console
/// or PuppetDB hosts
pub fn is_unknown_infrastructure(roles: &RoleInventory) -> bool {
    !roles.has(Role::PrimaryMaster) && !roles.has(Role::ConsoleHost) && !roles.has(Role::PuppetdbHost)
}

/// Resolve which hosts run which services.
///
/// Bad role values are an error here; [`RoleInventory::sanitize`] drops them
/// so the remaining hosts can still be resolved.
pub fn resolve_topology(roles: &RoleInventory) -> Result<ServiceClassMembership> {
    roles.validate()?;
    if is_unknown_infrastructure(roles) {
        return Err(TuneError::UnsupportedTopology(
            "unknown infrastructure: no primary master, console or puppetdb host".to_string(),
        ));
    }

    let mut membership = ServiceClassMembership::default();

    let primary = roles.hosts(Role::PrimaryMaster);
    membership.add(ServiceClass::Master, &primary);
    membership.add(ServiceClass::PrimaryMaster, &primary);
    for class in ServiceClass::PRIMARY_SERVICES {
        membership.assign(class, &primary);
    }

    if let Some(console) = roles.get(Role::ConsoleHost) {
        membership.assign(ServiceClass::Console, &console.hosts());
    }
    if let Some(puppetdb) = roles.get(Role::PuppetdbHost) {
        membership.assign(ServiceClass::Puppetdb, &puppetdb.hosts());
        if let Some(first) = puppetdb.first() {
            membership.assign(ServiceClass::Database, &[first]);
        }
    }
    if let Some(database) = roles.get(Role::DatabaseHost) {
        membership.assign(ServiceClass::Database, &database.hosts());
    }

    let compile = roles.hosts(Role::CompileMaster);
    membership.add(ServiceClass::Master, &compile);
    membership.add(ServiceClass::CompileMaster, &compile);

    membership.add(
        ServiceClass::PrimaryMasterReplica,
        &roles.hosts(Role::PrimaryMasterReplica),
    );

    for class in ServiceClass::ALL {
        tracing::debug!("Class {} on {:?}", class, membership.hosts(class));
    }
    Ok(membership)
}
