//! Main tuning engine
//!
//! Resolves the topology of an infrastructure, then tunes every host in
//! parallel. A host that cannot be tuned is recorded as a failure and never
//! stops the others.

use crate::calculate::{apportion, AgentWorkload, CapacityEstimate, Params, SettingsResult};
use crate::config::TuneConfig;
use crate::error::{Result, TuneError};
use crate::report::optimize_common;
use crate::system::{check_minimum_requirements, FactSource, HostResources};
use crate::topology::{resolve_topology, InfrastructureShape, RoleInventory, ServiceClassSet};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// Recommendations for one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostReport {
    /// Hostname
    pub host: String,
    /// Services tuned on the host
    pub classes: ServiceClassSet,
    /// Resources the host has
    pub resources: HostResources,
    /// Recommended settings
    pub settings: SettingsResult,
    /// Worker pool capacity, for hosts running Puppet Server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<CapacityEstimate>,
}

impl HostReport {
    /// Short description of the host's role
    pub fn role(&self) -> &'static str {
        self.classes.describe()
    }
}

/// A host that could not be tuned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostFailure {
    /// Hostname
    pub host: String,
    /// Reason
    pub message: String,
}

/// Tuning run result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuneReport {
    /// When the run finished
    pub generated_at: DateTime<Utc>,
    /// Detected infrastructure shape
    pub shape: InfrastructureShape,
    /// Tuned hosts, by hostname
    pub hosts: Vec<HostReport>,
    /// Settings shared by every host, when extracted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common: Option<Params>,
    /// Hosts tuned despite falling short of minimum requirements
    pub warnings: Vec<String>,
    /// Hosts that could not be tuned
    pub failures: Vec<HostFailure>,
}

impl TuneReport {
    /// Check if every host was tuned
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Report for `host`
    pub fn host(&self, host: &str) -> Option<&HostReport> {
        self.hosts.iter().find(|report| report.host == host)
    }

    /// Print the report to console
    pub fn print_summary(&self) -> Result<()> {
        print!("{}", crate::report::render_text(self)?);
        Ok(())
    }
}

/// Outcome of tuning one host
struct HostOutcome {
    report: HostReport,
    warning: Option<TuneError>,
}

/// Main tuning engine
pub struct TuneEngine {
    /// Configuration
    config: TuneConfig,
}

impl TuneEngine {
    /// Create a new tuning engine
    pub fn new(config: TuneConfig) -> Self {
        Self { config }
    }

    /// Tune every host named by `roles`, reading resources from `facts`
    pub fn execute(&self, roles: &RoleInventory, facts: &dyn FactSource) -> Result<TuneReport> {
        let start_time = Instant::now();

        // A bad role value fails only that role; the other hosts are still tuned
        let (roles, rejected) = roles.sanitize();
        let mut failures: Vec<HostFailure> = rejected
            .into_iter()
            .map(|(role, e)| HostFailure {
                host: role.key().to_string(),
                message: e.to_string(),
            })
            .collect();

        let membership = resolve_topology(&roles)?;
        let shape = InfrastructureShape::detect(&roles).with_code_cache(self.config.code_cache);
        tracing::info!(
            "Infrastructure: monolithic={}, compile masters={}, replica={}, external database={}",
            shape.is_monolithic,
            shape.with_compile_masters,
            shape.with_replica,
            shape.with_external_database
        );

        let hosts: Vec<&str> = membership.all_hosts().into_iter().collect();
        let force = self.config.force;
        let workload = &self.config.workload;

        let results: Vec<(String, Result<HostOutcome>)> = hosts
            .par_iter()
            .map(|host| {
                let classes = membership.tuned_classes_for_host(host);
                let outcome = tune_host(host, classes, &shape, facts, force, workload);
                (host.to_string(), outcome)
            })
            .collect();

        let mut reports = Vec::new();
        let mut warnings = Vec::new();
        for (host, result) in results {
            match result {
                Ok(outcome) => {
                    if let Some(warning) = outcome.warning {
                        warnings.push(warning.to_string());
                    }
                    reports.push(outcome.report);
                }
                Err(e) => {
                    tracing::warn!("Unable to tune {}: {}", host, e);
                    failures.push(HostFailure {
                        host,
                        message: e.to_string(),
                    });
                }
            }
        }

        let common = if self.config.common {
            Some(extract_common(&mut reports))
        } else {
            None
        };

        tracing::info!(
            "Tuned {} host(s) with {} warning(s) and {} failure(s) in {:.2?}",
            reports.len(),
            warnings.len(),
            failures.len(),
            start_time.elapsed()
        );

        Ok(TuneReport {
            generated_at: Utc::now(),
            shape,
            hosts: reports,
            common,
            warnings,
            failures,
        })
    }
}

fn tune_host(
    host: &str,
    classes: ServiceClassSet,
    shape: &InfrastructureShape,
    facts: &dyn FactSource,
    force: bool,
    workload: &AgentWorkload,
) -> Result<HostOutcome> {
    let resources = facts.resolve_host_facts(host)?;

    let warning = check_minimum_requirements(host, &resources, force).err();
    if let Some(warning) = &warning {
        tracing::warn!("{}", warning);
    }

    let settings = apportion(&resources, &classes, shape);
    let capacity = settings
        .workers()
        .map(|workers| CapacityEstimate::for_workers(workers, workload));

    tracing::info!(
        "Tuned {} ({}): {} CPU(s) / {} MB RAM, {} setting(s)",
        host,
        classes.describe(),
        resources.cpu,
        resources.ram_mb,
        settings.params.len()
    );

    Ok(HostOutcome {
        report: HostReport {
            host: host.to_string(),
            classes,
            resources,
            settings,
            capacity,
        },
        warning,
    })
}

/// Move settings shared by every host into a common layer
fn extract_common(reports: &mut [HostReport]) -> Params {
    let by_host: BTreeMap<String, Params> = reports
        .iter()
        .map(|report| (report.host.clone(), report.settings.params.clone()))
        .collect();
    let (common, mut remainders) = optimize_common(&by_host);

    for report in reports.iter_mut() {
        if let Some(params) = remainders.remove(&report.host) {
            report.settings.params = params;
        }
    }
    common
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::{keys, HeapSize, SettingValue};
    use crate::topology::{Inventory, ServiceClass};

    const MONOLITHIC: &str = r#"
nodes:
  master: { resources: { cpu: 4, ram: 8g } }
roles:
  puppet_master_host: master
"#;

    const WITH_COMPILE_MASTERS: &str = r#"
nodes:
  master: { resources: { cpu: 8, ram: 16g } }
  compile1: { resources: { cpu: 4, ram: 8192 } }
  compile2: { resources: { cpu: 4, ram: 8192 } }
roles:
  puppet_master_host: master
  compile_master: [compile1, compile2]
"#;

    fn run(inventory: &str, config: TuneConfig) -> TuneReport {
        let inventory = Inventory::from_yaml_str(inventory).unwrap();
        TuneEngine::new(config)
            .execute(&inventory.roles, &inventory)
            .unwrap()
    }

    #[test]
    fn test_tune_monolithic_master() {
        let report = run(MONOLITHIC, TuneConfig::default());

        assert!(report.is_success());
        assert!(report.warnings.is_empty());
        assert!(report.shape.is_monolithic);

        let master = report.host("master").unwrap();
        assert_eq!(master.role(), "Primary Master");
        assert_eq!(master.settings.totals.cpu.used, 4);
        assert_eq!(master.settings.totals.ram.used, 6451);
        assert_eq!(
            master.settings.params[keys::MASTER_JAVA_ARGS],
            SettingValue::Heap(HeapSize::fixed(2048))
        );
        assert_eq!(
            master.settings.params[keys::DATABASE_SHARED_BUFFERS],
            SettingValue::Text("2048MB".to_string())
        );

        let capacity = master.capacity.unwrap();
        assert_eq!(capacity.workers, 2);
        assert_eq!(capacity.maximum_nodes, 2 * 1800 / 20);
    }

    #[test]
    fn test_insufficient_resources_is_a_warning() {
        let small = "nodes:\n  master: { resources: { cpu: 2, ram: 4096 } }\nroles:\n  puppet_master_host: master\n";

        let report = run(small, TuneConfig::default());
        assert!(report.is_success());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("master"));
        assert!(report.host("master").unwrap().settings.workers().is_some());

        let forced = run(
            small,
            TuneConfig {
                force: true,
                ..Default::default()
            },
        );
        assert!(forced.warnings.is_empty());
    }

    #[test]
    fn test_missing_facts_do_not_stop_other_hosts() {
        let inventory = r#"
nodes:
  master: { resources: { cpu: 4, ram: 8192 } }
roles:
  puppet_master_host: master
  compile_master: [compile1]
"#;
        let report = run(inventory, TuneConfig::default());

        assert!(!report.is_success());
        assert_eq!(report.hosts.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].host, "compile1");
    }

    #[test]
    fn test_unknown_infrastructure_fails() {
        let inventory = Inventory::from_yaml_str("roles:\n  compile_master: compile1\n").unwrap();
        let result = TuneEngine::new(TuneConfig::default()).execute(&inventory.roles, &inventory);
        assert!(matches!(result, Err(TuneError::UnsupportedTopology(_))));

        // nothing is left to classify once the blank primary is dropped
        let inventory = Inventory::from_yaml_str("roles:\n  puppet_master_host: ''\n").unwrap();
        let result = TuneEngine::new(TuneConfig::default()).execute(&inventory.roles, &inventory);
        assert!(matches!(result, Err(TuneError::UnsupportedTopology(_))));
    }

    #[test]
    fn test_blank_hostname_does_not_stop_other_hosts() {
        let inventory = r#"
nodes:
  master: { resources: { cpu: 4, ram: 8192 } }
  compile1: { resources: { cpu: 4, ram: 8192 } }
roles:
  puppet_master_host: master
  compile_master: [compile1, ""]
"#;
        let report = run(inventory, TuneConfig::default());

        assert!(!report.is_success());
        assert!(report.shape.with_compile_masters);
        assert_eq!(report.hosts.len(), 2);
        assert!(report.host("master").is_some());
        assert_eq!(report.host("compile1").unwrap().role(), "Compile Master");

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].host, "compile_master");
        assert!(report.failures[0].message.contains("empty hostname"));
    }

    #[test]
    fn test_extract_common_settings() {
        let report = run(
            WITH_COMPILE_MASTERS,
            TuneConfig {
                common: true,
                ..Default::default()
            },
        );

        let common = report.common.as_ref().unwrap();
        assert_eq!(common.len(), 1);
        assert_eq!(
            common[keys::MASTER_JAVA_ARGS],
            SettingValue::Heap(HeapSize::fixed(1536))
        );

        let compile = report.host("compile1").unwrap();
        assert_eq!(compile.role(), "Compile Master");
        assert!(!compile.settings.params.contains_key(keys::MASTER_JAVA_ARGS));
        assert_eq!(
            compile.settings.params[keys::MASTER_JRUBY_MAX_ACTIVE_INSTANCES],
            SettingValue::Integer(3)
        );
        assert_eq!(report.host("master").unwrap().settings.workers(), Some(2));
    }

    #[test]
    fn test_replica_is_tuned_like_primary() {
        let inventory = r#"
nodes:
  master: { resources: { cpu: 4, ram: 8192 } }
  replica: { resources: { cpu: 4, ram: 8192 } }
roles:
  puppet_master_host: master
  primary_master_replica: replica
"#;
        let report = run(inventory, TuneConfig::default());

        let master = report.host("master").unwrap();
        let replica = report.host("replica").unwrap();
        assert!(replica.classes.contains(ServiceClass::Puppetdb));
        assert_eq!(replica.settings, master.settings);
    }

    #[test]
    fn test_capacity_uses_workload() {
        let config = TuneConfig {
            workload: AgentWorkload {
                run_interval: 1800,
                average_compile_time: 20,
                active_nodes: Some(1000),
            },
            ..Default::default()
        };
        let report = run(MONOLITHIC, config);

        let capacity = report.host("master").unwrap().capacity.unwrap();
        assert_eq!(capacity.minimum_workers, Some(23));
        assert!(capacity.is_undersized());
        assert_eq!(capacity.run_sample, Some(10_000));
    }
}
