//! Report rendering
//!
//! Text and JSON renderings of a tuning run, and export of the recommended
//! settings as Hiera data files.

use crate::calculate::Params;
use crate::core::{HostReport, TuneReport};
use crate::error::{IoResultExt, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Hiera directory holding per-node data files
pub const HIERA_NODES_DIR: &str = "nodes";

/// Hiera data file holding settings shared by every host
pub const HIERA_COMMON_FILE: &str = "common.yaml";

/// Render a report as human-readable text
pub fn render_text(report: &TuneReport) -> Result<String> {
    let mut out = String::new();

    for host in &report.hosts {
        render_host(&mut out, host)?;
    }

    if let Some(common) = report.common.as_ref().filter(|common| !common.is_empty()) {
        let _ = writeln!(
            out,
            "## Specify the following optimized settings in Hiera in {}\n",
            HIERA_COMMON_FILE
        );
        let _ = writeln!(out, "{}", to_hiera_yaml(common)?);
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "=== Warnings ===");
        for warning in &report.warnings {
            let _ = writeln!(out, "  {}", warning);
        }
        let _ = writeln!(out);
    }

    if !report.failures.is_empty() {
        let _ = writeln!(out, "=== Failures: {} ===", report.failures.len());
        for failure in &report.failures {
            let _ = writeln!(out, "  {} - {}", failure.host, failure.message);
        }
        let _ = writeln!(out);
    }

    Ok(out)
}

fn render_host(out: &mut String, host: &HostReport) -> Result<()> {
    let totals = &host.settings.totals;

    let _ = writeln!(
        out,
        "## Found: {} CPU(s) / {} MB RAM for {} ({})",
        host.resources.cpu,
        host.resources.ram_mb,
        host.host,
        host.role()
    );
    if host.settings.params.is_empty() {
        let _ = writeln!(out, "## No settings to specify for {}\n", host.host);
    } else {
        let _ = writeln!(
            out,
            "## Specify the following optimized settings in Hiera in {}\n",
            node_file_name(&host.host)
        );
        let _ = writeln!(out, "{}", to_hiera_yaml(&host.settings.params)?);
    }

    let _ = writeln!(
        out,
        "## CPU Summary: Total/Used/Free: {}/{}/{} for {}",
        totals.cpu.total,
        totals.cpu.used,
        totals.cpu.free(),
        host.host
    );
    let _ = writeln!(
        out,
        "## RAM Summary: Total/Used/Free: {}/{}/{} for {}",
        totals.ram.total,
        totals.ram.used,
        totals.ram.free(),
        host.host
    );
    if let Some(mb_per_worker) = totals.mb_per_worker {
        let _ = writeln!(
            out,
            "## JVM Summary: Using {} MB per Puppet Server JRuby for {}",
            mb_per_worker, host.host
        );
    }
    if let Some(capacity) = &host.capacity {
        let _ = writeln!(
            out,
            "## Capacity: {} JRuby(s) can serve up to {} node(s) on {}",
            capacity.workers, capacity.maximum_nodes, host.host
        );
        if let Some(minimum) = capacity.minimum_workers {
            let _ = writeln!(
                out,
                "## Capacity: active nodes need at least {} JRuby(s){}",
                minimum,
                if capacity.is_undersized() { ", more than recommended" } else { "" }
            );
        }
        if let Some(sample) = capacity.run_sample {
            let _ = writeln!(out, "## Capacity: sample {} agent run(s) to measure compile time", sample);
        }
    }
    if totals.cpu.is_overcommitted() || totals.ram.is_overcommitted() {
        let _ = writeln!(out, "## Warning: settings exceed the resources of {}", host.host);
    }
    let _ = writeln!(out);
    Ok(())
}

/// Render a report as JSON
pub fn render_json(report: &TuneReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Settings as a Hiera YAML document
pub fn to_hiera_yaml(params: &Params) -> Result<String> {
    Ok(format!("---\n{}", serde_yaml::to_string(params)?))
}

fn node_file_name(host: &str) -> String {
    format!("{}/{}.yaml", HIERA_NODES_DIR, host)
}

/// Write settings into a Hiera data directory.
///
/// Each host with settings gets `nodes/<host>.yaml`; common settings go to
/// `common.yaml`. Returns the files written.
pub fn write_hiera(report: &TuneReport, dir: &Path) -> Result<Vec<PathBuf>> {
    let nodes_dir = dir.join(HIERA_NODES_DIR);
    fs::create_dir_all(&nodes_dir).with_path(&nodes_dir)?;

    let mut written = Vec::new();
    for host in report.hosts.iter().filter(|host| !host.settings.params.is_empty()) {
        let path = dir.join(node_file_name(&host.host));
        fs::write(&path, to_hiera_yaml(&host.settings.params)?).with_path(&path)?;
        written.push(path);
    }

    if let Some(common) = report.common.as_ref().filter(|common| !common.is_empty()) {
        let path = dir.join(HIERA_COMMON_FILE);
        fs::write(&path, to_hiera_yaml(common)?).with_path(&path)?;
        written.push(path);
    }

    tracing::info!("Wrote {} Hiera file(s) to {:?}", written.len(), dir);
    Ok(written)
}
