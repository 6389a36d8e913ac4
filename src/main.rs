//! petune CLI - Puppet Enterprise tuning recommendations
//!
//! Reads an inventory, or the local host, and prints recommended settings.

use anyhow::Context;
use clap::Parser;
use petune::config::{CliArgs, Commands, OutputFormat, TuneConfig};
use petune::core::TuneEngine;
use petune::error::TuneError;
use petune::report::{render_json, write_hiera};
use petune::system::{FactSource, LocalFacts};
use petune::topology::{Inventory, RoleInventory};
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging; report output owns stdout
    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every host was tuned
fn run(args: CliArgs) -> anyhow::Result<bool> {
    if let Some(Commands::Facts) = &args.command {
        LocalFacts::collect()
            .context("Unable to collect local facts")?
            .print_summary();
        return Ok(true);
    }

    let config = TuneConfig::from_cli(&args).map_err(TuneError::config)?;

    let (roles, facts): (RoleInventory, Box<dyn FactSource>) = match &config.inventory {
        Some(path) => {
            let inventory = Inventory::load(path)
                .with_context(|| format!("Unable to load inventory {}", path.display()))?;
            let roles = inventory.roles.clone();
            let facts: Box<dyn FactSource> = Box::new(inventory);
            (roles, facts)
        }
        None => {
            let local = LocalFacts::collect().context("Unable to collect local facts")?;
            let roles = Inventory::single_host(&local.hostname, local.resources).roles;
            let facts: Box<dyn FactSource> = Box::new(local);
            (roles, facts)
        }
    };

    let report = TuneEngine::new(config.clone()).execute(&roles, facts.as_ref())?;

    match config.format {
        OutputFormat::Text => report.print_summary()?,
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }

    if let Some(dir) = &config.hiera_dir {
        let written = write_hiera(&report, dir)
            .with_context(|| format!("Unable to write Hiera data to {}", dir.display()))?;
        if config.format == OutputFormat::Text {
            println!("## Wrote {} Hiera file(s) to {}", written.len(), dir.display());
        }
    }

    Ok(report.is_success())
}
