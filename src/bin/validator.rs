//! Relation Validator CLI
//!
//! Loads relation declarations, lints them and validates schema snapshots.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relation_registry::{
    RelationGraph, RelationLinter, RelationsConfig, Registry, SchemaSnapshot, ValidationReport,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relation-validator")]
#[command(about = "Check foreign-key relation declarations and validate schema snapshots")]
#[command(version)]
struct Cli {
    /// Config file (defaults to relations.toml lookup)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load declarations and summarise them
    Check {
        /// Declaration file or directory (default: registry.path)
        path: Option<PathBuf>,
    },

    /// List the relations currently in force
    Active {
        path: Option<PathBuf>,
    },

    /// Validate a snapshot against the active relations
    Validate {
        path: Option<PathBuf>,
        /// Snapshot JSON (default: validation.snapshot)
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
        /// Write the JSON report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report contradictory or suspicious declarations
    Lint {
        path: Option<PathBuf>,
        /// Fail on warnings too
        #[arg(long)]
        deny_warnings: bool,
    },

    /// Print tables in parent-first order
    Order {
        path: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn load_registry(config: &RelationsConfig, path: Option<PathBuf>) -> Result<Registry> {
    let path = path.unwrap_or_else(|| config.registry_path());
    Registry::load_path(&path).with_context(|| format!("loading {}", path.display()))
}

/// Returns `Ok(false)` when the command found problems
fn run(cli: Cli) -> Result<bool> {
    let config = RelationsConfig::load_from(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Check { path } => {
            let registry = load_registry(&config, path)?;
            let counts = registry.status_counts();

            println!("🔍 {} declarations", registry.len());
            println!("  active:     {}", counts.active);
            println!("  added:      {}", counts.added);
            println!("  changed:    {}", counts.changed);
            println!("  removed:    {}", counts.removed);
            println!("  superseded: {}", counts.superseded);
            println!("  in force:   {}", registry.active_relations().count());
            println!("  fingerprint {}", registry.fingerprint());
            Ok(true)
        }

        Commands::Active { path } => {
            let registry = load_registry(&config, path)?;
            let mut section: Option<&str> = None;
            for relation in registry.active_relations() {
                if relation.section.as_deref() != section {
                    section = relation.section.as_deref();
                    if let Some(heading) = section {
                        println!("\n# {}", heading);
                    }
                }
                println!("{}", relation);
            }
            Ok(true)
        }

        Commands::Validate {
            path,
            snapshot,
            output,
        } => {
            let registry = load_registry(&config, path)?;
            let snapshot_path = snapshot
                .or_else(|| config.validation.snapshot.clone())
                .context("no snapshot given; pass --snapshot or set validation.snapshot")?;
            let snapshot = SchemaSnapshot::load_file(&snapshot_path)
                .with_context(|| format!("loading snapshot {}", snapshot_path.display()))?;

            let report = ValidationReport::build(&registry, &snapshot);
            let json = report.to_json(config.report.output_format)?;
            write_output(output.as_deref(), &json)?;

            if report.is_success() {
                eprintln!(
                    "✅ {} relations checked, no violations",
                    report.relations_checked
                );
                return Ok(true);
            }

            eprintln!("❌ {} violation(s):", report.violations.len());
            for violation in &report.violations {
                eprintln!("   └─ {}", violation);
            }
            Ok(!config.validation.fail_on_violation)
        }

        Commands::Lint {
            path,
            deny_warnings,
        } => {
            let registry = load_registry(&config, path)?;
            let result = RelationLinter::new()
                .allow(config.lint.allow.iter().cloned())
                .lint(&registry);

            for error in &result.errors {
                println!("❌ {} [{}] {}", error.code, error.location, error.message);
            }
            for warning in &result.warnings {
                println!("⚠️  {} [{}] {}", warning.code, warning.location, warning.message);
            }

            let deny = deny_warnings || config.lint.deny_warnings;
            let passed = result.is_clean() && !(deny && result.has_warnings());
            if passed {
                println!(
                    "✅ Lint passed ({} warning(s))",
                    result.warnings.len()
                );
            }
            Ok(passed)
        }

        Commands::Order { path } => {
            let registry = load_registry(&config, path)?;
            let graph = RelationGraph::from_registry(&registry);
            for (idx, table) in graph.load_order()?.iter().enumerate() {
                println!("{:>3}. {}", idx + 1, table);
            }
            Ok(true)
        }
    }
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("writing report to {}", path.display()))?;
            eprintln!("✅ Report written to {:?}", path);
        }
        None => println!("{}", content),
    }
    Ok(())
}
