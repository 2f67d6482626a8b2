mod backup_manager;
mod cli;
mod config;
mod disk_space;
mod document;
mod error;
mod extractor;
mod logger;
mod orchestrator;
mod plan;
mod preamble;
mod region;
mod remover;
mod report;
mod rewriter;
mod snapshot_diff;

use anyhow::Result;
use backup_manager::BackupManager;
use cli::{Args, parse_args};
use orchestrator::{Orchestrator, RunOptions};
use plan::RunPlan;
use report::ReportFormatter;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let args = parse_args()?;
    let config = config::load_config()?;
    logger::init_logging(config.log.enabled)?;

    match args {
        Args::Run {
            plan,
            dry_run,
            backup_dir,
        } => {
            let backup_dir = backup_dir.or(config.backup.backup_dir.clone());
            run_plan(Path::new(&plan), dry_run, backup_dir)?;
        }
        Args::Rollback { id } => {
            rollback(&config, id)?;
        }
        Args::History | Args::BackupList => {
            show_history(&config)?;
        }
        Args::Status => {
            show_status(&config)?;
        }
        Args::Diff { id } => {
            show_diff(&config, &id)?;
        }
        Args::BackupShow { id } => {
            show_snapshot(&config, &id)?;
        }
        Args::BackupRestore { id } => {
            rollback(&config, Some(id))?;
        }
        Args::BackupRemove { id } => {
            backup_manager_for(&config)?.remove(&id)?;
            println!("Removed snapshot {id}");
        }
        Args::BackupPrune { keep, keep_days } => {
            prune(&config, keep, keep_days)?;
        }
        Args::Config { show } => {
            show_config(show)?;
        }
    }

    Ok(())
}

fn backup_manager_for(config: &config::Config) -> Result<BackupManager> {
    match &config.backup.backup_dir {
        Some(dir) => BackupManager::with_directory(dir.clone()),
        None => BackupManager::new(),
    }
}

fn run_plan(plan_path: &Path, dry_run: bool, backup_dir: Option<String>) -> Result<()> {
    let plan = RunPlan::load(plan_path)?;

    let options = RunOptions {
        dry_run,
        backup_dir: backup_dir.map(PathBuf::from),
    };

    let mut orchestrator = Orchestrator::new(plan, options);
    let report = orchestrator.run()?;

    print!("{}", ReportFormatter::format_run_report(&report));

    if let Some(snapshot) = &report.snapshot {
        println!("\nRollback with: carvex rollback {}", snapshot.id);
    }

    Ok(())
}

fn rollback(config: &config::Config, id: Option<String>) -> Result<()> {
    let manager = backup_manager_for(config)?;

    let snapshot_id = match id {
        Some(id) => id,
        None => match manager.latest_id()? {
            Some(id) => {
                println!("Rolling back last run: {id}\n");
                id
            }
            None => {
                anyhow::bail!("No snapshots found to roll back");
            }
        },
    };

    let restored = manager.restore(&snapshot_id)?;
    println!("Restored: {}", restored.display());

    Ok(())
}

fn show_history(config: &config::Config) -> Result<()> {
    let manager = backup_manager_for(config)?;
    let snapshots = manager.list()?;

    print!("{}", ReportFormatter::format_history(&snapshots));
    Ok(())
}

fn show_status(config: &config::Config) -> Result<()> {
    let manager = backup_manager_for(config)?;
    let snapshots = manager.list()?;

    println!("Snapshot directory: {}", manager.backups_dir().display());
    println!("Total snapshots: {}\n", snapshots.len());

    if let Some(last) = snapshots.last() {
        println!("Last run:");
        println!("  ID: {}", last.id);
        println!("  Label: {}", last.label);
        println!("  Time: {}", last.timestamp.format("%Y-%m-%d %H:%M:%S"));
        println!("  File: {}", last.original_path.display());
    }

    Ok(())
}

fn show_snapshot(config: &config::Config, id: &str) -> Result<()> {
    let manager = backup_manager_for(config)?;
    let metadata = manager.find(id)?;

    println!("ID: {}", metadata.id);
    println!("Label: {}", metadata.label);
    println!("Time: {}", metadata.timestamp.format("%Y-%m-%d %H:%M:%S"));
    println!("Original: {}", metadata.original_path.display());
    println!("Copy: {}", metadata.backup_path.display());

    Ok(())
}

fn show_diff(config: &config::Config, id: &str) -> Result<()> {
    let manager = backup_manager_for(config)?;
    let metadata = manager.find(id)?;

    print!("{}", snapshot_diff::render_snapshot_diff(&metadata)?);
    Ok(())
}

fn prune(config: &config::Config, keep: Option<usize>, keep_days: Option<i64>) -> Result<()> {
    let manager = backup_manager_for(config)?;

    let removed = match (keep, keep_days) {
        (Some(n), _) => manager.prune(n)?,
        (None, Some(days)) => manager.prune_older_than(days)?,
        (None, None) => anyhow::bail!("Specify --keep=N or --keep-days=N"),
    };

    println!("Removed {removed} snapshot(s)");
    Ok(())
}

fn show_config(show: bool) -> Result<()> {
    let config_path = config::config_file_path()?;

    if !config_path.exists() {
        config::save_default_config()?;
        println!("Created default config: {}", config_path.display());
    }

    if show {
        print!("{}", std::fs::read_to_string(&config_path)?);
    } else {
        println!("Config file: {}", config_path.display());
    }

    Ok(())
}
