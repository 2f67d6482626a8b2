use anyhow::Result;
use clap::{Parser, Subcommand};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "

Copyright (c) 2026 InkyQuill
License: MIT
Source: https://github.com/InkyQuill/carvex
Rust Edition: 2024"
);

#[derive(Parser)]
#[command(name = "carvex")]
#[command(about = "Safe monolith decomposition with automatic backups and rollback")]
#[command(long_about = "Carvex carves named line regions out of a monolithic text file into new
files, removes them from the source in one safe pass, and applies literal
anchor-based patches to what remains.

Every destructive run starts with a durable snapshot, so any run can be
rolled back. Region addresses are validated against the pristine file and
removals are applied in descending line order, which keeps every pending
address valid while earlier regions disappear.

A run is described by a TOML plan:

  source = \"App.tsx\"
  dest_dir = \"components/views\"
  dest_suffix = \".tsx\"
  label = \"phase4\"

  [[extract]]
  name = \"EventsView\"
  start = 959
  end = 1093

  [[remove]]
  name = \"EventsView\"
  start = 959
  end = 1093

  [[patch]]
  kind = \"anchor-insert\"
  anchor = \"from './components/ui';\"
  line = \"import { EventsView } from './components/views';\"

EXAMPLES:
  carvex run phase4.toml              Execute a plan
  carvex run phase4.toml --dry-run    Preview without writing anything
  carvex rollback                     Restore the last snapshot
  carvex diff <ID>                    Diff a snapshot against the file now
  carvex history                      List all snapshots")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = LONG_VERSION)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a decomposition plan
    #[command(long_about = "Execute a TOML decomposition plan.

The run proceeds through fixed phases: snapshot, extract, remove, patch,
report. A failure halts the run at its current phase; the snapshot and any
already-extracted files stay on disk for inspection.

EXAMPLES:
  carvex run phase4.toml
  carvex run phase4.toml --dry-run
  carvex run phase4.toml --backup-dir /mnt/backups")]
    Run {
        /// Path to the plan file
        #[arg(value_name = "PLAN")]
        plan: String,

        /// Execute in memory and report, but write nothing
        #[arg(short = 'd', long, alias = "dry-run")]
        dry_run: bool,

        /// Custom snapshot directory
        #[arg(long, value_name = "DIR")]
        backup_dir: Option<String>,
    },

    /// Restore the source file from a snapshot
    #[command(long_about = "Restore a file from a snapshot.

If no snapshot ID is given, restores the most recent one. The snapshot is
kept after the restore, so the run can be replayed or diffed later.

EXAMPLES:
  carvex rollback                       Restore last snapshot
  carvex rollback 20260807-1201...      Restore a specific snapshot")]
    Rollback {
        /// Snapshot ID (defaults to the most recent)
        #[arg(value_name = "ID")]
        id: Option<String>,
    },

    /// Show snapshot history
    History,

    /// Show snapshot status
    Status,

    /// Diff a snapshot against the current file
    #[command(long_about = "Show what changed since a snapshot was taken.

EXAMPLES:
  carvex diff 20260807-120130500-phase4-ab12cd34")]
    Diff {
        /// Snapshot ID
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Manage snapshots
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Show or create the configuration file
    Config {
        /// Print current configuration without editing
        #[arg(long = "show")]
        show: bool,
    },
}

#[derive(Subcommand)]
enum BackupAction {
    /// List all snapshots
    List,

    /// Show snapshot details
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Restore from a snapshot
    Restore {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Remove a snapshot
    Remove {
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Prune old snapshots
    #[command(long_about = "Remove old snapshots, keeping recent ones.

Snapshots are never removed automatically; this is the only way they are
deleted.

EXAMPLES:
  carvex backup prune --keep=5
  carvex backup prune --keep-days=30")]
    Prune {
        /// Number of recent snapshots to keep
        #[arg(long, value_name = "N")]
        keep: Option<usize>,

        /// Keep snapshots from the last N days
        #[arg(long, value_name = "N")]
        keep_days: Option<i64>,
    },
}

pub fn parse_args() -> Result<Args> {
    let cli = Cli::parse();

    Ok(match cli.command {
        Commands::Run {
            plan,
            dry_run,
            backup_dir,
        } => Args::Run {
            plan,
            dry_run,
            backup_dir,
        },
        Commands::Rollback { id } => Args::Rollback { id },
        Commands::History => Args::History,
        Commands::Status => Args::Status,
        Commands::Diff { id } => Args::Diff { id },
        Commands::Backup { action } => match action {
            BackupAction::List => Args::BackupList,
            BackupAction::Show { id } => Args::BackupShow { id },
            BackupAction::Restore { id } => Args::BackupRestore { id },
            BackupAction::Remove { id } => Args::BackupRemove { id },
            BackupAction::Prune { keep, keep_days } => Args::BackupPrune { keep, keep_days },
        },
        Commands::Config { show } => Args::Config { show },
    })
}

#[derive(Debug)]
pub enum Args {
    Run {
        plan: String,
        dry_run: bool,
        backup_dir: Option<String>,
    },
    Rollback {
        id: Option<String>,
    },
    History,
    Status,
    Diff {
        id: String,
    },
    BackupList,
    BackupShow {
        id: String,
    },
    BackupRestore {
        id: String,
    },
    BackupRemove {
        id: String,
    },
    BackupPrune {
        keep: Option<usize>,
        keep_days: Option<i64>,
    },
    Config {
        show: bool,
    },
}
