//! Snapshot-vs-current diff rendering
//!
//! Snapshots are kept forever precisely so a human can see what a run did
//! long after the fact. `carvex diff <ID>` renders the snapshot against the
//! file as it is now.

use crate::backup_manager::SnapshotMetadata;
use anyhow::{Context, Result};
use colored::*;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::io::IsTerminal;

pub fn render_snapshot_diff(snapshot: &SnapshotMetadata) -> Result<String> {
    let old = fs::read_to_string(&snapshot.backup_path).with_context(|| {
        format!(
            "Failed to read snapshot file: {}",
            snapshot.backup_path.display()
        )
    })?;
    let new = fs::read_to_string(&snapshot.original_path).with_context(|| {
        format!(
            "Failed to read current file: {}",
            snapshot.original_path.display()
        )
    })?;

    let use_color = std::env::var("NO_COLOR").is_err() && std::io::stdout().is_terminal();
    let mut out = String::new();

    out.push_str(&format!(
        "--- {} (snapshot {})\n+++ {} (current)\n",
        snapshot.original_path.display(),
        snapshot.id,
        snapshot.original_path.display()
    ));

    if old == new {
        out.push_str("No differences.\n");
        return Ok(out);
    }

    let diff = TextDiff::from_lines(&old, &new);
    for (group_index, group) in diff.grouped_ops(3).iter().enumerate() {
        if group_index > 0 {
            out.push_str("...\n");
        }
        for op in group {
            for change in diff.iter_changes(op) {
                let (sign, styled): (&str, fn(&str) -> ColoredString) = match change.tag() {
                    ChangeTag::Delete => ("-", |s: &str| s.red()),
                    ChangeTag::Insert => ("+", |s: &str| s.green()),
                    ChangeTag::Equal => (" ", |s: &str| s.dimmed()),
                };
                let line = format!("{}{}", sign, change.value());
                if use_color {
                    out.push_str(&format!("{}", styled(&line)));
                } else {
                    out.push_str(&line);
                }
                if !line.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }

    Ok(out)
}
