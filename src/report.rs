//! Human-readable run reports
//!
//! Advisory output only; nothing parses this. Per-phase sections mirror the
//! run's state machine, and every patch rule's match sites are listed so an
//! incidental match is visible to the person reading the summary.

use crate::backup_manager::SnapshotMetadata;
use crate::orchestrator::RunReport;
use colored::*;
use std::io::IsTerminal;

pub struct ReportFormatter;

impl ReportFormatter {
    /// Honor NO_COLOR (https://no-color.org/) and non-tty stdout.
    fn should_use_color() -> bool {
        if std::env::var("NO_COLOR").is_ok() {
            return false;
        }
        std::io::stdout().is_terminal()
    }

    pub fn format_run_report(report: &RunReport) -> String {
        let use_color = Self::should_use_color();
        let mut out = String::new();

        let title = if report.dry_run {
            format!("Run '{}' (dry run)", report.label)
        } else {
            format!("Run '{}'", report.label)
        };
        if use_color {
            out.push_str(&format!("{}\n", title.bold().cyan()));
        } else {
            out.push_str(&format!("{title}\n"));
        }

        if let Some(snapshot) = &report.snapshot {
            out.push_str(&format!("Snapshot: {}\n", snapshot.id));
        }

        if !report.extractions.is_empty() {
            out.push('\n');
            for extraction in &report.extractions {
                let mut line = format!(
                    "Extracted {} ({} lines) -> {}",
                    extraction.name,
                    extraction.body_lines,
                    extraction.destination.display()
                );
                if extraction.marker_added {
                    line.push_str(" [visibility marker added]");
                }
                out.push_str(&Self::ok_line(&line, use_color));
            }
        }

        if let Some(removal) = &report.removal
            && !removal.regions.is_empty()
        {
            out.push('\n');
            for region in &removal.regions {
                out.push_str(&Self::ok_line(
                    &format!("Removed {} ({} lines)", region.name, region.lines_removed),
                    use_color,
                ));
            }
            out.push_str(&format!(
                "Removed {} lines total\n",
                removal.total_removed()
            ));
        }

        if !report.patches.is_empty() {
            out.push('\n');
            for patch in &report.patches {
                out.push_str(&Self::format_patch(patch, use_color));
            }
        }

        let delta = report.lines_before as i64 - report.lines_after as i64;
        let percent = if report.lines_before > 0 {
            delta as f64 / report.lines_before as f64 * 100.0
        } else {
            0.0
        };
        out.push_str(&format!(
            "\nSource: {} -> {} lines ({:+.1}%)\n",
            report.lines_before, report.lines_after, -percent
        ));

        out
    }

    fn format_patch(patch: &crate::rewriter::PatchOutcome, use_color: bool) -> String {
        let mut out = String::new();

        if patch.was_noop() {
            let line = format!("No match for [{}] - nothing changed", patch.rule);
            if use_color {
                out.push_str(&format!("{} {}\n", "!".yellow().bold(), line.yellow()));
            } else {
                out.push_str(&format!("! {line}\n"));
            }
            return out;
        }

        let summary = if patch.already_present {
            format!("[{}] already applied, skipped", patch.rule)
        } else {
            format!("[{}] applied ({} edit(s))", patch.rule, patch.applied)
        };
        out.push_str(&Self::ok_line(&summary, use_color));

        for m in &patch.matches {
            let site = format!("  L{}: {}", m.line_number, m.text.trim());
            if use_color {
                out.push_str(&format!("{}\n", site.dimmed()));
            } else {
                out.push_str(&format!("{site}\n"));
            }
        }

        out
    }

    fn ok_line(text: &str, use_color: bool) -> String {
        if use_color {
            format!("{} {}\n", "✓".green().bold(), text)
        } else {
            format!("✓ {text}\n")
        }
    }

    pub fn format_history(snapshots: &[SnapshotMetadata]) -> String {
        if snapshots.is_empty() {
            return "No snapshots found.\n".to_string();
        }

        let use_color = Self::should_use_color();
        let mut out = String::new();

        // Most recent first.
        for snapshot in snapshots.iter().rev() {
            let header = format!(
                "{}  [{}]",
                snapshot.timestamp.format("%Y-%m-%d %H:%M:%S"),
                snapshot.label
            );
            if use_color {
                out.push_str(&format!("{}\n", header.bold()));
            } else {
                out.push_str(&format!("{header}\n"));
            }
            out.push_str(&format!("  ID: {}\n", snapshot.id));
            out.push_str(&format!("  File: {}\n\n", snapshot.original_path.display()));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::ExtractionRecord;
    use crate::remover::{RegionRemoval, RemovalReport};
    use crate::rewriter::{PatchMatch, PatchOutcome};
    use std::path::PathBuf;

    fn sample_report() -> RunReport {
        RunReport {
            label: "phase4".to_string(),
            dry_run: false,
            snapshot: None,
            extractions: vec![ExtractionRecord {
                name: "EventsView".to_string(),
                destination: PathBuf::from("views/EventsView.tsx"),
                body_lines: 135,
                marker_added: true,
            }],
            removal: Some(RemovalReport {
                regions: vec![RegionRemoval {
                    name: "EventsView".to_string(),
                    lines_removed: 135,
                }],
                lines_before: 1379,
                lines_after: 1244,
            }),
            patches: vec![PatchOutcome {
                rule: "insert after 'x'".to_string(),
                matches: vec![PatchMatch {
                    line_number: 11,
                    text: "import x;".to_string(),
                }],
                applied: 1,
                already_present: false,
            }],
            lines_before: 1379,
            lines_after: 1245,
        }
    }

    #[test]
    fn test_report_mentions_each_phase() {
        let output = ReportFormatter::format_run_report(&sample_report());

        assert!(output.contains("Run 'phase4'"));
        assert!(output.contains("Extracted EventsView (135 lines)"));
        assert!(output.contains("visibility marker added"));
        assert!(output.contains("Removed EventsView (135 lines)"));
        assert!(output.contains("L11: import x;"));
        assert!(output.contains("1379 -> 1245 lines"));
    }

    #[test]
    fn test_noop_patch_flagged() {
        let mut report = sample_report();
        report.patches = vec![PatchOutcome {
            rule: "insert after 'gone'".to_string(),
            matches: vec![],
            applied: 0,
            already_present: false,
        }];

        let output = ReportFormatter::format_run_report(&report);
        assert!(output.contains("No match for [insert after 'gone']"));
    }

    #[test]
    fn test_dry_run_labeled() {
        let mut report = sample_report();
        report.dry_run = true;

        let output = ReportFormatter::format_run_report(&report);
        assert!(output.contains("(dry run)"));
    }

    #[test]
    fn test_history_empty() {
        assert_eq!(ReportFormatter::format_history(&[]), "No snapshots found.\n");
    }
}
