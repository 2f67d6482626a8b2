//! Run orchestration
//!
//! A run is a linear state machine:
//! `Idle -> BackedUp -> Extracted -> Removed -> Rewritten -> Reported`.
//! Each transition either completes or halts the run at its current state.
//! Nothing is cleaned up on failure: the snapshot and any already-written
//! extracted documents stay on disk for inspection, and the mutated source
//! is only persisted (atomically, in one write) after the rewrite phase
//! succeeds, so a crash mid-run never leaves a half-edited source.

use crate::backup_manager::{BackupManager, SnapshotMetadata};
use crate::document::{self, Document};
use crate::extractor::RegionExtractor;
use crate::plan::RunPlan;
use crate::region::{LineAddressIndex, RegionSet};
use crate::remover::{RegionRemover, RemovalReport};
use crate::rewriter::{PatchOutcome, PatternRewriter};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    BackedUp,
    Extracted,
    Removed,
    Rewritten,
    Reported,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Execute every phase in memory and report, but write nothing:
    /// no snapshot, no extracted files, no source rewrite.
    pub dry_run: bool,
    /// Override the snapshot root (defaults to ~/.carvex/backups).
    pub backup_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ExtractionRecord {
    pub name: String,
    pub destination: PathBuf,
    pub body_lines: usize,
    pub marker_added: bool,
}

#[derive(Debug)]
pub struct RunReport {
    pub label: String,
    pub dry_run: bool,
    pub snapshot: Option<SnapshotMetadata>,
    pub extractions: Vec<ExtractionRecord>,
    pub removal: Option<RemovalReport>,
    pub patches: Vec<PatchOutcome>,
    pub lines_before: usize,
    pub lines_after: usize,
}

pub struct Orchestrator {
    plan: RunPlan,
    options: RunOptions,
    phase: Phase,
}

impl Orchestrator {
    pub fn new(plan: RunPlan, options: RunOptions) -> Self {
        Self {
            plan,
            options,
            phase: Phase::Idle,
        }
    }

    /// The state the run reached; after a failed `run` this names the last
    /// completed transition.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn run(&mut self) -> Result<RunReport> {
        let mut document = Document::load(&self.plan.source)?;
        let lines_before = document.line_count();

        // Validate every span up front, against the pristine document,
        // before the backup is even taken. A bad plan fails with nothing
        // written anywhere.
        LineAddressIndex::resolve(&document, &self.plan.extract)?;
        let remove_set = LineAddressIndex::resolve(&document, &self.plan.remove)?;

        let snapshot = self.backup_phase()?;
        let extractions = self.extract_phase(&document)?;
        let removal = self.remove_phase(&mut document, &remove_set)?;
        let patches = self.rewrite_phase(&mut document)?;

        if !self.options.dry_run {
            document
                .persist()
                .with_context(|| format!("Failed to rewrite {}", self.plan.source.display()))?;
        }

        self.phase = Phase::Reported;
        Ok(RunReport {
            label: self.plan.label.clone(),
            dry_run: self.options.dry_run,
            snapshot,
            extractions,
            removal: Some(removal),
            patches,
            lines_before,
            lines_after: document.line_count(),
        })
    }

    fn backup_phase(&mut self) -> Result<Option<SnapshotMetadata>> {
        let snapshot = if self.options.dry_run {
            None
        } else {
            let mut manager = match &self.options.backup_dir {
                Some(dir) => BackupManager::with_directory(dir.clone())?,
                None => BackupManager::new()?,
            };
            let metadata = manager.snapshot(&self.plan.source, &self.plan.label)?;
            info!(id = %metadata.id, "snapshot written");
            Some(metadata)
        };

        self.phase = Phase::BackedUp;
        Ok(snapshot)
    }

    fn extract_phase(&mut self, document: &Document) -> Result<Vec<ExtractionRecord>> {
        let extractor = RegionExtractor::new(&self.plan.dialect);
        let mut records = Vec::with_capacity(self.plan.extract.len());

        for region in &self.plan.extract {
            let preamble_lines = self.plan.preamble.resolve(&region.name);
            let extracted = extractor.extract(document, region, &preamble_lines)?;
            let destination = self.plan.dest_for(&region.name);

            if !self.options.dry_run {
                if let Some(parent) = destination.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create destination directory: {}", parent.display())
                    })?;
                }
                // Deliberately overwrites: re-running a plan regenerates
                // the same extracted documents.
                document::write_atomic(&destination, &extracted.content)?;
            }

            info!(region = %region.name, lines = extracted.body_lines, "extracted");
            records.push(ExtractionRecord {
                name: extracted.name,
                destination,
                body_lines: extracted.body_lines,
                marker_added: extracted.marker_added,
            });
        }

        self.phase = Phase::Extracted;
        Ok(records)
    }

    fn remove_phase(
        &mut self,
        document: &mut Document,
        remove_set: &RegionSet,
    ) -> Result<RemovalReport> {
        let report = RegionRemover::remove(document, remove_set)?;
        info!(
            regions = report.regions.len(),
            lines = report.total_removed(),
            "regions removed"
        );

        self.phase = Phase::Removed;
        Ok(report)
    }

    fn rewrite_phase(&mut self, document: &mut Document) -> Result<Vec<PatchOutcome>> {
        let mut outcomes = Vec::with_capacity(self.plan.patch.len());

        for rule in &self.plan.patch {
            let outcome = PatternRewriter::apply(document, rule)?;
            info!(
                rule = %outcome.rule,
                matches = outcome.matches.len(),
                applied = outcome.applied,
                "patch applied"
            );
            outcomes.push(outcome);
        }

        self.phase = Phase::Rewritten;
        Ok(outcomes)
    }
}
