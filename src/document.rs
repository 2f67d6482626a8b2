//! Line-addressed document
//!
//! A document is an ordered sequence of terminator-less lines plus the path
//! it was loaded from. Line addresses used elsewhere in the engine are
//! 1-indexed and inclusive. Every mutation bumps a revision counter so that
//! region spans resolved against an older revision can be rejected instead
//! of silently deleting the wrong lines.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    lines: Vec<String>,
    revision: u64,
}

impl Document {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            lines: content.lines().map(str::to_string).collect(),
            revision: 0,
        })
    }

    pub fn from_lines(path: impl Into<PathBuf>, lines: Vec<String>) -> Self {
        Self {
            path: path.into(),
            lines,
            revision: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Inclusive 1-indexed slice. Callers must have validated the span
    /// (see `LineAddressIndex`); out-of-range panics here are bugs.
    pub fn slice(&self, start: usize, end: usize) -> &[String] {
        &self.lines[start - 1..end]
    }

    /// Delete an inclusive 1-indexed span and bump the revision.
    pub fn remove_span(&mut self, start: usize, end: usize) {
        self.lines.drain(start - 1..end);
        self.revision += 1;
    }

    /// Insert a line so that it becomes line `line_number`.
    pub fn insert_line(&mut self, line_number: usize, line: String) {
        self.lines.insert(line_number - 1, line);
        self.revision += 1;
    }

    pub fn replace_line(&mut self, line_number: usize, line: String) {
        self.lines[line_number - 1] = line;
        self.revision += 1;
    }

    /// Serialize with `\n` terminators and a single trailing newline.
    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Write the document back to its own path atomically.
    pub fn persist(&self) -> Result<()> {
        write_atomic(&self.path, &self.render())
    }
}

/// Write `content` to `path` via a temp file in the same directory and an
/// atomic rename, so a crash mid-write never leaves a truncated file.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let parent_dir = path.parent().unwrap_or(Path::new("."));

    let mut temp_file = NamedTempFile::new_in(parent_dir)
        .with_context(|| format!("Failed to create temp file in {}", parent_dir.display()))?;

    temp_file
        .write_all(content.as_bytes())
        .with_context(|| format!("Failed to write temp file for {}", path.display()))?;

    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist temp file to {}", path.display()))?;

    Ok(())
}
