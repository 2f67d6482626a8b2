//! Phase-labeled snapshots of the source document
//!
//! Every destructive run snapshots its source before touching it. A
//! snapshot is a directory under the backup root holding a full copy of the
//! file plus `operation.json` metadata. Snapshots are never deleted as a
//! side effect of creating new ones; `restore` puts the copy back and keeps
//! the snapshot, so a restored run can be replayed and the history stays
//! diffable. Pruning only happens when a human asks for it.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const MAX_SNAPSHOT_PERCENT_OF_FREE: f64 = 60.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// The plan's phase label, e.g. "phase4".
    pub label: String,
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
}

pub struct BackupManager {
    backups_dir: PathBuf,
}

impl BackupManager {
    pub fn new() -> Result<Self> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
        Self::with_directory(home_dir.join(".carvex").join("backups"))
    }

    pub fn with_directory(dir: impl Into<PathBuf>) -> Result<Self> {
        let backups_dir = dir.into();

        fs::create_dir_all(&backups_dir).with_context(|| {
            format!(
                "Failed to create backups directory: {}",
                backups_dir.display()
            )
        })?;

        Ok(Self { backups_dir })
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Copy `source` into a new snapshot directory and write its metadata.
    /// Returns only after both are durably on disk; any failure here must
    /// abort the caller's run before it mutates anything.
    pub fn snapshot(&mut self, source: &Path, label: &str) -> Result<SnapshotMetadata> {
        let file_size = source
            .metadata()
            .with_context(|| format!("Failed to read file metadata: {}", source.display()))?
            .len();

        crate::disk_space::check_space_for_snapshot(
            &self.backups_dir,
            file_size,
            MAX_SNAPSHOT_PERCENT_OF_FREE,
        )?;

        let id = format!(
            "{}-{}-{}",
            Utc::now().format("%Y%m%d-%H%M%S%3f"),
            label,
            Uuid::new_v4().to_string().split_at(8).0
        );
        let snapshot_dir = self.backups_dir.join(&id);

        fs::create_dir_all(&snapshot_dir).with_context(|| {
            format!(
                "Failed to create snapshot directory: {}",
                snapshot_dir.display()
            )
        })?;

        let file_name = source
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", source.display()))?;
        let backup_path = snapshot_dir.join(file_name);

        fs::copy(source, &backup_path)
            .with_context(|| format!("Failed to snapshot file: {}", source.display()))?;

        let metadata = SnapshotMetadata {
            id: id.clone(),
            timestamp: Utc::now(),
            label: label.to_string(),
            original_path: source.to_path_buf(),
            backup_path,
        };

        let metadata_path = snapshot_dir.join("operation.json");
        let metadata_json =
            serde_json::to_string_pretty(&metadata).context("Failed to serialize metadata")?;
        fs::write(&metadata_path, metadata_json)
            .with_context(|| format!("Failed to write metadata: {}", metadata_path.display()))?;

        Ok(metadata)
    }

    /// Copy the snapshot's file back over the original. The snapshot
    /// itself is kept; restoring is not consuming.
    pub fn restore(&self, id: &str) -> Result<PathBuf> {
        let metadata = self.find(id)?;

        if !metadata.backup_path.exists() {
            anyhow::bail!(
                "Snapshot file missing: {}",
                metadata.backup_path.display()
            );
        }

        fs::copy(&metadata.backup_path, &metadata.original_path).with_context(|| {
            format!(
                "Failed to restore file: {}",
                metadata.original_path.display()
            )
        })?;

        Ok(metadata.original_path)
    }

    pub fn find(&self, id: &str) -> Result<SnapshotMetadata> {
        let metadata_path = self.backups_dir.join(id).join("operation.json");

        if !metadata_path.exists() {
            anyhow::bail!("Snapshot not found: {}", id);
        }

        let metadata_json = fs::read_to_string(&metadata_path)
            .with_context(|| format!("Failed to read metadata: {}", metadata_path.display()))?;
        serde_json::from_str(&metadata_json).context("Failed to parse metadata")
    }

    pub fn latest_id(&self) -> Result<Option<String>> {
        Ok(self.list()?.last().map(|m| m.id.clone()))
    }

    /// All snapshots, oldest first.
    pub fn list(&self) -> Result<Vec<SnapshotMetadata>> {
        let mut snapshots = Vec::new();

        for entry in fs::read_dir(&self.backups_dir).with_context(|| {
            format!(
                "Failed to read backups directory: {}",
                self.backups_dir.display()
            )
        })? {
            let entry = entry?;
            let metadata_path = entry.path().join("operation.json");

            if !metadata_path.exists() {
                continue;
            }

            let metadata_json = fs::read_to_string(&metadata_path)?;
            if let Ok(metadata) = serde_json::from_str::<SnapshotMetadata>(&metadata_json) {
                snapshots.push(metadata);
            }
        }

        snapshots.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        Ok(snapshots)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let snapshot_dir = self.backups_dir.join(id);
        fs::remove_dir_all(&snapshot_dir)
            .with_context(|| format!("Failed to remove snapshot: {}", snapshot_dir.display()))?;
        Ok(())
    }

    /// Keep only the `keep_count` most recent snapshots.
    pub fn prune(&self, keep_count: usize) -> Result<usize> {
        let snapshots = self.list()?;

        if snapshots.len() <= keep_count {
            return Ok(0);
        }

        let to_remove = snapshots.len() - keep_count;
        for snapshot in snapshots.iter().take(to_remove) {
            self.remove(&snapshot.id)?;
        }

        Ok(to_remove)
    }

    /// Remove snapshots older than `days`.
    pub fn prune_older_than(&self, days: i64) -> Result<usize> {
        let cutoff = Utc::now() - chrono::Duration::days(days);
        let mut removed = 0;

        for snapshot in self.list()? {
            if snapshot.timestamp < cutoff {
                self.remove(&snapshot.id)?;
                removed += 1;
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let file_path = dir.join(name);
        let mut file = File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path
    }

    fn create_test_manager() -> (BackupManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let manager = BackupManager::with_directory(temp_dir.path().join("backups")).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_snapshot_writes_copy_and_metadata() {
        let (mut manager, temp_dir) = create_test_manager();
        let source = create_test_file(temp_dir.path(), "App.tsx", "monolith content\n");

        let metadata = manager.snapshot(&source, "phase1").unwrap();

        let snapshot_dir = manager.backups_dir().join(&metadata.id);
        assert!(snapshot_dir.exists());
        assert!(snapshot_dir.join("operation.json").exists());
        assert_eq!(
            fs::read_to_string(&metadata.backup_path).unwrap(),
            "monolith content\n"
        );
        assert_eq!(metadata.label, "phase1");
        assert!(metadata.id.contains("phase1"));
    }

    #[test]
    fn test_snapshot_missing_source_fails() {
        let (mut manager, temp_dir) = create_test_manager();
        let missing = temp_dir.path().join("does_not_exist.txt");

        assert!(manager.snapshot(&missing, "phase1").is_err());
    }

    #[test]
    fn test_restore_puts_content_back_and_keeps_snapshot() {
        let (mut manager, temp_dir) = create_test_manager();
        let source = create_test_file(temp_dir.path(), "App.tsx", "original");

        let metadata = manager.snapshot(&source, "phase1").unwrap();
        fs::write(&source, "mutated").unwrap();

        let restored = manager.restore(&metadata.id).unwrap();

        assert_eq!(restored, source);
        assert_eq!(fs::read_to_string(&source).unwrap(), "original");
        // Restoring must not consume the snapshot.
        assert!(manager.backups_dir().join(&metadata.id).exists());
        assert!(manager.find(&metadata.id).is_ok());
    }

    #[test]
    fn test_restore_unknown_id_fails() {
        let (manager, _temp_dir) = create_test_manager();
        let err = manager.restore("no-such-snapshot").unwrap_err();
        assert!(err.to_string().contains("Snapshot not found"));
    }

    #[test]
    fn test_list_sorted_by_timestamp() {
        let (mut manager, temp_dir) = create_test_manager();
        let source = create_test_file(temp_dir.path(), "App.tsx", "content");

        let first = manager.snapshot(&source, "phase1").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let second = manager.snapshot(&source, "phase2").unwrap();

        let snapshots = manager.list().unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].id, first.id);
        assert_eq!(snapshots[1].id, second.id);
    }

    #[test]
    fn test_latest_id() {
        let (mut manager, temp_dir) = create_test_manager();
        assert!(manager.latest_id().unwrap().is_none());

        let source = create_test_file(temp_dir.path(), "App.tsx", "content");
        manager.snapshot(&source, "phase1").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let last = manager.snapshot(&source, "phase2").unwrap();

        assert_eq!(manager.latest_id().unwrap().unwrap(), last.id);
    }

    #[test]
    fn test_snapshots_are_not_auto_deleted() {
        let (mut manager, temp_dir) = create_test_manager();
        let source = create_test_file(temp_dir.path(), "App.tsx", "content");

        for i in 0..5 {
            manager.snapshot(&source, &format!("phase{i}")).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        assert_eq!(manager.list().unwrap().len(), 5);
    }

    #[test]
    fn test_prune_keeps_most_recent() {
        let (mut manager, temp_dir) = create_test_manager();
        let source = create_test_file(temp_dir.path(), "App.tsx", "content");

        let mut ids = Vec::new();
        for i in 0..4 {
            ids.push(manager.snapshot(&source, &format!("phase{i}")).unwrap().id);
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let removed = manager.prune(2).unwrap();
        assert_eq!(removed, 2);

        let remaining = manager.list().unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0].id, ids[2]);
        assert_eq!(remaining[1].id, ids[3]);
    }

    #[test]
    fn test_prune_noop_when_under_limit() {
        let (manager, _temp_dir) = create_test_manager();
        assert_eq!(manager.prune(10).unwrap(), 0);
    }

    #[test]
    fn test_prune_older_than() {
        let (mut manager, temp_dir) = create_test_manager();
        let source = create_test_file(temp_dir.path(), "App.tsx", "content");

        let metadata = manager.snapshot(&source, "phase1").unwrap();

        // Backdate the snapshot by editing its metadata.
        let metadata_path = manager
            .backups_dir()
            .join(&metadata.id)
            .join("operation.json");
        let mut aged: SnapshotMetadata =
            serde_json::from_str(&fs::read_to_string(&metadata_path).unwrap()).unwrap();
        aged.timestamp = Utc::now() - chrono::Duration::days(30);
        fs::write(&metadata_path, serde_json::to_string_pretty(&aged).unwrap()).unwrap();

        manager.snapshot(&source, "phase2").unwrap();

        let removed = manager.prune_older_than(7).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(manager.list().unwrap().len(), 1);
    }

    #[test]
    fn test_list_ignores_directories_without_metadata() {
        let (manager, _temp_dir) = create_test_manager();

        let stray = manager.backups_dir().join("stray-dir");
        fs::create_dir_all(&stray).unwrap();
        fs::write(stray.join("file.txt"), "data").unwrap();

        assert!(manager.list().unwrap().is_empty());
    }
}
