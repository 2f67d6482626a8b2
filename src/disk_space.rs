//! Disk space checking for snapshot writes
//!
//! A destructive phase must never start without a durable snapshot, so the
//! snapshot write is checked against free space up front instead of failing
//! halfway through a copy.

use anyhow::{Context, Result};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct DiskSpace {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl DiskSpace {
    pub fn bytes_to_human(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = 1024 * KB;
        const GB: u64 = 1024 * MB;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    pub fn available_human(&self) -> String {
        Self::bytes_to_human(self.available_bytes)
    }
}

#[cfg(unix)]
pub fn get_disk_space(path: &Path) -> Result<DiskSpace> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path =
        CString::new(path.as_os_str().as_bytes()).context("Failed to convert path to CString")?;

    // Safety: statvfs is a plain C struct of integers, so a zeroed value is
    // a valid initializer, and the call only writes through the reference.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    unsafe {
        if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
            return Err(anyhow::anyhow!(
                "Failed to get disk space for '{}': {}",
                path.display(),
                std::io::Error::last_os_error()
            ));
        }
    }

    let frsize = stat.f_frsize;
    Ok(DiskSpace {
        total_bytes: stat.f_blocks * frsize,
        available_bytes: stat.f_bavail * frsize,
    })
}

#[cfg(not(unix))]
pub fn get_disk_space(_path: &Path) -> Result<DiskSpace> {
    Err(anyhow::anyhow!(
        "Disk space checking is only implemented on Unix platforms"
    ))
}

/// Fail if writing `required_bytes` under `snapshot_dir` would consume more
/// than `max_percent` of the free space there.
pub fn check_space_for_snapshot(
    snapshot_dir: &Path,
    required_bytes: u64,
    max_percent: f64,
) -> Result<()> {
    let space = get_disk_space(snapshot_dir).context("Failed to check disk space")?;

    let percent_of_free = if space.available_bytes > 0 {
        (required_bytes as f64 / space.available_bytes as f64) * 100.0
    } else {
        100.0
    };

    if percent_of_free > max_percent {
        return Err(anyhow::anyhow!(
            "Insufficient disk space for snapshot\n\
             snapshot directory: {}\n\
             available: {}\n\
             required: {} ({:.1}% of free space, maximum {:.1}%)\n\
             \n\
             Remove old snapshots (carvex backup prune --keep=5) or point\n\
             --backup-dir at a partition with more room.",
            snapshot_dir.display(),
            space.available_human(),
            DiskSpace::bytes_to_human(required_bytes),
            percent_of_free,
            max_percent
        ));
    }

    Ok(())
}
