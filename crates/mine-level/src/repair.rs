//! Recovery of level files cut short on disk.

use crate::format::{salvage, write_level};
use mine_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Rebuild a damaged level file from its complete leading records.
///
/// Returns `None` when the header is unreadable or no complete GRID record
/// precedes the damage. The result is written in the current format
/// version with the demo count matching the demos that survived.
pub fn repair_truncated(bytes: &[u8]) -> Option<Vec<u8>> {
    let (level, complete) = salvage(bytes)?;
    let repaired = write_level(&level).ok()?;
    info!(
        event = "level_repaired",
        kept_bytes = complete,
        dropped_bytes = bytes.len() - complete,
        demos = level.demos.len(),
    );
    Some(repaired)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

/// Repair a level file in place, keeping the original as `<name>.bak`.
/// Returns the path of the backup.
pub fn repair_file(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;

    let Some(repaired) = repair_truncated(&bytes) else {
        warn!(event = "repair_failed", path = %path.display());
        return Err(Error::InvalidState(format!(
            "{} cannot be repaired",
            path.display()
        )));
    };

    let backup = backup_path(path);
    fs::rename(path, &backup)?;
    fs::write(path, repaired)?;
    info!(event = "level_file_repaired", path = %path.display(), backup = %backup.display());
    Ok(backup)
}
