//! Level files and demos.
//!
//! Reads and writes the versioned binary level format, salvages truncated
//! files and plays recorded demos back against the engine.

pub mod alphabet;
pub mod demo;
pub mod format;
pub mod repair;

use mine_core::Result;
use mine_world::Level;
use std::fs;
use std::path::Path;
use tracing::info;

pub use alphabet::{decode_byte, encode_cell, grid_from_rows};
pub use demo::{
    check, judge, replay, replay_with, verify, DemoCheck, DemoPlayer, DemoVerdict, ReplayReport,
};
pub use format::{read_level, write_level, FORMAT_VERSION};
pub use repair::{repair_file, repair_truncated};

/// Read a level file.
pub fn load(path: impl AsRef<Path>) -> Result<Level> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let level = read_level(&bytes)?;
    info!(
        event = "level_loaded",
        path = %path.display(),
        title = %level.meta.title,
        demos = level.demos.len(),
    );
    Ok(level)
}

/// Write a level file in the current format version.
pub fn save(path: impl AsRef<Path>, level: &Level) -> Result<()> {
    let path = path.as_ref();
    let bytes = write_level(level)?;
    fs::write(path, &bytes)?;
    info!(event = "level_saved", path = %path.display(), bytes = bytes.len());
    Ok(())
}
