//! One-byte move codes used by demos.
//!
//! A code packs a direction (none, up, down, left, right) and an action
//! (move, take, place bomb) as `b'A' + action * 5 + direction`, which keeps
//! recorded move strings printable (`A`..`O`).

use crate::error::{Error, Result};
use crate::types::{Action, Direction, Intent};

pub const MOVE_CODE_BASE: u8 = b'A';
pub const MOVE_CODE_COUNT: u8 = 15;

/// Byte recorded for an idle tick.
pub const IDLE_CODE: u8 = MOVE_CODE_BASE;

pub fn encode_move(intent: Intent) -> u8 {
    MOVE_CODE_BASE + intent.action.index() * 5 + intent.dir.index()
}

pub fn decode_move(code: u8) -> Result<Intent> {
    let raw = code
        .checked_sub(MOVE_CODE_BASE)
        .filter(|raw| *raw < MOVE_CODE_COUNT)
        .ok_or_else(|| Error::InvalidDemo(format!("unknown move code 0x{:02x}", code)))?;

    let dir = Direction::from_index(raw % 5)
        .ok_or_else(|| Error::InvalidDemo(format!("bad direction in 0x{:02x}", code)))?;
    let action = Action::from_index(raw / 5)
        .ok_or_else(|| Error::InvalidDemo(format!("bad action in 0x{:02x}", code)))?;

    Ok(Intent::new(dir, action))
}

/// Decode, clamping unrecognised codes to an idle tick.
pub fn decode_move_lossy(code: u8) -> Intent {
    decode_move(code).unwrap_or(Intent::IDLE)
}
