//! Core types for the Mine cellular puzzle engine.
//!
//! Holds everything the engine and the codecs share: positions and
//! intents, the object kinds with their capability flags, the immutable
//! prototype table, the cell model, level properties and play statistics.

pub mod types;
pub mod config;
pub mod error;
pub mod object;
pub mod cell;
pub mod prototype;
pub mod stats;
pub mod moves;

pub use error::{Error, Result};
pub use types::*;
pub use config::*;
pub use object::{Flags, ObjectKind};
pub use cell::{Blast, Cell, ExitState, Payload, Phase};
pub use stats::*;
pub use moves::{decode_move, decode_move_lossy, encode_move, IDLE_CODE};
