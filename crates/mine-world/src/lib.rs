//! The Mine world: grid arena, levels and the turn engine.
//!
//! A [`Level`] is the authored, serializable description of a puzzle. A
//! [`Game`] is one deterministic run of a level: it owns a copy of the grid
//! and advances it tick by tick through [`Game::apply_turn`]. The engine
//! phases live in `engine`, the per-object behaviour in the resolver
//! modules, each of which extends `Game` with its own `impl` block.

pub mod grid;
pub mod level;
pub mod sound;
pub mod game;
pub mod engine;
pub mod fall;
pub mod explosion;
pub mod movement;
pub mod enemy;
pub mod terrain;

#[cfg(test)]
mod testing;

pub use grid::Grid;
pub use level::{default_palette, Demo, Level, LevelMeta, Remainder};
pub use sound::{SoundEvent, SoundSet};
pub use game::{Game, MinerCount, MinerState, WheelRef};
