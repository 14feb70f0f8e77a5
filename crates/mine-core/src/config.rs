//! Configuration types and engine constants.

use serde::{Deserialize, Serialize};

/// Simulation ticks per second of level time.
pub const TICKS_PER_SECOND: u32 = 8;
/// Seconds before a time limit runs out during which the countdown sounds.
pub const COUNTDOWN_WINDOW_SECS: u32 = 10;
/// Ticks between arming a time bomb and its detonation.
pub const TIME_BOMB_FUSE: u8 = 16;
/// Bombs handed out by a bomb pack.
pub const BOMBS_PER_PACK: u8 = 3;
/// A rock resting on sand sinks with a chance of one in this many per tick.
pub const SAND_SINK_CHANCE: u32 = 8;
/// Largest grid side a level file may declare.
pub const MAX_GRID_SIDE: u16 = 1024;
/// Number of recent player positions kept as robot targets.
pub const MAX_ROBOT_TARGETS: usize = 8;
/// Highest player count a level may declare.
pub const MAX_PLAYERS: usize = 2;

/// Tunable properties of a level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProperties {
    /// Number of miners (1 or 2)
    pub player_count: u8,
    /// Chance in percent that a player's push succeeds
    pub push_probability: u8,
    /// A swamp cell spreads with a chance of one in this many per tick (0 = never)
    pub swamp_rate: u16,
    /// Ticks between two dispenser releases
    pub dispenser_speed: u16,
    /// Ticks between two elevator moves
    pub elevator_speed: u16,
    /// Ticks a wheel stays active once turned
    pub wheel_duration: u16,
    /// Robots move once every this many ticks
    pub robot_move_rate: u16,
    /// Loot value that opens the exits
    pub loot_target: u32,
    /// The level is lost once more than this much loot was destroyed
    pub loot_loss_threshold: Option<u32>,
    /// Maximum number of player steps
    pub step_limit: Option<u32>,
    /// Time limit in seconds
    pub time_limit: Option<u32>,
}

impl Default for LevelProperties {
    fn default() -> Self {
        Self {
            player_count: 1,
            push_probability: 100,
            swamp_rate: 20,
            dispenser_speed: 8,
            elevator_speed: 2,
            wheel_duration: 64,
            robot_move_rate: 2,
            loot_target: 0,
            loot_loss_threshold: None,
            step_limit: None,
            time_limit: None,
        }
    }
}

impl LevelProperties {
    /// Total ticks allowed by the time limit, if any.
    pub fn time_limit_ticks(&self) -> Option<u32> {
        self.time_limit.map(|secs| secs.saturating_mul(TICKS_PER_SECOND))
    }
}

/// Options of the demo replay utility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Stop a replay after this many ticks even if moves remain
    pub max_ticks: u64,
    /// Continue with idle ticks after the last move until the level resolves
    pub settle_ticks: u64,
    /// Attempt a truncation repair when a level file fails to parse
    pub repair_truncated: bool,
    /// Emit one JSON line per demo instead of a pretty report
    pub json_lines: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_ticks: 100_000,
            settle_ticks: 64,
            repair_truncated: false,
            json_lines: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let props = LevelProperties::default();
        assert_eq!(props.player_count, 1);
        assert_eq!(props.push_probability, 100);
        assert!(props.time_limit.is_none());

        let replay = ReplayConfig::default();
        assert_eq!(replay.max_ticks, 100_000);
    }

    #[test]
    fn test_time_limit_ticks() {
        let props = LevelProperties {
            time_limit: Some(30),
            ..Default::default()
        };
        assert_eq!(props.time_limit_ticks(), Some(30 * TICKS_PER_SECOND));
    }

    #[test]
    fn test_properties_serialization() {
        let props = LevelProperties {
            loot_target: 12,
            step_limit: Some(400),
            ..Default::default()
        };
        let json = serde_json::to_string(&props).unwrap();
        let deserialized: LevelProperties = serde_json::from_str(&json).unwrap();
        assert_eq!(props, deserialized);
    }
}
