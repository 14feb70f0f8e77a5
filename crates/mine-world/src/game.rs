//! Run-time state of a level being played.
//!
//! A `Game` owns its own copy of the grid and everything the turn engine
//! changes from tick to tick. It is created from a `Level` and a seed; with
//! the same level, seed and intents two games evolve identically.

use crate::grid::Grid;
use crate::level::{Demo, Level, Remainder};
use crate::sound::{SoundEvent, SoundSet};
use mine_core::{
    encode_move, Cell, Direction, Error, Intent, LevelProperties, LootLedger, ObjectKind, Outcome,
    Payload, Phase, PlayStats, Position, Result, MAX_PLAYERS, MAX_ROBOT_TARGETS,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Per-player bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerState {
    pub alive: bool,
    pub finished: bool,
    /// Time bombs carried
    pub bombs: u8,
    /// Key ring, one bit per colour
    pub keys: u8,
}

impl MinerState {
    fn new() -> Self {
        Self {
            alive: true,
            finished: false,
            bombs: 0,
            keys: 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.alive && !self.finished
    }
}

/// Miner counters of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerCount {
    pub total: u32,
    pub playing: u32,
    pub finished: u32,
}

/// The wheel currently turned by a miner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelRef {
    pub pos: Position,
    pub remaining: u16,
}

/// Sounds a level can switch off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Silence {
    pub yamyam: bool,
    pub explosion: bool,
}

#[derive(Debug, Clone)]
pub struct Game {
    pub(crate) grid: Grid,
    pub(crate) props: LevelProperties,
    pub(crate) silence: Silence,
    pub(crate) palette: Vec<Remainder>,
    pub(crate) palette_cursor: usize,
    pub(crate) seed: u32,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) turn: u32,
    pub(crate) ledger: LootLedger,
    pub(crate) miners: Vec<MinerState>,
    pub(crate) count: MinerCount,
    pub(crate) controls: [Intent; MAX_PLAYERS],
    pub(crate) sounds: SoundSet,
    pub(crate) robot_targets: Vec<Position>,
    pub(crate) wheel: Option<WheelRef>,
    pub(crate) elevator_clock: u16,
    pub(crate) dispenser_clock: u16,
    pub(crate) exits_opened: bool,
    /// Ruby lasers waiting to be fired by the current detonation.
    pub(crate) lasers: Vec<(Position, Direction)>,
    pub(crate) moves: Vec<u8>,
    pub(crate) stats: PlayStats,
    pub(crate) outcome: Outcome,
}

impl Game {
    pub fn new(level: &Level, seed: u32) -> Result<Self> {
        level.validate_layout()?;

        let mut grid = level.grid.clone();
        let players: Vec<Position> = grid.find(ObjectKind::Player);
        for (index, pos) in players.iter().enumerate() {
            let cell = grid.get(*pos).with_payload(Payload::Miner(index as u8))?;
            grid.set(*pos, cell);
        }

        let player_count = level.props.player_count as usize;
        let ledger = LootLedger::new(loot_on(&grid));

        debug!(
            event = "game_created",
            seed,
            width = grid.width,
            height = grid.height,
            players = player_count,
            loot = ledger.initial,
        );

        Ok(Self {
            grid,
            props: level.props.clone(),
            silence: Silence {
                yamyam: level.meta.silent_yamyam,
                explosion: level.meta.silent_explosion,
            },
            palette: level.palette(),
            palette_cursor: 0,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed as u64),
            turn: 0,
            ledger,
            miners: vec![MinerState::new(); player_count],
            count: MinerCount {
                total: player_count as u32,
                playing: player_count as u32,
                finished: 0,
            },
            controls: [Intent::IDLE; MAX_PLAYERS],
            sounds: SoundSet::new(),
            robot_targets: Vec::with_capacity(MAX_ROBOT_TARGETS),
            wheel: None,
            elevator_clock: 0,
            dispenser_clock: 0,
            exits_opened: false,
            lasers: Vec::new(),
            moves: Vec::new(),
            stats: PlayStats::new(),
            outcome: Outcome::Playing,
        })
    }

    /// Queue the intent of `player` for the next tick.
    pub fn set_intent(&mut self, player: usize, intent: Intent) -> Result<()> {
        if player >= self.miners.len() {
            return Err(Error::Validation(format!(
                "player {} out of range, level has {}",
                player,
                self.miners.len()
            )));
        }
        self.controls[player] = intent;
        Ok(())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn sounds(&self) -> &[SoundEvent] {
        self.sounds.as_slice()
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn stats(&self) -> &PlayStats {
        &self.stats
    }

    /// Encoded moves of every tick applied so far.
    pub fn moves(&self) -> &[u8] {
        &self.moves
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn props(&self) -> &LevelProperties {
        &self.props
    }

    pub fn ledger(&self) -> &LootLedger {
        &self.ledger
    }

    pub fn miners(&self) -> &[MinerState] {
        &self.miners
    }

    pub fn miner_count(&self) -> MinerCount {
        self.count
    }

    pub fn player_count(&self) -> usize {
        self.miners.len()
    }

    pub fn wheel(&self) -> Option<WheelRef> {
        self.wheel
    }

    pub fn robot_targets(&self) -> &[Position] {
        &self.robot_targets
    }

    /// Build a demo from this run's seed and recorded moves.
    pub fn record_demo(&self, title: impl Into<String>) -> Demo {
        Demo {
            seed: self.seed,
            moves: self.moves.clone(),
            title: title.into(),
            user_recorded: true,
            expect_success: self.outcome.is_success(),
        }
    }

    /// Value of the loot currently lying on the grid.
    pub fn loot_in_play(&self) -> u32 {
        loot_on(&self.grid)
    }

    /// Position of the cell of miner `index`, if it is still on the grid.
    pub fn find_miner(&self, index: usize) -> Option<Position> {
        self.grid
            .iter()
            .find(|(_, c)| c.kind == ObjectKind::Player && c.miner() == Some(index as u8))
            .map(|(pos, _)| pos)
    }

    pub(crate) fn emit(&mut self, event: SoundEvent) {
        let muted = match event {
            SoundEvent::Eat => self.silence.yamyam,
            SoundEvent::Explosion => self.silence.explosion,
            _ => false,
        };
        if !muted {
            self.sounds.push(event);
        }
    }

    pub(crate) fn add_robot_target(&mut self, pos: Position) {
        self.robot_targets.retain(|p| *p != pos);
        self.robot_targets.insert(0, pos);
        self.robot_targets.truncate(MAX_ROBOT_TARGETS);
    }

    pub(crate) fn kill_miner(&mut self, index: usize) {
        let Some(miner) = self.miners.get_mut(index) else {
            return;
        };
        if !miner.is_playing() {
            return;
        }
        miner.alive = false;
        self.count.playing -= 1;
        self.stats.miners_lost += 1;
        debug!(event = "miner_lost", miner = index, turn = self.turn);
    }

    pub(crate) fn finish_miner(&mut self, index: usize) {
        let Some(miner) = self.miners.get_mut(index) else {
            return;
        };
        if !miner.is_playing() {
            return;
        }
        miner.finished = true;
        self.count.playing -= 1;
        self.count.finished += 1;
        self.stats.miners_finished += 1;
        info!(event = "miner_finished", miner = index, turn = self.turn);
    }

    pub(crate) fn lose_loot(&mut self, value: u32) {
        if value > 0 {
            self.ledger.lose(value);
            self.stats.loot_lost += value;
        }
    }

    pub(crate) fn collect_loot(&mut self, value: u32) {
        if value > 0 {
            self.ledger.collect(value);
            self.stats.loot_collected += value;
        }
    }

    pub(crate) fn record_move(&mut self, intent: Intent) {
        self.moves.push(encode_move(intent));
    }
}

/// Loot value a cell still counts for; gems already breaking count as lost.
pub(crate) fn placed_loot(cell: &Cell) -> u32 {
    match cell.phase {
        Phase::Breaking | Phase::Shattering => 0,
        _ => cell.kind.loot_value(),
    }
}

fn loot_on(grid: &Grid) -> u32 {
    grid.cells().iter().map(placed_loot).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{game, level};

    #[test]
    fn test_players_numbered_row_major() {
        let game = game(&["  P", "P  "]);
        assert_eq!(game.player_count(), 2);
        assert_eq!(game.find_miner(0), Some(Position::new(0, 0)));
        assert_eq!(game.find_miner(1), Some(Position::new(2, 1)));
        assert_eq!(game.miner_count().playing, 2);
    }

    #[test]
    fn test_rejects_invalid_level() {
        let mut level = level(&["P  "]);
        level.props.player_count = 2;
        assert!(Game::new(&level, 1).is_err());
    }

    #[test]
    fn test_set_intent_range() {
        let mut game = game(&["P  "]);
        assert!(game.set_intent(0, Intent::step(Direction::Right)).is_ok());
        assert!(game.set_intent(1, Intent::IDLE).is_err());
    }

    #[test]
    fn test_robot_targets_distinct_and_capped() {
        let mut game = game(&["P  "]);
        for x in 0..10 {
            game.add_robot_target(Position::new(x, 0));
        }
        game.add_robot_target(Position::new(5, 0));

        assert_eq!(game.robot_targets().len(), MAX_ROBOT_TARGETS);
        assert_eq!(game.robot_targets()[0], Position::new(5, 0));
        assert_eq!(
            game.robot_targets()
                .iter()
                .filter(|p| **p == Position::new(5, 0))
                .count(),
            1
        );
    }

    #[test]
    fn test_initial_ledger() {
        let game = game(&["Pe$s"]);
        assert_eq!(game.ledger().initial, 14);
        assert_eq!(game.loot_in_play(), 14);
    }

    #[test]
    fn test_silenced_sounds() {
        let mut level = level(&["P  "]);
        level.meta.silent_explosion = true;
        let mut game = Game::new(&level, 3).unwrap();

        game.emit(SoundEvent::Explosion);
        game.emit(SoundEvent::Eat);

        assert_eq!(game.sounds(), &[SoundEvent::Eat]);
    }
}
