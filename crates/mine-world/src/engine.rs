//! The turn engine.
//!
//! `apply_turn` advances the whole game by one tick in fixed phases:
//!
//! 1. administration (counters, transient cells, delayed transitions)
//! 2. the active wheel
//! 3. player actions
//! 4. the countdown clock
//! 5. the main scan over every cell, row-major from the bottom-left
//! 6. the loot check that opens the exits
//! 7. outcome evaluation
//!
//! A cell whose stamp equals the current turn has already been handled in
//! this tick and is skipped by the scan. Every resolver that moves content
//! into a cell stamps the destination.

use crate::game::Game;
use crate::sound::SoundEvent;
use mine_core::{
    Cell, ExitState, FailureReason, Flags, Intent, ObjectKind, Outcome, Phase, Position,
    COUNTDOWN_WINDOW_SECS, TICKS_PER_SECOND,
};
use tracing::{info, trace};

impl Game {
    /// Advance the game by one tick. Does nothing once the outcome is decided.
    pub fn apply_turn(&mut self) {
        if self.outcome.is_decided() {
            return;
        }

        self.admin_phase();
        self.wheel_phase();
        self.player_phase();
        let timed_out = self.countdown_phase();
        self.scan_phase();
        self.loot_check_phase();
        self.evaluate_outcome(timed_out);

        self.stats.turns = self.turn;
        trace!(
            event = "turn_applied",
            turn = self.turn,
            sounds = self.sounds.len(),
            playing = self.count.playing,
        );
    }

    fn admin_phase(&mut self) {
        self.moves.reserve(self.miners.len());
        self.elevator_clock = (self.elevator_clock + 1) % self.props.elevator_speed.max(1);
        self.dispenser_clock = (self.dispenser_clock + 1) % self.props.dispenser_speed.max(1);
        self.turn += 1;
        self.sounds.clear();
        self.robot_targets.clear();

        for index in 0..self.grid.len() {
            let pos = self.grid.index_to_pos(index);
            let cell = self.grid.get(pos);

            match (cell.kind, cell.phase) {
                (ObjectKind::Laser, _) => self.grid.set(pos, Cell::air()),
                (_, Phase::Breaking | Phase::Shattering) => self.grid.set(pos, Cell::air()),
                (ObjectKind::Dispenser, Phase::Dispensing) => self.release_dispenser(pos),
                (_, Phase::Pushing | Phase::Sinking) => self.set_phase(pos, Phase::Still),
                (ObjectKind::Exit, _) => self.advance_exit(pos),
                _ => {}
            }
        }
    }

    fn advance_exit(&mut self, pos: Position) {
        let playing = self.count.playing;
        let Some(cell) = self.grid.get_mut(pos) else {
            return;
        };
        let next = match cell.exit_state() {
            Some(ExitState::Occupied) if playing == 0 => ExitState::Closing,
            Some(ExitState::Occupied) => ExitState::Open,
            Some(ExitState::Opening) => ExitState::Open,
            Some(ExitState::Closing) => ExitState::Closed,
            _ => return,
        };
        cell.set_exit_state(next);
    }

    fn wheel_phase(&mut self) {
        let Some(mut wheel) = self.wheel else {
            return;
        };

        wheel.remaining = wheel.remaining.saturating_sub(1);
        if wheel.remaining == 0 {
            if self.grid.kind(wheel.pos) == ObjectKind::Wheel {
                self.set_phase(wheel.pos, Phase::Still);
            }
            self.wheel = None;
            return;
        }

        self.wheel = Some(wheel);
        self.add_robot_target(wheel.pos);
        self.emit(SoundEvent::Wheel);
    }

    fn player_phase(&mut self) {
        for index in 0..self.miners.len() {
            let intent = std::mem::replace(&mut self.controls[index], Intent::IDLE);
            let mut recorded = Intent::IDLE;

            if self.miners[index].is_playing() {
                if let Some(pos) = self.find_miner(index) {
                    if !self.grid.is_stamped(pos, self.turn) {
                        recorded = intent;
                        if self.try_move_player_to(pos, intent) {
                            self.stats.steps += 1;
                        }
                    }
                }
            }

            self.record_move(recorded);
        }

        if self.wheel.is_none() {
            for index in 0..self.miners.len() {
                if !self.miners[index].is_playing() {
                    continue;
                }
                if let Some(pos) = self.find_miner(index) {
                    self.add_robot_target(pos);
                }
            }
        }
    }

    /// Returns true once the time limit has run out.
    fn countdown_phase(&mut self) -> bool {
        let Some(limit) = self.props.time_limit_ticks() else {
            return false;
        };

        let remaining = limit as i64 - self.turn as i64;
        if remaining <= 0 {
            return true;
        }

        let tps = TICKS_PER_SECOND as i64;
        if remaining <= COUNTDOWN_WINDOW_SECS as i64 * tps && remaining % tps == 0 {
            self.emit(SoundEvent::Countdown);
        }
        false
    }

    fn scan_phase(&mut self) {
        let turn = self.turn;

        for index in 0..self.grid.len() {
            let pos = self.grid.index_to_pos(index);
            let cell = self.grid.get(pos);
            if cell.stamp == turn {
                continue;
            }

            if cell.pending_blast {
                self.detonate(pos);
                self.grid.stamp(pos, turn);
                continue;
            }

            match cell.kind {
                ObjectKind::Explosion => self.apply_explosion_state(pos),
                ObjectKind::Exit => {}
                ObjectKind::TimeBomb => self.apply_time_bomb(pos),
                ObjectKind::Dispenser => self.apply_dispenser(pos),
                ObjectKind::Swamp => self.apply_swamp(pos),
                ObjectKind::SandRock => self.apply_sand_rock(pos),
                ObjectKind::Pusher => self.apply_pusher_object_turn(pos),
                ObjectKind::Conveyor => self.apply_conveyor(pos),
                ObjectKind::Elevator => self.apply_elevator(pos),
                _ if cell.has(Flags::FALLABLE) => self.apply_fallable_turn(pos),
                _ if cell.has(Flags::ENEMY) => self.apply_enemy_turn(pos),
                _ => {}
            }

            self.grid.stamp(pos, turn);
        }
    }

    fn loot_check_phase(&mut self) {
        if self.exits_opened || self.ledger.collected < self.props.loot_target {
            return;
        }

        for pos in self.grid.find(ObjectKind::Exit) {
            if let Some(cell) = self.grid.get_mut(pos) {
                if cell.exit_state() == Some(ExitState::Closed) {
                    cell.set_exit_state(ExitState::Opening);
                }
            }
        }
        self.exits_opened = true;
        self.emit(SoundEvent::ExitOpen);
        info!(
            event = "exits_opened",
            turn = self.turn,
            collected = self.ledger.collected
        );
    }

    fn evaluate_outcome(&mut self, timed_out: bool) {
        let outcome = if self.count.playing == 0 && self.count.finished > 0 {
            Outcome::Success
        } else if self.count.playing == 0 {
            Outcome::Failure(FailureReason::MinersLost)
        } else if self
            .props
            .loot_loss_threshold
            .is_some_and(|threshold| self.ledger.lost > threshold)
        {
            Outcome::Failure(FailureReason::LootLost)
        } else if self
            .props
            .step_limit
            .is_some_and(|limit| self.stats.steps > limit)
        {
            Outcome::Failure(FailureReason::StepLimit)
        } else if timed_out {
            Outcome::Failure(FailureReason::TimeOut)
        } else {
            Outcome::Playing
        };

        if outcome.is_decided() {
            self.outcome = outcome;
            self.stats.outcome = outcome;
            info!(
                event = "level_resolved",
                outcome = ?outcome,
                turn = self.turn,
                steps = self.stats.steps,
                loot_collected = self.ledger.collected,
                loot_lost = self.ledger.lost,
                miners_finished = self.count.finished,
            );
        }
    }

    pub(crate) fn set_phase(&mut self, pos: Position, phase: Phase) {
        if let Some(cell) = self.grid.get_mut(pos) {
            cell.phase = phase;
        }
    }
}
