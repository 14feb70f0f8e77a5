//! Player movement, pushing and the mechanical movers (pushers, conveyors,
//! elevators).

use crate::game::{placed_loot, Game, WheelRef};
use crate::sound::SoundEvent;
use mine_core::{
    Action, Cell, Direction, ExitState, Flags, Intent, ObjectKind, Phase, Position,
    BOMBS_PER_PACK, TIME_BOMB_FUSE,
};
use rand::Rng;
use tracing::{debug, trace};

impl Game {
    /// Resolve the intent of the miner standing at `player`. Returns true
    /// when the miner left its cell.
    pub fn try_move_player_to(&mut self, player: Position, intent: Intent) -> bool {
        let turn = self.turn;
        let Some(miner) = self.grid.get(player).miner().map(usize::from) else {
            return false;
        };

        if intent.is_idle() {
            self.grid.stamp(player, turn);
            return false;
        }

        let target = player.step(intent.dir);
        let moved = match intent.action {
            Action::Move => self.step_player(player, target, intent.dir, miner),
            Action::Take => {
                self.take_adjacent(target, miner);
                false
            }
            Action::PlaceBomb => {
                self.place_bomb(target, miner);
                false
            }
        };

        if !moved {
            self.grid.stamp(player, turn);
        }
        moved
    }

    fn step_player(
        &mut self,
        player: Position,
        target: Position,
        dir: Direction,
        miner: usize,
    ) -> bool {
        let turn = self.turn;
        let cell = self.grid.get(target);

        match cell.kind {
            ObjectKind::Air => {
                self.grid.move_cell(player, target, turn);
                true
            }
            ObjectKind::Earth | ObjectKind::Sand => {
                self.emit(SoundEvent::Dig);
                self.grid.move_cell(player, target, turn);
                true
            }
            ObjectKind::Exit => {
                if !cell.exit_state().is_some_and(|s| s.accepts_miner()) {
                    return false;
                }
                self.grid.take(player);
                self.grid.stamp(player, turn);
                if let Some(exit) = self.grid.get_mut(target) {
                    exit.set_exit_state(ExitState::Occupied);
                }
                self.grid.stamp(target, turn);
                self.finish_miner(miner);
                self.emit(SoundEvent::ExitEnter);
                true
            }
            ObjectKind::Door => {
                let held = cell
                    .color()
                    .is_some_and(|c| self.miners[miner].keys & c.bit() != 0);
                let beyond = target.step(dir);
                if !held || !self.grid.is_air(beyond) {
                    return false;
                }
                self.grid.move_cell(player, beyond, turn);
                self.emit(SoundEvent::Door);
                true
            }
            ObjectKind::Wheel => {
                self.turn_wheel(target);
                false
            }
            ObjectKind::Acid => {
                self.grid.take(player);
                self.grid.stamp(player, turn);
                self.kill_miner(miner);
                self.emit(SoundEvent::Acid);
                false
            }
            _ if cell.has(Flags::PICKABLE) => {
                self.collect(target, miner);
                self.grid.move_cell(player, target, turn);
                true
            }
            _ if cell.has(Flags::ENEMY) => {
                trace!(event = "walked_into_enemy", miner, x = target.x, y = target.y);
                self.detonate(player);
                false
            }
            _ if cell.has(Flags::PUSHABLE) => {
                if self.try_push(target, dir, true) {
                    self.grid.move_cell(player, target, turn);
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn take_adjacent(&mut self, target: Position, miner: usize) {
        let cell = self.grid.get(target);
        match cell.kind {
            ObjectKind::Earth | ObjectKind::Sand => {
                self.grid.put(target, Cell::air(), self.turn);
                self.emit(SoundEvent::Dig);
            }
            ObjectKind::Wheel => self.turn_wheel(target),
            _ if cell.has(Flags::PICKABLE) => {
                self.collect(target, miner);
                self.grid.stamp(target, self.turn);
            }
            _ => {}
        }
    }

    fn place_bomb(&mut self, target: Position, miner: usize) {
        if self.miners[miner].bombs == 0 || !self.grid.is_air(target) {
            return;
        }
        self.miners[miner].bombs -= 1;
        self.stats.bombs_placed += 1;
        self.grid
            .put(target, Cell::time_bomb(TIME_BOMB_FUSE), self.turn);
        debug!(event = "bomb_placed", miner, x = target.x, y = target.y);
    }

    fn collect(&mut self, pos: Position, miner: usize) {
        let cell = self.grid.take(pos);
        self.collect_loot(placed_loot(&cell));

        match cell.kind {
            ObjectKind::Key => {
                if let Some(color) = cell.color() {
                    self.miners[miner].keys |= color.bit();
                    self.stats.keys_collected += 1;
                }
            }
            ObjectKind::BombPack => {
                let state = &mut self.miners[miner];
                state.bombs = state.bombs.saturating_add(BOMBS_PER_PACK);
            }
            _ => {}
        }
        self.emit(SoundEvent::Pick);
    }

    fn turn_wheel(&mut self, pos: Position) {
        if let Some(previous) = self.wheel {
            if previous.pos != pos && self.grid.kind(previous.pos) == ObjectKind::Wheel {
                self.set_phase(previous.pos, Phase::Still);
            }
        }
        self.set_phase(pos, Phase::Spinning);
        self.wheel = Some(WheelRef {
            pos,
            remaining: self.props.wheel_duration,
        });
        self.emit(SoundEvent::Wheel);
    }

    /// Shove the object at `from` one cell towards `dir`. Miners need a
    /// `PUSHABLE` object and may fail by chance; machines need an
    /// `OBJECT_PUSHABLE` one and always succeed.
    pub fn try_push(&mut self, from: Position, dir: Direction, by_player: bool) -> bool {
        let cell = self.grid.get(from);
        if cell.pending_blast || dir == Direction::None {
            return false;
        }

        let required = if by_player {
            Flags::PUSHABLE
        } else {
            Flags::OBJECT_PUSHABLE
        };
        if !cell.has(required) {
            return false;
        }
        if cell.has(Flags::FALLABLE) && (cell.is_moving() || (by_player && !dir.is_horizontal()))
        {
            return false;
        }

        let beyond = from.step(dir);
        if !self.grid.is_air(beyond) {
            return false;
        }

        if by_player {
            let roll: u8 = self.rng.gen_range(0..100);
            if roll >= self.props.push_probability {
                return false;
            }
            self.stats.pushes += 1;
        }

        self.grid.move_cell(from, beyond, self.turn);
        self.set_phase(beyond, Phase::Pushing);
        self.emit(SoundEvent::Push);
        true
    }

    pub fn apply_pusher_object_turn(&mut self, pos: Position) {
        let dir = self.grid.get(pos).dir;
        self.try_push(pos.step(dir), dir, false);
    }

    /// Carry the object resting on a conveyor one cell along the belt.
    pub(crate) fn apply_conveyor(&mut self, pos: Position) {
        let dir = self.grid.get(pos).dir;
        let top = pos.above();
        let cell = self.grid.get(top);

        if !cell.has(Flags::OBJECT_PUSHABLE)
            || cell.is_moving()
            || self.grid.is_stamped(top, self.turn)
        {
            return;
        }
        let dest = top.step(dir);
        if self.grid.is_air(dest) {
            self.grid.move_cell(top, dest, self.turn);
        }
    }

    /// Move an elevator one cell along its direction together with whatever
    /// rests on it; reverse when blocked.
    pub(crate) fn apply_elevator(&mut self, pos: Position) {
        if self.elevator_clock != 0 {
            return;
        }
        let turn = self.turn;
        let dir = self.grid.get(pos).dir;
        let top = pos.above();
        let load = self.grid.get(top);
        let carried = carriable(&load);

        let moved = match dir {
            Direction::Up if load.is_air() => {
                self.grid.move_cell(pos, top, turn);
                true
            }
            Direction::Up if carried && self.grid.is_air(top.above()) => {
                self.grid.move_cell(top, top.above(), turn);
                self.grid.move_cell(pos, top, turn);
                true
            }
            Direction::Down if self.grid.is_air(pos.below()) => {
                self.grid.move_cell(pos, pos.below(), turn);
                if carried {
                    self.grid.move_cell(top, pos, turn);
                }
                true
            }
            _ => false,
        };

        if !moved {
            if let Some(cell) = self.grid.get_mut(pos) {
                cell.dir = if dir == Direction::Up {
                    Direction::Down
                } else {
                    Direction::Up
                };
            }
        }
    }
}

fn carriable(cell: &Cell) -> bool {
    cell.kind == ObjectKind::Player
        || cell.has(Flags::OBJECT_PUSHABLE)
        || cell.has(Flags::FALLABLE)
}
