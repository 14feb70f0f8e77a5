//! Enemy behaviour: wall-hugging bugs and lorries, wandering yam-yams and
//! pursuing robots.

use crate::game::{placed_loot, Game};
use crate::sound::SoundEvent;
use mine_core::{Direction, ObjectKind, Phase, Position};
use rand::Rng;
use tracing::trace;

impl Game {
    pub fn apply_enemy_turn(&mut self, pos: Position) {
        let kind = self.grid.kind(pos);

        if kind != ObjectKind::Robot && self.player_adjacent(pos) {
            trace!(event = "enemy_touched_player", kind = ?kind, x = pos.x, y = pos.y);
            self.detonate(pos);
            return;
        }

        match kind {
            ObjectKind::Bug => self.wall_hug(pos, true),
            ObjectKind::Lorry => self.wall_hug(pos, false),
            ObjectKind::YamYam => self.apply_yamyam(pos),
            ObjectKind::Robot => self.apply_robot(pos),
            other => unreachable!("{:?} is not an enemy", other),
        }
    }

    fn player_adjacent(&self, pos: Position) -> bool {
        Direction::all()
            .iter()
            .any(|d| self.grid.kind(pos.step(*d)) == ObjectKind::Player)
    }

    /// Bugs keep a wall on their left, lorries on their right.
    fn wall_hug(&mut self, pos: Position, prefer_left: bool) {
        let mut dir = self.grid.get(pos).dir;
        if dir == Direction::None {
            dir = Direction::Up;
        }
        let (side, other) = if prefer_left {
            (dir.turn_left(), dir.turn_right())
        } else {
            (dir.turn_right(), dir.turn_left())
        };

        if self.grid.is_air(pos.step(side)) {
            self.move_enemy(pos, side);
        } else if self.grid.is_air(pos.step(dir)) {
            self.move_enemy(pos, dir);
        } else {
            self.face(pos, other);
        }
    }

    fn apply_yamyam(&mut self, pos: Position) {
        let dir = self.grid.get(pos).dir;
        let ahead = pos.step(dir);
        let food = self.grid.get(ahead);

        if dir != Direction::None && food.kind.is_gem() && placed_loot(&food) > 0 {
            self.lose_loot(placed_loot(&food));
            self.move_enemy(pos, dir);
            self.emit(SoundEvent::Eat);
        } else if dir != Direction::None && self.grid.is_air(ahead) {
            self.move_enemy(pos, dir);
        } else {
            let dirs = Direction::all();
            let next = dirs[self.rng.gen_range(0..dirs.len())];
            self.face(pos, next);
        }
    }

    /// Greedy pursuit of the nearest robot target, larger axis first.
    fn apply_robot(&mut self, pos: Position) {
        if self.turn % u32::from(self.props.robot_move_rate.max(1)) != 0 {
            return;
        }
        let Some(target) = self
            .robot_targets
            .iter()
            .copied()
            .min_by_key(|t| pos.manhattan_distance(t))
        else {
            return;
        };

        let dx = target.x - pos.x;
        let dy = target.y - pos.y;
        let horizontal = if dx > 0 {
            Direction::Right
        } else if dx < 0 {
            Direction::Left
        } else {
            Direction::None
        };
        let vertical = if dy > 0 {
            Direction::Up
        } else if dy < 0 {
            Direction::Down
        } else {
            Direction::None
        };
        let order = if dx.abs() >= dy.abs() {
            [horizontal, vertical]
        } else {
            [vertical, horizontal]
        };

        for dir in order {
            if dir == Direction::None {
                continue;
            }
            let dest = pos.step(dir);
            match self.grid.kind(dest) {
                ObjectKind::Air => {
                    self.move_enemy(pos, dir);
                    return;
                }
                ObjectKind::Player => {
                    trace!(event = "robot_caught_player", x = dest.x, y = dest.y);
                    self.detonate(dest);
                    return;
                }
                _ => {}
            }
        }
    }

    fn move_enemy(&mut self, pos: Position, dir: Direction) {
        let dest = pos.step(dir);
        self.grid.move_cell(pos, dest, self.turn);
        if let Some(cell) = self.grid.get_mut(dest) {
            cell.dir = dir;
            cell.phase = Phase::Moving;
        }
    }

    fn face(&mut self, pos: Position, dir: Direction) {
        if let Some(cell) = self.grid.get_mut(pos) {
            cell.dir = dir;
            cell.phase = Phase::Still;
        }
    }
}
