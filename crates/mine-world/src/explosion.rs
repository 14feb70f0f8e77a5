//! Explosions, their yields, time bombs and ruby lasers.

use crate::game::{placed_loot, Game};
use crate::level::Remainder;
use crate::sound::SoundEvent;
use mine_core::{Blast, Cell, Direction, Flags, ObjectKind, Position};
use std::collections::HashSet;
use tracing::{debug, trace};

/// The extra cells a big explosion reaches, two steps out on each axis.
const BIG_REACH: [(i32, i32); 4] = [(0, 2), (-2, 0), (2, 0), (0, -2)];

impl Game {
    /// Blow up the cell at `pos`, then fire every laser the blast released.
    pub fn detonate(&mut self, pos: Position) {
        self.explode_at(pos);
        self.fire_lasers();
    }

    /// Fire a laser from `origin` heading `dir`.
    pub fn start_laser(&mut self, origin: Position, dir: Direction) {
        self.lasers.push((origin, dir));
        self.fire_lasers();
    }

    fn fire_lasers(&mut self) {
        while let Some((origin, dir)) = self.lasers.pop() {
            self.trace_laser(origin, dir);
        }
    }

    fn explode_at(&mut self, center: Position) {
        let source = self.grid.get(center);
        let big = source.kind == ObjectKind::TimeBomb;

        if let Some(index) = source.miner() {
            self.kill_miner(index as usize);
        }
        if source.has(Flags::ENEMY) {
            self.stats.enemies_killed += 1;
        }
        let remainder = if source.kind == ObjectKind::YamYam {
            Some(self.next_remainder())
        } else {
            None
        };

        let mut area: Vec<(Option<usize>, Position)> = self
            .grid
            .block(center)
            .into_iter()
            .map(|(slot, pos)| (Some(slot), pos))
            .collect();
        if big {
            for (dx, dy) in BIG_REACH {
                let pos = center.add(dx, dy);
                if self.grid.contains(pos) {
                    area.push((None, pos));
                }
            }
        }

        debug!(
            event = "explosion",
            x = center.x,
            y = center.y,
            source = ?source.kind,
            big,
            turn = self.turn
        );
        self.emit(SoundEvent::Explosion);

        for (slot, pos) in area {
            self.apply_explosion(center, pos, source.kind, slot, remainder);
        }
    }

    /// Resolve the blast of an explosion centred on `center` on the cell `pos`.
    pub fn apply_explosion(
        &mut self,
        center: Position,
        pos: Position,
        source: ObjectKind,
        slot: Option<usize>,
        remainder: Option<Remainder>,
    ) {
        let target = self.grid.get(pos);
        let turn = self.turn;

        if pos != center {
            if target.kind == ObjectKind::Ruby {
                let dir = away_from(center, pos);
                if dir != Direction::None {
                    self.lasers.push((pos, dir));
                }
                return;
            }
            let open = target.is_air() || target.kind == ObjectKind::Laser;
            if !open && !target.has(Flags::BLOWABLE) {
                return;
            }
            if target.has(Flags::EXPLODE_PROPAGATE) {
                if let Some(index) = target.miner() {
                    self.kill_miner(index as usize);
                }
                if let Some(cell) = self.grid.get_mut(pos) {
                    cell.pending_blast = true;
                    cell.stamp = turn;
                }
                return;
            }
        }

        self.lose_loot(placed_loot(&target));
        let yields = self.blow_result(&target, source, slot, remainder);
        self.grid.put(pos, Cell::explosion(yields), turn);
    }

    /// What an exploding cell turns into once the blast is over.
    pub fn blow_result(
        &self,
        target: &Cell,
        source: ObjectKind,
        slot: Option<usize>,
        remainder: Option<Remainder>,
    ) -> ObjectKind {
        if matches!(target.kind, ObjectKind::StoneWall | ObjectKind::Safe) {
            if let Some(inner) = target.contents() {
                return inner;
            }
        }
        match source {
            ObjectKind::Bug => ObjectKind::Emerald,
            ObjectKind::Lorry => ObjectKind::Sapphire,
            ObjectKind::YamYam => match (remainder, slot) {
                (Some(remainder), Some(slot)) => remainder[slot],
                _ => ObjectKind::Air,
            },
            _ => ObjectKind::Air,
        }
    }

    fn next_remainder(&mut self) -> Remainder {
        let remainder = self.palette[self.palette_cursor % self.palette.len()];
        self.palette_cursor = (self.palette_cursor + 1) % self.palette.len();
        remainder
    }

    /// Advance an explosion by one stage; the last stage leaves its yield.
    pub fn apply_explosion_state(&mut self, pos: Position) {
        let Some(blast) = self.grid.get(pos).blast() else {
            return;
        };

        if blast.stage + 1 >= Blast::FINAL_STAGE {
            self.ledger.spawn(blast.yields.loot_value());
            self.grid.put(pos, Cell::new(blast.yields), self.turn);
        } else if let Some(cell) = self.grid.get_mut(pos) {
            cell.set_blast_stage(blast.stage + 1);
        }
    }

    pub(crate) fn apply_time_bomb(&mut self, pos: Position) {
        let Some(fuse) = self.grid.get(pos).fuse() else {
            return;
        };
        let fuse = fuse.saturating_sub(1);
        if fuse == 0 {
            self.detonate(pos);
            return;
        }
        if let Some(cell) = self.grid.get_mut(pos) {
            cell.set_fuse(fuse);
        }
        self.emit(SoundEvent::Tick);
    }

    fn trace_laser(&mut self, origin: Position, mut dir: Direction) {
        let turn = self.turn;
        let limit = 4 * self.grid.len();
        let mut visited = HashSet::new();
        let mut pos = origin;

        self.emit(SoundEvent::Laser);

        for _ in 0..limit {
            if !visited.insert((pos, dir)) {
                break;
            }
            let next = pos.step(dir);
            let cell = self.grid.get(next);
            match cell.kind {
                ObjectKind::Air => {
                    self.grid.put(next, Cell::laser(dir), turn);
                }
                _ if cell.pending_blast => break,
                ObjectKind::Emerald => dir = dir.turn_left(),
                ObjectKind::Sapphire => dir = dir.turn_right(),
                _ => {
                    if cell.has(Flags::BLOWABLE) {
                        trace!(event = "laser_hit", x = next.x, y = next.y, kind = ?cell.kind);
                        self.explode_at(next);
                    }
                    break;
                }
            }
            pos = next;
        }
    }
}

/// Direction pointing from `center` through `pos`; horizontal wins on
/// diagonals.
fn away_from(center: Position, pos: Position) -> Direction {
    let dx = pos.x - center.x;
    let dy = pos.y - center.y;
    if dx.abs() >= dy.abs() && dx != 0 {
        if dx > 0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy > 0 {
        Direction::Up
    } else if dy < 0 {
        Direction::Down
    } else {
        Direction::None
    }
}
