//! Falling, rolling, landing, acid, converters and sand.

use crate::game::{placed_loot, Game};
use crate::sound::SoundEvent;
use mine_core::{Cell, Direction, Flags, ObjectKind, Phase, Position, SAND_SINK_CHANCE};
use rand::Rng;
use tracing::trace;

impl Game {
    pub fn can_fall_down(&self, pos: Position) -> bool {
        self.grid.is_air(pos.below())
    }

    /// Move a falling object from `from` into the free cell `to`.
    pub fn trigger_fall(&mut self, from: Position, to: Position) {
        self.grid.move_cell(from, to, self.turn);
        self.set_phase(to, Phase::Moving);
    }

    pub fn try_fall_to(&mut self, from: Position, to: Position) -> bool {
        if !self.grid.is_air(to) {
            return false;
        }
        self.trigger_fall(from, to);
        true
    }

    pub fn apply_fallable_turn(&mut self, pos: Position) {
        let cell = self.grid.get(pos);
        let below = pos.below();

        if self.try_fall_to(pos, below) {
            return;
        }

        let under = self.grid.get(below);
        match under.kind {
            ObjectKind::Acid => {
                self.dissolve(pos);
                return;
            }
            ObjectKind::Converter
                if cell.is_moving()
                    && cell.has(Flags::CONVERTABLE)
                    && self.grid.is_air(below.below()) =>
            {
                self.convert(pos, below.below());
                return;
            }
            _ => {}
        }

        if cell.is_moving() {
            self.land(pos, cell, under);
            return;
        }

        if under.kind == ObjectKind::Sand && cell.has(Flags::SAND_SINKABLE) {
            self.try_sink(pos, below);
            return;
        }

        self.try_roll(pos, under);
    }

    fn land(&mut self, pos: Position, cell: Cell, under: Cell) {
        let below = pos.below();

        if under.kind == ObjectKind::Player || under.has(Flags::ENEMY) {
            if !cell.has(Flags::BLOWABLE) {
                self.grid.take(pos);
                self.lose_loot(placed_loot(&cell));
            }
            trace!(event = "crushed", x = below.x, y = below.y, target = ?under.kind);
            self.detonate(below);
            return;
        }

        if cell.kind == ObjectKind::Bomb && under.kind != ObjectKind::Cushion {
            self.detonate(pos);
            return;
        }
        if under.kind == ObjectKind::Bomb {
            self.detonate(below);
            return;
        }
        if under.kind == ObjectKind::Cushion {
            self.set_phase(pos, Phase::Still);
            return;
        }

        if cell.kind == ObjectKind::Rock && under.phase == Phase::Still {
            let broken = match under.kind {
                ObjectKind::Sapphire => Some(Phase::Breaking),
                ObjectKind::Citrine => Some(Phase::Shattering),
                _ => None,
            };
            if let Some(phase) = broken {
                self.lose_loot(placed_loot(&under));
                self.set_phase(below, phase);
                self.grid.stamp(below, self.turn);
                self.stats.gems_broken += 1;
                self.set_phase(pos, Phase::Still);
                self.emit(SoundEvent::Break);
                return;
            }
        }

        if cell.kind == ObjectKind::Drop {
            self.grid.put(pos, Cell::new(ObjectKind::Swamp), self.turn);
            self.emit(SoundEvent::Swamp);
            return;
        }

        if self.try_roll(pos, under) {
            return;
        }

        self.set_phase(pos, Phase::Still);
        self.emit(if cell.kind.is_gem() {
            SoundEvent::GemLand
        } else {
            SoundEvent::RockLand
        });
    }

    /// Roll off a round, resting surface: left first, then right.
    fn try_roll(&mut self, pos: Position, under: Cell) -> bool {
        if !under.has(Flags::ROUND) || under.is_moving() {
            return false;
        }
        for dir in [Direction::Left, Direction::Right] {
            let side = pos.step(dir);
            if self.grid.is_air(side) && self.grid.is_air(side.below()) {
                self.trigger_fall(pos, side);
                return true;
            }
        }
        false
    }

    fn dissolve(&mut self, pos: Position) {
        let cell = self.grid.take(pos);
        self.lose_loot(placed_loot(&cell));
        self.emit(SoundEvent::Acid);
        trace!(event = "dissolved", x = pos.x, y = pos.y, kind = ?cell.kind);
    }

    fn convert(&mut self, from: Position, to: Position) {
        let cell = self.grid.get(from);
        let Some(kind) = cell.kind.converted() else {
            return;
        };
        self.grid.take(from);
        self.ledger.vanish(placed_loot(&cell));
        self.ledger.spawn(kind.loot_value());

        let mut converted = Cell::new(kind);
        converted.phase = Phase::Moving;
        self.grid.put(to, converted, self.turn);
        self.emit(SoundEvent::Convert);
    }

    /// A rock resting on sand may sink into it.
    fn try_sink(&mut self, pos: Position, sand: Position) {
        if self.rng.gen_range(0..SAND_SINK_CHANCE) != 0 {
            return;
        }
        self.grid.take(pos);
        let mut sand_rock = Cell::new(ObjectKind::SandRock);
        sand_rock.phase = Phase::Sinking;
        self.grid.put(sand, sand_rock, self.turn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{game, kind_at, run};
    use mine_core::{FailureReason, Outcome};

    #[test]
    fn test_rock_falls_one_cell_per_tick() {
        let mut game = game(&[
            "r  P", //
            "    ", //
            "    ", //
            "####",
        ]);

        run(&mut game, 1);
        assert_eq!(kind_at(&game, 0, 3), ObjectKind::Air);
        assert_eq!(kind_at(&game, 0, 2), ObjectKind::Rock);
        assert!(game.grid().get(Position::new(0, 2)).is_moving());

        run(&mut game, 1);
        assert_eq!(kind_at(&game, 0, 1), ObjectKind::Rock);

        run(&mut game, 1);
        assert_eq!(kind_at(&game, 0, 1), ObjectKind::Rock);
        assert_eq!(game.grid().get(Position::new(0, 1)).phase, Phase::Still);
        assert!(game.sounds().contains(&SoundEvent::RockLand));
    }

    #[test]
    fn test_rock_crushes_player() {
        let mut game = game(&[
            " r  ", //
            "    ", //
            " P  ", //
            "####",
        ]);

        run(&mut game, 2);
        assert_eq!(kind_at(&game, 1, 1), ObjectKind::Explosion);
        assert_eq!(game.stats().miners_lost, 1);
        assert_eq!(game.outcome(), Outcome::Failure(FailureReason::MinersLost));
    }

    #[test]
    fn test_rolls_off_round_object() {
        let mut game = game(&[
            " r  P", //
            " r   ", //
            "#####",
        ]);

        run(&mut game, 1);
        assert_eq!(kind_at(&game, 0, 2), ObjectKind::Rock);
        assert_eq!(kind_at(&game, 1, 2), ObjectKind::Air);

        run(&mut game, 1);
        assert_eq!(kind_at(&game, 0, 1), ObjectKind::Rock);
    }

    #[test]
    fn test_no_roll_off_flat_wall() {
        let mut game = game(&[
            " r  P", //
            " #   ", //
            "#####",
        ]);
        run(&mut game, 3);
        assert_eq!(kind_at(&game, 1, 2), ObjectKind::Rock);
    }

    #[test]
    fn test_acid_dissolves_loot() {
        let mut game = game(&[
            "e   P", //
            "_####",
        ]);

        run(&mut game, 1);
        assert_eq!(kind_at(&game, 0, 1), ObjectKind::Air);
        assert_eq!(game.ledger().lost, 1);
        assert!(game.sounds().contains(&SoundEvent::Acid));
        assert_eq!(game.ledger().expected_in_play(), game.loot_in_play() as i64);
    }

    #[test]
    fn test_converter_transforms() {
        let mut game = game(&[
            "e   P", //
            "     ", //
            "+    ", //
            "     ", //
            "#####",
        ]);

        run(&mut game, 2);
        assert_eq!(kind_at(&game, 0, 3), ObjectKind::Air);
        assert_eq!(kind_at(&game, 0, 1), ObjectKind::Sapphire);
        assert!(game.sounds().contains(&SoundEvent::Convert));
        assert_eq!(game.ledger().adjust, 2);
        assert_eq!(game.ledger().expected_in_play(), game.loot_in_play() as i64);
    }

    #[test]
    fn test_converter_mappings() {
        let mut game = game(&[
            "r u $ P", //
            "       ", //
            "+ + +  ", //
            "       ", //
            "#######",
        ]);

        run(&mut game, 2);
        assert_eq!(kind_at(&game, 0, 1), ObjectKind::Emerald);
        assert_eq!(kind_at(&game, 2, 1), ObjectKind::Bag);
        assert_eq!(kind_at(&game, 4, 1), ObjectKind::Ruby);
        assert_eq!(game.ledger().expected_in_play(), game.loot_in_play() as i64);
    }

    #[test]
    fn test_converter_ignores_resting_object() {
        let mut game = game(&[
            "e   P", //
            "+    ", //
            "     ", //
            "#####",
        ]);

        run(&mut game, 3);
        assert_eq!(kind_at(&game, 0, 2), ObjectKind::Emerald);
        assert_eq!(kind_at(&game, 0, 0), ObjectKind::Wall);
        assert_eq!(game.grid().count(ObjectKind::Sapphire), 0);
        assert_eq!(game.ledger().adjust, 0);
    }

    #[test]
    fn test_rock_breaks_sapphire() {
        let mut game = game(&[
            "r   P", //
            "     ", //
            "s    ", //
            "#####",
        ]);

        run(&mut game, 2);
        assert_eq!(game.grid().get(Position::new(0, 1)).phase, Phase::Breaking);
        assert_eq!(game.stats().gems_broken, 1);
        assert_eq!(game.ledger().lost, 3);
        assert_eq!(game.loot_in_play(), 0);

        run(&mut game, 1);
        assert_eq!(kind_at(&game, 0, 1), ObjectKind::Rock);
    }

    #[test]
    fn test_falling_bomb_explodes() {
        let mut game = game(&[
            "b   P", //
            "     ", //
            "#####",
        ]);

        run(&mut game, 2);
        assert_eq!(kind_at(&game, 0, 1), ObjectKind::Explosion);
        assert!(game.sounds().contains(&SoundEvent::Explosion));
    }

    #[test]
    fn test_cushion_catches_bomb() {
        let mut game = game(&[
            "b   P", //
            "     ", //
            "=####",
        ]);

        run(&mut game, 3);
        assert_eq!(kind_at(&game, 0, 1), ObjectKind::Bomb);
        assert_eq!(game.grid().get(Position::new(0, 1)).phase, Phase::Still);
    }

    #[test]
    fn test_rock_sinks_into_sand() {
        let mut game = game(&[
            "r   P", //
            ":    ", //
            "     ", //
            "@@@@@",
        ]);

        let mut released = false;
        for _ in 0..500 {
            game.apply_turn();
            if kind_at(&game, 0, 1) == ObjectKind::Rock {
                released = true;
                break;
            }
        }
        assert!(released);
        assert_eq!(kind_at(&game, 0, 2), ObjectKind::Sand);
        assert_eq!(kind_at(&game, 0, 3), ObjectKind::Air);
    }
}
