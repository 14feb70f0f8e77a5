//! Swamps, sand-rocks and dispensers.

use crate::game::Game;
use crate::sound::SoundEvent;
use mine_core::{Cell, Direction, ObjectKind, Phase, Position};
use rand::Rng;

impl Game {
    /// A swamp occasionally drips into the air below it or spreads into
    /// earth above and beside it.
    pub(crate) fn apply_swamp(&mut self, pos: Position) {
        let rate = u32::from(self.props.swamp_rate);
        if rate == 0 || self.rng.gen_range(0..rate) != 0 {
            return;
        }

        let dirs = Direction::all();
        let dir = dirs[self.rng.gen_range(0..dirs.len())];
        let target = pos.step(dir);

        match dir {
            Direction::Down if self.grid.is_air(target) => {
                let mut drop = Cell::new(ObjectKind::Drop);
                drop.phase = Phase::Moving;
                self.grid.put(target, drop, self.turn);
                self.emit(SoundEvent::Swamp);
            }
            Direction::Up | Direction::Left | Direction::Right
                if self.grid.kind(target) == ObjectKind::Earth =>
            {
                self.grid
                    .put(target, Cell::new(ObjectKind::Swamp), self.turn);
                self.emit(SoundEvent::Swamp);
            }
            _ => {}
        }
    }

    /// A sand-rock over air lets its rock drop out of the sand.
    pub(crate) fn apply_sand_rock(&mut self, pos: Position) {
        let below = pos.below();
        if !self.grid.is_air(below) {
            return;
        }
        self.grid.put(pos, Cell::new(ObjectKind::Sand), self.turn);
        let mut rock = Cell::new(ObjectKind::Rock);
        rock.phase = Phase::Moving;
        self.grid.put(below, rock, self.turn);
    }

    /// Arm every dispenser when the dispenser clock wraps.
    pub(crate) fn apply_dispenser(&mut self, pos: Position) {
        if self.dispenser_clock != 0 {
            return;
        }
        if let Some(cell) = self.grid.get_mut(pos) {
            if cell.phase == Phase::Still {
                cell.phase = Phase::Dispensing;
            }
        }
    }

    /// Drop the product of an armed dispenser into the cell below.
    pub(crate) fn release_dispenser(&mut self, pos: Position) {
        let dispenser = self.grid.get(pos);
        let below = pos.below();

        if let Some(kind) = dispenser.contents() {
            if self.grid.is_air(below) {
                let mut product = Cell::new(kind);
                product.phase = Phase::Moving;
                self.grid.put(below, product, self.turn);
                self.ledger.spawn(kind.loot_value());
                self.emit(SoundEvent::Dispense);
            }
        }
        self.set_phase(pos, Phase::Still);
    }
}
