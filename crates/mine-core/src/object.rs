//! Object kinds and their capability flags.

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// Type of the object occupying a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ObjectKind {
    #[default]
    Air,
    Earth,
    Sand,
    Wall,
    RoundWall,
    SteelWall,
    StoneWall,
    Swamp,
    Drop,
    Acid,
    Cushion,
    Rock,
    SandRock,
    Emerald,
    Sapphire,
    Ruby,
    Citrine,
    Bag,
    Bomb,
    TimeBomb,
    BombPack,
    Key,
    Door,
    Exit,
    Player,
    Bug,
    Lorry,
    YamYam,
    Robot,
    Explosion,
    Laser,
    Dispenser,
    Converter,
    Pusher,
    Elevator,
    Conveyor,
    Wheel,
    Safe,
}

impl ObjectKind {
    pub const COUNT: usize = 38;

    pub const ALL: [ObjectKind; Self::COUNT] = [
        ObjectKind::Air,
        ObjectKind::Earth,
        ObjectKind::Sand,
        ObjectKind::Wall,
        ObjectKind::RoundWall,
        ObjectKind::SteelWall,
        ObjectKind::StoneWall,
        ObjectKind::Swamp,
        ObjectKind::Drop,
        ObjectKind::Acid,
        ObjectKind::Cushion,
        ObjectKind::Rock,
        ObjectKind::SandRock,
        ObjectKind::Emerald,
        ObjectKind::Sapphire,
        ObjectKind::Ruby,
        ObjectKind::Citrine,
        ObjectKind::Bag,
        ObjectKind::Bomb,
        ObjectKind::TimeBomb,
        ObjectKind::BombPack,
        ObjectKind::Key,
        ObjectKind::Door,
        ObjectKind::Exit,
        ObjectKind::Player,
        ObjectKind::Bug,
        ObjectKind::Lorry,
        ObjectKind::YamYam,
        ObjectKind::Robot,
        ObjectKind::Explosion,
        ObjectKind::Laser,
        ObjectKind::Dispenser,
        ObjectKind::Converter,
        ObjectKind::Pusher,
        ObjectKind::Elevator,
        ObjectKind::Conveyor,
        ObjectKind::Wheel,
        ObjectKind::Safe,
    ];

    /// Position of this kind in [`ObjectKind::ALL`].
    pub fn ordinal(&self) -> usize {
        *self as usize
    }

    /// Collectable loot value; zero for everything that is not loot.
    pub fn loot_value(&self) -> u32 {
        match self {
            ObjectKind::Emerald => 1,
            ObjectKind::Citrine => 2,
            ObjectKind::Sapphire => 3,
            ObjectKind::Ruby => 5,
            ObjectKind::Bag => 10,
            _ => 0,
        }
    }

    pub fn is_gem(&self) -> bool {
        matches!(
            self,
            ObjectKind::Emerald | ObjectKind::Sapphire | ObjectKind::Ruby | ObjectKind::Citrine
        )
    }

    /// Result of passing through a converter; `None` for kinds it ignores.
    pub fn converted(&self) -> Option<ObjectKind> {
        match self {
            ObjectKind::Emerald => Some(ObjectKind::Sapphire),
            ObjectKind::Sapphire => Some(ObjectKind::Rock),
            ObjectKind::Rock => Some(ObjectKind::Emerald),
            ObjectKind::Ruby => Some(ObjectKind::Bag),
            ObjectKind::Bag => Some(ObjectKind::Ruby),
            ObjectKind::Citrine => Some(ObjectKind::Citrine),
            _ => None,
        }
    }

    /// Transient kinds exist only during a run and have no file identifier.
    pub fn is_transient(&self) -> bool {
        matches!(self, ObjectKind::Explosion | ObjectKind::Laser)
    }
}

/// Capability flags of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Flags(pub u16);

impl Flags {
    pub const EMPTY: Self = Self(0);

    /// Falls when the cell below is free.
    pub const FALLABLE: Self = Self(1 << 0);

    /// Destroyed (or transformed) by explosions.
    pub const BLOWABLE: Self = Self(1 << 1);

    /// Objects resting on it roll off sideways.
    pub const ROUND: Self = Self(1 << 2);

    /// Can be pushed by a miner.
    pub const PUSHABLE: Self = Self(1 << 3);

    /// Can be moved by pushers, conveyors and elevators.
    pub const OBJECT_PUSHABLE: Self = Self(1 << 4);

    /// Transformed when falling through a converter.
    pub const CONVERTABLE: Self = Self(1 << 5);

    /// Sinks into sand it rests on.
    pub const SAND_SINKABLE: Self = Self(1 << 6);

    /// Moves on its own and kills miners.
    pub const ENEMY: Self = Self(1 << 7);

    /// Detonates on its own when caught in a blast.
    pub const EXPLODE_PROPAGATE: Self = Self(1 << 8);

    /// Collected by a miner stepping onto it.
    pub const PICKABLE: Self = Self(1 << 9);

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Flags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_match_table() {
        for (i, kind) in ObjectKind::ALL.iter().enumerate() {
            assert_eq!(kind.ordinal(), i);
        }
    }

    #[test]
    fn test_converter_cycle() {
        let mut kind = ObjectKind::Emerald;
        for _ in 0..3 {
            kind = kind.converted().unwrap();
        }
        assert_eq!(kind, ObjectKind::Emerald);
        assert_eq!(ObjectKind::Ruby.converted(), Some(ObjectKind::Bag));
        assert_eq!(ObjectKind::Bag.converted(), Some(ObjectKind::Ruby));
        assert_eq!(ObjectKind::Citrine.converted(), Some(ObjectKind::Citrine));
        assert_eq!(ObjectKind::Bomb.converted(), None);
    }

    #[test]
    fn test_flag_operations() {
        let mut flags = Flags::FALLABLE | Flags::ROUND;
        assert!(flags.contains(Flags::FALLABLE));
        assert!(!flags.contains(Flags::FALLABLE | Flags::PICKABLE));
        assert!(flags.intersects(Flags::FALLABLE | Flags::PICKABLE));

        flags.remove(Flags::ROUND);
        assert!(!flags.contains(Flags::ROUND));
        flags.insert(Flags::ENEMY);
        assert!(flags.contains(Flags::ENEMY));
        assert!(!flags.is_empty());
    }

    #[test]
    fn test_loot_values() {
        assert_eq!(ObjectKind::Emerald.loot_value(), 1);
        assert_eq!(ObjectKind::Rock.loot_value(), 0);
        assert!(ObjectKind::Ruby.is_gem());
        assert!(!ObjectKind::Bag.is_gem());
    }
}
