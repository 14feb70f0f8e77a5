//! Object prototype table.
//!
//! Built once on first use and read-only afterwards. Every kind maps to a
//! template cell holding its default flags, orientation and payload.

use crate::cell::{Blast, Cell, ExitState, Payload};
use crate::config::TIME_BOMB_FUSE;
use crate::error::{Error, Result};
use crate::object::{Flags, ObjectKind};
use crate::types::{Direction, KeyColor};
use once_cell::sync::Lazy;

static PROTOTYPES: Lazy<Vec<Cell>> = Lazy::new(build);

/// Template cell for `kind`.
pub fn lookup(kind: ObjectKind) -> &'static Cell {
    &PROTOTYPES[kind.ordinal()]
}

/// Check that every slot was filled; an Air sentinel in a non-Air slot means
/// the table was left incomplete.
pub fn verify() -> Result<()> {
    for kind in ObjectKind::ALL {
        let proto = lookup(kind);
        if proto.kind != kind {
            return Err(Error::InvalidState(format!(
                "prototype for {:?} is unset (found {:?})",
                kind, proto.kind
            )));
        }
        if !proto.payload().fits(kind) {
            return Err(Error::InvalidState(format!(
                "prototype payload {:?} does not fit {:?}",
                proto.payload(),
                kind
            )));
        }
    }
    Ok(())
}

fn build() -> Vec<Cell> {
    let mut table = vec![Cell::air(); ObjectKind::COUNT];
    for kind in ObjectKind::ALL {
        table[kind.ordinal()] = template(kind);
    }
    table
}

fn template(kind: ObjectKind) -> Cell {
    use ObjectKind::*;

    let fall = Flags::FALLABLE;
    let blow = Flags::BLOWABLE;
    let round = Flags::ROUND;
    let push = Flags::PUSHABLE;
    let shove = Flags::OBJECT_PUSHABLE;
    let convert = Flags::CONVERTABLE;
    let enemy = Flags::BLOWABLE | Flags::ENEMY | Flags::EXPLODE_PROPAGATE;

    let (flags, dir, payload) = match kind {
        Air => (Flags::EMPTY, Direction::None, Payload::None),
        Earth | Sand | Wall | Swamp | SandRock | StoneWall => (blow, Direction::None, Payload::None),
        RoundWall => (blow | round, Direction::None, Payload::None),
        SteelWall | Acid | Converter => (Flags::EMPTY, Direction::None, Payload::None),
        Drop => (fall | blow, Direction::None, Payload::None),
        Cushion => (blow | push | shove, Direction::None, Payload::None),
        Rock => (
            fall | blow | round | push | shove | convert | Flags::SAND_SINKABLE,
            Direction::None,
            Payload::None,
        ),
        Emerald | Sapphire | Citrine | Bag => (
            fall | blow | round | shove | convert | Flags::PICKABLE,
            Direction::None,
            Payload::None,
        ),
        Ruby => (
            fall | round | shove | convert | Flags::PICKABLE,
            Direction::None,
            Payload::None,
        ),
        Bomb => (
            fall | blow | round | push | shove | Flags::EXPLODE_PROPAGATE,
            Direction::None,
            Payload::None,
        ),
        TimeBomb => (
            blow | Flags::EXPLODE_PROPAGATE,
            Direction::None,
            Payload::Fuse(TIME_BOMB_FUSE),
        ),
        BombPack => (blow | Flags::PICKABLE, Direction::None, Payload::None),
        Key => (
            blow | Flags::PICKABLE,
            Direction::None,
            Payload::Color(KeyColor::Red),
        ),
        Door => (Flags::EMPTY, Direction::None, Payload::Color(KeyColor::Red)),
        Exit => (Flags::EMPTY, Direction::None, Payload::Exit(ExitState::Closed)),
        Player => (
            blow | Flags::EXPLODE_PROPAGATE,
            Direction::None,
            Payload::Miner(0),
        ),
        Bug | Lorry => (enemy, Direction::Up, Payload::None),
        YamYam | Robot => (enemy, Direction::Down, Payload::None),
        Explosion => (
            Flags::EMPTY,
            Direction::None,
            Payload::Blast(Blast {
                stage: 1,
                yields: Air,
            }),
        ),
        Laser => (Flags::EMPTY, Direction::Right, Payload::None),
        Dispenser => (Flags::EMPTY, Direction::Down, Payload::Contents(Rock)),
        Pusher => (Flags::EMPTY, Direction::Right, Payload::None),
        Conveyor => (Flags::EMPTY, Direction::Right, Payload::None),
        Elevator => (Flags::EMPTY, Direction::Up, Payload::None),
        Wheel => (blow, Direction::None, Payload::None),
        Safe => (blow | push | shove, Direction::None, Payload::None),
    };

    Cell::template(kind, flags, dir, payload)
}
