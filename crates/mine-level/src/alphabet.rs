//! One-byte object identifiers used in level files.
//!
//! The mapping is a fixed bijection between bytes and settled cells (kind,
//! orientation and payload). Entries are only ever appended, so files
//! written by older builds keep decoding to the same objects.

use mine_core::{prototype, Cell, Direction, Error, KeyColor, ObjectKind, Payload, Result};
use mine_world::Grid;
use once_cell::sync::Lazy;
use std::collections::HashMap;

type Identity = (ObjectKind, Direction, Payload);

struct Alphabet {
    cells: HashMap<u8, Cell>,
    bytes: HashMap<Identity, u8>,
}

static ALPHABET: Lazy<Alphabet> = Lazy::new(build);

fn holding(kind: ObjectKind, inner: ObjectKind) -> Option<Cell> {
    Cell::new(kind).with_payload(Payload::Contents(inner)).ok()
}

fn entries() -> Vec<(u8, Option<Cell>)> {
    use ObjectKind::*;

    let plain = |kind| Some(Cell::new(kind));
    let facing = |kind, dir| Some(Cell::facing(kind, dir));

    vec![
        (b' ', Some(Cell::air())),
        (b'.', plain(Earth)),
        (b':', plain(Sand)),
        (b'#', plain(Wall)),
        (b'(', plain(RoundWall)),
        (b'@', plain(SteelWall)),
        (b'w', plain(StoneWall)),
        (b'1', holding(StoneWall, Emerald)),
        (b'2', holding(StoneWall, Sapphire)),
        (b'3', holding(StoneWall, Ruby)),
        (b'4', holding(StoneWall, Citrine)),
        (b'5', holding(StoneWall, Bag)),
        (b'~', plain(Swamp)),
        (b',', plain(Drop)),
        (b'_', plain(Acid)),
        (b'=', plain(Cushion)),
        (b'r', plain(Rock)),
        (b';', plain(SandRock)),
        (b'e', plain(Emerald)),
        (b's', plain(Sapphire)),
        (b'u', plain(Ruby)),
        (b'c', plain(Citrine)),
        (b'$', plain(Bag)),
        (b'b', plain(Bomb)),
        (b't', plain(TimeBomb)),
        (b'T', plain(BombPack)),
        (b'f', Some(Cell::key(KeyColor::Red))),
        (b'g', Some(Cell::key(KeyColor::Green))),
        (b'h', Some(Cell::key(KeyColor::Blue))),
        (b'i', Some(Cell::key(KeyColor::Yellow))),
        (b'F', Some(Cell::door(KeyColor::Red))),
        (b'G', Some(Cell::door(KeyColor::Green))),
        (b'H', Some(Cell::door(KeyColor::Blue))),
        (b'I', Some(Cell::door(KeyColor::Yellow))),
        (b'X', plain(Exit)),
        (b'P', plain(Player)),
        (b'A', facing(Bug, Direction::Up)),
        (b'B', facing(Bug, Direction::Down)),
        (b'C', facing(Bug, Direction::Left)),
        (b'D', facing(Bug, Direction::Right)),
        (b'L', facing(Lorry, Direction::Up)),
        (b'M', facing(Lorry, Direction::Down)),
        (b'N', facing(Lorry, Direction::Left)),
        (b'O', facing(Lorry, Direction::Right)),
        (b'Y', plain(YamYam)),
        (b'R', plain(Robot)),
        (b'{', holding(Dispenser, Rock)),
        (b'}', holding(Dispenser, Emerald)),
        (b'|', holding(Dispenser, Bomb)),
        (b'+', plain(Converter)),
        (b'^', facing(Pusher, Direction::Up)),
        (b'v', facing(Pusher, Direction::Down)),
        (b'<', facing(Pusher, Direction::Left)),
        (b'>', facing(Pusher, Direction::Right)),
        (b'E', plain(Elevator)),
        (b'[', facing(Conveyor, Direction::Left)),
        (b']', facing(Conveyor, Direction::Right)),
        (b'*', plain(Wheel)),
        (b'0', plain(Safe)),
        (b'6', holding(Safe, Emerald)),
        (b'7', holding(Safe, Sapphire)),
        (b'8', holding(Safe, Bag)),
    ]
}

fn build() -> Alphabet {
    let mut cells = HashMap::new();
    let mut bytes = HashMap::new();
    for (byte, cell) in entries() {
        if let Some(cell) = cell {
            cells.insert(byte, cell);
            bytes.insert(identity(&cell), byte);
        }
    }
    Alphabet { cells, bytes }
}

/// Orientation and payload only take part in the identity of the kinds
/// whose identifier depends on them.
fn identity(cell: &Cell) -> Identity {
    use ObjectKind::*;

    let proto = prototype::lookup(cell.kind);
    let dir = match cell.kind {
        Bug | Lorry | Pusher | Conveyor => cell.dir,
        _ => proto.dir,
    };
    let payload = match cell.kind {
        StoneWall | Safe | Dispenser | Key | Door => cell.payload(),
        _ => proto.payload(),
    };
    (cell.kind, dir, payload)
}

/// Cell for an identifier byte.
pub fn decode_byte(byte: u8) -> Option<Cell> {
    ALPHABET.cells.get(&byte).copied()
}

/// Identifier byte for a cell. Transient cells are written as what they
/// settle into: an explosion as its yield, a laser segment as air. A variant
/// without an identifier of its own falls back to its kind's default.
pub fn encode_cell(cell: &Cell) -> u8 {
    let settled = match cell.kind {
        ObjectKind::Explosion => Cell::new(cell.blast().map_or(ObjectKind::Air, |b| b.yields)),
        ObjectKind::Laser => Cell::air(),
        _ => *cell,
    };

    let table = &*ALPHABET;
    table
        .bytes
        .get(&identity(&settled))
        .or_else(|| table.bytes.get(&identity(prototype::lookup(settled.kind))))
        .copied()
        .unwrap_or(b' ')
}

/// Grid from rows of identifier characters, top row first.
pub fn grid_from_rows(rows: &[&str]) -> Option<Grid> {
    Grid::from_rows(rows, |ch| u8::try_from(ch).ok().and_then(decode_byte))
}

/// Number of identifiers in the alphabet.
pub fn len() -> usize {
    ALPHABET.cells.len()
}

/// Check the alphabet is a bijection and that every settled kind can be
/// written.
pub fn verify() -> Result<()> {
    let table = &*ALPHABET;
    let declared = entries();
    if table.cells.len() != declared.len() || table.bytes.len() != declared.len() {
        return Err(Error::InvalidState(format!(
            "identifier alphabet has {} bytes and {} objects for {} entries",
            table.cells.len(),
            table.bytes.len(),
            declared.len()
        )));
    }

    for kind in ObjectKind::ALL {
        if kind.is_transient() {
            continue;
        }
        if !table.bytes.contains_key(&identity(prototype::lookup(kind))) {
            return Err(Error::InvalidState(format!("{:?} has no identifier", kind)));
        }
    }
    Ok(())
}
