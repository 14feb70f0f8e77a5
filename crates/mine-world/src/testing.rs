//! Small text-grid builder for unit tests.

use crate::game::Game;
use crate::grid::Grid;
use crate::level::Level;
use mine_core::{Cell, Direction, KeyColor, ObjectKind, Payload, Position};

pub(crate) fn cell_for(ch: char) -> Option<Cell> {
    use ObjectKind::*;

    let cell = match ch {
        ' ' => Cell::air(),
        '.' => Cell::new(Earth),
        ':' => Cell::new(Sand),
        '#' => Cell::new(Wall),
        '(' => Cell::new(RoundWall),
        '@' => Cell::new(SteelWall),
        '~' => Cell::new(Swamp),
        '_' => Cell::new(Acid),
        '=' => Cell::new(Cushion),
        'r' => Cell::new(Rock),
        'e' => Cell::new(Emerald),
        's' => Cell::new(Sapphire),
        'u' => Cell::new(Ruby),
        'c' => Cell::new(Citrine),
        '$' => Cell::new(Bag),
        'b' => Cell::new(Bomb),
        't' => Cell::new(TimeBomb),
        'T' => Cell::new(BombPack),
        'f' => Cell::key(KeyColor::Red),
        'F' => Cell::door(KeyColor::Red),
        'X' => Cell::new(Exit),
        'P' => Cell::player(0),
        'A' => Cell::facing(Bug, Direction::Up),
        'C' => Cell::facing(Bug, Direction::Left),
        'L' => Cell::facing(Lorry, Direction::Up),
        'Y' => Cell::new(YamYam),
        'R' => Cell::new(Robot),
        ';' => Cell::new(SandRock),
        '{' => Cell::new(Dispenser),
        '+' => Cell::new(Converter),
        '>' => Cell::facing(Pusher, Direction::Right),
        '<' => Cell::facing(Pusher, Direction::Left),
        'E' => Cell::facing(Elevator, Direction::Up),
        ']' => Cell::facing(Conveyor, Direction::Right),
        '*' => Cell::new(Wheel),
        'w' => Cell::new(StoneWall),
        '1' => Cell::new(StoneWall)
            .with_payload(Payload::Contents(Emerald))
            .ok()?,
        _ => return None,
    };
    Some(cell)
}

/// Level from text rows, top row first, with one player per `P`.
pub(crate) fn level(rows: &[&str]) -> Level {
    let grid = Grid::from_rows(rows, cell_for).expect("test grid");
    let players = grid.count(ObjectKind::Player) as u8;
    let mut level = Level::from_grid(grid);
    level.props.player_count = players;
    level
}

pub(crate) fn game(rows: &[&str]) -> Game {
    Game::new(&level(rows), 7).expect("test game")
}

pub(crate) fn run(game: &mut Game, ticks: usize) {
    for _ in 0..ticks {
        game.apply_turn();
    }
}

pub(crate) fn kind_at(game: &Game, x: i32, y: i32) -> ObjectKind {
    game.grid().kind(Position::new(x, y))
}
