//! The authored level: grid, metadata, tunable properties, Yam-Yam palette
//! and recorded demos.

use crate::grid::Grid;
use mine_core::{Cell, Error, LevelProperties, ObjectKind, Position, Result, MAX_PLAYERS};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// What a Yam-Yam explosion leaves behind, one kind per cell of the 3x3
/// block, row-major from the bottom-left.
pub type Remainder = [ObjectKind; 9];

/// Palette used when a level defines none.
pub fn default_palette() -> Vec<Remainder> {
    vec![[ObjectKind::Emerald; 9]]
}

/// Descriptive data that does not influence the simulation, apart from the
/// two silence flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelMeta {
    pub title: String,
    pub author: String,
    pub description: String,
    pub music: String,
    pub uuid: Uuid,
    pub difficulty: u8,
    pub category: u8,
    /// Leaderboard flag bits
    pub leaderboard: u8,
    pub non_modifiable: bool,
    /// Mute the eating sound of Yam-Yams
    pub silent_yamyam: bool,
    /// Mute explosions
    pub silent_explosion: bool,
}

impl Default for LevelMeta {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            description: String::new(),
            music: String::new(),
            uuid: Uuid::nil(),
            difficulty: 0,
            category: 0,
            leaderboard: 0,
            non_modifiable: false,
            silent_yamyam: false,
            silent_explosion: false,
        }
    }
}

/// A recorded run: the seed and one move byte per player per tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demo {
    pub seed: u32,
    pub moves: Vec<u8>,
    pub title: String,
    pub user_recorded: bool,
    /// The run finished the level when it was recorded.
    pub expect_success: bool,
}

impl Demo {
    pub fn new(seed: u32, moves: Vec<u8>, title: impl Into<String>) -> Self {
        Self {
            seed,
            moves,
            title: title.into(),
            user_recorded: false,
            expect_success: false,
        }
    }

    /// Number of ticks covered by the move string.
    pub fn ticks(&self, player_count: usize) -> usize {
        if player_count == 0 {
            0
        } else {
            self.moves.len() / player_count
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub meta: LevelMeta,
    pub props: LevelProperties,
    pub grid: Grid,
    pub yamyam_palette: Vec<Remainder>,
    pub demos: Vec<Demo>,
}

impl Level {
    /// Empty level filled with air.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            meta: LevelMeta {
                uuid: Uuid::new_v4(),
                ..Default::default()
            },
            props: LevelProperties::default(),
            grid: Grid::new(width, height),
            yamyam_palette: Vec::new(),
            demos: Vec::new(),
        }
    }

    pub fn from_grid(grid: Grid) -> Self {
        Self {
            grid,
            ..Self::new(1, 1)
        }
    }

    pub fn width(&self) -> i32 {
        self.grid.width
    }

    pub fn height(&self) -> i32 {
        self.grid.height
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        debug!(
            event = "level_resized",
            from_width = self.grid.width,
            from_height = self.grid.height,
            width,
            height
        );
        self.grid.resize(width, height);
    }

    pub fn cell(&self, pos: Position) -> Cell {
        self.grid.get(pos)
    }

    pub fn set_cell(&mut self, pos: Position, cell: Cell) -> Result<()> {
        if !self.grid.contains(pos) {
            return Err(Error::Validation(format!("{} is outside the level", pos)));
        }
        if cell.kind.is_transient() {
            return Err(Error::Validation(format!(
                "{:?} cannot be placed in a level",
                cell.kind
            )));
        }
        self.grid.set(pos, cell);
        Ok(())
    }

    pub fn add_demo(&mut self, demo: Demo) {
        self.demos.push(demo);
    }

    pub fn remove_demo(&mut self, index: usize) -> Option<Demo> {
        if index < self.demos.len() {
            Some(self.demos.remove(index))
        } else {
            None
        }
    }

    pub fn remove_demo_by_title(&mut self, title: &str) -> Option<Demo> {
        let index = self.demos.iter().position(|d| d.title == title)?;
        self.remove_demo(index)
    }

    pub fn demos(&self) -> &[Demo] {
        &self.demos
    }

    /// Value of all loot lying on the grid.
    pub fn total_loot(&self) -> u32 {
        self.grid.cells().iter().map(|c| c.kind.loot_value()).sum()
    }

    /// The Yam-Yam palette, or the default one when the level has none.
    pub fn palette(&self) -> Vec<Remainder> {
        if self.yamyam_palette.is_empty() {
            default_palette()
        } else {
            self.yamyam_palette.clone()
        }
    }

    /// Check the level and every stored demo.
    pub fn validate(&self) -> Result<()> {
        self.validate_layout()?;

        let players = self.props.player_count as usize;
        for demo in &self.demos {
            if demo.moves.len() % players != 0 {
                return Err(Error::InvalidDemo(format!(
                    "demo '{}' has {} moves, not a multiple of {} players",
                    demo.title,
                    demo.moves.len(),
                    players
                )));
            }
        }

        Ok(())
    }

    /// Check what a game needs to start: players, grid, properties and
    /// palette. Stored demos are not looked at.
    pub fn validate_layout(&self) -> Result<()> {
        let players = self.props.player_count as usize;
        if players == 0 || players > MAX_PLAYERS {
            return Err(Error::Validation(format!(
                "player count {} out of range 1..={}",
                players, MAX_PLAYERS
            )));
        }

        let placed = self.grid.count(ObjectKind::Player);
        if placed != players {
            return Err(Error::Validation(format!(
                "level declares {} players but has {} player cells",
                players, placed
            )));
        }

        if let Some((pos, cell)) = self.grid.iter().find(|(_, c)| c.kind.is_transient()) {
            return Err(Error::Validation(format!(
                "transient {:?} at {}",
                cell.kind, pos
            )));
        }

        if self.props.push_probability > 100 {
            return Err(Error::Validation(format!(
                "push probability {} above 100",
                self.props.push_probability
            )));
        }

        for remainder in &self.yamyam_palette {
            if remainder
                .iter()
                .any(|k| k.is_transient() || *k == ObjectKind::Player)
            {
                return Err(Error::Validation(
                    "yam-yam palette may not hold players or transient objects".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_with_player() -> Level {
        let mut level = Level::new(4, 3);
        level
            .set_cell(Position::new(0, 0), Cell::player(0))
            .unwrap();
        level
    }

    #[test]
    fn test_new_level_is_air() {
        let level = Level::new(5, 4);
        assert_eq!(level.width(), 5);
        assert_eq!(level.height(), 4);
        assert!(level.grid.cells().iter().all(|c| c.is_air()));
        assert!(!level.meta.uuid.is_nil());
    }

    #[test]
    fn test_set_cell_rejects_outside_and_transient() {
        let mut level = Level::new(2, 2);
        assert!(level
            .set_cell(Position::new(2, 0), Cell::new(ObjectKind::Rock))
            .is_err());
        assert!(level
            .set_cell(Position::new(0, 0), Cell::explosion(ObjectKind::Air))
            .is_err());
        assert!(level
            .set_cell(Position::new(1, 1), Cell::new(ObjectKind::Rock))
            .is_ok());
        assert_eq!(level.cell(Position::new(1, 1)).kind, ObjectKind::Rock);
    }

    #[test]
    fn test_demo_list() {
        let mut level = level_with_player();
        level.add_demo(Demo::new(1, b"AEE".to_vec(), "first"));
        level.add_demo(Demo::new(2, b"AB".to_vec(), "second"));
        level.add_demo(Demo::new(3, Vec::new(), "third"));

        let removed = level.remove_demo_by_title("second").unwrap();
        assert_eq!(removed.seed, 2);
        assert_eq!(level.demos().len(), 2);
        assert_eq!(level.demos()[1].title, "third");

        assert!(level.remove_demo(5).is_none());
        assert_eq!(level.remove_demo(0).unwrap().title, "first");
    }

    #[test]
    fn test_level_json_dump() {
        let mut level = level_with_player();
        level.meta.title = "dump".to_string();
        level.add_demo(Demo::new(9, b"EE".to_vec(), "walk"));

        let json = serde_json::to_string(&level).unwrap();
        let back: Level = serde_json::from_str(&json).unwrap();
        assert_eq!(back, level);
    }

    #[test]
    fn test_demo_ticks() {
        let demo = Demo::new(0, b"AEAEAE".to_vec(), "two players");
        assert_eq!(demo.ticks(1), 6);
        assert_eq!(demo.ticks(2), 3);
    }

    #[test]
    fn test_total_loot() {
        let mut level = level_with_player();
        level
            .set_cell(Position::new(1, 0), Cell::new(ObjectKind::Emerald))
            .unwrap();
        level
            .set_cell(Position::new(2, 0), Cell::new(ObjectKind::Bag))
            .unwrap();
        level
            .set_cell(Position::new(3, 0), Cell::new(ObjectKind::Rock))
            .unwrap();
        assert_eq!(level.total_loot(), 11);
    }

    #[test]
    fn test_validate_player_count() {
        let mut level = level_with_player();
        assert!(level.validate().is_ok());

        level.props.player_count = 2;
        assert!(level.validate().is_err());

        level
            .set_cell(Position::new(3, 2), Cell::player(1))
            .unwrap();
        assert!(level.validate().is_ok());

        level.add_demo(Demo::new(0, b"AAA".to_vec(), "odd"));
        assert!(matches!(level.validate(), Err(Error::InvalidDemo(_))));
        assert!(level.validate_layout().is_ok());
    }

    #[test]
    fn test_palette_falls_back_to_default() {
        let mut level = level_with_player();
        assert_eq!(level.palette(), default_palette());

        level.yamyam_palette.push([ObjectKind::Ruby; 9]);
        assert_eq!(level.palette()[0][4], ObjectKind::Ruby);
    }

    #[test]
    fn test_resize_keeps_content() {
        let mut level = level_with_player();
        level.resize(8, 8);
        assert_eq!(level.width(), 8);
        assert_eq!(level.cell(Position::new(0, 0)).kind, ObjectKind::Player);
    }
}
