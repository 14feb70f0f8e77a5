//! Versioned binary level format.
//!
//! A file is a big-endian `u32` version followed by tagged records, each a
//! one-byte tag and a tag-specific payload, terminated by [`tag::END`].
//! Strings carry a `u16` length, move strings a `u32` length. Tags that
//! appeared in a later version than the file declares are rejected.

use crate::alphabet;
use mine_core::{Cell, Error, LevelProperties, ObjectKind, Result, MAX_GRID_SIDE};
use mine_world::{Demo, Grid, Level, LevelMeta, Remainder};
use tracing::debug;
use uuid::Uuid;

pub const FORMAT_VERSION: u32 = 3;

pub mod tag {
    pub const END: u8 = 0x00;
    pub const DEMO_COUNT: u8 = 0x01;
    pub const TITLE: u8 = 0x02;
    pub const DIFFICULTY: u8 = 0x03;
    pub const CATEGORY: u8 = 0x04;
    pub const PLAYER_COUNT: u8 = 0x05;
    pub const UUID: u8 = 0x06;
    pub const AUTHOR: u8 = 0x07;
    pub const LEADERBOARD: u8 = 0x08;
    pub const NON_MODIFIABLE: u8 = 0x09;
    pub const SILENT: u8 = 0x0A;
    pub const DESCRIPTION: u8 = 0x0B;
    pub const STEP_LIMIT: u8 = 0x0C;
    pub const TIME_LIMIT: u8 = 0x0D;
    pub const MUSIC: u8 = 0x0E;
    pub const LOOT_LOSS: u8 = 0x0F;
    pub const PUSH: u8 = 0x10;
    pub const DISPENSER: u8 = 0x11;
    pub const SWAMP: u8 = 0x12;
    pub const ROBOT: u8 = 0x13;
    pub const WHEEL: u8 = 0x14;
    pub const LOOT_TARGET: u8 = 0x15;
    pub const ELEVATOR: u8 = 0x16;
    pub const GRID: u8 = 0x20;
    pub const YAMYAM: u8 = 0x21;
    pub const DEMO: u8 = 0x22;
}

/// First format version that knows `tag`, or `None` for unknown tags.
fn introduced_in(code: u8) -> Option<u32> {
    match code {
        tag::END..=tag::TIME_LIMIT | tag::MUSIC | tag::PUSH | tag::DISPENSER | tag::SWAMP => {
            Some(1)
        }
        tag::LOOT_TARGET | tag::GRID | tag::DEMO => Some(1),
        tag::YAMYAM | tag::ROBOT | tag::WHEEL | tag::ELEVATOR => Some(2),
        tag::LOOT_LOSS => Some(3),
        _ => None,
    }
}

const SILENT_YAMYAM: u8 = 0x01;
const SILENT_EXPLOSION: u8 = 0x02;
const DEMO_USER_RECORDED: u8 = 0x01;
const DEMO_EXPECT_SUCCESS: u8 = 0x02;

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn take(&mut self, len: usize, context: &'static str) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(Error::Truncated {
                context,
                offset: self.offset,
            })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn u8(&mut self, context: &'static str) -> Result<u8> {
        Ok(self.take(1, context)?[0])
    }

    fn u16(&mut self, context: &'static str) -> Result<u16> {
        let b = self.take(2, context)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, context: &'static str) -> Result<u32> {
        let b = self.take(4, context)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn string(&mut self, context: &'static str) -> Result<String> {
        let len = self.u16(context)? as usize;
        let raw = self.take(len, context)?;
        String::from_utf8(raw.to_vec())
            .map_err(|e| Error::Serialization(format!("{}: {}", context, e)))
    }

    fn object(&mut self, context: &'static str) -> Result<ObjectKind> {
        let offset = self.offset;
        let byte = self.u8(context)?;
        let cell = alphabet::decode_byte(byte).ok_or(Error::UnknownObject { byte, offset })?;
        Ok(cell.kind)
    }
}

/// Records gathered so far while parsing.
#[derive(Default)]
struct Partial {
    meta: LevelMeta,
    props: LevelProperties,
    grid: Option<Grid>,
    palette: Vec<Remainder>,
    demos: Vec<Demo>,
    declared_demos: u16,
    /// Offset just past the last complete record.
    complete: usize,
}

impl Partial {
    fn into_level(self) -> Result<Level> {
        let grid = self
            .grid
            .ok_or_else(|| Error::Validation("level file has no GRID record".to_string()))?;
        Ok(Level {
            meta: self.meta,
            props: self.props,
            grid,
            yamyam_palette: self.palette,
            demos: self.demos,
        })
    }
}

/// Parse as many records as possible. The error, if any, describes the
/// first record that could not be read; everything before it is kept.
fn parse(bytes: &[u8]) -> (Partial, Result<u32>) {
    let mut partial = Partial::default();
    let result = parse_into(bytes, &mut partial);
    (partial, result)
}

fn parse_into(bytes: &[u8], partial: &mut Partial) -> Result<u32> {
    let mut r = Reader::new(bytes);

    let version = r.u32("version")?;
    if version == 0 || version > FORMAT_VERSION {
        return Err(Error::UnsupportedVersion {
            found: version,
            max: FORMAT_VERSION,
        });
    }
    partial.complete = r.offset;

    loop {
        let offset = r.offset;
        let code = r.u8("tag")?;
        match introduced_in(code) {
            Some(since) if since <= version => {}
            _ => return Err(Error::UnknownTag { tag: code, offset }),
        }

        match code {
            tag::END => {
                if r.offset < bytes.len() {
                    debug!(
                        event = "trailing_bytes",
                        count = bytes.len() - r.offset
                    );
                }
                return Ok(version);
            }
            tag::DEMO_COUNT => partial.declared_demos = r.u16("demo count")?,
            tag::TITLE => partial.meta.title = r.string("title")?,
            tag::DIFFICULTY => partial.meta.difficulty = r.u8("difficulty")?,
            tag::CATEGORY => partial.meta.category = r.u8("category")?,
            tag::PLAYER_COUNT => partial.props.player_count = r.u8("player count")?,
            tag::UUID => {
                let raw = r.take(16, "uuid")?;
                let mut id = [0u8; 16];
                id.copy_from_slice(raw);
                partial.meta.uuid = Uuid::from_bytes(id);
            }
            tag::AUTHOR => partial.meta.author = r.string("author")?,
            tag::LEADERBOARD => partial.meta.leaderboard = r.u8("leaderboard")?,
            tag::NON_MODIFIABLE => partial.meta.non_modifiable = r.u8("non-modifiable")? != 0,
            tag::SILENT => {
                let bits = r.u8("silent")?;
                partial.meta.silent_yamyam = bits & SILENT_YAMYAM != 0;
                partial.meta.silent_explosion = bits & SILENT_EXPLOSION != 0;
            }
            tag::DESCRIPTION => partial.meta.description = r.string("description")?,
            tag::STEP_LIMIT => partial.props.step_limit = Some(r.u32("step limit")?),
            tag::TIME_LIMIT => partial.props.time_limit = Some(r.u32("time limit")?),
            tag::MUSIC => partial.meta.music = r.string("music")?,
            tag::LOOT_LOSS => partial.props.loot_loss_threshold = Some(r.u32("loot loss")?),
            tag::PUSH => partial.props.push_probability = r.u8("push probability")?,
            tag::DISPENSER => partial.props.dispenser_speed = r.u16("dispenser speed")?,
            tag::SWAMP => partial.props.swamp_rate = r.u16("swamp rate")?,
            tag::ROBOT => partial.props.robot_move_rate = r.u16("robot rate")?,
            tag::WHEEL => partial.props.wheel_duration = r.u16("wheel duration")?,
            tag::LOOT_TARGET => partial.props.loot_target = r.u32("loot target")?,
            tag::ELEVATOR => partial.props.elevator_speed = r.u16("elevator speed")?,
            tag::GRID => partial.grid = Some(read_grid(&mut r)?),
            tag::YAMYAM => partial.palette = read_palette(&mut r)?,
            tag::DEMO => {
                let demo = read_demo(&mut r, version)?;
                partial.demos.push(demo);
            }
            _ => return Err(Error::UnknownTag { tag: code, offset }),
        }
        partial.complete = r.offset;
    }
}

fn read_grid(r: &mut Reader<'_>) -> Result<Grid> {
    let width = r.u16("grid width")?;
    let height = r.u16("grid height")?;
    if width == 0 || height == 0 {
        return Err(Error::Validation(format!(
            "grid of {}x{} is empty",
            width, height
        )));
    }
    if width > MAX_GRID_SIDE || height > MAX_GRID_SIDE {
        return Err(Error::Validation(format!(
            "grid of {}x{} exceeds {} cells per side",
            width, height, MAX_GRID_SIDE
        )));
    }

    let start = r.offset;
    let raw = r.take(width as usize * height as usize, "grid cells")?;
    let mut cells = Vec::with_capacity(raw.len());
    for (i, byte) in raw.iter().enumerate() {
        let cell = alphabet::decode_byte(*byte).ok_or(Error::UnknownObject {
            byte: *byte,
            offset: start + i,
        })?;
        cells.push(cell);
    }

    Grid::from_cells(width as i32, height as i32, cells)
        .ok_or_else(|| Error::Validation("grid size does not match its cells".to_string()))
}

fn read_palette(r: &mut Reader<'_>) -> Result<Vec<Remainder>> {
    let count = r.u8("yam-yam count")?;
    let mut palette = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let mut remainder = [ObjectKind::Air; 9];
        for slot in remainder.iter_mut() {
            *slot = r.object("yam-yam remainder")?;
        }
        palette.push(remainder);
    }
    Ok(palette)
}

fn read_demo(r: &mut Reader<'_>, version: u32) -> Result<Demo> {
    let seed = r.u32("demo seed")?;
    let title = r.string("demo title")?;
    let len = r.u32("demo moves")? as usize;
    let moves = r.take(len, "demo moves")?.to_vec();

    let mut demo = Demo::new(seed, moves, title);
    if version >= 3 {
        let flags = r.u8("demo flags")?;
        demo.user_recorded = flags & DEMO_USER_RECORDED != 0;
        demo.expect_success = flags & DEMO_EXPECT_SUCCESS != 0;
    }
    Ok(demo)
}

/// Decode a level file.
pub fn read_level(bytes: &[u8]) -> Result<Level> {
    let (partial, result) = parse(bytes);
    let version = result?;

    if partial.declared_demos as usize != partial.demos.len() {
        return Err(Error::InvalidDemo(format!(
            "file declares {} demos but holds {}",
            partial.declared_demos,
            partial.demos.len()
        )));
    }

    let level = partial.into_level()?;
    debug!(
        event = "level_read",
        version,
        width = level.width(),
        height = level.height(),
        demos = level.demos.len(),
    );
    Ok(level)
}

/// Salvage the complete records of a damaged file.
///
/// Succeeds when the header is readable and a complete GRID record was
/// parsed before the damage; the demo count is corrected to the demos that
/// survived.
pub(crate) fn salvage(bytes: &[u8]) -> Option<(Level, usize)> {
    let (partial, result) = parse(bytes);
    if matches!(result, Err(Error::UnsupportedVersion { .. })) {
        return None;
    }
    let complete = partial.complete;
    partial.into_level().ok().map(|level| (level, complete))
}

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn tag(&mut self, tag: u8) -> &mut Self {
        self.buf.push(tag);
        self
    }

    fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    fn string(&mut self, value: &str, context: &str) -> Result<&mut Self> {
        let len = u16::try_from(value.len()).map_err(|_| {
            Error::Validation(format!("{} is longer than {} bytes", context, u16::MAX))
        })?;
        self.u16(len);
        self.buf.extend_from_slice(value.as_bytes());
        Ok(self)
    }
}

fn narrow<T: TryFrom<usize>>(value: usize, what: &str) -> Result<T> {
    T::try_from(value).map_err(|_| Error::Validation(format!("too many {}: {}", what, value)))
}

/// Encode a level in the current format version.
pub fn write_level(level: &Level) -> Result<Vec<u8>> {
    let meta = &level.meta;
    let props = &level.props;
    let mut w = Writer::default();

    w.u32(FORMAT_VERSION);
    w.tag(tag::DEMO_COUNT).u16(narrow(level.demos.len(), "demos")?);
    w.tag(tag::TITLE).string(&meta.title, "title")?;
    w.tag(tag::AUTHOR).string(&meta.author, "author")?;
    w.tag(tag::DESCRIPTION)
        .string(&meta.description, "description")?;
    w.tag(tag::MUSIC).string(&meta.music, "music")?;
    w.tag(tag::DIFFICULTY).u8(meta.difficulty);
    w.tag(tag::CATEGORY).u8(meta.category);
    w.tag(tag::UUID);
    w.buf.extend_from_slice(meta.uuid.as_bytes());
    w.tag(tag::LEADERBOARD).u8(meta.leaderboard);
    w.tag(tag::NON_MODIFIABLE).u8(u8::from(meta.non_modifiable));

    let mut silent = 0;
    if meta.silent_yamyam {
        silent |= SILENT_YAMYAM;
    }
    if meta.silent_explosion {
        silent |= SILENT_EXPLOSION;
    }
    w.tag(tag::SILENT).u8(silent);

    w.tag(tag::PLAYER_COUNT).u8(props.player_count);
    w.tag(tag::PUSH).u8(props.push_probability);
    w.tag(tag::SWAMP).u16(props.swamp_rate);
    w.tag(tag::DISPENSER).u16(props.dispenser_speed);
    w.tag(tag::ELEVATOR).u16(props.elevator_speed);
    w.tag(tag::WHEEL).u16(props.wheel_duration);
    w.tag(tag::ROBOT).u16(props.robot_move_rate);
    w.tag(tag::LOOT_TARGET).u32(props.loot_target);
    if let Some(threshold) = props.loot_loss_threshold {
        w.tag(tag::LOOT_LOSS).u32(threshold);
    }
    if let Some(limit) = props.step_limit {
        w.tag(tag::STEP_LIMIT).u32(limit);
    }
    if let Some(limit) = props.time_limit {
        w.tag(tag::TIME_LIMIT).u32(limit);
    }

    let columns: u16 = narrow(level.width() as usize, "columns")?;
    let rows: u16 = narrow(level.height() as usize, "rows")?;
    if columns > MAX_GRID_SIDE || rows > MAX_GRID_SIDE {
        return Err(Error::Validation(format!(
            "grid of {}x{} exceeds {} cells per side",
            columns, rows, MAX_GRID_SIDE
        )));
    }
    w.tag(tag::GRID).u16(columns).u16(rows);
    for cell in level.grid.cells() {
        w.u8(alphabet::encode_cell(cell));
    }

    if !level.yamyam_palette.is_empty() {
        w.tag(tag::YAMYAM)
            .u8(narrow(level.yamyam_palette.len(), "yam-yam remainders")?);
        for remainder in &level.yamyam_palette {
            for kind in remainder {
                w.u8(alphabet::encode_cell(&Cell::new(*kind)));
            }
        }
    }

    for demo in &level.demos {
        w.tag(tag::DEMO).u32(demo.seed);
        w.string(&demo.title, "demo title")?;
        w.u32(narrow(demo.moves.len(), "demo moves")?);
        w.buf.extend_from_slice(&demo.moves);

        let mut flags = 0;
        if demo.user_recorded {
            flags |= DEMO_USER_RECORDED;
        }
        if demo.expect_success {
            flags |= DEMO_EXPECT_SUCCESS;
        }
        w.u8(flags);
    }

    w.tag(tag::END);
    Ok(w.buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mine_core::Position;

    fn sample_level() -> Level {
        let mut level = Level::new(4, 3);
        level.meta.title = "Deep Shaft".to_string();
        level.meta.author = "ore".to_string();
        level.meta.silent_explosion = true;
        level.props.loot_target = 4;
        level.props.time_limit = Some(90);
        level.props.loot_loss_threshold = Some(2);
        level
            .set_cell(Position::new(0, 0), Cell::new(ObjectKind::Player))
            .unwrap();
        level
            .set_cell(Position::new(3, 2), alphabet::decode_byte(b'3').unwrap())
            .unwrap();
        level
            .set_cell(Position::new(1, 1), alphabet::decode_byte(b'C').unwrap())
            .unwrap();
        level.yamyam_palette = vec![[ObjectKind::Ruby; 9]];
        let mut demo = Demo::new(77, b"EEEA".to_vec(), "speedrun");
        demo.expect_success = true;
        level.add_demo(demo);
        level
    }

    /// Header for a hand-built file of the given version.
    fn header(version: u32) -> Vec<u8> {
        version.to_be_bytes().to_vec()
    }

    fn minimal_grid() -> Vec<u8> {
        vec![tag::GRID, 0, 2, 0, 1, b'P', b' ']
    }

    #[test]
    fn test_round_trip() {
        let level = sample_level();
        let bytes = write_level(&level).unwrap();
        let back = read_level(&bytes).unwrap();
        assert_eq!(back, level);
        assert_eq!(&bytes[..4], &FORMAT_VERSION.to_be_bytes());
    }

    #[test]
    fn test_minimal_v1_file() {
        let mut bytes = header(1);
        bytes.extend(minimal_grid());
        bytes.push(tag::END);

        let level = read_level(&bytes).unwrap();
        assert_eq!(level.width(), 2);
        assert_eq!(level.cell(Position::new(0, 0)).kind, ObjectKind::Player);
        assert!(level.demos.is_empty());
        assert!(level.props.loot_loss_threshold.is_none());
    }

    #[test]
    fn test_rejects_bad_versions() {
        for version in [0, FORMAT_VERSION + 1] {
            let mut bytes = header(version);
            bytes.extend(minimal_grid());
            bytes.push(tag::END);
            assert!(matches!(
                read_level(&bytes),
                Err(Error::UnsupportedVersion { .. })
            ));
        }
    }

    #[test]
    fn test_rejects_tags_newer_than_file() {
        let mut bytes = header(1);
        bytes.extend([tag::ROBOT, 0, 3]);
        bytes.extend(minimal_grid());
        bytes.push(tag::END);
        assert!(matches!(
            read_level(&bytes),
            Err(Error::UnknownTag { tag: tag::ROBOT, offset: 4 })
        ));

        let mut bytes = header(2);
        bytes.extend([tag::LOOT_LOSS, 0, 0, 0, 1]);
        assert!(matches!(
            read_level(&bytes),
            Err(Error::UnknownTag { tag: tag::LOOT_LOSS, .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_tag() {
        let mut bytes = header(3);
        bytes.push(0x7f);
        assert!(matches!(
            read_level(&bytes),
            Err(Error::UnknownTag { tag: 0x7f, offset: 4 })
        ));
    }

    #[test]
    fn test_rejects_unknown_object() {
        let mut bytes = header(3);
        bytes.extend([tag::GRID, 0, 2, 0, 1, b'P', b'9']);
        bytes.push(tag::END);
        assert!(matches!(
            read_level(&bytes),
            Err(Error::UnknownObject { byte: b'9', offset: 10 })
        ));
    }

    #[test]
    fn test_rejects_huge_grid_header() {
        let mut bytes = header(3);
        bytes.extend([tag::GRID, 0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(read_level(&bytes), Err(Error::Validation(_))));

        let mut bytes = header(3);
        bytes.extend([tag::GRID, 0x04, 0x00, 0x04, 0x00]);
        assert!(matches!(read_level(&bytes), Err(Error::Truncated { .. })));
    }

    #[test]
    fn test_rejects_empty_grid() {
        let mut bytes = header(3);
        bytes.extend([tag::GRID, 0, 0, 0, 4, tag::END]);
        assert!(matches!(read_level(&bytes), Err(Error::Validation(_))));
    }

    #[test]
    fn test_rejects_truncation() {
        let bytes = write_level(&sample_level()).unwrap();
        let cut = &bytes[..bytes.len() - 3];
        let err = read_level(cut).unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }));
        assert!(err.is_malformed());
    }

    #[test]
    fn test_rejects_missing_grid() {
        let mut bytes = header(3);
        bytes.extend([tag::PLAYER_COUNT, 1, tag::END]);
        assert!(matches!(read_level(&bytes), Err(Error::Validation(_))));
    }

    #[test]
    fn test_rejects_demo_count_mismatch() {
        let mut bytes = header(3);
        bytes.extend([tag::DEMO_COUNT, 0, 2]);
        bytes.extend(minimal_grid());
        bytes.push(tag::END);
        assert!(matches!(read_level(&bytes), Err(Error::InvalidDemo(_))));
    }

    #[test]
    fn test_v2_demo_has_no_flags() {
        let mut bytes = header(2);
        bytes.extend([tag::DEMO_COUNT, 0, 1]);
        bytes.extend(minimal_grid());
        bytes.push(tag::DEMO);
        bytes.extend(5u32.to_be_bytes());
        bytes.extend([0, 2, b'g', b'o']);
        bytes.extend(2u32.to_be_bytes());
        bytes.extend([b'E', b'E']);
        bytes.push(tag::END);

        let level = read_level(&bytes).unwrap();
        let demo = &level.demos[0];
        assert_eq!(demo.seed, 5);
        assert_eq!(demo.title, "go");
        assert_eq!(demo.moves, b"EE");
        assert!(!demo.user_recorded);
        assert!(!demo.expect_success);
    }

    #[test]
    fn test_explosions_are_written_settled() {
        let mut level = sample_level();
        level.grid.set(Position::new(2, 0), Cell::explosion(ObjectKind::Emerald));
        let back = read_level(&write_level(&level).unwrap()).unwrap();
        assert_eq!(back.cell(Position::new(2, 0)).kind, ObjectKind::Emerald);
    }

    #[test]
    fn test_rejects_oversized_title() {
        let mut level = sample_level();
        level.meta.title = "x".repeat(70_000);
        assert!(matches!(write_level(&level), Err(Error::Validation(_))));
    }
}
