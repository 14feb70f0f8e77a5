//! The per-cell value of the grid.
//!
//! A cell is a small `Copy` value: its kind, the capability flags copied
//! from the prototype table, an orientation, an animation phase and a typed
//! payload for the kinds that carry extra data. The payload is checked
//! against the kind whenever a cell is built, so a cell never holds a view
//! that does not belong to it.

use crate::error::{Error, Result};
use crate::object::{Flags, ObjectKind};
use crate::prototype;
use crate::types::{Direction, KeyColor};
use serde::{Deserialize, Serialize};

/// Animation / lifecycle phase of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Still,
    /// Falling, rolling or walking this tick.
    Moving,
    /// Shoved by a miner or a machine this tick.
    Pushing,
    /// A dispenser about to release its product.
    Dispensing,
    /// A sapphire cracked by a falling rock.
    Breaking,
    /// A citrine shattered by a falling rock.
    Shattering,
    /// A rock that just sank into sand.
    Sinking,
    /// A turned wheel.
    Spinning,
}

/// Sub-state of an exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExitState {
    #[default]
    Closed,
    Opening,
    Open,
    /// A miner is walking in.
    Occupied,
    Closing,
}

impl ExitState {
    /// Miners may enter an exit that is open or finishing its opening.
    pub fn accepts_miner(&self) -> bool {
        matches!(self, ExitState::Open | ExitState::Opening)
    }
}

/// Progress of an explosion cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Blast {
    /// 1 = ignite, 2..3 = hold, 4 = resolve into `yields`.
    pub stage: u8,
    pub yields: ObjectKind,
}

impl Blast {
    pub const FINAL_STAGE: u8 = 4;
}

/// Kind-specific data of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Payload {
    #[default]
    None,
    /// Embedded object of a stone wall or safe, product of a dispenser.
    Contents(ObjectKind),
    /// Colour of a key or door.
    Color(KeyColor),
    /// Remaining ticks of an armed time bomb.
    Fuse(u8),
    Blast(Blast),
    Exit(ExitState),
    /// Player index of a miner.
    Miner(u8),
}

impl Payload {
    /// Whether this payload is a legal view for `kind`.
    pub fn fits(&self, kind: ObjectKind) -> bool {
        match (kind, self) {
            (ObjectKind::StoneWall | ObjectKind::Safe, Payload::None) => true,
            (ObjectKind::StoneWall | ObjectKind::Safe, Payload::Contents(inner)) => {
                inner.loot_value() > 0
            }
            (ObjectKind::Dispenser, Payload::Contents(inner)) => {
                prototype::lookup(*inner).flags.contains(Flags::FALLABLE)
            }
            (ObjectKind::Key | ObjectKind::Door, Payload::Color(_)) => true,
            (ObjectKind::TimeBomb, Payload::Fuse(_)) => true,
            (ObjectKind::Explosion, Payload::Blast(blast)) => {
                (1..=Blast::FINAL_STAGE).contains(&blast.stage) && !blast.yields.is_transient()
            }
            (ObjectKind::Exit, Payload::Exit(_)) => true,
            (ObjectKind::Player, Payload::Miner(_)) => true,
            (
                ObjectKind::StoneWall
                | ObjectKind::Safe
                | ObjectKind::Dispenser
                | ObjectKind::Key
                | ObjectKind::Door
                | ObjectKind::TimeBomb
                | ObjectKind::Explosion
                | ObjectKind::Exit
                | ObjectKind::Player,
                _,
            ) => false,
            (_, Payload::None) => true,
            _ => false,
        }
    }
}

/// One grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub kind: ObjectKind,
    pub flags: Flags,
    pub dir: Direction,
    pub phase: Phase,
    payload: Payload,
    /// Detonate when the turn engine next reaches this cell.
    pub pending_blast: bool,
    /// Last turn in which this cell was processed.
    pub stamp: u32,
}

impl Default for Cell {
    fn default() -> Self {
        Cell::air()
    }
}

impl Cell {
    /// Raw constructor used by the prototype table.
    pub(crate) const fn template(
        kind: ObjectKind,
        flags: Flags,
        dir: Direction,
        payload: Payload,
    ) -> Self {
        Self {
            kind,
            flags,
            dir,
            phase: Phase::Still,
            payload,
            pending_blast: false,
            stamp: 0,
        }
    }

    /// Fresh cell of `kind` with its prototype defaults.
    pub fn new(kind: ObjectKind) -> Self {
        *prototype::lookup(kind)
    }

    pub const fn air() -> Self {
        Self::template(ObjectKind::Air, Flags::EMPTY, Direction::None, Payload::None)
    }

    pub fn facing(kind: ObjectKind, dir: Direction) -> Self {
        Self {
            dir,
            ..Self::new(kind)
        }
    }

    /// Replace the payload, rejecting views that do not belong to the kind.
    pub fn with_payload(mut self, payload: Payload) -> Result<Self> {
        if !payload.fits(self.kind) {
            return Err(Error::InvalidState(format!(
                "payload {:?} does not fit {:?}",
                payload, self.kind
            )));
        }
        self.payload = payload;
        Ok(self)
    }

    pub fn player(index: u8) -> Self {
        Self {
            payload: Payload::Miner(index),
            ..Self::new(ObjectKind::Player)
        }
    }

    pub fn key(color: KeyColor) -> Self {
        Self {
            payload: Payload::Color(color),
            ..Self::new(ObjectKind::Key)
        }
    }

    pub fn door(color: KeyColor) -> Self {
        Self {
            payload: Payload::Color(color),
            ..Self::new(ObjectKind::Door)
        }
    }

    pub fn time_bomb(fuse: u8) -> Self {
        Self {
            payload: Payload::Fuse(fuse),
            ..Self::new(ObjectKind::TimeBomb)
        }
    }

    pub fn exit(state: ExitState) -> Self {
        Self {
            payload: Payload::Exit(state),
            ..Self::new(ObjectKind::Exit)
        }
    }

    /// First stage of an explosion that will leave `yields` behind.
    pub fn explosion(yields: ObjectKind) -> Self {
        let yields = if yields.is_transient() {
            ObjectKind::Air
        } else {
            yields
        };
        Self {
            payload: Payload::Blast(Blast { stage: 1, yields }),
            ..Self::new(ObjectKind::Explosion)
        }
    }

    pub fn laser(dir: Direction) -> Self {
        Self::facing(ObjectKind::Laser, dir)
    }

    pub fn payload(&self) -> Payload {
        self.payload
    }

    pub fn is_air(&self) -> bool {
        self.kind == ObjectKind::Air
    }

    pub fn has(&self, flag: Flags) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_moving(&self) -> bool {
        self.phase == Phase::Moving
    }

    pub fn contents(&self) -> Option<ObjectKind> {
        match self.payload {
            Payload::Contents(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn color(&self) -> Option<KeyColor> {
        match self.payload {
            Payload::Color(color) => Some(color),
            _ => None,
        }
    }

    pub fn fuse(&self) -> Option<u8> {
        match self.payload {
            Payload::Fuse(fuse) => Some(fuse),
            _ => None,
        }
    }

    pub fn blast(&self) -> Option<Blast> {
        match self.payload {
            Payload::Blast(blast) => Some(blast),
            _ => None,
        }
    }

    pub fn exit_state(&self) -> Option<ExitState> {
        match self.payload {
            Payload::Exit(state) => Some(state),
            _ => None,
        }
    }

    pub fn miner(&self) -> Option<u8> {
        match self.payload {
            Payload::Miner(index) => Some(index),
            _ => None,
        }
    }

    pub fn set_fuse(&mut self, fuse: u8) {
        match &mut self.payload {
            Payload::Fuse(current) => *current = fuse,
            other => panic!("set_fuse on {:?} with payload {:?}", self.kind, other),
        }
    }

    pub fn set_blast_stage(&mut self, stage: u8) {
        assert!((1..=Blast::FINAL_STAGE).contains(&stage));
        match &mut self.payload {
            Payload::Blast(blast) => blast.stage = stage,
            other => panic!("set_blast_stage on {:?} with payload {:?}", self.kind, other),
        }
    }

    pub fn set_exit_state(&mut self, state: ExitState) {
        match &mut self.payload {
            Payload::Exit(current) => *current = state,
            other => panic!("set_exit_state on {:?} with payload {:?}", self.kind, other),
        }
    }
}
