//! Sound events raised during a tick.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEvent {
    Dig,
    Pick,
    Push,
    RockLand,
    GemLand,
    Explosion,
    Acid,
    Convert,
    Break,
    Eat,
    Swamp,
    Dispense,
    Laser,
    Wheel,
    Countdown,
    ExitOpen,
    ExitEnter,
    Door,
    Tick,
}

/// Ordered, deduplicated events of the current tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundSet {
    events: Vec<SoundEvent>,
}

impl SoundSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event unless it was already raised this tick.
    pub fn push(&mut self, event: SoundEvent) {
        if !self.events.contains(&event) {
            self.events.push(event);
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn contains(&self, event: SoundEvent) -> bool {
        self.events.contains(&event)
    }

    pub fn as_slice(&self) -> &[SoundEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SoundEvent> {
        self.events.iter()
    }
}
