//! Demo playback and verification.

use mine_core::{Error, Intent, Outcome, PlayStats, ReplayConfig, Result};
use mine_world::{Demo, Game, Level};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

pub use mine_core::{decode_move, decode_move_lossy, encode_move, IDLE_CODE};

/// Iterates over the ticks of a demo, yielding one intent per player.
pub struct DemoPlayer<'a> {
    moves: std::slice::ChunksExact<'a, u8>,
}

impl<'a> DemoPlayer<'a> {
    /// Checks every move byte up front, so iteration itself cannot fail.
    pub fn new(demo: &'a Demo, player_count: usize) -> Result<Self> {
        if player_count == 0 || demo.moves.len() % player_count != 0 {
            return Err(Error::InvalidDemo(format!(
                "'{}' has {} moves for {} players",
                demo.title,
                demo.moves.len(),
                player_count
            )));
        }
        for byte in &demo.moves {
            decode_move(*byte)?;
        }
        Ok(Self {
            moves: demo.moves.chunks_exact(player_count),
        })
    }
}

impl Iterator for DemoPlayer<'_> {
    type Item = Vec<Intent>;

    fn next(&mut self) -> Option<Self::Item> {
        let tick = self.moves.next()?;
        Some(tick.iter().map(|b| decode_move_lossy(*b)).collect())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.moves.size_hint()
    }
}

/// Result of playing a demo back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub title: String,
    pub seed: u32,
    /// Ticks taken from the move string before the run ended
    pub ticks_played: u32,
    /// Idle ticks run after the move string ran out
    pub settle_ticks: u32,
    pub outcome: Outcome,
    pub stats: PlayStats,
}

/// Whether a demo still does what its flags claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemoVerdict {
    Consistent,
    Inconsistent { reason: String },
}

impl DemoVerdict {
    pub fn is_consistent(&self) -> bool {
        matches!(self, DemoVerdict::Consistent)
    }
}

/// A demo's verdict, with the replay it was judged on when the demo could
/// be played at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoCheck {
    pub title: String,
    pub report: Option<ReplayReport>,
    pub verdict: DemoVerdict,
}

fn unbounded() -> ReplayConfig {
    ReplayConfig {
        max_ticks: u64::MAX,
        settle_ticks: 0,
        ..Default::default()
    }
}

/// Play a demo on a fresh game until its moves run out or the level is
/// decided.
pub fn replay(level: &Level, demo: &Demo) -> Result<ReplayReport> {
    replay_with(level, demo, &unbounded())
}

/// Like [`replay`], bounded by `config.max_ticks` and followed by up to
/// `config.settle_ticks` idle ticks while the level is still undecided.
#[instrument(skip(level, demo, config), fields(title = %demo.title, seed = demo.seed))]
pub fn replay_with(level: &Level, demo: &Demo, config: &ReplayConfig) -> Result<ReplayReport> {
    let mut game = Game::new(level, demo.seed)?;
    let player = DemoPlayer::new(demo, game.player_count())?;

    let mut budget = config.max_ticks;
    let mut ticks_played = 0;
    for intents in player {
        if game.outcome().is_decided() || budget == 0 {
            break;
        }
        for (index, intent) in intents.into_iter().enumerate() {
            game.set_intent(index, intent)?;
        }
        game.apply_turn();
        ticks_played += 1;
        budget -= 1;
    }

    let mut settle_ticks = 0;
    while !game.outcome().is_decided() && budget > 0 && u64::from(settle_ticks) < config.settle_ticks
    {
        game.apply_turn();
        settle_ticks += 1;
        budget -= 1;
    }

    debug!(
        event = "demo_replayed",
        ticks_played,
        settle_ticks,
        outcome = ?game.outcome(),
    );

    Ok(ReplayReport {
        title: demo.title.clone(),
        seed: demo.seed,
        ticks_played,
        settle_ticks,
        outcome: game.outcome(),
        stats: game.stats().clone(),
    })
}

/// Compare a replay against the demo's success flag.
pub fn judge(demo: &Demo, report: &ReplayReport) -> DemoVerdict {
    if demo.expect_success && !report.outcome.is_success() {
        warn!(
            event = "demo_inconsistent",
            title = %demo.title,
            outcome = ?report.outcome,
        );
        return DemoVerdict::Inconsistent {
            reason: format!(
                "expected success, replay ended {:?} after {} ticks",
                report.outcome, report.stats.turns
            ),
        };
    }
    DemoVerdict::Consistent
}

/// Replay a demo and check it against its success flag. A demo that cannot
/// be played at all is reported as inconsistent.
pub fn verify(level: &Level, demo: &Demo) -> DemoVerdict {
    check(level, demo, &unbounded()).verdict
}

/// Replay a demo under `config` and judge the result. Never fails: an
/// unplayable demo comes back inconsistent and without a report.
pub fn check(level: &Level, demo: &Demo, config: &ReplayConfig) -> DemoCheck {
    match replay_with(level, demo, config) {
        Ok(report) => DemoCheck {
            title: demo.title.clone(),
            verdict: judge(demo, &report),
            report: Some(report),
        },
        Err(err) => {
            warn!(event = "demo_unplayable", title = %demo.title, error = %err);
            DemoCheck {
                title: demo.title.clone(),
                report: None,
                verdict: DemoVerdict::Inconsistent {
                    reason: err.to_string(),
                },
            }
        }
    }
}
