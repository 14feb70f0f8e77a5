//! Play statistics, loot accounting and level outcome.

use serde::{Deserialize, Serialize};

/// Why a level ended unsuccessfully
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// Every miner died before reaching an exit
    MinersLost,
    /// The time limit ran out
    TimeOut,
    /// The step limit was exceeded
    StepLimit,
    /// More loot was destroyed than the level tolerates
    LootLost,
}

/// Resolution state of a running level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    Playing,
    Success,
    Failure(FailureReason),
}

impl Outcome {
    pub fn is_decided(&self) -> bool {
        !matches!(self, Outcome::Playing)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Loot bookkeeping.
///
/// `initial` is the value of all pickable loot on the grid when the run
/// started; `adjust` books loot that came into or went out of existence by
/// transformation (explosion yields, converters, dispensers). At every tick
/// `placed + collected + lost == initial + adjust`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LootLedger {
    pub initial: u32,
    pub collected: u32,
    pub lost: u32,
    pub adjust: i64,
}

impl LootLedger {
    pub fn new(initial: u32) -> Self {
        Self {
            initial,
            ..Default::default()
        }
    }

    pub fn collect(&mut self, value: u32) {
        self.collected += value;
    }

    pub fn lose(&mut self, value: u32) {
        self.lost += value;
    }

    pub fn spawn(&mut self, value: u32) {
        self.adjust += value as i64;
    }

    pub fn vanish(&mut self, value: u32) {
        self.adjust -= value as i64;
    }

    /// Loot value that should currently be lying on the grid.
    pub fn expected_in_play(&self) -> i64 {
        self.initial as i64 + self.adjust - self.collected as i64 - self.lost as i64
    }
}

/// Statistics gathered over one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayStats {
    /// Ticks applied
    pub turns: u32,
    /// Player moves that changed a miner's cell
    pub steps: u32,
    /// Loot value collected
    pub loot_collected: u32,
    /// Loot value destroyed
    pub loot_lost: u32,
    /// Gems broken by falling rocks
    pub gems_broken: u32,
    /// Enemies destroyed
    pub enemies_killed: u32,
    /// Objects pushed by miners
    pub pushes: u32,
    /// Time bombs placed
    pub bombs_placed: u32,
    /// Keys picked up
    pub keys_collected: u32,
    /// Miners that reached an exit
    pub miners_finished: u32,
    /// Miners that died
    pub miners_lost: u32,
    /// Final outcome
    pub outcome: Outcome,
}

impl PlayStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaderboard score: collected loot, a bonus per finished miner and a
    /// small penalty for every step taken.
    pub fn score(&self) -> i64 {
        let loot = self.loot_collected as i64 * 10;
        let finish = if self.outcome.is_success() {
            self.miners_finished as i64 * 500
        } else {
            0
        };
        loot + finish - self.steps as i64
    }
}

/// Aggregate over the replays of several demos of one level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsSummary {
    pub runs: u32,
    pub successes: u32,
    pub avg_turns: u32,
    pub avg_loot: u32,
    pub best: Option<PlayStats>,
}

impl StatsSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one more run into the summary
    pub fn update(&mut self, stats: &PlayStats) {
        let n = self.runs as f64;
        let new_n = n + 1.0;

        self.avg_turns = ((self.avg_turns as f64 * n + stats.turns as f64) / new_n) as u32;
        self.avg_loot =
            ((self.avg_loot as f64 * n + stats.loot_collected as f64) / new_n) as u32;

        if stats.outcome.is_success() {
            self.successes += 1;
        }

        let better = match &self.best {
            None => true,
            Some(best) => stats.score() > best.score(),
        };
        if better {
            self.best = Some(stats.clone());
        }

        self.runs += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_balance() {
        let mut ledger = LootLedger::new(10);
        ledger.collect(3);
        ledger.lose(2);
        ledger.spawn(4);
        assert_eq!(ledger.expected_in_play(), 9);
        ledger.vanish(1);
        assert_eq!(ledger.expected_in_play(), 8);
    }

    #[test]
    fn test_score_rewards_success() {
        let mut stats = PlayStats::new();
        stats.loot_collected = 5;
        stats.steps = 20;
        stats.miners_finished = 1;
        assert_eq!(stats.score(), 30);

        stats.outcome = Outcome::Success;
        assert_eq!(stats.score(), 530);
    }

    #[test]
    fn test_summary_update() {
        let mut summary = StatsSummary::new();

        let mut s1 = PlayStats::new();
        s1.turns = 100;
        s1.loot_collected = 4;

        let mut s2 = PlayStats::new();
        s2.turns = 200;
        s2.loot_collected = 8;
        s2.outcome = Outcome::Success;
        s2.miners_finished = 1;

        summary.update(&s1);
        summary.update(&s2);

        assert_eq!(summary.runs, 2);
        assert_eq!(summary.successes, 1);
        assert_eq!(summary.avg_turns, 150);
        assert_eq!(summary.best.unwrap().loot_collected, 8);
    }

    #[test]
    fn test_outcome_flags() {
        assert!(!Outcome::Playing.is_decided());
        assert!(Outcome::Success.is_decided());
        assert!(Outcome::Failure(FailureReason::TimeOut).is_decided());
        assert!(!Outcome::Failure(FailureReason::TimeOut).is_success());
    }
}
