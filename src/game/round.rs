//! Round lifecycle: phase, countdown, global score and combo

use super::ranking::RoundSummary;
use super::tuning::GameTuning;

/// Round phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoundPhase {
    /// Nothing started yet, or reset
    #[default]
    Idle,
    /// Timers and physics live
    Running,
    /// Frozen mid-round
    Paused,
    /// Countdown hit zero, ranking frozen
    Ended,
}

/// Score and timer state of the current round
#[derive(Debug, Clone)]
pub struct Round {
    pub phase: RoundPhase,
    /// Whole seconds remaining
    pub time_left: u32,
    pub score: u32,
    /// Consecutive cuts
    pub combo: u32,
    /// Set once when the round ends
    pub summary: Option<RoundSummary>,
}

impl Round {
    pub fn new(tuning: &GameTuning) -> Self {
        Self {
            phase: RoundPhase::Idle,
            time_left: tuning.round_secs,
            score: 0,
            combo: 0,
            summary: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == RoundPhase::Running
    }

    /// Zero score, combo and timer, then run
    pub fn begin(&mut self, tuning: &GameTuning) {
        *self = Self::new(tuning);
        self.phase = RoundPhase::Running;
    }

    /// Back to idle with a full timer
    pub fn reset(&mut self, tuning: &GameTuning) {
        *self = Self::new(tuning);
    }

    /// Running and paused swap; any other phase is left alone. Returns the new phase.
    pub fn toggle_pause(&mut self) -> RoundPhase {
        self.phase = match self.phase {
            RoundPhase::Running => RoundPhase::Paused,
            RoundPhase::Paused => RoundPhase::Running,
            other => other,
        };
        self.phase
    }

    /// One countdown second. Returns true when this tick ran the clock out.
    pub fn tick_countdown(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.time_left = self.time_left.saturating_sub(1);
        self.time_left == 0
    }

    /// Score one cut. Returns the bonus awarded, zero when this cut did not complete a combo.
    pub fn record_cut(&mut self, tuning: &GameTuning) -> u32 {
        self.score += tuning.points_per_fruit;
        self.combo += 1;
        if tuning.combo_every > 0 && self.combo % tuning.combo_every == 0 {
            self.score += tuning.combo_bonus;
            return tuning.combo_bonus;
        }
        0
    }

    /// Freeze with the final ranking
    pub fn finish(&mut self, summary: RoundSummary) {
        self.phase = RoundPhase::Ended;
        self.summary = Some(summary);
    }
}
