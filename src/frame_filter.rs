//! Decides, frame by frame, whether the fighters currently have agency.
//!
//! A fighting-game match is not actionable wall to wall: the pre-round
//! countdown, the frames after a knockout and the between-rounds health
//! reset all play out with no player input having any effect. The filter
//! classifies every frame so the session can skip the dead air with no-op
//! steps instead of asking players for moves that would go nowhere.
//!
//! The classification rules are deliberately asymmetric around a knockout.
//! When a fighter's health first drops below zero and the opponent's win
//! tally reads exactly one, that single frame is still actionable; dropping
//! it would lose the terminal transition of the round from every player's
//! recorded sequence. One frame later the same telemetry reads as a plain
//! knockout and play stays frozen until the next round starts. Do not
//! "simplify" these rules; the trailing-frame window is the point.

use tracing::trace;

use crate::error::MatchError;
use crate::telemetry::Telemetry;

/// Classification of one simulation frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePhase {
    /// The round countdown has not started; the timer still reads its reset
    /// value.
    PreRound,
    /// A fighter just dropped below zero health and the opponent's win tally
    /// reads one: the single trailing frame that completes a round.
    FinalBlow,
    /// A fighter is below zero health with no compensating win-tally read;
    /// the knockout animation is playing out.
    Downed,
    /// Health is climbing back through zero after a knockout; the next round
    /// has not started yet.
    RoundReset,
    /// Normal play.
    Active,
}

impl FramePhase {
    /// True when a bound player's move choice has in-game effect this frame.
    pub fn is_actionable(self) -> bool {
        matches!(self, FramePhase::FinalBlow | FramePhase::Active)
    }
}

/// Per-match filter state: the round-timer reset constant and the previous
/// frame's health snapshot.
#[derive(Debug)]
pub struct FrameFilter {
    round_timer_start: i64,
    prev_health: [i64; 2],
}

impl FrameFilter {
    /// Creates a filter seeded with the first frame's health readings.
    ///
    /// The first call to [`FrameFilter::assess`] should be for that same
    /// frame; with an identical snapshot the crossing rules cannot fire
    /// spuriously on frame one.
    pub fn new(round_timer_start: i64, first: &Telemetry) -> Result<Self, MatchError> {
        Ok(Self {
            round_timer_start,
            prev_health: [first.health(0)?, first.health(1)?],
        })
    }

    /// Classifies one frame and advances the health snapshot.
    ///
    /// Must be called exactly once per stepped frame, in order, including
    /// the frames produced by the session's own no-op submissions.
    pub fn assess(&mut self, info: &Telemetry) -> Result<FramePhase, MatchError> {
        let timer = info.round_timer()?;
        let health = [info.health(0)?, info.health(1)?];
        let wins = [info.wins(0)?, info.wins(1)?];
        let prev = self.prev_health;
        self.prev_health = health;

        let phase = if timer == self.round_timer_start {
            FramePhase::PreRound
        } else if Self::final_blow(health, wins, prev, 0) || Self::final_blow(health, wins, prev, 1)
        {
            FramePhase::FinalBlow
        } else if health[0] < 0 || health[1] < 0 {
            FramePhase::Downed
        } else if (prev[0] < 0 && health[0] == 0) || (prev[1] < 0 && health[1] == 0) {
            FramePhase::RoundReset
        } else {
            FramePhase::Active
        };
        trace!(?phase, timer, ?health, ?wins, "frame classified");
        Ok(phase)
    }

    /// The death frame: `slot` dropped below zero this frame while the
    /// opponent's tally reads exactly one round won.
    fn final_blow(health: [i64; 2], wins: [i64; 2], prev: [i64; 2], slot: usize) -> bool {
        health[slot] < 0 && wins[1 - slot] == 1 && prev[slot] >= 0
    }
}
