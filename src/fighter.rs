//! Persistent fighter identity shared by the scheduler and match sessions.
//!
//! A [`Fighter`] is the stable shell around a [`Player`] implementation:
//! name, chosen character, running statistics, and the driver holding the
//! actual learning agent. The shell lives in an [`Arc`] for the whole
//! tournament; sessions and the review phase borrow the driver through its
//! mutex, the scheduler updates the statistics, everyone else only reads.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use rand::Rng;
use tracing::warn;

use crate::action_codec::{ActionCodec, MoveId};
use crate::error::MatchError;
use crate::game_interface::{Player, Transition};
use crate::telemetry::Telemetry;

/// One roster entry: identity, statistics and the player implementation
/// driving it.
pub struct Fighter<O> {
    name: String,
    character: String,
    id: u32,
    matches_played: AtomicUsize,
    matches_won: AtomicUsize,
    driver: Mutex<Box<dyn Player<O> + Send>>,
}

impl<O> Fighter<O> {
    /// Wraps a player implementation into a roster entry.
    pub fn new(
        name: impl Into<String>,
        character: impl Into<String>,
        id: u32,
        driver: Box<dyn Player<O> + Send>,
    ) -> Self {
        Self {
            name: name.into(),
            character: character.into(),
            id,
            matches_played: AtomicUsize::new(0),
            matches_won: AtomicUsize::new(0),
            driver: Mutex::new(driver),
        }
    }

    /// Display name used in matchups, standings and logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Character this fighter plays, which also selects the save states its
    /// matches boot from.
    pub fn character(&self) -> &str {
        &self.character
    }

    /// Stable roster id, assigned at load time.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Completed (not aborted) matches this fighter took part in.
    pub fn matches_played(&self) -> usize {
        self.matches_played.load(Ordering::Relaxed)
    }

    /// Matches this fighter won.
    pub fn matches_won(&self) -> usize {
        self.matches_won.load(Ordering::Relaxed)
    }

    pub(crate) fn note_match_played(&self) {
        self.matches_played.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn note_match_won(&self) {
        self.matches_won.fetch_add(1, Ordering::Relaxed);
    }

    /// Non-blocking driver acquisition.
    ///
    /// A busy driver means an earlier match never returned from a player
    /// call and still holds the lock; failing fast here keeps one wedged
    /// player from freezing every later round it gets paired into. A
    /// poisoned driver (the player panicked) is recovered and reused.
    pub(crate) fn try_driver(
        &self,
    ) -> Result<MutexGuard<'_, Box<dyn Player<O> + Send>>, MatchError> {
        match self.driver.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => {
                warn!(
                    player = self.name.as_str(),
                    "driver mutex poisoned by a panicked match; recovering"
                );
                Ok(poisoned.into_inner())
            }
            Err(TryLockError::WouldBlock) => Err(MatchError::PlayerFault {
                player: self.name.clone(),
                source: anyhow::anyhow!(
                    "driver is still held by an earlier match that never returned"
                ),
            }),
        }
    }
}

impl<O> PartialEq for Fighter<O> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.id == other.id
    }
}

impl<O> Eq for Fighter<O> {}

impl<O> Hash for Fighter<O> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.id.hash(state);
    }
}

impl<O> fmt::Debug for Fighter<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fighter")
            .field("name", &self.name)
            .field("character", &self.character)
            .field("id", &self.id)
            .field("matches_played", &self.matches_played())
            .field("matches_won", &self.matches_won())
            .finish()
    }
}

/// Convenience alias: fighters are always shared.
pub type FighterRef<O> = Arc<Fighter<O>>;

/// Baseline player picking uniformly random moves.
///
/// The stock opponent for smoke-testing a roster; it never learns and its
/// review hook is a no-op.
#[derive(Debug, Default)]
pub struct RandomPlayer {
    num_moves: usize,
}

impl RandomPlayer {
    /// Creates a baseline player. The move range is taken from the codec at
    /// [`Player::prepare_for_next_fight`] time.
    pub fn new() -> Self {
        Self { num_moves: 1 }
    }
}

impl<O> Player<O> for RandomPlayer {
    fn prepare_for_next_fight(&mut self, codec: &Arc<ActionCodec>, _slot: usize) {
        self.num_moves = codec.len();
    }

    fn get_move(&mut self, _observation: &O, _info: &Telemetry) -> anyhow::Result<MoveId> {
        Ok(rand::thread_rng().gen_range(0..self.num_moves))
    }

    fn record_step(&mut self, _transition: Transition<O>) -> anyhow::Result<()> {
        Ok(())
    }

    fn review_fight(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter(name: &str, id: u32) -> Fighter<u64> {
        Fighter::new(name, "ryu", id, Box::new(RandomPlayer::new()))
    }

    #[test]
    fn identity_is_name_plus_id() {
        assert_eq!(fighter("Ryu", 0), fighter("Ryu", 0));
        assert_ne!(fighter("Ryu", 0), fighter("Ryu", 1));
        assert_ne!(fighter("Ryu", 0), fighter("Ken", 0));
    }

    #[test]
    fn statistics_start_at_zero_and_count_up() {
        let f = fighter("Ryu", 0);
        assert_eq!(f.matches_played(), 0);
        assert_eq!(f.matches_won(), 0);
        f.note_match_played();
        f.note_match_played();
        f.note_match_won();
        assert_eq!(f.matches_played(), 2);
        assert_eq!(f.matches_won(), 1);
    }

    #[test]
    fn busy_driver_fails_fast_instead_of_blocking() {
        let f = fighter("Ryu", 0);
        let held = f.try_driver().unwrap();
        match f.try_driver() {
            Err(MatchError::PlayerFault { player, .. }) => assert_eq!(player, "Ryu"),
            other => panic!("expected PlayerFault, got {:?}", other.is_ok()),
        }
        drop(held);
        assert!(f.try_driver().is_ok());
    }

    #[test]
    fn random_player_stays_inside_the_codec() {
        let codec = Arc::new(ActionCodec::street_fighter2());
        let mut player = RandomPlayer::new();
        Player::<u64>::prepare_for_next_fight(&mut player, &codec, 0);
        for _ in 0..500 {
            let mv = Player::<u64>::get_move(&mut player, &0, &Telemetry::new()).unwrap();
            assert!(codec.contains(mv));
        }
    }
}
