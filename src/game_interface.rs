//! Traits connecting the engine to a simulation backend and to player
//! implementations.
//!
//! The engine never talks to an emulator or a learning algorithm directly.
//! A lobby drives one [`Environment`] created through an
//! [`EnvironmentLoader`], and forwards observations to [`Player`]s bound
//! into its seats. Everything a backend must guarantee is written on the
//! trait methods; the engine honors the contracts but cannot check most of
//! them.

use std::sync::Arc;

use crate::action_codec::{ActionCodec, MoveId};
use crate::error::LoadError;
use crate::telemetry::Telemetry;

/// One simulation advance: the frame produced by submitting a move vector.
#[derive(Clone, Debug)]
pub struct Step<O> {
    /// Observation for the new frame (typically a pixel buffer).
    pub observation: O,
    /// Raw per-slot rewards, length = player count. For two-player matches
    /// the session overwrites slot 1 with the negation of slot 0.
    pub rewards: Vec<f32>,
    /// True when the match is over.
    pub done: bool,
    /// Named telemetry fields for the new frame.
    pub info: Telemetry,
}

/// A completed transition handed to [`Player::record_step`].
///
/// Observations and telemetry are owned because players typically keep
/// transitions in a replay memory long after the frame passed.
#[derive(Clone, Debug)]
pub struct Transition<O> {
    /// Observation the move was chosen from.
    pub observation: O,
    /// Telemetry the move was chosen from.
    pub info: Telemetry,
    /// The move the player picked.
    pub action: MoveId,
    /// Reward for this player, sign convention already applied.
    pub reward: f32,
    /// Observation after the move.
    pub next_observation: O,
    /// Telemetry after the move.
    pub next_info: Telemetry,
    /// True when this was the final transition of the match.
    pub done: bool,
}

/// A running simulation owned by one lobby for the duration of one match.
pub trait Environment {
    /// Observation type produced each frame.
    type Obs;

    /// Submits one move per seat (slot order) and advances one frame.
    ///
    /// `moves.len()` equals the player count the environment was loaded
    /// with. The returned reward vector must have the same length.
    fn step(&mut self, moves: &[MoveId]) -> anyhow::Result<Step<Self::Obs>>;

    /// Draws the current frame somewhere a human can see it. Best effort;
    /// the default does nothing.
    fn render(&mut self) {}

    /// Releases the simulation. Called exactly once per successful load;
    /// taking `self` by value lets the compiler enforce that.
    fn close(self) -> anyhow::Result<()>;
}

/// What the scheduler uses to boot one simulation per match.
pub trait EnvironmentLoader<E: Environment> {
    /// Boots a simulation at `save_state` with `players` participants.
    ///
    /// # Errors
    /// [`LoadError::UnknownState`] when no such save point exists for this
    /// game and player count.
    fn load(&self, save_state: &str, players: usize) -> Result<E, LoadError>;
}

/// A learning agent bound into a lobby seat.
///
/// Implementations live behind the [`crate::fighter::Fighter`] shell; the
/// engine serializes all calls, so `&mut self` is never contended within
/// one match.
pub trait Player<O> {
    /// Clears per-match memory and learns which seat this match is played
    /// from. Called once before the first move request of every match.
    fn prepare_for_next_fight(&mut self, codec: &Arc<ActionCodec>, slot: usize);

    /// Picks one move for the current frame.
    ///
    /// Must return within the configured stall window; a slower player
    /// forfeits the match. The returned index must be inside `codec`.
    fn get_move(&mut self, observation: &O, info: &Telemetry) -> anyhow::Result<MoveId>;

    /// Receives the transition the player just participated in. Called
    /// exactly once per actionable frame.
    fn record_step(&mut self, transition: Transition<O>) -> anyhow::Result<()>;

    /// Post-match training hook, called once per match after the round's
    /// last session finished. The only point at which learned parameters
    /// may change.
    fn review_fight(&mut self) -> anyhow::Result<()>;
}


#[cfg(test)]
mod interface_tests {
    use super::scripted::{quick_fight, ScriptedEnv, ScriptedLoader, ScriptedPlayer};
    use super::*;
    use crate::action_codec::ActionCodec as Codec;

    fn load_env<E: Environment, L: EnvironmentLoader<E>>(loader: &L, state: &str) -> E {
        loader.load(state, 2).unwrap()
    }

    #[test]
    fn loader_and_environment_round_trip() {
        let loader = ScriptedLoader::new(quick_fight(0));
        let mut env: ScriptedEnv = load_env(&loader, "two_player_ryuVSguile");
        let step = env.step(&[0, 0]).unwrap();
        assert_eq!(step.rewards.len(), 2);
        assert!(!step.done);
        env.close().unwrap();
        assert_eq!(loader.closed(), 1);
    }

    #[test]
    fn unknown_state_is_reported_by_name() {
        let loader = ScriptedLoader::new(quick_fight(0)).rejecting("two_player_nobodyVSnoone");
        match loader.load("two_player_nobodyVSnoone", 2) {
            Err(LoadError::UnknownState(state)) => {
                assert_eq!(state, "two_player_nobodyVSnoone");
            }
            other => panic!("expected UnknownState, got {:?}", other.is_ok()),
        }
    }

    #[test]
    fn player_contract_is_exercisable_through_the_trait() {
        let mut player = ScriptedPlayer::new(3);
        let probe = player.probe();
        let codec = std::sync::Arc::new(Codec::street_fighter2());

        player.prepare_for_next_fight(&codec, 1);
        let mv = player.get_move(&0, &Telemetry::new()).unwrap();
        assert_eq!(mv, 3);
        player
            .record_step(Transition {
                observation: 0,
                info: Telemetry::new(),
                action: mv,
                reward: -1.0,
                next_observation: 1,
                next_info: Telemetry::new(),
                done: false,
            })
            .unwrap();
        player.review_fight().unwrap();

        assert_eq!(probe.prepared(), 1);
        assert_eq!(probe.recorded(), 1);
        assert_eq!(probe.reviewed(), 1);
        assert_eq!(probe.slots(), vec![1]);
    }
}
