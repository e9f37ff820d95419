//! Error taxonomy for match execution and simulation loading.
//!
//! Collaborator traits ([`crate::game_interface`]) hand failures over as
//! [`anyhow::Error`]; the engine wraps them into these typed variants so the
//! scheduler can contain a fault at the granularity of a single session.

use std::time::Duration;

use thiserror::Error;

/// Errors produced while binding players into a lobby or running a match.
///
/// Every variant aborts at most the affected match. The scheduler logs the
/// error with round and matchup context, leaves the players' statistics
/// untouched and keeps the tournament running.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Tried to bind a player into a lobby whose seats are all taken.
    #[error("lobby is full ({capacity} seats)")]
    LobbyFull {
        /// Number of seats the lobby has.
        capacity: usize,
    },

    /// `play` was called before every seat was bound.
    #[error("cannot start a match with {bound} of {expected} seats bound")]
    MissingPlayers {
        /// Seats currently bound.
        bound: usize,
        /// Seats the lobby mode requires.
        expected: usize,
    },

    /// The requested save state does not exist for the configured game and
    /// player count.
    #[error("unknown save state '{state}'")]
    UnknownState {
        /// Name of the save state that failed to load.
        state: String,
    },

    /// A step's telemetry was missing a field the engine relies on.
    #[error("simulation telemetry is missing the '{field}' field")]
    MissingTelemetry {
        /// Key that was absent.
        field: &'static str,
    },

    /// A player returned a move index outside the action codec.
    #[error("player '{player}' chose move {move_id} but the codec only has {num_moves} moves")]
    IllegalMove {
        /// Offending player's name.
        player: String,
        /// The returned move index.
        move_id: usize,
        /// Size of the move enumeration.
        num_moves: usize,
    },

    /// The simulation backend raised while stepping, rendering or closing.
    #[error("simulation fault on frame {frame}")]
    Simulation {
        /// Frame count at the time of the fault.
        frame: u64,
        /// Underlying backend error.
        #[source]
        source: anyhow::Error,
    },

    /// A player's move or record call raised, or its driver was still held
    /// by an earlier match that never released it.
    #[error("player '{player}' failed")]
    PlayerFault {
        /// Offending player's name.
        player: String,
        /// Underlying player error.
        #[source]
        source: anyhow::Error,
    },

    /// A player's move request exceeded the configured stall window.
    #[error("player '{player}' stalled: move took {elapsed:?}, window is {limit:?}")]
    Stalled {
        /// Offending player's name.
        player: String,
        /// Time the move request actually took.
        elapsed: Duration,
        /// Configured stall window.
        limit: Duration,
    },

    /// The match exceeded its frame budget without the simulation reporting
    /// that it finished.
    #[error("match exceeded its frame budget of {limit} frames")]
    FrameLimit {
        /// Configured frame budget.
        limit: u64,
    },
}

/// Errors produced by [`crate::game_interface::EnvironmentLoader::load`].
#[derive(Debug, Error)]
pub enum LoadError {
    /// The named save state does not exist for this game/player-count
    /// combination.
    #[error("unknown save state '{0}'")]
    UnknownState(String),

    /// The backend failed for another reason (emulator missing, ROM not
    /// found, ...).
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<LoadError> for MatchError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::UnknownState(state) => MatchError::UnknownState { state },
            LoadError::Backend(source) => MatchError::Simulation { frame: 0, source },
        }
    }
}
