//! A lobby runs exactly one match to completion.
//!
//! The scheduler binds fighters into seats, then calls
//! [`Lobby::play`], which boots one simulation, primes it with a no-op
//! step, skips the frames nobody can act on, and drives the
//! move-step-record loop until the backend reports the match done. The
//! simulation handle is released unconditionally, whatever happened in
//! between; seats stay bound until the scheduler clears them.

use std::fmt::Display;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, instrument, trace};

use crate::action_codec::{ActionCodec, MoveId};
use crate::configuration::MatchLimits;
use crate::error::MatchError;
use crate::fighter::FighterRef;
use crate::frame_filter::FrameFilter;
use crate::game_config::GameConfig;
use crate::game_interface::{Environment, EnvironmentLoader, Transition};
use crate::telemetry::Telemetry;

/// Wall-clock pacing between rendered frames (the backend runs at 115 fps).
const FRAME_INTERVAL: Duration = Duration::from_micros(8_696);

/// How many seats a lobby has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LobbyMode {
    /// One fighter against the game's own opponent.
    SinglePlayer,
    /// Two fighters against each other.
    TwoPlayer,
}

impl LobbyMode {
    /// Number of seats, which is also the simulation's participant count.
    pub fn player_count(self) -> usize {
        match self {
            LobbyMode::SinglePlayer => 1,
            LobbyMode::TwoPlayer => 2,
        }
    }
}

/// The fighters of one match, in seat order.
#[derive(Clone, Debug)]
pub struct Matchup(Vec<String>);

impl Matchup {
    /// Builds a matchup from display names in seat order.
    pub fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    /// Display names in seat order.
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl Display for Matchup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.0.iter().fold(String::new(), |acu, name| {
            if acu.is_empty() {
                acu + name
            } else {
                acu + " VS " + name
            }
        });
        write!(f, "[{s}]")
    }
}

/// Outcome of one completed match.
#[derive(Clone, Debug)]
pub struct FightSummary {
    /// Seat of the fighter whose win tally reached the game's
    /// rounds-to-win, if any.
    pub winner: Option<usize>,
    /// Total frames stepped, filtered frames included.
    pub frames_seen: u64,
    /// Actionable frames, i.e. transitions recorded into each player.
    pub frames_recorded: u64,
}

/// Transient loop state of one running fight.
struct FightState<O> {
    obs: O,
    info: Telemetry,
    done: bool,
    frames: u64,
    recorded: u64,
}

/// One match session: 1–2 seats and the game it plays.
pub struct Lobby<O> {
    mode: LobbyMode,
    game: GameConfig,
    limits: MatchLimits,
    slots: Vec<Option<FighterRef<O>>>,
}

impl<O: Clone> Lobby<O> {
    /// Creates an empty lobby for `game`.
    pub fn new(mode: LobbyMode, game: GameConfig, limits: MatchLimits) -> Self {
        Self {
            mode,
            game,
            limits,
            slots: vec![None; mode.player_count()],
        }
    }

    /// Seat count of this lobby.
    pub fn mode(&self) -> LobbyMode {
        self.mode
    }

    /// Binds `fighter` to the first empty seat. The seat index is the
    /// fighter's in-simulation player number.
    ///
    /// # Errors
    /// [`MatchError::LobbyFull`] when every seat is taken; existing
    /// bindings are left untouched.
    pub fn add_player(&mut self, fighter: FighterRef<O>) -> Result<(), MatchError> {
        let Some(slot) = self.slots.iter_mut().find(|s| s.is_none()) else {
            return Err(MatchError::LobbyFull {
                capacity: self.slots.len(),
            });
        };
        *slot = Some(fighter);
        Ok(())
    }

    /// Unbinds every seat. Idempotent.
    pub fn clear_slots(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    /// Bound fighters in seat order.
    pub fn players(&self) -> impl Iterator<Item = &FighterRef<O>> {
        self.slots.iter().flatten()
    }

    /// Number of seats currently bound.
    pub fn bound_players(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// True when every seat is bound.
    pub fn is_full(&self) -> bool {
        self.bound_players() == self.slots.len()
    }

    /// True when no seat is bound.
    pub fn is_empty(&self) -> bool {
        self.bound_players() == 0
    }

    /// The current seating as a printable matchup.
    pub fn matchup(&self) -> Matchup {
        Matchup::new(self.players().map(|f| f.name().to_string()).collect())
    }

    /// Runs one match to completion.
    ///
    /// Boots the simulation at `initial_state`, primes it with one no-op
    /// step (backends start in a non-actionable pre-round state), then
    /// alternates the actionable-frame filter with the move-step-record
    /// loop until the backend reports done. The handle is closed exactly
    /// once whatever happens; seats stay bound for the scheduler to clear.
    ///
    /// # Errors
    /// See [`MatchError`]; any error aborts this match only.
    #[instrument(skip_all, fields(matchup = %self.matchup(), state = initial_state))]
    pub fn play<E, L>(
        &mut self,
        loader: &L,
        initial_state: &str,
        render: bool,
    ) -> Result<FightSummary, MatchError>
    where
        E: Environment<Obs = O>,
        L: EnvironmentLoader<E>,
    {
        let expected = self.mode.player_count();
        let bound = self.bound_players();
        if bound != expected {
            return Err(MatchError::MissingPlayers { bound, expected });
        }

        let mut sim = loader.load(initial_state, expected)?;
        let result = self.run_fight(&mut sim, render);
        // the handle is released no matter how the fight ended
        let closed = sim.close();

        let summary = result?;
        if let Err(source) = closed {
            return Err(MatchError::Simulation {
                frame: summary.frames_seen,
                source,
            });
        }
        info!(
            frames = summary.frames_seen,
            recorded = summary.frames_recorded,
            winner = ?summary.winner,
            "fight finished"
        );
        Ok(summary)
    }

    fn run_fight<E>(&self, sim: &mut E, render: bool) -> Result<FightSummary, MatchError>
    where
        E: Environment<Obs = O>,
    {
        let players = self.mode.player_count();
        let codec = Arc::clone(self.game.codec());
        let noop = vec![ActionCodec::NEUTRAL; players];

        let fighters: Vec<FighterRef<O>> = self.players().cloned().collect();
        let mut drivers = Vec::with_capacity(players);
        for fighter in &fighters {
            drivers.push(fighter.try_driver()?);
        }

        let first = sim
            .step(&noop)
            .map_err(|source| MatchError::Simulation { frame: 0, source })?;
        let mut state = FightState {
            obs: first.observation,
            info: first.info,
            done: first.done,
            frames: 1,
            recorded: 0,
        };
        let mut filter = FrameFilter::new(self.game.round_timer_start(), &state.info)?;

        for (slot, driver) in drivers.iter_mut().enumerate() {
            driver.prepare_for_next_fight(&codec, slot);
        }

        self.hold_until_actionable(sim, &mut filter, &mut state, render, &noop)?;

        while !state.done {
            let mut moves = Vec::with_capacity(players);
            for (slot, driver) in drivers.iter_mut().enumerate() {
                let asked = Instant::now();
                let mv = driver
                    .get_move(&state.obs, &state.info)
                    .map_err(|source| MatchError::PlayerFault {
                        player: fighters[slot].name().to_string(),
                        source,
                    })?;
                if let Some(limit) = self.limits.move_timeout {
                    let elapsed = asked.elapsed();
                    if elapsed > limit {
                        return Err(MatchError::Stalled {
                            player: fighters[slot].name().to_string(),
                            elapsed,
                            limit,
                        });
                    }
                }
                if !codec.contains(mv) {
                    return Err(MatchError::IllegalMove {
                        player: fighters[slot].name().to_string(),
                        move_id: mv,
                        num_moves: codec.len(),
                    });
                }
                moves.push(mv);
            }

            let mut step = sim.step(&moves).map_err(|source| MatchError::Simulation {
                frame: state.frames,
                source,
            })?;
            state.frames += 1;
            self.ensure_frame_budget(state.frames)?;
            if step.rewards.len() != players {
                return Err(MatchError::Simulation {
                    frame: state.frames,
                    source: anyhow::anyhow!(
                        "backend returned {} rewards for {players} players",
                        step.rewards.len()
                    ),
                });
            }
            // a two-player fight is zero-sum: seat 1 gets the negation of
            // seat 0's raw reward
            if players == 2 {
                step.rewards[1] = -step.rewards[0];
            }
            if render {
                sim.render();
                std::thread::sleep(FRAME_INTERVAL);
            }

            for (slot, driver) in drivers.iter_mut().enumerate() {
                driver
                    .record_step(Transition {
                        observation: state.obs.clone(),
                        info: state.info.clone(),
                        action: moves[slot],
                        reward: step.rewards[slot],
                        next_observation: step.observation.clone(),
                        next_info: step.info.clone(),
                        done: step.done,
                    })
                    .map_err(|source| MatchError::PlayerFault {
                        player: fighters[slot].name().to_string(),
                        source,
                    })?;
            }
            state.recorded += 1;
            state.obs = step.observation;
            state.info = step.info;
            state.done = step.done;

            self.hold_until_actionable(sim, &mut filter, &mut state, render, &noop)?;
        }

        let mut winner = None;
        for slot in 0..players {
            if state.info.wins(slot)? == self.game.rounds_to_win() {
                winner = Some(slot);
                break;
            }
        }
        Ok(FightSummary {
            winner,
            frames_seen: state.frames,
            frames_recorded: state.recorded,
        })
    }

    /// Steps no-op frames until play is actionable again (or the match is
    /// done). Players are never invoked and nothing is recorded here.
    fn hold_until_actionable<E>(
        &self,
        sim: &mut E,
        filter: &mut FrameFilter,
        state: &mut FightState<O>,
        render: bool,
        noop: &[MoveId],
    ) -> Result<(), MatchError>
    where
        E: Environment<Obs = O>,
    {
        loop {
            if state.done {
                return Ok(());
            }
            let phase = filter.assess(&state.info)?;
            if phase.is_actionable() {
                return Ok(());
            }
            trace!(?phase, frame = state.frames, "skipping non-actionable frame");
            let step = sim.step(noop).map_err(|source| MatchError::Simulation {
                frame: state.frames,
                source,
            })?;
            state.frames += 1;
            self.ensure_frame_budget(state.frames)?;
            if render {
                sim.render();
                std::thread::sleep(FRAME_INTERVAL);
            }
            state.obs = step.observation;
            state.info = step.info;
            state.done = step.done;
        }
    }

    fn ensure_frame_budget(&self, frames: u64) -> Result<(), MatchError> {
        if let Some(limit) = self.limits.frame_limit {
            if frames > limit {
                return Err(MatchError::FrameLimit { limit });
            }
        }
        Ok(())
    }
}
