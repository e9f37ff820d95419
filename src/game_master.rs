//! Round-based tournament orchestration.
//!
//! The [`GameMaster`] owns a fixed pool of lobbies and cycles them through
//! rounds. One round is four phases, always in this order:
//!
//! 1. **fill**: newly admitted fighters join the waiting pool, then random
//!    pairs are drawn into open lobbies until lobbies or pairs run out.
//! 2. **execute**: every filled lobby plays its match on its own thread;
//!    the round ends when every session reported or the round deadline
//!    passed. A session missing the deadline is abandoned and its lobby
//!    seat in the pool is replaced, so one wedged backend cannot shrink
//!    the tournament.
//! 3. **review**: each fighter that was seated this round gets one
//!    training pass over what it recorded.
//! 4. **reset**: lobbies are emptied and reopened, fighters return to the
//!    waiting pool.
//!
//! Faults stay contained to the session that raised them: an aborted match
//! is logged and discarded, statistics untouched, and the round goes on.
//! Control arrives through a [`MasterHandle`], which can pause, resume and
//! end the tournament from any thread; pause and end take effect at the
//! next round boundary.

use std::marker::PhantomData;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, instrument, trace, warn};

use crate::configuration::Configuration;
use crate::error::MatchError;
use crate::fighter::FighterRef;
use crate::game_config::GameConfig;
use crate::game_interface::{Environment, EnvironmentLoader};
use crate::lobby::{FightSummary, Lobby, LobbyMode};
use crate::logger;

/// Pause between rounds when the roster cannot field a single pair, so an
/// unbounded tournament does not spin hot while it waits for admissions.
const IDLE_BACKOFF: Duration = Duration::from_millis(25);

/// What one session thread sends back when its match ends.
struct SessionReport<O> {
    seq: usize,
    lobby: Lobby<O>,
    outcome: Result<FightSummary, MatchError>,
}

/// State shared between the round loop and every [`MasterHandle`].
struct MasterControl<O> {
    paused: Mutex<bool>,
    resumed: Condvar,
    ended: AtomicBool,
    render: AtomicBool,
    rounds_run: AtomicU64,
    admissions: Mutex<Vec<FighterRef<O>>>,
    roster: Mutex<Vec<FighterRef<O>>>,
    lineup: Mutex<Vec<String>>,
}

impl<O> MasterControl<O> {
    fn standings(&self) -> Vec<Standing> {
        let roster = self.roster.lock().expect("poisoned");
        let mut rows: Vec<Standing> = roster
            .iter()
            .map(|fighter| Standing {
                name: fighter.name().to_string(),
                character: fighter.character().to_string(),
                matches_played: fighter.matches_played(),
                matches_won: fighter.matches_won(),
            })
            .collect();
        // stable sort: ties keep roster order
        rows.sort_by(|a, b| b.matches_won.cmp(&a.matches_won));
        rows
    }
}

/// One leaderboard row.
#[derive(Clone, Debug)]
pub struct Standing {
    /// Fighter's display name.
    pub name: String,
    /// Character the fighter plays.
    pub character: String,
    /// Completed matches; aborted and abandoned ones do not count.
    pub matches_played: usize,
    /// Completed matches won.
    pub matches_won: usize,
}

impl Standing {
    /// Won fraction of completed matches, zero before the first one.
    pub fn win_rate(&self) -> f64 {
        if self.matches_played == 0 {
            0.0
        } else {
            self.matches_won as f64 / self.matches_played as f64
        }
    }
}

/// What a finished tournament hands back.
#[derive(Clone, Debug)]
pub struct TournamentReport {
    /// Rounds the loop completed before ending.
    pub rounds_run: u64,
    /// Final leaderboard, best first.
    pub standings: Vec<Standing>,
}

/// Remote control for a running tournament. Cheap to clone; every clone
/// talks to the same tournament.
pub struct MasterHandle<O> {
    control: Arc<MasterControl<O>>,
}

impl<O> Clone for MasterHandle<O> {
    fn clone(&self) -> Self {
        Self {
            control: Arc::clone(&self.control),
        }
    }
}

impl<O> MasterHandle<O> {
    /// Holds the round loop at the next round boundary until
    /// [`MasterHandle::resume`].
    pub fn pause(&self) {
        *self.control.paused.lock().expect("poisoned") = true;
        info!("pause requested");
    }

    /// Releases a paused round loop.
    pub fn resume(&self) {
        let mut paused = self.control.paused.lock().expect("poisoned");
        *paused = false;
        self.control.resumed.notify_all();
        info!("resume requested");
    }

    /// Ends the tournament after the current round; wakes a paused loop.
    pub fn end(&self) {
        self.control.ended.store(true, Ordering::Relaxed);
        let _paused = self.control.paused.lock().expect("poisoned");
        self.control.resumed.notify_all();
        info!("end requested");
    }

    /// Turns live match rendering on or off, effective from the next round.
    pub fn set_viewer(&self, enabled: bool) {
        self.control.render.store(enabled, Ordering::Relaxed);
        info!(enabled, "viewer toggled");
    }

    /// Rounds completed so far.
    pub fn rounds_run(&self) -> u64 {
        self.control.rounds_run.load(Ordering::Relaxed)
    }

    /// Matchups of the most recently filled round, in lobby order.
    pub fn current_matchups(&self) -> Vec<String> {
        self.control.lineup.lock().expect("poisoned").clone()
    }

    /// Adds a fighter to the tournament. It enters the waiting pool at the
    /// next fill phase; the lobby pool does not grow.
    pub fn admit(&self, fighter: FighterRef<O>) {
        info!(player = fighter.name(), "fighter admitted");
        self.control
            .roster
            .lock()
            .expect("poisoned")
            .push(Arc::clone(&fighter));
        self.control
            .admissions
            .lock()
            .expect("poisoned")
            .push(fighter);
    }

    /// Current leaderboard, best first.
    pub fn standings(&self) -> Vec<Standing> {
        self.control.standings()
    }
}

/// The tournament itself: a lobby pool, a fighter roster and the round
/// loop that cycles them.
///
/// # Type parameters
/// - `E`: the simulation backend, one instance per running match
/// - `L`: the loader that boots `E` at a save state
pub struct GameMaster<E: Environment, L> {
    loader: Arc<L>,
    game: GameConfig,
    config: Configuration,
    control: Arc<MasterControl<E::Obs>>,
    open: Vec<Lobby<E::Obs>>,
    closed: Vec<Lobby<E::Obs>>,
    waiting: Vec<FighterRef<E::Obs>>,
    in_match: Vec<FighterRef<E::Obs>>,
    rng: StdRng,
    rounds_run: u64,
    _env: PhantomData<E>,
}

impl<E, L> GameMaster<E, L>
where
    E: Environment + Send + 'static,
    E::Obs: Clone + 'static,
    L: EnvironmentLoader<E> + Send + Sync + 'static,
{
    /// Creates a tournament over `roster`.
    ///
    /// The lobby pool is sized at half the initial roster, rounded down,
    /// so every fighter can be seated each round. Later admissions share
    /// the existing pool.
    #[instrument(skip_all, fields(game = game.game(), fighters = roster.len()))]
    pub fn new(loader: L, game: GameConfig, config: Configuration, roster: Vec<FighterRef<E::Obs>>) -> Self {
        if config.log {
            logger::init_logger();
        }
        trace!(?config);

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let pool = roster.len() / 2;
        let open = (0..pool)
            .map(|_| Lobby::new(LobbyMode::TwoPlayer, game.clone(), config.limits()))
            .collect();
        let control = Arc::new(MasterControl {
            paused: Mutex::new(false),
            resumed: Condvar::new(),
            ended: AtomicBool::new(false),
            render: AtomicBool::new(config.render),
            rounds_run: AtomicU64::new(0),
            admissions: Mutex::new(Vec::new()),
            roster: Mutex::new(roster.clone()),
            lineup: Mutex::new(Vec::new()),
        });

        GameMaster {
            loader: Arc::new(loader),
            game,
            config,
            control,
            open,
            closed: Vec::new(),
            waiting: roster,
            in_match: Vec::new(),
            rng,
            rounds_run: 0,
            _env: PhantomData,
        }
    }

    /// A control handle for this tournament. Clones freely; stays valid
    /// after [`GameMaster::run`] consumed the master.
    pub fn handle(&self) -> MasterHandle<E::Obs> {
        MasterHandle {
            control: Arc::clone(&self.control),
        }
    }

    /// Runs rounds until the configured count is reached or the tournament
    /// is ended through a handle, then reports the final leaderboard.
    ///
    /// Per-session faults never escape this loop; they are logged and the
    /// affected match is discarded.
    #[instrument(skip_all, fields(game = self.game.game()))]
    pub fn run(mut self) -> TournamentReport {
        loop {
            self.wait_while_paused();
            if self.finished() {
                break;
            }
            self.fill_lobbies();
            self.execute_round();
            self.review_round();
            self.reset_round();
            self.rounds_run += 1;
            self.control.rounds_run.store(self.rounds_run, Ordering::Relaxed);
        }
        info!(rounds = self.rounds_run, "tournament over");
        TournamentReport {
            rounds_run: self.rounds_run,
            standings: self.control.standings(),
        }
    }

    fn finished(&self) -> bool {
        self.control.ended.load(Ordering::Relaxed)
            || self.config.rounds_to_run.is_some_and(|n| self.rounds_run >= n)
    }

    fn wait_while_paused(&self) {
        let mut paused = self.control.paused.lock().expect("poisoned");
        if *paused {
            info!(round = self.rounds_run, "round loop paused");
        }
        while *paused && !self.control.ended.load(Ordering::Relaxed) {
            paused = self.control.resumed.wait(paused).expect("poisoned");
        }
    }

    /// Drains admissions into the waiting pool, then seats random pairs
    /// into open lobbies until either runs out.
    fn fill_lobbies(&mut self) {
        let mut admitted = mem::take(&mut *self.control.admissions.lock().expect("poisoned"));
        self.waiting.append(&mut admitted);

        while self.waiting.len() >= 2 {
            let Some(mut lobby) = self.open.pop() else { break };
            for _ in 0..2 {
                let pick = self.rng.gen_range(0..self.waiting.len());
                let fighter = self.waiting.swap_remove(pick);
                lobby
                    .add_player(Arc::clone(&fighter))
                    .expect("lobby from the open pool has free seats");
                self.in_match.push(fighter);
            }
            self.closed.push(lobby);
        }

        let lineup: Vec<String> = self.closed.iter().map(|l| l.matchup().to_string()).collect();
        info!(round = self.rounds_run, matchups = ?lineup, "round filled");
        *self.control.lineup.lock().expect("poisoned") = lineup;
    }

    /// Plays every filled lobby on its own thread and waits for the
    /// reports, bounded by the round deadline.
    fn execute_round(&mut self) {
        if self.closed.is_empty() {
            std::thread::sleep(IDLE_BACKOFF);
            return;
        }
        let expected = self.closed.len();
        let render = self.control.render.load(Ordering::Relaxed);
        let (tx, rx) = mpsc::channel();

        let mut lineups = Vec::with_capacity(expected);
        for (seq, mut lobby) in self.closed.drain(..).enumerate() {
            lineups.push(lobby.matchup().to_string());
            let characters: Vec<&str> = lobby.players().map(|f| f.character()).collect();
            let state = self.game.save_state_name(&characters);
            let loader = Arc::clone(&self.loader);
            let tx = tx.clone();
            std::thread::spawn(move || {
                let outcome = lobby.play(loader.as_ref(), &state, render);
                // a receiver gone means the round moved on; drop the report
                let _ = tx.send(SessionReport { seq, lobby, outcome });
            });
        }
        drop(tx);

        let deadline = Instant::now() + self.config.round_deadline;
        let mut reported = vec![false; expected];
        let mut received = 0;
        while received < expected {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let report = match rx.recv_timeout(remaining) {
                Ok(report) => report,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            };
            reported[report.seq] = true;
            received += 1;
            self.absorb_report(report);
        }

        for seq in (0..expected).filter(|seq| !reported[*seq]) {
            if self.config.verbose {
                println!("\x1b[32m{}\x1b[39m: \x1b[31mnever finished\x1b[39m", lineups[seq]);
            }
            error!(
                round = self.rounds_run,
                matchup = lineups[seq].as_str(),
                "session never reported before the round deadline; abandoning it"
            );
            // the lost lobby stays with its thread; a fresh one keeps the
            // pool at full size
            self.closed.push(Lobby::new(
                LobbyMode::TwoPlayer,
                self.game.clone(),
                self.config.limits(),
            ));
        }
    }

    fn absorb_report(&mut self, report: SessionReport<E::Obs>) {
        let SessionReport { seq, lobby, outcome } = report;
        match outcome {
            Ok(summary) => {
                let players: Vec<FighterRef<E::Obs>> = lobby.players().cloned().collect();
                for fighter in &players {
                    fighter.note_match_played();
                }
                match summary.winner.and_then(|slot| players.get(slot)) {
                    Some(winner) => {
                        winner.note_match_won();
                        if self.config.verbose {
                            // green matchup, default result
                            println!(
                                "\x1b[32m{}\x1b[39m: {} wins",
                                lobby.matchup(),
                                winner.name()
                            );
                        }
                        info!(
                            round = self.rounds_run,
                            matchup = %lobby.matchup(),
                            winner = winner.name(),
                            frames = summary.frames_seen,
                            "match finished"
                        );
                    }
                    None => {
                        if self.config.verbose {
                            println!("\x1b[32m{}\x1b[39m: no winner", lobby.matchup());
                        }
                        info!(
                            round = self.rounds_run,
                            matchup = %lobby.matchup(),
                            frames = summary.frames_seen,
                            "match finished with no winner"
                        );
                    }
                }
            }
            Err(err) => {
                if self.config.verbose {
                    // green matchup, red abort notice
                    println!("\x1b[32m{}\x1b[39m: \x1b[31maborted\x1b[39m", lobby.matchup());
                }
                warn!(
                    round = self.rounds_run,
                    session = seq,
                    matchup = %lobby.matchup(),
                    error = %err,
                    "match aborted; its results are discarded"
                );
            }
        }
        self.closed.push(lobby);
    }

    /// One training pass per seated fighter, after every session of the
    /// round finished.
    fn review_round(&self) {
        if !self.config.review {
            return;
        }
        for fighter in &self.in_match {
            let mut driver = match fighter.try_driver() {
                Ok(driver) => driver,
                Err(err) => {
                    warn!(player = fighter.name(), error = %err, "skipping review");
                    continue;
                }
            };
            if let Err(err) = driver.review_fight() {
                warn!(player = fighter.name(), error = %err, "review failed");
            }
        }
    }

    /// Reopens every lobby and returns the seated fighters to the waiting
    /// pool.
    fn reset_round(&mut self) {
        for mut lobby in self.closed.drain(..) {
            lobby.clear_slots();
            self.open.push(lobby);
        }
        self.waiting.append(&mut self.in_match);
    }
}
