//! Scripted Street Fighter II backend shared by the end-to-end tests.
//!
//! The real backend is an emulator process; these fixtures replay a fixed
//! telemetry sequence shaped like an actual best-of-three match, so
//! tournament behavior can be asserted frame by frame without a ROM.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::bail;
use kumite::action_codec::{ActionCodec, MoveId};
use kumite::error::LoadError;
use kumite::fighter::{Fighter, FighterRef};
use kumite::game_interface::{Environment, EnvironmentLoader, Player, Step, Transition};
use kumite::telemetry::{Telemetry, ROUND_TIMER};

/// Round-timer reset value of the Genesis SF2 configuration.
pub const TIMER_START: i64 = 39208;

/// Raw reward the backend reports for seat 1. The engine must never let it
/// through: seat 1's recorded reward is always the negation of seat 0's.
pub const JUNK_REWARD: f32 = 55.5;

/// One scripted frame: the telemetry the backend would report plus the raw
/// reward for seat 0.
#[derive(Clone, Debug)]
pub struct ScriptFrame {
    pub info: Telemetry,
    pub reward: f32,
    pub done: bool,
}

impl ScriptFrame {
    pub fn new(info: Telemetry, reward: f32, done: bool) -> Self {
        Self { info, reward, done }
    }
}

/// Telemetry for one frame, keyed the way the Genesis backend reports it.
pub fn telemetry(timer: i64, health: [i64; 2], wins: [i64; 2]) -> Telemetry {
    Telemetry::new()
        .with(ROUND_TIMER, timer)
        .with("player1_health", health[0])
        .with("player2_health", health[1])
        .with("player1_matches_won", wins[0])
        .with("player2_matches_won", wins[1])
}

/// A complete best-of-three match which seat 0 sweeps 2-0.
///
/// Two countdown frames, two active frames, the round 1 killing blow,
/// knockout and health-reset dead air, one active frame of round 2 and the
/// match-ending knockout. A session stepping through it sees 9 frames,
/// records 4 transitions per seat and reads seat 0's rewards as
/// `[0.4, 1.0, 0.0, 1.0]`.
pub fn two_round_sweep() -> Vec<ScriptFrame> {
    vec![
        ScriptFrame::new(telemetry(TIMER_START, [176, 176], [0, 0]), 0.0, false),
        ScriptFrame::new(telemetry(TIMER_START, [176, 176], [0, 0]), 0.0, false),
        ScriptFrame::new(telemetry(38000, [176, 176], [0, 0]), 0.0, false),
        ScriptFrame::new(telemetry(37500, [176, 120], [0, 0]), 0.4, false),
        ScriptFrame::new(telemetry(37000, [150, -1], [1, 0]), 1.0, false),
        ScriptFrame::new(telemetry(36900, [150, -1], [1, 0]), 0.0, false),
        ScriptFrame::new(telemetry(36800, [150, 0], [1, 0]), 0.0, false),
        ScriptFrame::new(telemetry(30000, [176, 176], [1, 0]), 0.0, false),
        ScriptFrame::new(telemetry(29000, [139, -1], [2, 0]), 1.0, true),
    ]
}

/// A short solo drill: one countdown frame, two active frames, done with
/// the training dummy knocked out twice.
pub fn solo_drill() -> Vec<ScriptFrame> {
    vec![
        ScriptFrame::new(telemetry(TIMER_START, [176, 176], [0, 0]), 0.0, false),
        ScriptFrame::new(telemetry(38000, [176, 176], [0, 0]), 0.0, false),
        ScriptFrame::new(telemetry(37000, [176, 100], [0, 0]), 0.25, false),
        ScriptFrame::new(telemetry(36000, [176, -1], [2, 0]), 1.0, true),
    ]
}

/// Counters shared between a loader and every environment it boots.
#[derive(Default)]
pub struct EnvProbe {
    loads: AtomicUsize,
    closes: AtomicUsize,
    renders: AtomicUsize,
    states: Mutex<Vec<String>>,
    moves: Mutex<Vec<Vec<MoveId>>>,
}

impl EnvProbe {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::Relaxed)
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::Relaxed)
    }

    /// Save states booted, in load order.
    pub fn states(&self) -> Vec<String> {
        self.states.lock().unwrap().clone()
    }

    /// Every move vector submitted to any booted environment, in step order.
    pub fn moves(&self) -> Vec<Vec<MoveId>> {
        self.moves.lock().unwrap().clone()
    }
}

/// Replays a script, one frame per step call, clamping at the last frame.
pub struct VersusEnv {
    frames: Vec<ScriptFrame>,
    cursor: usize,
    players: usize,
    fail_on_step: Option<usize>,
    probe: Arc<EnvProbe>,
}

impl Environment for VersusEnv {
    type Obs = u32;

    fn step(&mut self, moves: &[MoveId]) -> anyhow::Result<Step<u32>> {
        let ordinal = self.cursor;
        if self.fail_on_step == Some(ordinal) {
            bail!("emulator process died on step {ordinal}");
        }
        self.probe.moves.lock().unwrap().push(moves.to_vec());
        let frame = &self.frames[ordinal.min(self.frames.len() - 1)];
        self.cursor += 1;

        let mut rewards = vec![frame.reward];
        rewards.resize(self.players, JUNK_REWARD);
        Ok(Step {
            observation: ordinal as u32,
            rewards,
            done: frame.done,
            info: frame.info.clone(),
        })
    }

    fn render(&mut self) {
        self.probe.renders.fetch_add(1, Ordering::Relaxed);
    }

    fn close(self) -> anyhow::Result<()> {
        self.probe.closes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Boots scripted environments for any save state with a recognised
/// player-count prefix; anything else is an unknown state.
#[derive(Clone)]
pub struct VersusLoader {
    frames: Vec<ScriptFrame>,
    fail_on_step: Option<usize>,
    probe: Arc<EnvProbe>,
}

impl VersusLoader {
    pub fn new(frames: Vec<ScriptFrame>) -> Self {
        Self {
            frames,
            fail_on_step: None,
            probe: Arc::default(),
        }
    }

    /// Boots environments whose `n`th step call (0-based) raises.
    pub fn failing_on_step(mut self, n: usize) -> Self {
        self.fail_on_step = Some(n);
        self
    }

    pub fn probe(&self) -> Arc<EnvProbe> {
        Arc::clone(&self.probe)
    }
}

impl EnvironmentLoader<VersusEnv> for VersusLoader {
    fn load(&self, save_state: &str, players: usize) -> Result<VersusEnv, LoadError> {
        if !save_state.starts_with("single_player_") && !save_state.starts_with("two_player_") {
            return Err(LoadError::UnknownState(save_state.to_string()));
        }
        self.probe.loads.fetch_add(1, Ordering::Relaxed);
        self.probe.states.lock().unwrap().push(save_state.to_string());
        Ok(VersusEnv {
            frames: self.frames.clone(),
            cursor: 0,
            players,
            fail_on_step: self.fail_on_step,
            probe: Arc::clone(&self.probe),
        })
    }
}

/// What a player saw and did, accumulated across matches.
#[derive(Default)]
pub struct TrainingLog {
    preparations: AtomicUsize,
    reviews: AtomicUsize,
    seats: Mutex<Vec<usize>>,
    transitions: Mutex<Vec<Transition<u32>>>,
}

impl TrainingLog {
    pub fn preparations(&self) -> usize {
        self.preparations.load(Ordering::Relaxed)
    }

    pub fn reviews(&self) -> usize {
        self.reviews.load(Ordering::Relaxed)
    }

    /// Seats this player was bound into, one entry per match.
    pub fn seats(&self) -> Vec<usize> {
        self.seats.lock().unwrap().clone()
    }

    pub fn transitions(&self) -> Vec<Transition<u32>> {
        self.transitions.lock().unwrap().clone()
    }

    pub fn rewards(&self) -> Vec<f32> {
        self.transitions
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.reward)
            .collect()
    }
}

/// Always plays the same move; records everything it is shown.
pub struct TrainablePlayer {
    mv: MoveId,
    log: Arc<TrainingLog>,
}

impl TrainablePlayer {
    pub fn new(mv: MoveId) -> Self {
        Self {
            mv,
            log: Arc::default(),
        }
    }

    pub fn log(&self) -> Arc<TrainingLog> {
        Arc::clone(&self.log)
    }
}

impl Player<u32> for TrainablePlayer {
    fn prepare_for_next_fight(&mut self, _codec: &Arc<ActionCodec>, slot: usize) {
        self.log.preparations.fetch_add(1, Ordering::Relaxed);
        self.log.seats.lock().unwrap().push(slot);
    }

    fn get_move(&mut self, _observation: &u32, _info: &Telemetry) -> anyhow::Result<MoveId> {
        Ok(self.mv)
    }

    fn record_step(&mut self, transition: Transition<u32>) -> anyhow::Result<()> {
        self.log.transitions.lock().unwrap().push(transition);
        Ok(())
    }

    fn review_fight(&mut self) -> anyhow::Result<()> {
        self.log.reviews.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Wraps a scripted player into a roster entry, handing back its log.
pub fn contender(
    name: &str,
    character: &str,
    id: u32,
    mv: MoveId,
) -> (FighterRef<u32>, Arc<TrainingLog>) {
    let player = TrainablePlayer::new(mv);
    let log = player.log();
    let fighter = Arc::new(Fighter::new(name, character, id, Box::new(player)));
    (fighter, log)
}
