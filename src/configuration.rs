//! Config for tournament behavior.
//!
//! This module provides configuration options for controlling how the game
//! master runs a tournament: how many rounds to play, whether training
//! reviews happen, how faults and stalls are bounded, and what gets printed
//! or logged along the way.
//!
//! Configuration can be created programmatically using
//! [`Configuration::new()`] or by reading environment variables using
//! [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! All values are optional. Flags are case-insensitive; set the value to
//! `"true"` to enable one.
//!
//! - `KUMITE_VERBOSE`: print round progress to stdout (default: `true`)
//! - `KUMITE_LOG`: enable logging to a file (default: `false`)
//! - `KUMITE_RENDER`: open the viewer from the first round (default: `false`)
//! - `KUMITE_REVIEW`: run each player's training review after its match
//!   (default: `true`)
//! - `KUMITE_ROUNDS`: number of rounds to run (default: unbounded)
//! - `KUMITE_SEED`: seed for the pairing draw (default: from entropy)

use std::time::Duration;

/// Per-match execution bounds, consumed by each lobby.
#[derive(Debug, Clone, Copy)]
pub struct MatchLimits {
    /// Wall-clock window one `get_move` call may take; `None` disables the
    /// check.
    pub move_timeout: Option<Duration>,
    /// Total frames (including filtered no-op frames) one match may step;
    /// `None` disables the check.
    pub frame_limit: Option<u64>,
}

/// Configuration for tournament behaviors.
#[derive(Debug, Clone, Copy)]
pub struct Configuration {
    pub(crate) rounds_to_run: Option<u64>,
    pub(crate) review: bool,
    pub(crate) render: bool,
    pub(crate) verbose: bool,
    pub(crate) log: bool,
    pub(crate) seed: Option<u64>,
    pub(crate) move_timeout: Option<Duration>,
    pub(crate) frame_limit: Option<u64>,
    pub(crate) round_deadline: Duration,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - Rounds run until an operator ends the tournament.
    /// - Players review (train on) each match they played.
    /// - The viewer is closed and round progress is printed to stdout.
    /// - Logging to file is disabled.
    /// - The pairing draw is seeded from entropy.
    /// - A move may take 2 seconds, a match 200 000 frames, a round 180
    ///   seconds; whatever exceeds its bound is aborted without a winner.
    pub fn new() -> Self {
        Self {
            rounds_to_run: None,
            review: true,
            render: false,
            verbose: true,
            log: false,
            seed: None,
            move_timeout: Some(Duration::from_secs(2)),
            frame_limit: Some(200_000),
            round_deadline: Duration::from_secs(180),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// See the module documentation for the recognized variables. Any other
    /// value (including unset) results in the default for that field.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        fn get_env_u64(var: &str) -> Option<u64> {
            std::env::var(var).ok().and_then(|val| val.parse().ok())
        }

        let defaults = Self::new();
        Self {
            rounds_to_run: get_env_u64("KUMITE_ROUNDS"),
            review: get_env_flag("KUMITE_REVIEW", true),
            render: get_env_flag("KUMITE_RENDER", false),
            verbose: get_env_flag("KUMITE_VERBOSE", true),
            log: get_env_flag("KUMITE_LOG", false),
            seed: get_env_u64("KUMITE_SEED"),
            ..defaults
        }
    }

    /// Run a fixed number of rounds instead of running until ended.
    pub fn with_rounds(mut self, rounds: u64) -> Self {
        self.rounds_to_run = Some(rounds);
        self
    }

    /// Enable or disable the post-match training review.
    pub fn with_review(mut self, value: bool) -> Self {
        self.review = value;
        self
    }

    /// Open or close the viewer from the first round.
    pub fn with_render(mut self, value: bool) -> Self {
        self.render = value;
        self
    }

    /// Enable or disable round progress on stdout.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Seed the pairing draw for reproducible tournaments.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Change the per-move stall window.
    pub fn with_move_timeout(mut self, window: Duration) -> Self {
        self.move_timeout = Some(window);
        self
    }

    /// Let players take as long as they want per move. The round deadline
    /// still bounds the match.
    pub fn without_move_timeout(mut self) -> Self {
        self.move_timeout = None;
        self
    }

    /// Change the per-match frame budget.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    /// Remove the per-match frame budget.
    pub fn without_frame_limit(mut self) -> Self {
        self.frame_limit = None;
        self
    }

    /// Change how long the scheduler waits at the round barrier before it
    /// forces unfinished matches done.
    pub fn with_round_deadline(mut self, deadline: Duration) -> Self {
        self.round_deadline = deadline;
        self
    }

    /// The per-match bounds handed to each lobby.
    pub fn limits(&self) -> MatchLimits {
        MatchLimits {
            move_timeout: self.move_timeout,
            frame_limit: self.frame_limit,
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}
