//! # Kumite
//!
//! Round-based match orchestration for learning agents in frame-stepped
//! fighting games.
//!
//! It provides:
//! - One-match execution with actionable-frame filtering ([`lobby`])
//! - A round loop pairing fighters at random, with pause/resume, live
//!   admissions and per-session fault containment ([`game_master`])
//! - Roster files mapping player implementations to characters ([`roster`])
//! - A line-oriented operator console ([`console`])
//!
//! The engine never touches an emulator itself. A backend plugs in through
//! the [`Environment`](crate::game_interface::Environment) and
//! [`EnvironmentLoader`](crate::game_interface::EnvironmentLoader) traits;
//! learning agents plug in through
//! [`Player`](crate::game_interface::Player). Each running match owns one
//! environment on its own thread, so a crashed or wedged backend costs the
//! tournament exactly one match.
//!
//! # Documentation Overview
//!
//! - For the frame loop of a single match and which frames players act on,
//!   see [`lobby`] and [`frame_filter`].
//! - For round scheduling, deadlines and the control handle, see
//!   [`game_master`].
//! - For tuning knobs and their environment variables, see
//!   [`Configuration`](crate::configuration::Configuration).
//! - For the move enumeration submitted to the backend, see
//!   [`action_codec`].
//!
//! # Usage Example
//!
//! A tournament over the bundled Street Fighter II profile, with the
//! backend stubbed out:
//!
//! ```no_run
//! # struct Sf2Env { players: usize }
//! # impl kumite::game_interface::Environment for Sf2Env {
//! #     type Obs = Vec<u8>;
//! #     fn step(
//! #         &mut self,
//! #         _moves: &[kumite::action_codec::MoveId],
//! #     ) -> anyhow::Result<kumite::game_interface::Step<Vec<u8>>> {
//! #         let info = kumite::telemetry::Telemetry::new()
//! #             .with(kumite::telemetry::ROUND_TIMER, 30069)
//! #             .with("player1_health", 176)
//! #             .with("player2_health", 176)
//! #             .with("player1_matches_won", 0)
//! #             .with("player2_matches_won", 2);
//! #         Ok(kumite::game_interface::Step {
//! #             observation: vec![0; 4],
//! #             rewards: vec![0.0; self.players],
//! #             done: true,
//! #             info,
//! #         })
//! #     }
//! #     fn close(self) -> anyhow::Result<()> { Ok(()) }
//! # }
//! # struct Sf2Loader;
//! # impl kumite::game_interface::EnvironmentLoader<Sf2Env> for Sf2Loader {
//! #     fn load(&self, _save_state: &str, players: usize) -> Result<Sf2Env, kumite::error::LoadError> {
//! #         Ok(Sf2Env { players })
//! #     }
//! # }
//! use kumite::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let game = GameConfig::street_fighter2();
//!     let config = Configuration::from_env().with_rounds(100).with_seed(42);
//!
//!     // "Random" is built in; register your own learners next to it
//!     let registry = PlayerRegistry::with_baseline();
//!     let roster = load_roster_file(&registry, &game, "fighters.csv")?;
//!
//!     let master = GameMaster::new(Sf2Loader, game, config, roster);
//!     let handle = master.handle();
//!
//!     // operator console on its own thread; `end` stops the tournament
//!     let _console = std::thread::spawn(move || {
//!         let stdin = std::io::stdin();
//!         let mut stdout = std::io::stdout();
//!         kumite::console::run_console(&handle, stdin.lock(), &mut stdout)
//!     });
//!
//!     let report = master.run();
//!     for row in &report.standings {
//!         println!("{}: {}/{} won", row.name, row.matches_won, row.matches_played);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Roster Files
//!
//! A roster is a small CSV, one fighter per line after the header:
//!
//! ```csv
//! implementation,displayName,character,loadExistingWeights
//! Random,Stick Figure,ryu,false
//! DeepQ,Champ,guile,true
//! ```
//!
//! The implementation column picks a factory from the
//! [`PlayerRegistry`](crate::roster::PlayerRegistry); the character picks
//! the save states the fighter's matches boot from.
#![warn(missing_docs)]

pub use anyhow;

pub mod action_codec;
pub mod configuration;
pub mod console;
pub mod error;
pub mod fighter;
pub mod frame_filter;
pub mod game_config;
pub mod game_interface;
pub mod game_master;
pub mod lobby;
mod logger;
pub mod roster;
pub mod telemetry;

/// Commonly used types for quick access.
///
/// ```rust
/// use kumite::prelude::*;
/// ```
///
/// Includes the configuration, the game profile, the tournament types and
/// the traits a backend or player implements.
pub mod prelude {
    pub use crate::action_codec::{ActionCodec, MoveId};
    pub use crate::configuration::Configuration;
    pub use crate::error::{LoadError, MatchError};
    pub use crate::fighter::{Fighter, FighterRef, RandomPlayer};
    pub use crate::game_config::GameConfig;
    pub use crate::game_interface::{Environment, EnvironmentLoader, Player, Step, Transition};
    pub use crate::game_master::{GameMaster, MasterHandle, Standing, TournamentReport};
    pub use crate::lobby::{FightSummary, Lobby, LobbyMode, Matchup};
    pub use crate::roster::{load_roster, load_roster_file, parse_roster, PlayerRegistry, PlayerSpec};
    pub use crate::telemetry::Telemetry;
}
