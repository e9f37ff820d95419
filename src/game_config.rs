//! Per-game configuration record.
//!
//! Everything the engine must know about one specific game lives here: the
//! round-timer reset constant the actionable-frame filter keys on, how many
//! round wins take a match, how save states are named, which characters the
//! roster may pick, and the move table. A [`GameConfig`] is built once and
//! cloned into every lobby; nothing game-specific hides in process-wide
//! tables.

use std::sync::Arc;

use crate::action_codec::ActionCodec;

/// Static description of one game.
#[derive(Clone, Debug)]
pub struct GameConfig {
    game: String,
    round_timer_start: i64,
    rounds_to_win: i64,
    characters: Vec<String>,
    codec: Arc<ActionCodec>,
}

impl GameConfig {
    /// Builds a record for a game.
    ///
    /// `round_timer_start` is the telemetry value the round timer shows
    /// before a round's countdown begins; `rounds_to_win` is the win tally
    /// that decides a match.
    pub fn new(
        game: impl Into<String>,
        round_timer_start: i64,
        rounds_to_win: i64,
        codec: ActionCodec,
    ) -> Self {
        Self {
            game: game.into(),
            round_timer_start,
            rounds_to_win,
            characters: Vec::new(),
            codec: Arc::new(codec),
        }
    }

    /// Sets the characters the roster may pick for this game.
    pub fn with_characters<I, S>(mut self, characters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.characters = characters.into_iter().map(Into::into).collect();
        self
    }

    /// Street Fighter II' Special Champion Edition (Genesis).
    pub fn street_fighter2() -> Self {
        Self::new(
            "StreetFighterIISpecialChampionEdition-Genesis",
            39208,
            2,
            ActionCodec::street_fighter2(),
        )
        .with_characters([
            "ryu", "blanka", "guile", "ehonda", "ken", "chunli", "zangief", "dhalsim",
        ])
    }

    /// Backend id of the game.
    pub fn game(&self) -> &str {
        &self.game
    }

    /// Round-timer value observed before a round's countdown begins.
    pub fn round_timer_start(&self) -> i64 {
        self.round_timer_start
    }

    /// Win tally that decides a match.
    pub fn rounds_to_win(&self) -> i64 {
        self.rounds_to_win
    }

    /// Shared move table for this game.
    pub fn codec(&self) -> &Arc<ActionCodec> {
        &self.codec
    }

    /// Characters the roster may pick. Empty when the game does not restrict
    /// them.
    pub fn characters(&self) -> &[String] {
        &self.characters
    }

    /// True when `character` is playable in this game (or the game does not
    /// restrict characters).
    pub fn is_known_character(&self, character: &str) -> bool {
        self.characters.is_empty() || self.characters.iter().any(|c| c == character)
    }

    /// Name of the save state a match between `characters` boots from,
    /// following the backend's file naming: `single_player_<c>` for solo
    /// play, `two_player_<a>VS<b>` for a versus match.
    pub fn save_state_name(&self, characters: &[&str]) -> String {
        match characters {
            [one] => format!("single_player_{one}"),
            [a, b] => format!("two_player_{a}VS{b}"),
            other => format!("two_player_{}", other.join("VS")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn street_fighter_preset_matches_the_backend() {
        let game = GameConfig::street_fighter2();
        assert_eq!(game.game(), "StreetFighterIISpecialChampionEdition-Genesis");
        assert_eq!(game.round_timer_start(), 39208);
        assert_eq!(game.rounds_to_win(), 2);
        assert_eq!(game.codec().len(), 51);
        assert_eq!(game.characters().len(), 8);
        assert!(game.is_known_character("chunli"));
        assert!(!game.is_known_character("akuma"));
    }

    #[test]
    fn save_states_follow_the_backend_naming() {
        let game = GameConfig::street_fighter2();
        assert_eq!(
            game.save_state_name(&["ryu", "guile"]),
            "two_player_ryuVSguile"
        );
        assert_eq!(game.save_state_name(&["ryu"]), "single_player_ryu");
    }

    #[test]
    fn unrestricted_games_accept_any_character() {
        let game = GameConfig::new("AnyGame", 1000, 2, ActionCodec::street_fighter2());
        assert!(game.is_known_character("whoever"));
    }
}
