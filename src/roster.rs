//! Roster parsing and fighter construction.
//!
//! A roster is a CSV file with one header line, then one fighter per line:
//!
//! ```csv
//! implementation,displayName,character,loadExistingWeights
//! Random,Stick Figure,ryu,false
//! DeepQ,Champ,guile,true
//! ```
//!
//! The implementation column selects a factory from a [`PlayerRegistry`];
//! the display name defaults to the implementation name when left empty;
//! the load flag is false when empty or any casing of "false", true
//! otherwise. Blank lines are skipped. A fighter with a character the game
//! does not know is kept, with a warning, because custom save states may
//! still exist for it.

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{info, instrument, warn};

use crate::fighter::{Fighter, FighterRef, RandomPlayer};
use crate::game_config::GameConfig;
use crate::game_interface::Player;

/// One parsed roster line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerSpec {
    /// Registered implementation to build this fighter from.
    pub implementation: String,
    /// Name shown in matchups, standings and logs.
    pub display_name: String,
    /// Character the fighter plays; selects the save states its matches
    /// boot from.
    pub character: String,
    /// True when the implementation should start from previously saved
    /// weights instead of fresh ones.
    pub load_weights: bool,
}

type PlayerFactory<O> =
    Box<dyn Fn(&PlayerSpec) -> anyhow::Result<Box<dyn Player<O> + Send>> + Send + Sync>;

/// Maps implementation names to the factories that build them.
pub struct PlayerRegistry<O> {
    factories: HashMap<String, PlayerFactory<O>>,
}

impl<O> PlayerRegistry<O> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with the built-in random baseline registered under
    /// `Random`.
    pub fn with_baseline() -> Self
    where
        O: 'static,
    {
        Self::new().register("Random", |_spec| Ok(Box::new(RandomPlayer::new())))
    }

    /// Registers a factory under `implementation`, replacing any earlier
    /// one with the same name.
    pub fn register(
        mut self,
        implementation: impl Into<String>,
        factory: impl Fn(&PlayerSpec) -> anyhow::Result<Box<dyn Player<O> + Send>>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.factories.insert(implementation.into(), Box::new(factory));
        self
    }

    /// Builds one player from its spec.
    ///
    /// # Errors
    /// Unknown implementation names, or whatever the factory itself raises.
    pub fn build(&self, spec: &PlayerSpec) -> anyhow::Result<Box<dyn Player<O> + Send>> {
        let Some(factory) = self.factories.get(&spec.implementation) else {
            let mut known: Vec<&str> = self.factories.keys().map(String::as_str).collect();
            known.sort_unstable();
            bail!(
                "no player implementation registered under '{}' (known: {})",
                spec.implementation,
                known.join(", ")
            );
        };
        factory(spec)
    }
}

impl<O> Default for PlayerRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses roster CSV from any reader. The first line is a header and is
/// skipped.
pub fn parse_roster<R: BufRead>(reader: R) -> anyhow::Result<Vec<PlayerSpec>> {
    let mut specs = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("line {}: read failed", index + 1))?;
        if index == 0 || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 4 {
            bail!(
                "line {}: expected 4 comma-separated fields, found {}",
                index + 1,
                fields.len()
            );
        }
        let (implementation, display_name, character, load_weights) =
            (fields[0], fields[1], fields[2], fields[3]);
        if implementation.is_empty() {
            bail!("line {}: implementation name is empty", index + 1);
        }
        if character.is_empty() {
            bail!("line {}: character is empty", index + 1);
        }
        specs.push(PlayerSpec {
            implementation: implementation.to_string(),
            display_name: if display_name.is_empty() {
                implementation.to_string()
            } else {
                display_name.to_string()
            },
            character: character.to_string(),
            load_weights: !load_weights.is_empty()
                && !load_weights.eq_ignore_ascii_case("false"),
        });
    }
    Ok(specs)
}

/// Builds fighters from parsed specs, assigning ids in roster order.
#[instrument(skip_all, fields(fighters = specs.len()))]
pub fn load_roster<O>(
    registry: &PlayerRegistry<O>,
    game: &GameConfig,
    specs: &[PlayerSpec],
) -> anyhow::Result<Vec<FighterRef<O>>> {
    let mut roster = Vec::with_capacity(specs.len());
    for (id, spec) in specs.iter().enumerate() {
        if !game.is_known_character(&spec.character) {
            warn!(
                player = spec.display_name.as_str(),
                character = spec.character.as_str(),
                "character is not in the configured game's list"
            );
        }
        let driver = registry
            .build(spec)
            .with_context(|| format!("building player '{}'", spec.display_name))?;
        roster.push(Arc::new(Fighter::new(
            spec.display_name.clone(),
            spec.character.clone(),
            id as u32,
            driver,
        )));
    }
    info!(fighters = roster.len(), "roster loaded");
    Ok(roster)
}

/// Reads, parses and builds a roster from a CSV file.
pub fn load_roster_file<O>(
    registry: &PlayerRegistry<O>,
    game: &GameConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<Vec<FighterRef<O>>> {
    let path = path.as_ref();
    let file =
        std::fs::File::open(path).with_context(|| format!("opening roster file {path:?}"))?;
    let specs = parse_roster(BufReader::new(file))
        .with_context(|| format!("parsing roster file {path:?}"))?;
    load_roster(registry, game, &specs)
}
