//! Line-oriented operator console.
//!
//! Runs next to [`crate::game_master::GameMaster::run`] on its own thread
//! and drives the tournament through a [`MasterHandle`]. Commands come in
//! a long and a short form:
//!
//! | input | effect |
//! |---|---|
//! | `pause` | hold the round loop at the next round boundary |
//! | `start` | release a paused round loop |
//! | `view rounds`, `vr` | print rounds completed |
//! | `view matches`, `vm` | print the current matchups |
//! | `view wins`, `vw` | print the leaderboard |
//! | `open viewer`, `ov` | render matches from the next round |
//! | `close viewer`, `cv` | stop rendering from the next round |
//! | `end` | finish after the current round and leave the console |
//!
//! Anything else prints a hint and is ignored.

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::game_master::{MasterHandle, Standing};

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// One operator command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Hold the round loop at the next round boundary.
    Pause,
    /// Release a paused round loop.
    Start,
    /// Print rounds completed so far.
    ViewRounds,
    /// Print the matchups of the most recently filled round.
    ViewMatches,
    /// Print the leaderboard.
    ViewWins,
    /// Turn live rendering on.
    OpenViewer,
    /// Turn live rendering off.
    CloseViewer,
    /// End the tournament after the current round.
    End,
}

/// Parses one input line. Case and extra whitespace are ignored; unknown
/// input yields `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    let normalized = line.trim().to_ascii_lowercase();
    let words: Vec<&str> = normalized.split_whitespace().collect();
    match words.as_slice() {
        ["pause"] => Some(Command::Pause),
        ["start"] => Some(Command::Start),
        ["view", "rounds"] | ["vr"] => Some(Command::ViewRounds),
        ["view", "matches"] | ["vm"] => Some(Command::ViewMatches),
        ["view", "wins"] | ["vw"] => Some(Command::ViewWins),
        ["open", "viewer"] | ["ov"] => Some(Command::OpenViewer),
        ["close", "viewer"] | ["cv"] => Some(Command::CloseViewer),
        ["end"] => Some(Command::End),
        _ => None,
    }
}

/// Reads commands from `input` until `end` arrives or the input closes.
///
/// Responses go to `output`; this is normally stdin and stdout but any
/// reader/writer pair works, which is also how the tests drive it.
pub fn run_console<O, R, W>(handle: &MasterHandle<O>, input: R, output: &mut W) -> io::Result<()>
where
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        let Some(command) = parse_command(&line) else {
            if !line.trim().is_empty() {
                writeln!(output, "{YELLOW}unknown command '{}'{RESET}", line.trim())?;
                writeln!(
                    output,
                    "commands: pause, start, view rounds (vr), view matches (vm), \
                     view wins (vw), open viewer (ov), close viewer (cv), end"
                )?;
            }
            continue;
        };
        debug!(?command, "console command");
        match command {
            Command::Pause => {
                handle.pause();
                writeln!(output, "pausing at the next round boundary")?;
            }
            Command::Start => {
                handle.resume();
                writeln!(output, "resuming")?;
            }
            Command::ViewRounds => writeln!(output, "rounds run: {}", handle.rounds_run())?,
            Command::ViewMatches => {
                let matchups = handle.current_matchups();
                if matchups.is_empty() {
                    writeln!(output, "no matches scheduled yet")?;
                } else {
                    for matchup in matchups {
                        writeln!(output, "{matchup}")?;
                    }
                }
            }
            Command::ViewWins => write_standings(output, &handle.standings())?,
            Command::OpenViewer => {
                handle.set_viewer(true);
                writeln!(output, "viewer on from the next round")?;
            }
            Command::CloseViewer => {
                handle.set_viewer(false);
                writeln!(output, "viewer off from the next round")?;
            }
            Command::End => {
                handle.end();
                writeln!(output, "ending after the current round")?;
                break;
            }
        }
        output.flush()?;
    }
    Ok(())
}

/// Writes the leaderboard, best first.
pub fn write_standings<W: Write>(output: &mut W, standings: &[Standing]) -> io::Result<()> {
    if standings.is_empty() {
        return writeln!(output, "empty roster");
    }
    let widest = standings.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for (rank, row) in standings.iter().enumerate() {
        if row.matches_played == 0 {
            writeln!(
                output,
                "{:>2}. {:·<widest$} ({}) no matches yet",
                rank + 1,
                row.name,
                row.character
            )?;
        } else {
            writeln!(
                output,
                "{:>2}. {:·<widest$} ({}) {}/{} won {GREEN}{:.0}%{RESET}",
                rank + 1,
                row.name,
                row.character,
                row.matches_won,
                row.matches_played,
                row.win_rate() * 100.0,
            )?;
        }
    }
    Ok(())
}
