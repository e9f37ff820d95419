//! Fixed mapping between integer move indices and pad-input bitmasks.
//!
//! A codec is built once per game from an ordered list of button combos and
//! shared read-only by every session of that game. Index 0 is always the
//! neutral combo: sessions submit it while a frame is non-actionable, so a
//! table whose first entry presses anything is rejected outright.
//!
//! The enumeration order is part of the contract: players pick moves by
//! index and the backend decodes the same index, so the table must never be
//! reordered once a tournament started.

use anyhow::bail;

/// Index of a move within an [`ActionCodec`].
pub type MoveId = usize;

/// Bitmask over [`Button::ALL`]; bit `i` means button `i` is held down.
pub type ButtonMask = u16;

/// Pad buttons in simulation wire order (Genesis layout).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Button {
    B,
    A,
    Mode,
    Start,
    Up,
    Down,
    Left,
    Right,
    C,
    Y,
    X,
    Z,
}

impl Button {
    /// Every button, in wire order. The position in this array is the bit
    /// position in a [`ButtonMask`].
    pub const ALL: [Button; 12] = [
        Button::B,
        Button::A,
        Button::Mode,
        Button::Start,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::C,
        Button::Y,
        Button::X,
        Button::Z,
    ];

    /// Bit of this button within a [`ButtonMask`].
    pub fn bit(self) -> ButtonMask {
        1 << self as u16
    }

    /// Upper-case label, as the backend names the button.
    pub fn label(self) -> &'static str {
        match self {
            Button::B => "B",
            Button::A => "A",
            Button::Mode => "MODE",
            Button::Start => "START",
            Button::Up => "UP",
            Button::Down => "DOWN",
            Button::Left => "LEFT",
            Button::Right => "RIGHT",
            Button::C => "C",
            Button::Y => "Y",
            Button::X => "X",
            Button::Z => "Z",
        }
    }
}

/// Ordered move enumeration for one game.
#[derive(Clone, Debug)]
pub struct ActionCodec {
    combos: Vec<Vec<Button>>,
    masks: Vec<ButtonMask>,
    labels: Vec<String>,
}

impl ActionCodec {
    /// Move index of the neutral (all buttons released) combo.
    pub const NEUTRAL: MoveId = 0;

    /// Builds a codec from an ordered combo table.
    ///
    /// The table must be non-empty and its first entry must be the neutral
    /// combo.
    pub fn new(combos: Vec<Vec<Button>>) -> anyhow::Result<Self> {
        let Some(first) = combos.first() else {
            bail!("combo table is empty");
        };
        if !first.is_empty() {
            bail!("combo table must start with the neutral combo");
        }
        let masks = combos
            .iter()
            .map(|combo| combo.iter().fold(0, |mask, b| mask | b.bit()))
            .collect();
        let labels = combos
            .iter()
            .map(|combo| {
                if combo.is_empty() {
                    "NEUTRAL".to_string()
                } else {
                    combo
                        .iter()
                        .map(|b| b.label())
                        .collect::<Vec<_>>()
                        .join("+")
                }
            })
            .collect();
        Ok(Self {
            combos,
            masks,
            labels,
        })
    }

    /// Number of moves in the enumeration.
    pub fn len(&self) -> usize {
        self.combos.len()
    }

    /// True when the codec has no moves. Never the case for a codec built
    /// through [`ActionCodec::new`].
    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }

    /// True when `mv` is a valid move index.
    pub fn contains(&self, mv: MoveId) -> bool {
        mv < self.combos.len()
    }

    /// Bitmask for `mv`, or `None` when out of range.
    pub fn encode(&self, mv: MoveId) -> Option<ButtonMask> {
        self.masks.get(mv).copied()
    }

    /// Human-readable label for `mv` ("NEUTRAL", "DOWN+LEFT+Y", ...).
    pub fn describe(&self, mv: MoveId) -> Option<&str> {
        self.labels.get(mv).map(String::as_str)
    }

    /// Raw button combo behind `mv`.
    pub fn combo(&self, mv: MoveId) -> Option<&[Button]> {
        self.combos.get(mv).map(Vec::as_slice)
    }

    /// The Street Fighter II' Special Champion Edition move table: neutral,
    /// the eight stick directions, and each of the six attack buttons alone
    /// or combined with a direction. 51 moves total.
    pub fn street_fighter2() -> Self {
        use Button::{Down, Left, Right, Up, A, B, C, X, Y, Z};

        let mut combos: Vec<Vec<Button>> = vec![
            vec![],
            vec![Up],
            vec![Down],
            vec![Left],
            vec![Up, Left],
            vec![Down, Left],
            vec![Right],
            vec![Up, Right],
            vec![Down, Right],
        ];
        for attack in [A, B, C, X, Y, Z] {
            combos.push(vec![attack]);
            combos.push(vec![attack, Up]);
            combos.push(vec![attack, Down]);
            combos.push(vec![attack, Left]);
            combos.push(vec![attack, Right]);
            combos.push(vec![attack, Down, Left]);
            combos.push(vec![attack, Down, Right]);
        }
        Self::new(combos).expect("built-in combo table is well formed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn street_fighter_table_has_51_moves_and_a_neutral_first() {
        let codec = ActionCodec::street_fighter2();
        assert_eq!(codec.len(), 51);
        assert_eq!(codec.encode(ActionCodec::NEUTRAL), Some(0));
        assert_eq!(codec.describe(ActionCodec::NEUTRAL), Some("NEUTRAL"));
    }

    #[test]
    fn masks_follow_wire_order() {
        let codec = ActionCodec::street_fighter2();
        // move 1 is UP, wire position 4
        assert_eq!(codec.encode(1), Some(1 << 4));
        // move 5 is DOWN+LEFT, wire positions 5 and 6
        assert_eq!(codec.encode(5), Some((1 << 5) | (1 << 6)));
        assert_eq!(codec.describe(5), Some("DOWN+LEFT"));
    }

    #[test]
    fn attack_blocks_come_after_the_directions() {
        let codec = ActionCodec::street_fighter2();
        // first attack block starts at index 9 with A alone
        assert_eq!(codec.describe(9), Some("A"));
        assert_eq!(codec.combo(9), Some([Button::A].as_slice()));
        // last move is Z with DOWN+RIGHT
        assert_eq!(codec.describe(50), Some("Z+DOWN+RIGHT"));
    }

    #[test]
    fn out_of_range_moves_are_rejected() {
        let codec = ActionCodec::street_fighter2();
        assert!(!codec.contains(51));
        assert_eq!(codec.encode(51), None);
        assert_eq!(codec.describe(51), None);
    }

    #[test]
    fn table_must_start_with_neutral() {
        assert!(ActionCodec::new(vec![]).is_err());
        assert!(ActionCodec::new(vec![vec![Button::Up]]).is_err());
        assert!(ActionCodec::new(vec![vec![], vec![Button::Up]]).is_ok());
    }
}
