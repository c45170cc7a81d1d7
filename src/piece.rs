//! The twelve pentomino pieces and their canonical shapes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::SochiError;

/// One of the twelve pentominoes, named by its letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub enum Piece {
    F,
    I,
    L,
    N,
    P,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
}

/// Every piece in alphabetical order.
pub const ALL_PIECES: [Piece; 12] = [
    Piece::F,
    Piece::I,
    Piece::L,
    Piece::N,
    Piece::P,
    Piece::T,
    Piece::U,
    Piece::V,
    Piece::W,
    Piece::X,
    Piece::Y,
    Piece::Z,
];

impl Piece {
    pub fn from_char(c: char) -> Option<Self> {
        ALL_PIECES.iter().copied().find(|p| p.letter() == c)
    }

    pub fn letter(self) -> char {
        match self {
            Piece::F => 'F',
            Piece::I => 'I',
            Piece::L => 'L',
            Piece::N => 'N',
            Piece::P => 'P',
            Piece::T => 'T',
            Piece::U => 'U',
            Piece::V => 'V',
            Piece::W => 'W',
            Piece::X => 'X',
            Piece::Y => 'Y',
            Piece::Z => 'Z',
        }
    }

    /// Canonical five-cell shape in the z = 0 plane.
    pub fn shape(self) -> [[i32; 3]; 5] {
        match self {
            Piece::F => [[1, 0, 0], [2, 0, 0], [0, 1, 0], [1, 1, 0], [1, 2, 0]],
            Piece::I => [[0, 0, 0], [0, 1, 0], [0, 2, 0], [0, 3, 0], [0, 4, 0]],
            Piece::L => [[0, 0, 0], [0, 1, 0], [0, 2, 0], [0, 3, 0], [1, 3, 0]],
            Piece::N => [[1, 0, 0], [2, 0, 0], [0, 1, 0], [1, 1, 0], [0, 2, 0]],
            Piece::P => [[0, 0, 0], [1, 0, 0], [0, 1, 0], [1, 1, 0], [0, 2, 0]],
            Piece::T => [[0, 0, 0], [1, 0, 0], [2, 0, 0], [1, 1, 0], [1, 2, 0]],
            Piece::U => [[0, 0, 0], [2, 0, 0], [0, 1, 0], [1, 1, 0], [2, 1, 0]],
            Piece::V => [[0, 0, 0], [0, 1, 0], [0, 2, 0], [1, 2, 0], [2, 2, 0]],
            Piece::W => [[0, 0, 0], [1, 0, 0], [1, 1, 0], [2, 1, 0], [2, 2, 0]],
            Piece::X => [[1, 0, 0], [0, 1, 0], [1, 1, 0], [2, 1, 0], [1, 2, 0]],
            Piece::Y => [[1, 0, 0], [0, 1, 0], [1, 1, 0], [1, 2, 0], [1, 3, 0]],
            Piece::Z => [[0, 0, 0], [1, 0, 0], [1, 1, 0], [1, 2, 0], [2, 2, 0]],
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl TryFrom<char> for Piece {
    type Error = SochiError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Piece::from_char(c)
            .ok_or_else(|| SochiError::InvalidInput(format!("unknown piece symbol {c:?}")))
    }
}

impl From<Piece> for char {
    fn from(p: Piece) -> char {
        p.letter()
    }
}

impl std::str::FromStr for Piece {
    type Err = SochiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Piece::try_from(c),
            _ => Err(SochiError::InvalidInput(format!(
                "piece must be a single letter, got {s:?}"
            ))),
        }
    }
}

/// Parse a comma separated piece list such as `"V, W"`. Blank entries are ignored.
pub fn parse_piece_list(s: &str) -> Result<Vec<Piece>, SochiError> {
    let mut out: Vec<Piece> = s
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()?;
    out.sort();
    out.dedup();
    Ok(out)
}
