//! Layout fingerprints and the positional similarity metric.
//!
//! A fingerprint lists the piece occupying every cell of a solved puzzle in
//! a fixed traversal order: z ascending, then y descending, then x
//! ascending. Two fingerprints are only comparable within one size class.

use std::fmt;

use crate::error::SochiError;
use crate::piece::Piece;
use crate::puzzle::Cell;

/// Fraction of positions holding the same symbol in both sequences.
///
/// Returns `0.0` when the lengths differ or both sequences are empty.
pub fn similarity<T: PartialEq>(a: &[T], b: &[T]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let matches = a.iter().zip(b).filter(|(x, y)| x == y).count();
    matches as f64 / a.len() as f64
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(Vec<Piece>);

impl Fingerprint {
    /// Parse a string of piece letters, rejecting anything outside the alphabet.
    pub fn parse(s: &str) -> Result<Self, SochiError> {
        s.trim()
            .chars()
            .map(|c| {
                Piece::from_char(c).ok_or_else(|| {
                    SochiError::InvalidInput(format!("fingerprint symbol {c:?} is not a piece"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Fingerprint)
    }

    /// Build a fingerprint from cells in any order.
    pub fn from_cells(cells: &[Cell]) -> Self {
        let mut ordered: Vec<&Cell> = cells.iter().collect();
        ordered.sort_by(|a, b| {
            a.z.cmp(&b.z)
                .then_with(|| b.y.cmp(&a.y))
                .then_with(|| a.x.cmp(&b.x))
        });
        Fingerprint(ordered.into_iter().map(|c| c.piece).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn symbols(&self) -> &[Piece] {
        &self.0
    }

    pub fn into_symbols(self) -> Vec<Piece> {
        self.0
    }

    pub fn similarity(&self, other: &Fingerprint) -> f64 {
        similarity(&self.0, &other.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in &self.0 {
            write!(f, "{}", p.letter())?;
        }
        Ok(())
    }
}
