//! Base puzzle solutions: placed cells on a 3D grid.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::SochiError;
use crate::fingerprint::Fingerprint;
use crate::piece::Piece;

/// A single occupied grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub piece: Piece,
}

/// Grid extent along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridSize {
    /// Smallest grid containing every cell, i.e. max coordinate + 1 per axis.
    pub fn enclosing(cells: &[Cell]) -> Option<Self> {
        let first = cells.first()?;
        let mut size = GridSize {
            x: first.x,
            y: first.y,
            z: first.z,
        };
        for c in cells {
            size.x = size.x.max(c.x);
            size.y = size.y.max(c.y);
            size.z = size.z.max(c.z);
        }
        Some(GridSize {
            x: size.x.saturating_add(1),
            y: size.y.saturating_add(1),
            z: size.z.saturating_add(1),
        })
    }
}

/// Master solution a publication is derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePuzzle {
    pub id: Uuid,
    /// Unique slug such as `5x4x3_0010`.
    pub name: String,
    pub description: Option<String>,
    pub puzzle_type_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub cells: Vec<Cell>,
}

impl BasePuzzle {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::from_cells(&self.cells)
    }

    /// Cells ordered z, y, x ascending as the viewer expects them.
    pub fn cells_in_viewer_order(&self) -> Vec<Cell> {
        let mut cells = self.cells.clone();
        cells.sort_by_key(|c| (c.z, c.y, c.x));
        cells
    }
}

/// Largest coordinate accepted on any axis.
pub const MAX_COORDINATE: i32 = 255;

/// Reject empty layouts, coordinates outside `0..=MAX_COORDINATE` and two
/// pieces in one cell.
pub fn validate_cells(cells: &[Cell]) -> Result<(), SochiError> {
    if cells.is_empty() {
        return Err(SochiError::InvalidInput("solution has no cells".into()));
    }
    let mut seen = HashSet::with_capacity(cells.len());
    for c in cells {
        if c.x < 0 || c.y < 0 || c.z < 0 {
            return Err(SochiError::InvalidInput(format!(
                "negative coordinate ({}, {}, {})",
                c.x, c.y, c.z
            )));
        }
        if c.x > MAX_COORDINATE || c.y > MAX_COORDINATE || c.z > MAX_COORDINATE {
            return Err(SochiError::InvalidInput(format!(
                "coordinate ({}, {}, {}) beyond {MAX_COORDINATE}",
                c.x, c.y, c.z
            )));
        }
        if !seen.insert((c.x, c.y, c.z)) {
            return Err(SochiError::InvalidInput(format!(
                "cell ({}, {}, {}) occupied twice",
                c.x, c.y, c.z
            )));
        }
    }
    Ok(())
}
